//! The triangulation graph over POIs and the greedy planar triangulator.
//!
//! # Lifecycle
//!
//! A [`TriangulationGraph`] starts with exactly the POI nodes and no edges.
//! [`PlanarTriangulator`] adds edges in ascending candidate cost; afterwards
//! edges are only ever removed (by the pruner).

use rstar::RTree;
use rustc_hash::FxHashMap;

use bg_core::{NodeId, Point};
use bg_spatial::{SpatialError, WeightedNetwork};

use crate::geometry::Segment;
use crate::pairs::CandidatePair;
use crate::{GrowthError, GrowthResult};

// ── Graph types ───────────────────────────────────────────────────────────────

/// A POI node of the triangulation.
#[derive(Debug, Clone, PartialEq)]
pub struct GtNode {
    /// Base network node this POI sits on.
    pub id: NodeId,
    pub pos: Point,
    /// Set by closeness pruning.
    pub closeness: Option<f64>,
}

/// A virtual POI-to-POI edge.
#[derive(Debug, Clone, PartialEq)]
pub struct GtEdge {
    pub a: NodeId,
    pub b: NodeId,
    /// Candidate cost of the routed pair.
    pub weight: f64,
    /// The two POIs are directly joined by existing infrastructure.
    pub existing: bool,
    /// Set by betweenness pruning.
    pub betweenness: Option<f64>,
    /// Cosmetic line width derived from betweenness.
    pub width: Option<f64>,
}

/// Undirected graph over the POI set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriangulationGraph {
    nodes: Vec<GtNode>,
    edges: Vec<GtEdge>,
    /// Base `NodeId` → position in `nodes`.
    local: FxHashMap<NodeId, usize>,
}

impl TriangulationGraph {
    /// Edge-less graph over `pois`, taking positions from `network`.
    /// Repeated POIs are added once.
    pub fn from_pois(network: &WeightedNetwork, pois: &[NodeId]) -> GrowthResult<Self> {
        let mut gt = Self::default();
        for &id in pois {
            if !network.contains_node(id) {
                return Err(SpatialError::NodeNotFound(id).into());
            }
            if gt.local.contains_key(&id) {
                continue;
            }
            gt.local.insert(id, gt.nodes.len());
            gt.nodes.push(GtNode { id, pos: network.node_pos[id.index()], closeness: None });
        }
        Ok(gt)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[GtNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GtEdge] {
        &self.edges
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.local.contains_key(&id)
    }

    /// Position of `id` in [`nodes`](Self::nodes).
    pub fn local_index(&self, id: NodeId) -> Option<usize> {
        self.local.get(&id).copied()
    }

    pub fn position(&self, id: NodeId) -> Option<Point> {
        self.local_index(id).map(|i| self.nodes[i].pos)
    }

    pub fn existing_edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.existing).count()
    }

    pub fn segment(&self, edge: &GtEdge) -> Option<Segment> {
        Some(Segment::new(self.position(edge.a)?, self.position(edge.b)?))
    }

    /// Per-node `(neighbour, edge)` lists in local indices.
    pub(crate) fn adjacency(&self) -> Vec<Vec<(usize, usize)>> {
        let mut adj = vec![Vec::new(); self.nodes.len()];
        for (i, e) in self.edges.iter().enumerate() {
            let (Some(a), Some(b)) = (self.local_index(e.a), self.local_index(e.b)) else {
                continue;
            };
            adj[a].push((b, i));
            if a != b {
                adj[b].push((a, i));
            }
        }
        adj
    }

    pub(crate) fn edges_mut(&mut self) -> &mut [GtEdge] {
        &mut self.edges
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [GtNode] {
        &mut self.nodes
    }

    fn push_edge(&mut self, edge: GtEdge) {
        self.edges.push(edge);
    }

    /// Drop every edge whose `keep` flag is false.  Returns the number removed.
    pub(crate) fn retain_edges(&mut self, keep: &[bool]) -> usize {
        debug_assert_eq!(keep.len(), self.edges.len());
        let before = self.edges.len();
        let mut flags = keep.iter();
        self.edges.retain(|_| flags.next().copied().unwrap_or(true));
        before - self.edges.len()
    }

    /// Subgraph on the nodes whose `keep` flag is set, with every edge
    /// between two kept nodes.
    pub(crate) fn induced_subgraph(&self, keep: &[bool]) -> Self {
        debug_assert_eq!(keep.len(), self.nodes.len());
        let mut sub = Self::default();
        for (node, _) in self.nodes.iter().zip(keep).filter(|&(_, &k)| k) {
            sub.local.insert(node.id, sub.nodes.len());
            sub.nodes.push(node.clone());
        }
        sub.edges = self
            .edges
            .iter()
            .filter(|e| sub.contains_node(e.a) && sub.contains_node(e.b))
            .cloned()
            .collect();
        sub
    }
}

// ── PlanarTriangulator ────────────────────────────────────────────────────────

/// Greedy planar triangulation.
///
/// Candidates are taken strictly in the given (ascending cost) order and
/// accepted unless their straight segment properly crosses an edge already
/// in the graph.  Accepted segments are kept in an R-tree so each candidate
/// is only tested against edges whose bounding boxes overlap its own.
pub struct PlanarTriangulator<'a> {
    network: &'a WeightedNetwork,
}

impl<'a> PlanarTriangulator<'a> {
    pub fn new(network: &'a WeightedNetwork) -> Self {
        Self { network }
    }

    /// Add every non-crossing candidate to `gt`.  Returns the number of
    /// accepted edges.
    ///
    /// # Errors
    ///
    /// [`GrowthError::InvariantViolation`] if a candidate endpoint is not a
    /// node of `gt`.
    pub fn triangulate(
        &self,
        gt: &mut TriangulationGraph,
        pairs: &[CandidatePair],
    ) -> GrowthResult<usize> {
        let mut accepted_segments: RTree<Segment> = RTree::new();
        for edge in gt.edges() {
            if let Some(seg) = gt.segment(edge) {
                accepted_segments.insert(seg);
            }
        }

        let mut accepted = 0;
        for pair in pairs {
            let start = gt
                .position(pair.a)
                .ok_or(GrowthError::InvariantViolation { node: pair.a })?;
            let end = gt
                .position(pair.b)
                .ok_or(GrowthError::InvariantViolation { node: pair.b })?;
            let candidate = Segment::new(start, end);

            let crosses = accepted_segments
                .locate_in_envelope_intersecting(&rstar::RTreeObject::envelope(&candidate))
                .any(|seg| candidate.properly_intersects(seg));
            if crosses {
                continue;
            }

            gt.push_edge(GtEdge {
                a: pair.a,
                b: pair.b,
                weight: pair.cost,
                existing: self.network.has_existing_edge(pair.a, pair.b),
                betweenness: None,
                width: None,
            });
            accepted_segments.insert(candidate);
            accepted += 1;
        }

        log::info!(
            "triangulation accepted {accepted} of {} candidates over {} POIs",
            pairs.len(),
            gt.node_count()
        );
        Ok(accepted)
    }
}
