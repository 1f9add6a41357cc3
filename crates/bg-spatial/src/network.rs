//! Weighted street network and builder.
//!
//! # Data layout
//!
//! Edges are **undirected** and indexed by `EdgeId`.  Adjacency uses
//! **Compressed Sparse Row (CSR)** format with one entry per edge endpoint:
//! the neighbours of `NodeId n` occupy
//!
//! ```text
//! adj_node[ node_adj_start[n] .. node_adj_start[n+1] ]
//! adj_edge[ node_adj_start[n] .. node_adj_start[n+1] ]
//! ```
//!
//! Within a node's slice entries are in ascending `EdgeId` order, so every
//! traversal (and therefore every shortest-path tie-break) is deterministic.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps planar `(x, y)` to the nearest `NodeId`.
//! Used to snap POI coordinates onto street nodes.

use rstar::{AABB, PointDistance, RTree, RTreeObject};
use rustc_hash::FxHashMap;

use bg_core::{EdgeId, NodeId, Point};

use crate::graph::GraphData;
use crate::{SpatialError, SpatialResult};

// ── R-tree node entry ─────────────────────────────────────────────────────────

#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2],
    id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── WeightedNetwork ───────────────────────────────────────────────────────────

/// Undirected street graph with per-edge length and existing-infrastructure
/// flag, plus a spatial index for node snapping.
///
/// The network is read-only once built: discounted routing weights live in
/// the [`Router`](crate::Router), never in the network itself.  Construct
/// with [`NetworkBuilder`].
pub struct WeightedNetwork {
    // ── Node data ─────────────────────────────────────────────────────────
    /// Planar position of each node.  Indexed by `NodeId`.
    pub node_pos: Vec<Point>,

    /// External id (e.g. OSM id) of each node.
    pub node_external: Vec<u64>,

    /// Point-of-interest marker.
    pub node_poi: Vec<bool>,

    /// `true` if the node was part of the merged existing-infrastructure
    /// graph.  Such nodes are always carried into the final network.
    pub node_in_existing: Vec<bool>,

    // ── CSR adjacency ─────────────────────────────────────────────────────
    /// Length = `node_count + 1`.
    pub node_adj_start: Vec<u32>,
    pub adj_node: Vec<NodeId>,
    pub adj_edge: Vec<EdgeId>,

    // ── Edge data (indexed by EdgeId) ─────────────────────────────────────
    pub edge_a: Vec<NodeId>,
    pub edge_b: Vec<NodeId>,

    /// Base weight (length).  Never negative.
    pub edge_length: Vec<f64>,

    /// Part of currently built bike infrastructure.
    pub edge_existing: Vec<bool>,

    // ── Lookups ───────────────────────────────────────────────────────────
    external_idx: FxHashMap<u64, NodeId>,
    spatial_idx: RTree<NodeEntry>,
}

impl WeightedNetwork {
    /// Construct an empty network with no nodes or edges.
    pub fn empty() -> Self {
        NetworkBuilder::new().build()
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    #[inline]
    pub fn contains_node(&self, node: NodeId) -> bool {
        node.index() < self.node_count()
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// `(neighbour, edge)` pairs incident to `node`, in ascending edge order.
    #[inline]
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, EdgeId)> + '_ {
        let start = self.node_adj_start[node.index()] as usize;
        let end   = self.node_adj_start[node.index() + 1] as usize;
        self.adj_node[start..end]
            .iter()
            .copied()
            .zip(self.adj_edge[start..end].iter().copied())
    }

    #[inline]
    pub fn degree(&self, node: NodeId) -> usize {
        let start = self.node_adj_start[node.index()] as usize;
        let end   = self.node_adj_start[node.index() + 1] as usize;
        end - start
    }

    #[inline]
    pub fn endpoints(&self, edge: EdgeId) -> (NodeId, NodeId) {
        (self.edge_a[edge.index()], self.edge_b[edge.index()])
    }

    /// The endpoint of `edge` that is not `node`.
    #[inline]
    pub fn other_end(&self, edge: EdgeId, node: NodeId) -> NodeId {
        let (a, b) = self.endpoints(edge);
        if a == node { b } else { a }
    }

    /// Lowest-id edge directly joining `a` and `b`, in either direction.
    pub fn find_edge(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        self.neighbors(a).find(|&(n, _)| n == b).map(|(_, e)| e)
    }

    /// `true` if any existing-infrastructure edge directly joins `a` and `b`.
    pub fn has_existing_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.neighbors(a)
            .any(|(n, e)| n == b && self.edge_existing[e.index()])
    }

    // ── Weights ───────────────────────────────────────────────────────────

    /// `length × (1 − route_factor)` for existing edges, `length` otherwise.
    #[inline]
    pub fn discounted_weight(&self, edge: EdgeId, route_factor: f64) -> f64 {
        let length = self.edge_length[edge.index()];
        if self.edge_existing[edge.index()] {
            length * (1.0 - route_factor)
        } else {
            length
        }
    }

    /// Number of edges flagged as existing infrastructure.
    pub fn existing_edge_count(&self) -> usize {
        self.edge_existing.iter().filter(|&&e| e).count()
    }

    // ── Node lookups ──────────────────────────────────────────────────────

    /// All POI-flagged nodes in ascending id order.
    pub fn poi_nodes(&self) -> Vec<NodeId> {
        self.node_poi
            .iter()
            .enumerate()
            .filter(|&(_, &poi)| poi)
            .map(|(i, _)| NodeId(i as u32))
            .collect()
    }

    pub fn node_by_external(&self, external: u64) -> Option<NodeId> {
        self.external_idx.get(&external).copied()
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Nearest node to `pos`.  `None` only if the network has no nodes.
    pub fn snap_to_node(&self, pos: Point) -> Option<NodeId> {
        self.spatial_idx
            .nearest_neighbor(&pos.to_array())
            .map(|e| e.id)
    }

    /// Up to `k` nearest nodes to `pos`, sorted by ascending distance.
    pub fn k_nearest_nodes(&self, pos: Point, k: usize) -> Vec<NodeId> {
        self.spatial_idx
            .nearest_neighbor_iter(&pos.to_array())
            .take(k)
            .map(|e| e.id)
            .collect()
    }
}

/// Snap POI coordinates onto their nearest street nodes.
///
/// Several POIs frequently map to the same intersection; the result is
/// sorted and de-duplicated so every node appears once.
pub fn snap_pois(network: &WeightedNetwork, points: &[Point]) -> Vec<NodeId> {
    let mut nodes: Vec<NodeId> = points
        .iter()
        .filter_map(|&p| network.snap_to_node(p))
        .collect();
    nodes.sort_unstable();
    nodes.dedup();
    nodes
}

// ── NetworkBuilder ────────────────────────────────────────────────────────────

/// Construct a [`WeightedNetwork`] incrementally, then call [`build`](Self::build).
///
/// Nodes are keyed by external id: adding a node whose external id is
/// already known returns the existing `NodeId` (this is what makes merging
/// an existing-infrastructure graph a plain union).
///
/// # Example
///
/// ```
/// use bg_core::Point;
/// use bg_spatial::NetworkBuilder;
///
/// let mut b = NetworkBuilder::new();
/// let a = b.add_node(10, Point::new(0.0, 0.0), true);
/// let c = b.add_node(11, Point::new(1.0, 0.0), true);
/// b.add_edge(a, c, 1.0, false);
/// let net = b.build();
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.edge_count(), 1);
/// assert_eq!(net.degree(a), 1);
/// ```
pub struct NetworkBuilder {
    nodes:        Vec<RawNode>,
    edges:        Vec<RawEdge>,
    external_idx: FxHashMap<u64, NodeId>,
    /// First edge seen per unordered endpoint pair.
    pair_idx:     FxHashMap<(NodeId, NodeId), Vec<EdgeId>>,
}

struct RawNode {
    external:    u64,
    pos:         Point,
    poi:         bool,
    in_existing: bool,
}

struct RawEdge {
    a:        NodeId,
    b:        NodeId,
    length:   f64,
    existing: bool,
}

#[inline]
fn pair_key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b { (a, b) } else { (b, a) }
}

fn check_length(length: f64, u: u64, v: u64) -> SpatialResult<()> {
    if length.is_finite() && length >= 0.0 {
        Ok(())
    } else {
        Err(SpatialError::Parse(format!(
            "edge {u}-{v} has invalid length {length}: must be finite and non-negative"
        )))
    }
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self {
            nodes:        Vec::new(),
            edges:        Vec::new(),
            external_idx: FxHashMap::default(),
            pair_idx:     FxHashMap::default(),
        }
    }

    /// Pre-allocate for the expected number of nodes and edges.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes:        Vec::with_capacity(nodes),
            edges:        Vec::with_capacity(edges),
            external_idx: FxHashMap::with_capacity_and_hasher(nodes, Default::default()),
            pair_idx:     FxHashMap::with_capacity_and_hasher(edges, Default::default()),
        }
    }

    /// Build from a base graph, validating that every edge references known
    /// nodes and carries a usable length.
    pub fn from_graph(graph: &GraphData) -> SpatialResult<Self> {
        let mut b = Self::with_capacity(graph.nodes.len(), graph.edges.len());
        for n in &graph.nodes {
            if !n.pos.is_finite() {
                return Err(SpatialError::Parse(format!(
                    "node {} has non-finite coordinates {}",
                    n.id, n.pos
                )));
            }
            b.add_node(n.id, n.pos, n.poi);
        }
        for e in &graph.edges {
            check_length(e.length, e.u, e.v)?;
            let a = b.resolve(e.u)?;
            let c = b.resolve(e.v)?;
            b.add_edge(a, c, e.length, e.existing);
        }
        Ok(b)
    }

    /// Add a node and return its `NodeId` (sequential from 0).  An already
    /// known external id returns the existing node; its POI flag is OR-ed.
    pub fn add_node(&mut self, external: u64, pos: Point, poi: bool) -> NodeId {
        if let Some(&id) = self.external_idx.get(&external) {
            self.nodes[id.index()].poi |= poi;
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(RawNode { external, pos, poi, in_existing: false });
        self.external_idx.insert(external, id);
        id
    }

    /// Add an undirected edge and return its `EdgeId`.
    ///
    /// `length` must be finite and non-negative; use
    /// [`from_graph`](Self::from_graph) for validated bulk input.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, length: f64, existing: bool) -> EdgeId {
        debug_assert!(length >= 0.0, "negative edge length {length}");
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(RawEdge { a, b, length, existing });
        self.pair_idx.entry(pair_key(a, b)).or_default().push(id);
        id
    }

    /// Union an existing-infrastructure graph into the network.
    ///
    /// Nodes are matched by external id (unknown ones are added).  An
    /// existing edge whose endpoints are already joined by base edges flags
    /// every one of them as existing; otherwise it is added as a new
    /// existing edge.
    /// Returns the number of edges newly added.
    pub fn merge_existing(&mut self, existing: &GraphData) -> SpatialResult<usize> {
        for n in &existing.nodes {
            let id = self.add_node(n.id, n.pos, n.poi);
            self.nodes[id.index()].in_existing = true;
        }
        let mut added = 0;
        for e in &existing.edges {
            check_length(e.length, e.u, e.v)?;
            let a = self.resolve(e.u)?;
            let c = self.resolve(e.v)?;
            match self.pair_idx.get(&pair_key(a, c)) {
                Some(parallel) => {
                    for edge in parallel {
                        self.edges[edge.index()].existing = true;
                    }
                }
                None => {
                    self.add_edge(a, c, e.length, true);
                    added += 1;
                }
            }
        }
        log::debug!(
            "merged existing infrastructure: {} nodes, {} edges ({} new)",
            existing.nodes.len(),
            existing.edges.len(),
            added
        );
        Ok(added)
    }

    /// Set or clear the POI marker on a node.
    pub fn set_poi(&mut self, node: NodeId, poi: bool) {
        self.nodes[node.index()].poi = poi;
    }

    pub fn resolve(&self, external: u64) -> SpatialResult<NodeId> {
        self.external_idx
            .get(&external)
            .copied()
            .ok_or(SpatialError::UnknownExternalId(external))
    }

    pub fn node_pos(&self, id: NodeId) -> Point {
        self.nodes[id.index()].pos
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.edges.len() }

    /// Consume the builder and produce a [`WeightedNetwork`].
    ///
    /// Time complexity: O(N + E) for the CSR arrays + O(N log N) for the
    /// R-tree bulk load.
    pub fn build(self) -> WeightedNetwork {
        let node_count = self.nodes.len();

        // Count endpoint slots per node (self-loops occupy one slot).
        let mut node_adj_start = vec![0u32; node_count + 1];
        for e in &self.edges {
            node_adj_start[e.a.index() + 1] += 1;
            if e.a != e.b {
                node_adj_start[e.b.index() + 1] += 1;
            }
        }
        for i in 1..=node_count {
            node_adj_start[i] += node_adj_start[i - 1];
        }

        // Fill in edge order so each slice is sorted by EdgeId.
        let slots = node_adj_start[node_count] as usize;
        let mut adj_node = vec![NodeId::INVALID; slots];
        let mut adj_edge = vec![EdgeId::INVALID; slots];
        let mut cursor: Vec<u32> = node_adj_start[..node_count].to_vec();
        for (i, e) in self.edges.iter().enumerate() {
            let id = EdgeId(i as u32);
            let slot = cursor[e.a.index()] as usize;
            adj_node[slot] = e.b;
            adj_edge[slot] = id;
            cursor[e.a.index()] += 1;
            if e.a != e.b {
                let slot = cursor[e.b.index()] as usize;
                adj_node[slot] = e.a;
                adj_edge[slot] = id;
                cursor[e.b.index()] += 1;
            }
        }

        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| NodeEntry { point: n.pos.to_array(), id: NodeId(i as u32) })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        WeightedNetwork {
            node_pos:         self.nodes.iter().map(|n| n.pos).collect(),
            node_external:    self.nodes.iter().map(|n| n.external).collect(),
            node_poi:         self.nodes.iter().map(|n| n.poi).collect(),
            node_in_existing: self.nodes.iter().map(|n| n.in_existing).collect(),
            node_adj_start,
            adj_node,
            adj_edge,
            edge_a:           self.edges.iter().map(|e| e.a).collect(),
            edge_b:           self.edges.iter().map(|e| e.b).collect(),
            edge_length:      self.edges.iter().map(|e| e.length).collect(),
            edge_existing:    self.edges.iter().map(|e| e.existing).collect(),
            external_idx:     self.external_idx,
            spatial_idx,
        }
    }
}

impl Default for NetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
