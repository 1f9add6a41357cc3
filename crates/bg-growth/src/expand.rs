//! Re-expansion of surviving GT edges into street paths and assembly of the
//! final network.

use std::collections::BTreeSet;

use bg_core::{EdgeId, NodeId};
use bg_spatial::{Router, SpatialError, SpatialResult, WeightedNetwork};

use crate::triangulation::{GtEdge, TriangulationGraph};
use crate::GrowthResult;

// ── PathExpander ──────────────────────────────────────────────────────────────

/// Union of the base-network nodes visited by every expanded GT edge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expansion {
    pub nodes: BTreeSet<NodeId>,
    /// GT edges that were routed.
    pub routed: usize,
    /// GT edges whose endpoints turned out to be disconnected.
    pub skipped: usize,
    /// Sum of the individual path node counts, before the union.
    pub path_node_total: usize,
}

impl Expansion {
    /// Nodes saved by sharing path segments between GT edges.
    pub fn shared_nodes(&self) -> usize {
        self.path_node_total - self.nodes.len()
    }
}

/// Routes every GT edge on the base network.
pub struct PathExpander<'a, R: Router> {
    network: &'a WeightedNetwork,
    router: &'a R,
}

impl<'a, R: Router> PathExpander<'a, R> {
    pub fn new(network: &'a WeightedNetwork, router: &'a R) -> Self {
        Self { network, router }
    }

    /// Expand GT edges in ascending weight order.  A pair without a path is
    /// logged and skipped.
    ///
    /// # Errors
    ///
    /// Propagates [`SpatialError::NodeNotFound`] for endpoints outside the
    /// network.
    pub fn expand(&self, gt: &TriangulationGraph) -> GrowthResult<Expansion> {
        let mut edges: Vec<&GtEdge> = gt.edges().iter().collect();
        edges.sort_by(|x, y| x.weight.total_cmp(&y.weight));

        let mut expansion = Expansion::default();
        for (edge, result) in edges.iter().zip(self.route_all(&edges)) {
            match result {
                Ok(nodes) => {
                    expansion.routed += 1;
                    expansion.path_node_total += nodes.len();
                    expansion.nodes.extend(nodes);
                }
                Err(SpatialError::NoPath { .. }) => {
                    log::warn!("GT edge {} - {} has no street path; skipped", edge.a, edge.b);
                    expansion.skipped += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        log::info!(
            "expanded {} GT edges into {} street nodes ({} shared)",
            expansion.routed,
            expansion.nodes.len(),
            expansion.shared_nodes()
        );
        Ok(expansion)
    }

    fn route_one(&self, edge: &GtEdge) -> SpatialResult<Vec<NodeId>> {
        self.router.route(self.network, edge.a, edge.b).map(|r| r.nodes)
    }

    #[cfg(not(feature = "parallel"))]
    fn route_all(&self, edges: &[&GtEdge]) -> Vec<SpatialResult<Vec<NodeId>>> {
        edges.iter().map(|e| self.route_one(e)).collect()
    }

    #[cfg(feature = "parallel")]
    fn route_all(&self, edges: &[&GtEdge]) -> Vec<SpatialResult<Vec<NodeId>>> {
        use rayon::prelude::*;

        edges.par_iter().map(|e| self.route_one(e)).collect()
    }
}

// ── FinalNetwork ──────────────────────────────────────────────────────────────

/// Where a final edge came from.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Provenance {
    /// Part of the existing-infrastructure input.
    pub existing: bool,
    /// Produced by path expansion.
    pub generated: bool,
}

impl Provenance {
    pub fn as_str(self) -> &'static str {
        match (self.existing, self.generated) {
            (true, true) => "both",
            (true, false) => "existing",
            (false, true) => "generated",
            (false, false) => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FinalEdge {
    pub edge: EdgeId,
    pub a: NodeId,
    pub b: NodeId,
    pub length: f64,
    pub provenance: Provenance,
}

/// The proposed network: a subgraph of the base network.
///
/// `nodes` and `edges` are sorted by id.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FinalNetwork {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<FinalEdge>,
}

impl FinalNetwork {
    /// Induced subgraph of `network` over the expanded nodes, merged with all
    /// existing infrastructure.
    ///
    /// With `drop_isolated`, nodes left without an incident edge are removed.
    pub fn assemble(network: &WeightedNetwork, expansion: &Expansion, drop_isolated: bool) -> Self {
        let mut nodes: BTreeSet<NodeId> = expansion.nodes.clone();
        nodes.extend(
            (0..network.node_count())
                .filter(|&i| network.node_in_existing[i])
                .map(|i| NodeId(i as u32)),
        );

        let mut edges = Vec::new();
        for i in 0..network.edge_count() {
            let edge = EdgeId(i as u32);
            let (a, b) = network.endpoints(edge);
            let provenance = Provenance {
                existing: network.edge_existing[i],
                generated: expansion.nodes.contains(&a) && expansion.nodes.contains(&b),
            };
            if !(provenance.existing || provenance.generated) {
                continue;
            }
            nodes.insert(a);
            nodes.insert(b);
            edges.push(FinalEdge { edge, a, b, length: network.edge_length[i], provenance });
        }

        if drop_isolated {
            let touched: BTreeSet<NodeId> = edges.iter().flat_map(|e| [e.a, e.b]).collect();
            nodes.retain(|n| touched.contains(n));
        }

        Self { nodes: nodes.into_iter().collect(), edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.binary_search(&node).is_ok()
    }

    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        self.edges.binary_search_by_key(&edge, |e| e.edge).is_ok()
    }

    pub fn generated_edges(&self) -> impl Iterator<Item = &FinalEdge> + '_ {
        self.edges.iter().filter(|e| e.provenance.generated)
    }

    pub fn existing_edges(&self) -> impl Iterator<Item = &FinalEdge> + '_ {
        self.edges.iter().filter(|e| e.provenance.existing)
    }

    /// Total length of generated edges that are not already built.
    pub fn new_length(&self) -> f64 {
        self.edges
            .iter()
            .filter(|e| e.provenance.generated && !e.provenance.existing)
            .map(|e| e.length)
            .sum()
    }
}
