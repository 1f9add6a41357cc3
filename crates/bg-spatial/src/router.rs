//! Routing trait and the default discounted-weight Dijkstra.
//!
//! # Pluggability
//!
//! `bg-growth` calls routing via the [`Router`] trait, so alternative cost
//! models (slope penalties, accident data, A*) can be swapped in without
//! touching the pipeline.  The default [`DiscountRouter`] routes on
//! `length × (1 − route_factor)` for existing-infrastructure edges.
//!
//! # Weight lifetime
//!
//! Discounted weights are derived once in [`DiscountRouter::new`] and then
//! reused by every query; the network itself is never mutated.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use bg_core::{EdgeId, NodeId};

use crate::network::WeightedNetwork;
use crate::{SpatialError, SpatialResult};

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a routing query.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Visited nodes from source to destination, both inclusive.
    pub nodes: Vec<NodeId>,
    /// Traversed edges in order.  `edges.len() == nodes.len() - 1`.
    pub edges: Vec<EdgeId>,
    /// Sum of the router's edge costs along `edges`.
    pub cost: f64,
}

impl Route {
    /// `true` if the source and destination are the same node.
    pub fn is_trivial(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn source(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn target(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable routing engine.
///
/// Implementations must be `Send + Sync` so they can be shared across Rayon
/// workers when the `parallel` feature of `bg-growth` is enabled.
pub trait Router: Send + Sync {
    /// Cost of traversing `edge`.  Must be finite and non-negative.
    fn edge_cost(&self, edge: EdgeId) -> f64;

    /// Shortest routes from `from` to each of `targets`, in target order.
    ///
    /// Unreachable targets yield [`SpatialError::NoPath`]; a target equal to
    /// `from` yields a trivial zero-cost route.
    fn routes_from(
        &self,
        network: &WeightedNetwork,
        from: NodeId,
        targets: &[NodeId],
    ) -> Vec<SpatialResult<Route>>;

    /// Shortest route from `from` to `to`.
    fn route(&self, network: &WeightedNetwork, from: NodeId, to: NodeId) -> SpatialResult<Route> {
        self.routes_from(network, from, &[to])
            .pop()
            .unwrap_or(Err(SpatialError::NoPath { from, to }))
    }
}

// ── DiscountRouter ────────────────────────────────────────────────────────────

/// Dijkstra over the undirected street graph, weighted by discounted length.
pub struct DiscountRouter {
    route_factor: f64,
    weights: Vec<f64>,
}

impl DiscountRouter {
    /// Derive the discounted weight of every edge for `route_factor`.
    pub fn new(network: &WeightedNetwork, route_factor: f64) -> Self {
        let weights = (0..network.edge_count())
            .map(|i| network.discounted_weight(EdgeId(i as u32), route_factor))
            .collect();
        Self { route_factor, weights }
    }

    pub fn route_factor(&self) -> f64 {
        self.route_factor
    }

    /// Discounted weights indexed by `EdgeId`.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

impl Router for DiscountRouter {
    #[inline]
    fn edge_cost(&self, edge: EdgeId) -> f64 {
        self.weights[edge.index()]
    }

    fn routes_from(
        &self,
        network: &WeightedNetwork,
        from: NodeId,
        targets: &[NodeId],
    ) -> Vec<SpatialResult<Route>> {
        if !network.contains_node(from) {
            return targets.iter().map(|_| Err(SpatialError::NodeNotFound(from))).collect();
        }
        let tree = dijkstra(network, from, targets, |e| self.edge_cost(e));
        targets
            .iter()
            .map(|&to| {
                if !network.contains_node(to) {
                    return Err(SpatialError::NodeNotFound(to));
                }
                tree.path_to(network, to, |e| self.edge_cost(e))
                    .ok_or(SpatialError::NoPath { from, to })
            })
            .collect()
    }
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

/// Total order over non-NaN costs so they can live in a `BinaryHeap`.
#[derive(Copy, Clone, PartialEq, Debug)]
struct Cost(f64);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Shortest-path tree rooted at one source.
struct PathTree {
    source: NodeId,
    /// `prev_edge[v]` = edge that reached v; `EdgeId::INVALID` if unreached.
    prev_edge: Vec<EdgeId>,
}

impl PathTree {
    fn path_to(
        &self,
        network: &WeightedNetwork,
        to: NodeId,
        cost_of: impl Fn(EdgeId) -> f64,
    ) -> Option<Route> {
        if to == self.source {
            return Some(Route { nodes: vec![to], edges: vec![], cost: 0.0 });
        }
        if self.prev_edge[to.index()] == EdgeId::INVALID {
            return None;
        }

        let mut nodes = vec![to];
        let mut edges = Vec::new();
        let mut cur = to;
        while cur != self.source {
            let e = self.prev_edge[cur.index()];
            edges.push(e);
            cur = network.other_end(e, cur);
            nodes.push(cur);
        }
        nodes.reverse();
        edges.reverse();

        // Summed along the path rather than read from the search frontier.
        let cost = edges.iter().map(|&e| cost_of(e)).sum();
        Some(Route { nodes, edges, cost })
    }
}

/// Single-source Dijkstra that stops once every target is settled.
fn dijkstra(
    network: &WeightedNetwork,
    from: NodeId,
    targets: &[NodeId],
    cost_of: impl Fn(EdgeId) -> f64,
) -> PathTree {
    let n = network.node_count();
    let mut dist      = vec![f64::INFINITY; n];
    let mut prev_edge = vec![EdgeId::INVALID; n];
    let mut settled   = vec![false; n];

    let mut is_target = vec![false; n];
    let mut remaining = 0usize;
    for &t in targets {
        if network.contains_node(t) && !is_target[t.index()] {
            is_target[t.index()] = true;
            remaining += 1;
        }
    }

    dist[from.index()] = 0.0;

    // Secondary key NodeId ensures deterministic tie-breaking.
    let mut heap: BinaryHeap<Reverse<(Cost, NodeId)>> = BinaryHeap::new();
    heap.push(Reverse((Cost(0.0), from)));

    while let Some(Reverse((Cost(cost), node))) = heap.pop() {
        if settled[node.index()] {
            continue;
        }
        settled[node.index()] = true;

        if is_target[node.index()] {
            remaining -= 1;
            if remaining == 0 {
                break;
            }
        }

        for (neighbor, edge) in network.neighbors(node) {
            if settled[neighbor.index()] {
                continue;
            }
            let new_cost = cost + cost_of(edge);
            if new_cost < dist[neighbor.index()] {
                dist[neighbor.index()] = new_cost;
                prev_edge[neighbor.index()] = edge;
                heap.push(Reverse((Cost(new_cost), neighbor)));
            }
        }
    }

    PathTree { source: from, prev_edge }
}
