//! Weighted centrality measures on the triangulation graph.
//!
//! All shortest paths use the stored GT edge `weight`.  Path lengths that
//! differ by less than a relative [`TIE_EPSILON`] count as equal, so
//! betweenness splits evenly across geometrically equivalent routes even
//! when the summed float costs differ in the last bits.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::triangulation::TriangulationGraph;

pub const TIE_EPSILON: f64 = 1e-10;

#[derive(Copy, Clone, Debug, PartialEq)]
struct Dist(f64);

impl Eq for Dist {}

impl PartialOrd for Dist {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Dist {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[inline]
fn same_length(a: f64, b: f64) -> bool {
    (a - b).abs() <= TIE_EPSILON * a.abs().max(b.abs()).max(1.0)
}

/// Shortest-path DAG from one source.
struct ShortestPaths {
    /// Nodes in settling order (non-decreasing distance).
    order: Vec<usize>,
    dist: Vec<f64>,
    /// Number of shortest paths from the source.
    sigma: Vec<f64>,
    /// `(predecessor, edge)` on some shortest path.
    preds: Vec<Vec<(usize, usize)>>,
}

fn shortest_paths(adj: &[Vec<(usize, usize)>], weights: &[f64], source: usize) -> ShortestPaths {
    let n = adj.len();
    let mut sp = ShortestPaths {
        order: Vec::with_capacity(n),
        dist: vec![f64::INFINITY; n],
        sigma: vec![0.0; n],
        preds: vec![Vec::new(); n],
    };
    let mut settled = vec![false; n];
    let mut heap = BinaryHeap::new();

    sp.dist[source] = 0.0;
    sp.sigma[source] = 1.0;
    heap.push(Reverse((Dist(0.0), source)));

    while let Some(Reverse((Dist(d), v))) = heap.pop() {
        if settled[v] || d > sp.dist[v] {
            continue;
        }
        settled[v] = true;
        sp.order.push(v);

        for &(w, e) in &adj[v] {
            if settled[w] {
                continue;
            }
            let alt = d + weights[e];
            if sp.dist[w].is_finite() && same_length(alt, sp.dist[w]) {
                sp.sigma[w] += sp.sigma[v];
                sp.preds[w].push((v, e));
            } else if alt < sp.dist[w] {
                sp.dist[w] = alt;
                sp.sigma[w] = sp.sigma[v];
                sp.preds[w].clear();
                sp.preds[w].push((v, e));
                heap.push(Reverse((Dist(alt), w)));
            }
        }
    }
    sp
}

fn weights_of(gt: &TriangulationGraph) -> Vec<f64> {
    gt.edges().iter().map(|e| e.weight).collect()
}

/// Weighted edge betweenness (Brandes), indexed like `gt.edges()`.
///
/// Every node is used as a source and each ordered `(s, t)` pair
/// contributes, so an undirected edge collects shortest-path traffic in both
/// directions.  Values are raw path counts, not normalised.
pub fn edge_betweenness(gt: &TriangulationGraph) -> Vec<f64> {
    let adj = gt.adjacency();
    let weights = weights_of(gt);
    let mut bw = vec![0.0; weights.len()];
    let mut delta = vec![0.0; adj.len()];

    for s in 0..adj.len() {
        let sp = shortest_paths(&adj, &weights, s);
        for &v in &sp.order {
            delta[v] = 0.0;
        }
        for &w in sp.order.iter().rev() {
            for &(v, e) in &sp.preds[w] {
                let share = sp.sigma[v] / sp.sigma[w] * (1.0 + delta[w]);
                bw[e] += share;
                delta[v] += share;
            }
        }
    }
    bw
}

/// Weighted closeness per node, indexed like `gt.nodes()`.
///
/// Computed over the nodes each node actually reaches: `reached / Σ dist`.
/// A node that reaches nothing scores `0`.
pub fn closeness(gt: &TriangulationGraph) -> Vec<f64> {
    let adj = gt.adjacency();
    let weights = weights_of(gt);

    (0..adj.len())
        .map(|s| {
            let sp = shortest_paths(&adj, &weights, s);
            let reached = sp.order.len().saturating_sub(1);
            let total: f64 = sp.order.iter().map(|&v| sp.dist[v]).sum();
            if reached == 0 || total <= 0.0 {
                0.0
            } else {
                reached as f64 / total
            }
        })
        .collect()
}

/// Quantile `q ∈ [0, 1]` with linear interpolation between closest ranks.
///
/// `None` for an empty input.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let h = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    Some(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}
