//! Centrality-driven pruning of the triangulation graph.
//!
//! Two families of pruning:
//!
//! - **single-shot quantile** (`betweenness`, `closeness`): score once, keep
//!   everything at or above the `(1 − prune_factor)` quantile.
//! - **iterative** (`iterative_betweenness`, `hybrid`): repeatedly recompute
//!   betweenness and remove the weakest unprotected edges in shrinking
//!   batches until the target edge count is reached.  Edges tagged
//!   `existing` are never removed and are added on top of the target.
//!
//! `hybrid` runs the single-shot betweenness pass first and then the
//! iterative pass on what is left.

use bg_core::{BatchMode, GrowthConfig, PruneMeasure};

use crate::centrality::{closeness, edge_betweenness, quantile};
use crate::triangulation::TriangulationGraph;

/// Betweenness assigned to protected edges during iterative pruning.
pub const PROTECTED_BETWEENNESS: f64 = f64::INFINITY;

// ── BatchSchedule ─────────────────────────────────────────────────────────────

/// Batch-size state machine for iterative pruning.
///
/// Starts at `sizes[0]` with a threshold of `0.5`.  Each iteration may step
/// once to the next (smaller) size, when the fraction of removals still
/// required has dropped below the threshold; the threshold then halves.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSchedule {
    sizes: [usize; 6],
    index: usize,
    threshold: f64,
}

impl BatchSchedule {
    pub fn new(mode: BatchMode) -> Self {
        Self { sizes: mode.sizes(), index: 0, threshold: 0.5 }
    }

    /// Batch size currently in effect.
    pub fn current(&self) -> usize {
        self.sizes[self.index]
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.sizes.len()
    }

    /// Advance given the fraction of the initial removal count that is
    /// still outstanding, and return the batch size for this iteration.
    pub fn update(&mut self, remaining_fraction: f64) -> usize {
        if remaining_fraction < self.threshold && !self.is_last() {
            self.threshold /= 2.0;
            self.index += 1;
        }
        self.current().max(1)
    }
}

// ── PruneReport ───────────────────────────────────────────────────────────────

/// What a pruning run did.
#[derive(Debug, Clone, PartialEq)]
pub struct PruneReport {
    pub measure: PruneMeasure,
    pub edges_before: usize,
    pub edges_after: usize,
    pub nodes_before: usize,
    pub nodes_after: usize,
    /// Quantile threshold of the single-shot pass, if one ran.
    pub threshold: Option<f64>,
    /// Iterations of the iterative pass.
    pub iterations: usize,
    /// The iterative pass stopped because only protected edges were left.
    pub exhausted: bool,
}

impl PruneReport {
    fn start(measure: PruneMeasure, gt: &TriangulationGraph) -> Self {
        Self {
            measure,
            edges_before: gt.edge_count(),
            edges_after: gt.edge_count(),
            nodes_before: gt.node_count(),
            nodes_after: gt.node_count(),
            threshold: None,
            iterations: 0,
            exhausted: false,
        }
    }

    pub fn removed_edges(&self) -> usize {
        self.edges_before - self.edges_after
    }
}

// ── CentralityPruner ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct CentralityPruner {
    measure: PruneMeasure,
    prune_factor: f64,
    batch_mode: BatchMode,
}

impl CentralityPruner {
    pub fn new(measure: PruneMeasure, prune_factor: f64) -> Self {
        Self { measure, prune_factor, batch_mode: BatchMode::Adaptive }
    }

    pub fn from_config(config: &GrowthConfig) -> Self {
        Self::new(config.prune_measure, config.prune_factor).with_batch_mode(config.batch_mode)
    }

    pub fn with_batch_mode(mut self, mode: BatchMode) -> Self {
        self.batch_mode = mode;
        self
    }

    /// Prune `gt` and hand it back.
    pub fn prune(&self, mut gt: TriangulationGraph) -> (TriangulationGraph, PruneReport) {
        let mut report = PruneReport::start(self.measure, &gt);
        if gt.edge_count() == 0 {
            return (gt, report);
        }

        if self.measure == PruneMeasure::Closeness {
            let (pruned, threshold) = self.prune_closeness(&gt);
            gt = pruned;
            report.threshold = threshold;
        }
        if self.measure.uses_quantile_betweenness() {
            report.threshold = self.prune_betweenness(&mut gt);
        }
        if self.measure.is_iterative() {
            self.prune_iterative(&mut gt, &mut report);
        }

        report.edges_after = gt.edge_count();
        report.nodes_after = gt.node_count();
        log::info!(
            "{} pruning kept {}/{} edges and {}/{} nodes",
            self.measure,
            report.edges_after,
            report.edges_before,
            report.nodes_after,
            report.nodes_before
        );
        (gt, report)
    }

    /// Keep edges at or above the betweenness quantile and record their
    /// score and line width.
    fn prune_betweenness(&self, gt: &mut TriangulationGraph) -> Option<f64> {
        let bw = edge_betweenness(gt);
        let threshold = quantile(&bw, 1.0 - self.prune_factor)?;

        for (edge, &score) in gt.edges_mut().iter_mut().zip(&bw) {
            edge.betweenness = Some(score);
            edge.width = Some((score + 1.0).sqrt() * 0.5);
        }
        let keep: Vec<bool> = bw.iter().map(|&b| b >= threshold).collect();
        let removed = gt.retain_edges(&keep);
        log::debug!("betweenness threshold {threshold:.4} removed {removed} edges");
        Some(threshold)
    }

    /// Induced subgraph on nodes at or above the closeness quantile.
    fn prune_closeness(&self, gt: &TriangulationGraph) -> (TriangulationGraph, Option<f64>) {
        let cc = closeness(gt);
        let Some(threshold) = quantile(&cc, 1.0 - self.prune_factor) else {
            return (gt.clone(), None);
        };

        let mut scored = gt.clone();
        for (node, &score) in scored.nodes_mut().iter_mut().zip(&cc) {
            node.closeness = Some(score);
        }
        let keep: Vec<bool> = cc.iter().map(|&c| c >= threshold).collect();
        log::debug!("closeness threshold {threshold:.6}");
        (scored.induced_subgraph(&keep), Some(threshold))
    }

    /// Target is `edges × prune_factor + existing`, both counted in `gt`.
    /// A batch never takes the graph below the target.
    fn prune_iterative(&self, gt: &mut TriangulationGraph, report: &mut PruneReport) {
        let start = gt.edge_count();
        let target = start as f64 * self.prune_factor + gt.existing_edge_count() as f64;
        let to_remove = start as f64 - target;
        let mut schedule = BatchSchedule::new(self.batch_mode);

        while gt.edge_count() as f64 > target {
            let excess = gt.edge_count() as f64 - target;
            let cap = excess.ceil() as usize;
            let k = schedule.update(excess / to_remove).min(cap);

            let mut bw = edge_betweenness(gt);
            for (score, edge) in bw.iter_mut().zip(gt.edges()) {
                if edge.existing {
                    *score = PROTECTED_BETWEENNESS;
                }
            }

            let mut doomed = lowest_unprotected(&bw, k);
            if doomed.is_empty() {
                report.exhausted = true;
                log::warn!(
                    "iterative pruning stopped at {} edges (target {target:.1}): only protected edges remain",
                    gt.edge_count()
                );
                break;
            }
            doomed.truncate(cap);

            let mut keep = vec![true; bw.len()];
            for &i in &doomed {
                keep[i] = false;
            }
            let removed = gt.retain_edges(&keep);
            report.iterations += 1;
            log::debug!(
                "iteration {}: batch {k}, removed {removed}, {} edges left",
                report.iterations,
                gt.edge_count()
            );
        }
    }
}

/// Indices of the `k` lowest finite scores, plus every further edge tied
/// with the last one taken.  Protected (infinite) scores are never chosen.
pub(crate) fn lowest_unprotected(scores: &[f64], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).filter(|&i| scores[i].is_finite()).collect();
    order.sort_by(|&x, &y| scores[x].total_cmp(&scores[y]).then(x.cmp(&y)));

    if order.len() <= k {
        return order;
    }
    let boundary = scores[order[k - 1]];
    let cut = k + order[k..].iter().take_while(|&&i| scores[i] == boundary).count();
    order.truncate(cut);
    order
}

