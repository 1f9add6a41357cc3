//! Stage callbacks for progress reporting and intermediate inspection.

use crate::expand::{Expansion, FinalNetwork};
use crate::pairs::CandidatePair;
use crate::prune::PruneReport;
use crate::triangulation::TriangulationGraph;

/// Callbacks invoked by [`GrowthPipeline::run`][crate::GrowthPipeline::run]
/// after each stage.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: stage printer
///
/// ```rust,ignore
/// struct StagePrinter;
///
/// impl GrowthObserver for StagePrinter {
///     fn on_pruned(&mut self, _gt: &TriangulationGraph, report: &PruneReport) {
///         println!("kept {} of {} edges", report.edges_after, report.edges_before);
///     }
/// }
/// ```
pub trait GrowthObserver {
    /// Candidate pairs, sorted ascending by cost.
    fn on_pairs(&mut self, _pairs: &[CandidatePair]) {}

    /// The triangulation before pruning.
    fn on_triangulated(&mut self, _gt: &TriangulationGraph) {}

    /// The triangulation after pruning.
    fn on_pruned(&mut self, _gt: &TriangulationGraph, _report: &PruneReport) {}

    /// The expanded node set and the assembled network.
    fn on_expanded(&mut self, _expansion: &Expansion, _network: &FinalNetwork) {}
}

/// A [`GrowthObserver`] that does nothing.
pub struct NoopObserver;

impl GrowthObserver for NoopObserver {}
