//! End-to-end growth run: enumerate → triangulate → prune → expand.

use bg_core::{GrowthConfig, NodeId};
use bg_spatial::{DiscountRouter, WeightedNetwork};

use crate::expand::{Expansion, FinalNetwork, PathExpander};
use crate::observer::{GrowthObserver, NoopObserver};
use crate::pairs::PairEnumerator;
use crate::prune::{CentralityPruner, PruneReport};
use crate::triangulation::{PlanarTriangulator, TriangulationGraph};
use crate::{GrowthError, GrowthResult};

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct GrowthOutput {
    /// Number of candidate pairs fed to the triangulator.
    pub pairs: usize,
    /// Edges accepted by the triangulator, before pruning.
    pub triangulated_edges: usize,
    /// The triangulation after pruning.
    pub triangulation: TriangulationGraph,
    pub prune: PruneReport,
    pub expansion: Expansion,
    pub network: FinalNetwork,
}

/// Runs the four stages in order over a read-only base network.
///
/// # Example
///
/// ```rust,ignore
/// let config = GrowthConfig { prune_factor: 0.5, ..GrowthConfig::default() };
/// let pois = network.poi_nodes();
/// let out = GrowthPipeline::new(config).run(&network, &pois, &mut NoopObserver)?;
/// println!("{} generated edges", out.network.generated_edges().count());
/// ```
#[derive(Debug, Clone, Default)]
pub struct GrowthPipeline {
    config: GrowthConfig,
}

impl GrowthPipeline {
    pub fn new(config: GrowthConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GrowthConfig {
        &self.config
    }

    /// Grow a network connecting `pois`.
    ///
    /// A POI set with no connected pair yields a network holding only the
    /// existing infrastructure.
    ///
    /// # Errors
    ///
    /// - [`GrowthError::Config`] for an out-of-range configuration.
    /// - [`GrowthError::Spatial`] if a POI is not a node of `network`.
    /// - [`GrowthError::InvariantViolation`] if the triangulation and the
    ///   candidate pairs disagree on the POI set.
    pub fn run<O: GrowthObserver>(
        &self,
        network: &WeightedNetwork,
        pois: &[NodeId],
        observer: &mut O,
    ) -> GrowthResult<GrowthOutput> {
        self.config.validate()?;
        let route_factor = self.config.route_factor;

        // ── ① Candidate pairs ─────────────────────────────────────────────
        let mut gt = TriangulationGraph::from_pois(network, pois)?;
        let pair_router = DiscountRouter::new(network, route_factor);
        let pairs = match PairEnumerator::new(network, &pair_router).enumerate(pois) {
            Ok(pairs) => pairs,
            Err(GrowthError::DisconnectedInput { pois }) => {
                log::warn!("none of {pois} POIs are connected; nothing to grow");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        observer.on_pairs(&pairs);

        // ── ② Planar triangulation ────────────────────────────────────────
        let triangulated_edges = PlanarTriangulator::new(network).triangulate(&mut gt, &pairs)?;
        observer.on_triangulated(&gt);

        // ── ③ Pruning ─────────────────────────────────────────────────────
        let (gt, prune) = CentralityPruner::from_config(&self.config).prune(gt);
        observer.on_pruned(&gt, &prune);

        // ── ④ Expansion ───────────────────────────────────────────────────
        // Weights are derived afresh for this phase.
        let expand_router = DiscountRouter::new(network, route_factor);
        let expansion = PathExpander::new(network, &expand_router).expand(&gt)?;
        let result = FinalNetwork::assemble(network, &expansion, self.config.drop_isolated());
        observer.on_expanded(&expansion, &result);

        log::info!(
            "grown network: {} nodes, {} edges ({} generated, {} existing)",
            result.node_count(),
            result.edge_count(),
            result.generated_edges().count(),
            result.existing_edges().count()
        );

        Ok(GrowthOutput {
            pairs: pairs.len(),
            triangulated_edges,
            triangulation: gt,
            prune,
            expansion,
            network: result,
        })
    }
}

/// Grow a network over the POIs flagged on `network` itself.
pub fn grow_network(network: &WeightedNetwork, config: &GrowthConfig) -> GrowthResult<FinalNetwork> {
    let pois = network.poi_nodes();
    GrowthPipeline::new(config.clone())
        .run(network, &pois, &mut NoopObserver)
        .map(|out| out.network)
}
