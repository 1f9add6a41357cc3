//! Shortest-path enumeration between all POI pairs.

use bg_core::{EdgeId, NodeId};
use bg_spatial::{Route, Router, SpatialError, WeightedNetwork};

use crate::{GrowthError, GrowthResult};

/// One routed POI pair, a candidate edge for the triangulation.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePair {
    pub a: NodeId,
    pub b: NodeId,
    /// Sum of discounted edge weights along `edges`.  Always `> 0`.
    pub cost: f64,
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeId>,
}

/// Per-source result before merging.
struct SourcePairs {
    pairs: Vec<CandidatePair>,
    /// Distinct POIs reachable from this source (zero-cost ones included).
    connected: usize,
    unreachable: usize,
}

/// Routes every unordered POI pair once and sorts the result by cost.
pub struct PairEnumerator<'a, R: Router> {
    network: &'a WeightedNetwork,
    router:  &'a R,
}

impl<'a, R: Router> PairEnumerator<'a, R> {
    pub fn new(network: &'a WeightedNetwork, router: &'a R) -> Self {
        Self { network, router }
    }

    /// Candidate pairs sorted ascending by cost.
    ///
    /// Only pairs `(pois[i], pois[j])` with `i < j` are routed.  Ties keep
    /// generation order (stable sort), so identical input always produces
    /// an identical list.  Repeated POIs are routed once.
    ///
    /// # Errors
    ///
    /// [`GrowthError::DisconnectedInput`] when two or more POIs were given
    /// and none of them reaches another; [`GrowthError::Spatial`] when a POI
    /// is not a node of the network.
    pub fn enumerate(&self, pois: &[NodeId]) -> GrowthResult<Vec<CandidatePair>> {
        let pois = dedup_in_order(pois);
        if pois.len() < 2 {
            return Ok(Vec::new());
        }

        let per_source = self.route_all_sources(&pois)?;

        let mut connected = 0;
        let mut unreachable = 0;
        let mut pairs = Vec::new();
        for source in per_source {
            connected += source.connected;
            unreachable += source.unreachable;
            pairs.extend(source.pairs);
        }

        if connected == 0 {
            return Err(GrowthError::DisconnectedInput { pois: pois.len() });
        }
        if unreachable > 0 {
            log::warn!("{unreachable} POI pairs have no connecting path and were dropped");
        }

        // Stable: equal costs keep generation order.
        pairs.sort_by(|x, y| x.cost.total_cmp(&y.cost));
        log::info!("enumerated {} candidate pairs over {} POIs", pairs.len(), pois.len());
        Ok(pairs)
    }

    #[cfg(not(feature = "parallel"))]
    fn route_all_sources(&self, pois: &[NodeId]) -> GrowthResult<Vec<SourcePairs>> {
        (0..pois.len()).map(|i| self.pairs_from(pois, i)).collect()
    }

    #[cfg(feature = "parallel")]
    fn route_all_sources(&self, pois: &[NodeId]) -> GrowthResult<Vec<SourcePairs>> {
        use rayon::prelude::*;

        // Indexed collect keeps source order.
        (0..pois.len())
            .into_par_iter()
            .map(|i| self.pairs_from(pois, i))
            .collect()
    }

    /// Route `pois[i]` to `pois[i..]` with a single search.
    fn pairs_from(&self, pois: &[NodeId], i: usize) -> GrowthResult<SourcePairs> {
        let source = pois[i];
        let targets = &pois[i..];
        let mut out = SourcePairs { pairs: Vec::new(), connected: 0, unreachable: 0 };

        for (result, &target) in self
            .router
            .routes_from(self.network, source, targets)
            .into_iter()
            .zip(targets)
        {
            match result {
                Ok(Route { nodes, edges, .. }) => {
                    if target == source {
                        continue;
                    }
                    out.connected += 1;
                    let cost: f64 = edges.iter().map(|&e| self.router.edge_cost(e)).sum();
                    if cost > 0.0 {
                        out.pairs.push(CandidatePair { a: source, b: target, cost, nodes, edges });
                    }
                }
                Err(SpatialError::NoPath { from, to }) => {
                    log::debug!("no path between POIs {from} and {to}");
                    out.unreachable += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(out)
    }
}

fn dedup_in_order(pois: &[NodeId]) -> Vec<NodeId> {
    let mut seen = rustc_hash::FxHashSet::default();
    pois.iter().copied().filter(|p| seen.insert(*p)).collect()
}
