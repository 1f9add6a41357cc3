//! Tests for bg-growth.
//!
//! Fixtures are hand-built street networks; property checks use a seeded
//! jittered grid.

use bg_core::{GrowthConfig, NodeId, Point, PruneMeasure};
use bg_spatial::{DiscountRouter, NetworkBuilder, WeightedNetwork};

use crate::{CandidatePair, PairEnumerator, PlanarTriangulator, TriangulationGraph};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Complete graph on the unit square, every edge length 1, every node a POI.
///
///   1:(0,1) ── 2:(1,1)
///     │    ╲ ╱   │
///     │    ╱ ╲   │
///   0:(0,0) ── 3:(1,0)
///
/// Edge ids: 0-1, 0-2, 0-3, 1-2, 1-3, 2-3.  `existing` lists edge ids to tag
/// as existing infrastructure.
fn square_network(existing: &[usize]) -> (WeightedNetwork, [NodeId; 4]) {
    let mut b = NetworkBuilder::new();
    let n = [
        b.add_node(10, Point::new(0.0, 0.0), true),
        b.add_node(11, Point::new(0.0, 1.0), true),
        b.add_node(12, Point::new(1.0, 1.0), true),
        b.add_node(13, Point::new(1.0, 0.0), true),
    ];
    let pairs = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];
    for (i, &(x, y)) in pairs.iter().enumerate() {
        b.add_edge(n[x], n[y], 1.0, existing.contains(&i));
    }
    (b.build(), n)
}

/// Two routes between POIs 0 and 4:
///
///   top row  0 ─ 1 ─ 2 ─ 4   (3 × 10, new)
///   detour   0 ─ 3 ─ 4       (25 + 10, existing)
fn detour_network() -> (WeightedNetwork, [NodeId; 5]) {
    let mut b = NetworkBuilder::new();
    let n0 = b.add_node(100, Point::new(0.0, 0.0), true);
    let n1 = b.add_node(101, Point::new(1.0, 0.0), false);
    let n2 = b.add_node(102, Point::new(2.0, 0.0), false);
    let n3 = b.add_node(103, Point::new(0.0, 1.0), false);
    let n4 = b.add_node(104, Point::new(2.0, 1.0), true);
    b.add_edge(n0, n1, 10.0, false);
    b.add_edge(n1, n2, 10.0, false);
    b.add_edge(n2, n4, 10.0, false);
    b.add_edge(n0, n3, 25.0, true);
    b.add_edge(n3, n4, 10.0, true);
    (b.build(), [n0, n1, n2, n3, n4])
}

/// `side × side` grid with jittered coordinates and Euclidean edge lengths;
/// `pois` random nodes flagged as POIs.
fn jittered_grid(side: usize, pois: usize, seed: u64) -> WeightedNetwork {
    use rand::rngs::SmallRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    let mut rng = SmallRng::seed_from_u64(seed);
    let mut b = NetworkBuilder::with_capacity(side * side, 2 * side * side);
    let mut ids = Vec::with_capacity(side * side);
    for row in 0..side {
        for col in 0..side {
            let pos = Point::new(
                col as f64 + rng.gen_range(-0.3..0.3),
                row as f64 + rng.gen_range(-0.3..0.3),
            );
            ids.push(b.add_node((row * side + col) as u64, pos, false));
        }
    }
    for row in 0..side {
        for col in 0..side {
            let here = ids[row * side + col];
            let mut link = |there: NodeId| {
                let len = b.node_pos(here).distance(b.node_pos(there));
                b.add_edge(here, there, len, false);
            };
            if col + 1 < side {
                link(ids[row * side + col + 1]);
            }
            if row + 1 < side {
                link(ids[(row + 1) * side + col]);
            }
        }
    }
    let mut shuffled = ids.clone();
    shuffled.shuffle(&mut rng);
    for &id in shuffled.iter().take(pois) {
        b.set_poi(id, true);
    }
    b.build()
}

/// GT over `pois` with hand-picked unit-cost edges (no routing involved).
fn hand_gt(network: &WeightedNetwork, pois: &[NodeId], links: &[(usize, usize)]) -> TriangulationGraph {
    let pairs: Vec<CandidatePair> = links
        .iter()
        .map(|&(x, y)| CandidatePair {
            a: pois[x],
            b: pois[y],
            cost: 1.0,
            nodes: vec![pois[x], pois[y]],
            edges: vec![],
        })
        .collect();
    let mut gt = TriangulationGraph::from_pois(network, pois).unwrap();
    PlanarTriangulator::new(network).triangulate(&mut gt, &pairs).unwrap();
    gt
}

/// Four POIs forming a bent path A(0,0) ─ B(1,0) ─ C(2,1) ─ D(3,0).
fn path_network() -> (WeightedNetwork, [NodeId; 4]) {
    let mut b = NetworkBuilder::new();
    let n = [
        b.add_node(1, Point::new(0.0, 0.0), true),
        b.add_node(2, Point::new(1.0, 0.0), true),
        b.add_node(3, Point::new(2.0, 1.0), true),
        b.add_node(4, Point::new(3.0, 0.0), true),
    ];
    b.add_edge(n[0], n[1], 1.0, false);
    b.add_edge(n[1], n[2], 1.0, false);
    b.add_edge(n[2], n[3], 1.0, false);
    (b.build(), n)
}

fn triangulated(network: &WeightedNetwork, route_factor: f64) -> TriangulationGraph {
    let pois = network.poi_nodes();
    let router = DiscountRouter::new(network, route_factor);
    let pairs = PairEnumerator::new(network, &router).enumerate(&pois).unwrap();
    let mut gt = TriangulationGraph::from_pois(network, &pois).unwrap();
    PlanarTriangulator::new(network).triangulate(&mut gt, &pairs).unwrap();
    gt
}

fn config(measure: PruneMeasure, prune_factor: f64) -> GrowthConfig {
    GrowthConfig { prune_measure: measure, prune_factor, ..GrowthConfig::default() }
}

// ── Geometry ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod geometry {
    use bg_core::Point;
    use crate::{Segment, ccw, segments_intersect};

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn ccw_orientation() {
        assert!(ccw(p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)));
        assert!(!ccw(p(0.0, 0.0), p(1.0, 1.0), p(1.0, 0.0)));
        // Collinear is not a strict turn.
        assert!(!ccw(p(0.0, 0.0), p(1.0, 1.0), p(2.0, 2.0)));
    }

    #[test]
    fn crossing_diagonals_intersect() {
        assert!(segments_intersect(p(0.0, 0.0), p(1.0, 1.0), p(0.0, 1.0), p(1.0, 0.0)));
    }

    #[test]
    fn shared_endpoint_is_not_an_intersection() {
        assert!(!segments_intersect(p(0.0, 0.0), p(1.0, 1.0), p(1.0, 1.0), p(2.0, 0.0)));
        assert!(!segments_intersect(p(0.0, 0.0), p(1.0, 1.0), p(0.0, 0.0), p(1.0, 0.0)));
    }

    #[test]
    fn disjoint_segments() {
        assert!(!segments_intersect(p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0), p(1.0, 1.0)));
        // T-junction short of the other segment.
        assert!(!segments_intersect(p(0.0, 0.0), p(2.0, 0.0), p(1.0, 0.5), p(1.0, 2.0)));
    }

    #[test]
    fn segment_envelope_covers_both_ends() {
        use rstar::RTreeObject;
        let env = Segment::new(p(3.0, -1.0), p(-2.0, 4.0)).envelope();
        assert_eq!(env.lower(), [-2.0, -1.0]);
        assert_eq!(env.upper(), [3.0, 4.0]);
    }
}

// ── Pair enumeration ──────────────────────────────────────────────────────────

#[cfg(test)]
mod pairs {
    use bg_core::{NodeId, Point};
    use bg_spatial::{DiscountRouter, NetworkBuilder};
    use crate::{GrowthError, PairEnumerator};
    use super::{detour_network, init_logger, square_network};

    #[test]
    fn one_candidate_per_unordered_pair() {
        init_logger();
        let (net, n) = square_network(&[]);
        let router = DiscountRouter::new(&net, 0.0);
        let pairs = PairEnumerator::new(&net, &router).enumerate(&n).unwrap();
        assert_eq!(pairs.len(), 6);
        // Equal costs keep generation order: i < j, by i then j.
        let order: Vec<_> = pairs.iter().map(|p| (p.a, p.b)).collect();
        assert_eq!(
            order,
            vec![(n[0], n[1]), (n[0], n[2]), (n[0], n[3]), (n[1], n[2]), (n[1], n[3]), (n[2], n[3])]
        );
    }

    #[test]
    fn sorted_by_cost_and_summed_over_edges() {
        let mut b = NetworkBuilder::new();
        let a = b.add_node(1, Point::new(0.0, 0.0), true);
        let m = b.add_node(2, Point::new(1.0, 0.0), false);
        let c = b.add_node(3, Point::new(2.0, 0.0), true);
        let d = b.add_node(4, Point::new(2.0, 1.0), true);
        b.add_edge(a, m, 4.0, false);
        b.add_edge(m, c, 4.0, false);
        b.add_edge(c, d, 1.0, false);
        let net = b.build();

        let router = DiscountRouter::new(&net, 0.0);
        let pairs = PairEnumerator::new(&net, &router).enumerate(&[a, c, d]).unwrap();
        let costs: Vec<f64> = pairs.iter().map(|p| p.cost).collect();
        assert_eq!(costs, vec![1.0, 8.0, 9.0]);
        assert_eq!((pairs[2].a, pairs[2].b), (a, d));
        assert_eq!(pairs[2].nodes, vec![a, m, c, d]);
        assert_eq!(pairs[2].edges.len(), 3);
    }

    #[test]
    fn route_factor_discounts_existing_edges() {
        let (net, n) = detour_network();
        let plain = DiscountRouter::new(&net, 0.0);
        let pairs = PairEnumerator::new(&net, &plain).enumerate(&[n[0], n[4]]).unwrap();
        assert_eq!(pairs[0].cost, 30.0);
        assert_eq!(pairs[0].nodes, vec![n[0], n[1], n[2], n[4]]);

        let discounted = DiscountRouter::new(&net, 0.5);
        let pairs = PairEnumerator::new(&net, &discounted).enumerate(&[n[0], n[4]]).unwrap();
        assert_eq!(pairs[0].cost, 17.5);
        assert_eq!(pairs[0].nodes, vec![n[0], n[3], n[4]]);
    }

    #[test]
    fn duplicate_pois_are_routed_once() {
        let (net, n) = square_network(&[]);
        let router = DiscountRouter::new(&net, 0.0);
        let pairs = PairEnumerator::new(&net, &router)
            .enumerate(&[n[0], n[1], n[0], n[1]])
            .unwrap();
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn zero_cost_pairs_are_dropped() {
        let mut b = NetworkBuilder::new();
        let a = b.add_node(1, Point::new(0.0, 0.0), true);
        let z = b.add_node(2, Point::new(0.0, 0.0), true);
        let c = b.add_node(3, Point::new(1.0, 0.0), true);
        b.add_edge(a, z, 0.0, false);
        b.add_edge(z, c, 2.0, false);
        let net = b.build();

        let router = DiscountRouter::new(&net, 0.0);
        let pairs = PairEnumerator::new(&net, &router).enumerate(&[a, z, c]).unwrap();
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|p| p.cost > 0.0));
    }

    #[test]
    fn fully_disconnected_pois_error() {
        init_logger();
        let mut b = NetworkBuilder::new();
        let a = b.add_node(1, Point::new(0.0, 0.0), true);
        let c = b.add_node(2, Point::new(1.0, 0.0), true);
        let net = b.build();

        let router = DiscountRouter::new(&net, 0.0);
        let err = PairEnumerator::new(&net, &router).enumerate(&[a, c]).unwrap_err();
        assert!(matches!(err, GrowthError::DisconnectedInput { pois: 2 }));
    }

    #[test]
    fn partially_disconnected_pois_drop_pairs() {
        let mut b = NetworkBuilder::new();
        let a = b.add_node(1, Point::new(0.0, 0.0), true);
        let c = b.add_node(2, Point::new(1.0, 0.0), true);
        let lonely = b.add_node(3, Point::new(5.0, 5.0), true);
        b.add_edge(a, c, 1.0, false);
        let net = b.build();

        let router = DiscountRouter::new(&net, 0.0);
        let pairs = PairEnumerator::new(&net, &router).enumerate(&[a, c, lonely]).unwrap();
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn fewer_than_two_pois_is_empty() {
        let (net, n) = square_network(&[]);
        let router = DiscountRouter::new(&net, 0.0);
        let e = PairEnumerator::new(&net, &router);
        assert!(e.enumerate(&[]).unwrap().is_empty());
        assert!(e.enumerate(&[n[2]]).unwrap().is_empty());
    }

    #[test]
    fn unknown_poi_is_a_spatial_error() {
        let (net, n) = square_network(&[]);
        let router = DiscountRouter::new(&net, 0.0);
        let err = PairEnumerator::new(&net, &router).enumerate(&[n[0], NodeId(42)]).unwrap_err();
        assert!(matches!(err, GrowthError::Spatial(_)));
    }
}

// ── Triangulation ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod triangulation {
    use bg_core::NodeId;
    use bg_spatial::SpatialError;
    use crate::{CandidatePair, GrowthError, PlanarTriangulator, TriangulationGraph};
    use super::{init_logger, jittered_grid, square_network, triangulated};

    #[test]
    fn square_keeps_exactly_one_diagonal() {
        init_logger();
        let (net, n) = square_network(&[]);
        let gt = triangulated(&net, 0.0);
        assert_eq!(gt.node_count(), 4);
        assert_eq!(gt.edge_count(), 5);

        let has = |x: NodeId, y: NodeId| {
            gt.edges().iter().any(|e| (e.a, e.b) == (x, y) || (e.a, e.b) == (y, x))
        };
        // (0,0)-(1,1) is generated first and wins; (0,1)-(1,0) crosses it.
        assert!(has(n[0], n[2]));
        assert!(!has(n[1], n[3]));
        assert!(gt.edges().iter().all(|e| e.weight == 1.0));
    }

    #[test]
    fn existing_flag_follows_direct_existing_edge() {
        let (net, n) = square_network(&[0]);
        let gt = triangulated(&net, 0.0);
        assert_eq!(gt.existing_edge_count(), 1);
        let e = gt.edges().iter().find(|e| e.existing).unwrap();
        assert_eq!((e.a, e.b), (n[0], n[1]));
    }

    #[test]
    fn random_triangulations_are_planar() {
        for seed in 0..5 {
            let net = jittered_grid(6, 12, seed);
            let gt = triangulated(&net, 0.0);
            assert!(gt.edge_count() > 0);

            let edges = gt.edges();
            for (i, x) in edges.iter().enumerate() {
                for y in &edges[i + 1..] {
                    if x.a == y.a || x.a == y.b || x.b == y.a || x.b == y.b {
                        continue;
                    }
                    let sx = gt.segment(x).unwrap();
                    let sy = gt.segment(y).unwrap();
                    assert!(!sx.properly_intersects(&sy), "seed {seed}: {x:?} crosses {y:?}");
                }
            }
        }
    }

    #[test]
    fn triangulation_is_deterministic() {
        let net = jittered_grid(7, 15, 99);
        assert_eq!(triangulated(&net, 0.3), triangulated(&net, 0.3));
    }

    #[test]
    fn unknown_endpoint_is_an_invariant_violation() {
        let (net, n) = square_network(&[]);
        let mut gt = TriangulationGraph::from_pois(&net, &[n[0], n[1]]).unwrap();
        let pair = CandidatePair { a: n[0], b: n[2], cost: 1.0, nodes: vec![], edges: vec![] };
        let err = PlanarTriangulator::new(&net).triangulate(&mut gt, &[pair]).unwrap_err();
        assert!(matches!(err, GrowthError::InvariantViolation { node } if node == n[2]));
    }

    #[test]
    fn poi_outside_network_is_rejected() {
        let (net, n) = square_network(&[]);
        let err = TriangulationGraph::from_pois(&net, &[n[0], NodeId(77)]).unwrap_err();
        assert!(matches!(
            err,
            GrowthError::Spatial(SpatialError::NodeNotFound(NodeId(77)))
        ));
    }

    #[test]
    fn repeated_pois_become_one_node() {
        let (net, n) = square_network(&[]);
        let gt = TriangulationGraph::from_pois(&net, &[n[3], n[1], n[3]]).unwrap();
        assert_eq!(gt.node_count(), 2);
        assert_eq!(gt.local_index(n[3]), Some(0));
        assert_eq!(gt.local_index(n[1]), Some(1));
        assert_eq!(gt.edge_count(), 0);
    }
}

// ── Centrality ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod centrality {
    use crate::{closeness, edge_betweenness, quantile};
    use super::{hand_gt, path_network, square_network, triangulated};

    #[test]
    fn path_betweenness_counts_ordered_pairs() {
        let (net, n) = path_network();
        let gt = hand_gt(&net, &n, &[(0, 1), (1, 2), (2, 3)]);
        assert_eq!(edge_betweenness(&gt), vec![6.0, 8.0, 6.0]);
    }

    #[test]
    fn equal_paths_split_betweenness() {
        // Square minus one diagonal: 1 and 3 are joined by two paths of
        // length 2, one through 0 and one through 2.
        let (net, _) = square_network(&[]);
        let gt = triangulated(&net, 0.0);
        let bw = edge_betweenness(&gt);
        // Edge order: 0-1, 0-2 (diagonal), 0-3, 1-2, 2-3.
        assert_eq!(bw, vec![3.0, 2.0, 3.0, 3.0, 3.0]);
    }

    #[test]
    fn path_closeness() {
        let (net, n) = path_network();
        let gt = hand_gt(&net, &n, &[(0, 1), (1, 2), (2, 3)]);
        assert_eq!(closeness(&gt), vec![0.5, 0.75, 0.75, 0.5]);
    }

    #[test]
    fn isolated_node_closeness_is_zero() {
        let (net, n) = path_network();
        let gt = hand_gt(&net, &n, &[(0, 1)]);
        let cc = closeness(&gt);
        assert_eq!(cc[0], 1.0);
        assert_eq!(cc[2], 0.0);
        assert_eq!(cc[3], 0.0);
    }

    #[test]
    fn linear_quantile() {
        let v = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(quantile(&v, 0.0), Some(1.0));
        assert_eq!(quantile(&v, 1.0), Some(4.0));
        assert_eq!(quantile(&v, 0.5), Some(2.5));
        assert_eq!(quantile(&[7.0], 0.3), Some(7.0));
        assert_eq!(quantile(&[], 0.5), None);
    }
}

// ── Pruning ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod prune {
    use bg_core::{BatchMode, PruneMeasure};
    use crate::prune::lowest_unprotected;
    use crate::{BatchSchedule, CentralityPruner};
    use super::{hand_gt, init_logger, path_network, square_network, triangulated};

    #[test]
    fn factor_one_keeps_everything() {
        let (net, _) = square_network(&[]);
        for measure in [PruneMeasure::Betweenness, PruneMeasure::Closeness] {
            let gt = triangulated(&net, 0.0);
            let (pruned, report) = CentralityPruner::new(measure, 1.0).prune(gt);
            assert_eq!(pruned.edge_count(), 5, "{measure}");
            assert_eq!(pruned.node_count(), 4, "{measure}");
            assert_eq!(report.removed_edges(), 0);
        }
    }

    #[test]
    fn tiny_factor_keeps_the_single_top_edge() {
        let (net, n) = path_network();
        let gt = hand_gt(&net, &n, &[(0, 1), (1, 2), (2, 3)]);
        let (pruned, report) = CentralityPruner::new(PruneMeasure::Betweenness, 1e-9).prune(gt);
        assert_eq!(pruned.edge_count(), 1);
        let kept = &pruned.edges()[0];
        assert_eq!((kept.a, kept.b), (n[1], n[2]));
        assert_eq!(kept.betweenness, Some(8.0));
        assert_eq!(kept.width, Some(1.5));
        assert_eq!(report.edges_before, 3);
        // GT nodes are kept in betweenness mode.
        assert_eq!(pruned.node_count(), 4);
    }

    #[test]
    fn betweenness_records_scores_on_kept_edges() {
        let (net, _) = square_network(&[]);
        let gt = triangulated(&net, 0.0);
        let (pruned, report) = CentralityPruner::new(PruneMeasure::Betweenness, 0.5).prune(gt);
        // Diagonal (bw 2) falls below the median of [2, 3, 3, 3, 3].
        assert_eq!(report.threshold, Some(3.0));
        assert_eq!(pruned.edge_count(), 4);
        for e in pruned.edges() {
            assert_eq!(e.betweenness, Some(3.0));
            assert_eq!(e.width, Some(1.0));
        }
    }

    #[test]
    fn closeness_keeps_induced_subgraph() {
        let (net, n) = path_network();
        let gt = hand_gt(&net, &n, &[(0, 1), (1, 2), (2, 3)]);
        let (pruned, report) = CentralityPruner::new(PruneMeasure::Closeness, 0.5).prune(gt);
        assert_eq!(report.threshold, Some(0.625));
        assert_eq!(pruned.node_count(), 2);
        assert!(pruned.contains_node(n[1]) && pruned.contains_node(n[2]));
        assert_eq!(pruned.edge_count(), 1);
        assert!(pruned.nodes().iter().all(|v| v.closeness == Some(0.75)));
    }

    #[test]
    fn empty_graph_is_a_no_op() {
        let (net, n) = path_network();
        let gt = hand_gt(&net, &n, &[]);
        for measure in [
            PruneMeasure::Betweenness,
            PruneMeasure::Closeness,
            PruneMeasure::IterativeBetweenness,
            PruneMeasure::Hybrid,
        ] {
            let (pruned, report) = CentralityPruner::new(measure, 0.3).prune(gt.clone());
            assert_eq!(pruned, gt);
            assert_eq!(report.iterations, 0);
        }
    }

    #[test]
    fn iterative_protects_existing_edges() {
        init_logger();
        // 5 × 0.2 + 1 existing = 2: the diagonal goes first, then the two
        // lowest-index sides of the remaining tie.
        let (net, n) = square_network(&[0]);
        let gt = triangulated(&net, 0.0);
        let (pruned, report) =
            CentralityPruner::new(PruneMeasure::IterativeBetweenness, 0.2).prune(gt);
        assert_eq!(pruned.edge_count(), 2);
        let ends: Vec<_> = pruned.edges().iter().map(|e| (e.a, e.b, e.existing)).collect();
        assert_eq!(ends, vec![(n[0], n[1], true), (n[2], n[3], false)]);
        assert!(!report.exhausted);
        assert_eq!(report.iterations, 1);
    }

    #[test]
    fn iterative_keeps_every_protected_edge() {
        let (net, _) = square_network(&[0, 5]);
        let gt = triangulated(&net, 0.0);
        assert_eq!(gt.existing_edge_count(), 2);
        let (pruned, report) =
            CentralityPruner::new(PruneMeasure::IterativeBetweenness, 0.2).prune(gt);
        // 5 × 0.2 + 2 = 3.
        assert_eq!(pruned.edge_count(), 3);
        assert_eq!(pruned.existing_edge_count(), 2);
        assert!(!report.exhausted);
    }

    #[test]
    fn iterative_target_counts_existing_infrastructure() {
        // 5 × 0.6 + 1 existing = 4: one removal, the weak diagonal.
        let (net, n) = square_network(&[0]);
        let gt = triangulated(&net, 0.0);
        let (pruned, _) = CentralityPruner::new(PruneMeasure::IterativeBetweenness, 0.6)
            .with_batch_mode(BatchMode::Fixed(1))
            .prune(gt);
        assert_eq!(pruned.edge_count(), 4);
        assert!(!pruned.edges().iter().any(|e| (e.a, e.b) == (n[0], n[2])));
    }

    #[test]
    fn adaptive_batches_stop_at_the_target() {
        init_logger();
        let net = super::jittered_grid(10, 30, 7);
        for factor in [0.9, 0.5, 0.2] {
            let gt = triangulated(&net, 0.0);
            let before = gt.edge_count();
            assert!(before > 40, "first batch must not cover the graph, got {before}");
            let target = before as f64 * factor;

            let (pruned, report) =
                CentralityPruner::new(PruneMeasure::IterativeBetweenness, factor).prune(gt);
            let after = pruned.edge_count() as f64;
            assert!(after <= target && after > target - 1.0, "{factor}: {after} vs {target}");
            assert!(pruned.edge_count() > 0);
            assert!(!report.exhausted);
        }
    }

    #[test]
    fn hybrid_runs_quantile_then_iterative() {
        // Quantile pass drops the diagonal; the 4-cycle left has equal
        // betweenness, so 4 × 0.2 + 1 = 1.8 leaves only the protected side.
        let (net, n) = square_network(&[0]);
        let gt = triangulated(&net, 0.0);
        let (pruned, report) = CentralityPruner::new(PruneMeasure::Hybrid, 0.2).prune(gt);
        assert_eq!(report.threshold, Some(3.0));
        assert!(!report.exhausted);
        assert_eq!(report.iterations, 1);
        assert_eq!(pruned.edge_count(), 1);
        let kept = &pruned.edges()[0];
        assert_eq!((kept.a, kept.b), (n[0], n[1]));
        assert_eq!(kept.betweenness, Some(3.0));
        assert_eq!(kept.width, Some(1.0));
    }

    #[test]
    fn pruning_never_adds_edges() {
        let net = super::jittered_grid(6, 14, 5);
        for measure in [
            PruneMeasure::Betweenness,
            PruneMeasure::Closeness,
            PruneMeasure::IterativeBetweenness,
            PruneMeasure::Hybrid,
        ] {
            let gt = triangulated(&net, 0.0);
            let before = gt.edge_count();
            let (pruned, report) = CentralityPruner::new(measure, 0.4).prune(gt);
            assert!(pruned.edge_count() <= before, "{measure}");
            assert_eq!(report.edges_after, pruned.edge_count());
        }
    }

    #[test]
    fn adaptive_schedule_steps_once_per_update() {
        let mut s = BatchSchedule::new(BatchMode::Adaptive);
        assert_eq!(s.update(1.0), 40);
        assert_eq!(s.update(0.4), 20);
        assert_eq!(s.threshold(), 0.25);
        assert_eq!(s.update(0.4), 20);
        assert_eq!(s.update(0.2), 10);
        assert_eq!(s.update(0.0), 5);
        assert_eq!(s.update(0.0), 2);
        assert_eq!(s.update(0.0), 1);
        assert!(s.is_last());
        assert_eq!(s.update(0.0), 1);
    }

    #[test]
    fn fixed_schedule_never_changes_size() {
        let mut s = BatchSchedule::new(BatchMode::Fixed(3));
        for f in [1.0, 0.3, 0.1, 0.0, 0.0, 0.0, 0.0] {
            assert_eq!(s.update(f), 3);
        }
    }

    #[test]
    fn lowest_batch_includes_boundary_ties() {
        let scores = [5.0, 1.0, 3.0, 1.0, f64::INFINITY, 3.0];
        assert_eq!(lowest_unprotected(&scores, 1), vec![1, 3]);
        assert_eq!(lowest_unprotected(&scores, 3), vec![1, 3, 2, 5]);
        assert_eq!(lowest_unprotected(&scores, 10), vec![1, 3, 2, 5, 0]);
        assert!(lowest_unprotected(&[f64::INFINITY; 3], 2).is_empty());
    }
}

// ── Expansion ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod expand {
    use bg_spatial::DiscountRouter;
    use crate::{FinalNetwork, PathExpander, Provenance};
    use super::{detour_network, square_network, triangulated};

    #[test]
    fn shared_segments_are_counted_once() {
        let (net, _) = square_network(&[]);
        let gt = triangulated(&net, 0.0);
        let router = DiscountRouter::new(&net, 0.0);
        let expansion = PathExpander::new(&net, &router).expand(&gt).unwrap();
        assert_eq!(expansion.routed, 5);
        assert_eq!(expansion.path_node_total, 10);
        assert_eq!(expansion.nodes.len(), 4);
        assert!(expansion.nodes.len() <= expansion.path_node_total);
        assert_eq!(expansion.shared_nodes(), 6);
    }

    #[test]
    fn final_network_is_the_induced_subgraph() {
        let (net, _) = square_network(&[]);
        let gt = triangulated(&net, 0.0);
        let router = DiscountRouter::new(&net, 0.0);
        let expansion = PathExpander::new(&net, &router).expand(&gt).unwrap();
        let result = FinalNetwork::assemble(&net, &expansion, false);
        // Both diagonals are in the base graph, so both are induced.
        assert_eq!(result.edge_count(), 6);
        assert_eq!(result.node_count(), 4);
        assert!(result.edges.iter().all(|e| e.provenance.generated && !e.provenance.existing));
    }

    #[test]
    fn provenance_tags() {
        assert_eq!(Provenance { existing: true, generated: true }.as_str(), "both");
        assert_eq!(Provenance { existing: true, generated: false }.as_str(), "existing");
        assert_eq!(Provenance { existing: false, generated: true }.as_str(), "generated");
    }

    #[test]
    fn existing_infrastructure_is_merged_in() {
        let (net, [n0, n1, n2, n3, n4]) = detour_network();
        let gt = triangulated(&net, 0.0);
        let router = DiscountRouter::new(&net, 0.0);
        let expansion = PathExpander::new(&net, &router).expand(&gt).unwrap();
        let result = FinalNetwork::assemble(&net, &expansion, false);

        assert_eq!(result.nodes, vec![n0, n1, n2, n3, n4]);
        assert_eq!(result.generated_edges().count(), 3);
        assert_eq!(result.existing_edges().count(), 2);
        assert!(result.existing_edges().all(|e| !e.provenance.generated));
        assert_eq!(result.new_length(), 30.0);
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod pipeline {
    use bg_core::{GrowthConfig, NodeId, Point, PruneMeasure};
    use bg_spatial::{GraphData, NetworkBuilder};
    use crate::{
        CandidatePair, Expansion, FinalNetwork, GrowthError, GrowthObserver, GrowthPipeline,
        NoopObserver, PruneReport, TriangulationGraph, grow_network,
    };
    use super::{config, detour_network, init_logger, jittered_grid, square_network};

    #[test]
    fn empty_poi_set_gives_empty_network() {
        let (net, _) = square_network(&[]);
        let out = GrowthPipeline::new(GrowthConfig::default())
            .run(&net, &[], &mut NoopObserver)
            .unwrap();
        assert!(out.network.is_empty());
        assert_eq!(out.pairs, 0);
        assert_eq!(out.triangulation.edge_count(), 0);
    }

    #[test]
    fn disconnected_pois_give_empty_network() {
        init_logger();
        let mut b = NetworkBuilder::new();
        let a = b.add_node(1, Point::new(0.0, 0.0), true);
        let c = b.add_node(2, Point::new(3.0, 0.0), true);
        let net = b.build();
        let out = GrowthPipeline::new(GrowthConfig::default())
            .run(&net, &[a, c], &mut NoopObserver)
            .unwrap();
        assert!(out.network.is_empty());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let (net, n) = square_network(&[]);
        let err = GrowthPipeline::new(config(PruneMeasure::Betweenness, 0.0))
            .run(&net, &n, &mut NoopObserver)
            .unwrap_err();
        assert!(matches!(err, GrowthError::Config(_)));
    }

    #[test]
    fn route_factor_pulls_routes_onto_existing_edges() {
        let (net, [n0, _, _, n3, n4]) = detour_network();

        let plain = grow_network(&net, &GrowthConfig::default()).unwrap();
        assert_eq!(plain.edge_count(), 5);

        let cfg = GrowthConfig { route_factor: 0.5, ..GrowthConfig::default() };
        let reuse = grow_network(&net, &cfg).unwrap();
        assert_eq!(reuse.nodes, vec![n0, n3, n4]);
        assert_eq!(reuse.edge_count(), 2);
        assert!(reuse.edges.iter().all(|e| e.provenance.existing && e.provenance.generated));
        assert_eq!(reuse.new_length(), 0.0);
    }

    #[test]
    fn iterative_mode_drops_isolated_nodes() {
        let mut b = NetworkBuilder::new();
        let n = [
            b.add_node(10, Point::new(0.0, 0.0), true),
            b.add_node(11, Point::new(0.0, 1.0), true),
            b.add_node(12, Point::new(1.0, 1.0), true),
        ];
        b.add_edge(n[0], n[1], 1.0, false);
        b.add_edge(n[1], n[2], 1.0, false);
        let mut existing = GraphData::new();
        existing.add_node(900, 5.0, 5.0, false);
        b.merge_existing(&existing).unwrap();
        let net = b.build();
        let island = net.node_by_external(900).unwrap();

        let keep = grow_network(&net, &config(PruneMeasure::Betweenness, 1.0)).unwrap();
        assert!(keep.contains_node(island));

        let drop = grow_network(&net, &config(PruneMeasure::IterativeBetweenness, 1.0)).unwrap();
        assert!(!drop.contains_node(island));
        assert_eq!(drop.node_count(), 3);
    }

    /// 8 × 8 jittered grid with existing lanes along row 3 and column 3
    /// (14 segments) and ten POIs, none of them on a lane.
    fn laned_grid() -> bg_spatial::WeightedNetwork {
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};

        const SIDE: usize = 8;
        const LANE: usize = 3;
        let mut rng = SmallRng::seed_from_u64(11);
        let mut b = NetworkBuilder::with_capacity(SIDE * SIDE, 2 * SIDE * SIDE);
        let mut ids = Vec::with_capacity(SIDE * SIDE);
        for row in 0..SIDE {
            for col in 0..SIDE {
                let pos = Point::new(
                    col as f64 + rng.gen_range(-0.3..0.3),
                    row as f64 + rng.gen_range(-0.3..0.3),
                );
                ids.push(b.add_node((row * SIDE + col) as u64, pos, false));
            }
        }
        for row in 0..SIDE {
            for col in 0..SIDE {
                let here = ids[row * SIDE + col];
                if col + 1 < SIDE {
                    let there = ids[row * SIDE + col + 1];
                    let len = b.node_pos(here).distance(b.node_pos(there));
                    b.add_edge(here, there, len, row == LANE);
                }
                if row + 1 < SIDE {
                    let there = ids[(row + 1) * SIDE + col];
                    let len = b.node_pos(here).distance(b.node_pos(there));
                    b.add_edge(here, there, len, col == LANE);
                }
            }
        }
        let pois = [(0, 0), (0, 5), (1, 2), (2, 7), (4, 1), (5, 5), (6, 2), (7, 0), (7, 6), (1, 6)];
        for (row, col) in pois {
            b.set_poi(ids[row * SIDE + col], true);
        }
        b.build()
    }

    #[test]
    fn iterative_mode_keeps_generated_routes_beside_existing_lanes() {
        init_logger();
        let net = laned_grid();
        assert_eq!(net.existing_edge_count(), 14);
        let pois = net.poi_nodes();
        let cfg = GrowthConfig {
            route_factor: 0.3,
            ..config(PruneMeasure::IterativeBetweenness, 0.2)
        };
        let out = GrowthPipeline::new(cfg).run(&net, &pois, &mut NoopObserver).unwrap();

        // Lanes never touch a POI, so no triangulation edge is protected.
        assert_eq!(out.triangulation.existing_edge_count(), 0);
        let target = out.prune.edges_before as f64 * 0.2;
        let kept = out.prune.edges_after as f64;
        assert!(kept <= target && kept > target - 1.0, "{kept} vs {target}");
        assert!(out.prune.edges_after > 0);

        assert_eq!(out.network.existing_edges().count(), 14);
        assert!(out.network.edges.iter().any(|e| e.provenance.generated && !e.provenance.existing));
        assert!(out.network.new_length() > 0.0);
    }

    #[test]
    fn runs_are_reproducible() {
        let net = jittered_grid(8, 16, 7);
        let pois = net.poi_nodes();
        for measure in [
            PruneMeasure::Betweenness,
            PruneMeasure::Closeness,
            PruneMeasure::IterativeBetweenness,
            PruneMeasure::Hybrid,
        ] {
            let p = GrowthPipeline::new(config(measure, 0.5));
            let first = p.run(&net, &pois, &mut NoopObserver).unwrap();
            let second = p.run(&net, &pois, &mut NoopObserver).unwrap();
            assert_eq!(first.network, second.network, "{measure}");
            assert_eq!(first.triangulation, second.triangulation, "{measure}");
        }
    }

    #[derive(Default)]
    struct Recorder {
        pairs: usize,
        triangulated: usize,
        pruned: usize,
        expanded: usize,
    }

    impl GrowthObserver for Recorder {
        fn on_pairs(&mut self, pairs: &[CandidatePair]) {
            self.pairs = pairs.len();
        }
        fn on_triangulated(&mut self, gt: &TriangulationGraph) {
            self.triangulated = gt.edge_count();
        }
        fn on_pruned(&mut self, _gt: &TriangulationGraph, report: &PruneReport) {
            self.pruned = report.edges_after;
        }
        fn on_expanded(&mut self, _expansion: &Expansion, network: &FinalNetwork) {
            self.expanded = network.edge_count();
        }
    }

    #[test]
    fn observer_sees_every_stage() {
        let (net, n) = square_network(&[]);
        let mut rec = Recorder::default();
        let out = GrowthPipeline::new(config(PruneMeasure::Betweenness, 0.5))
            .run(&net, &n, &mut rec)
            .unwrap();
        assert_eq!(rec.pairs, 6);
        assert_eq!(rec.triangulated, 5);
        assert_eq!(rec.pruned, 4);
        assert_eq!(rec.expanded, out.network.edge_count());
        assert_eq!(out.triangulated_edges, 5);
    }

    #[test]
    fn unknown_poi_aborts() {
        let (net, n) = square_network(&[]);
        let err = GrowthPipeline::new(GrowthConfig::default())
            .run(&net, &[n[0], NodeId(50)], &mut NoopObserver)
            .unwrap_err();
        assert!(matches!(err, GrowthError::Spatial(_)));
    }
}

// ── Export ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod export {
    use bg_core::GrowthConfig;
    use crate::{grow_network, write_final_csv, write_final_nodes_csv};
    use super::detour_network;

    #[test]
    fn edge_table_uses_external_ids() {
        let (net, _) = detour_network();
        let result = grow_network(&net, &GrowthConfig::default()).unwrap();
        let mut buf = Vec::new();
        write_final_csv(&mut buf, &net, &result).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "edge,u,v,length,existing,generated");
        assert_eq!(lines.len(), 1 + result.edge_count());
        assert_eq!(lines[1], "0,100,101,10,0,1");
        assert_eq!(lines[4], "3,100,103,25,1,0");
    }

    #[test]
    fn node_table_lists_every_node() {
        let (net, _) = detour_network();
        let result = grow_network(&net, &GrowthConfig::default()).unwrap();
        let mut buf = Vec::new();
        write_final_nodes_csv(&mut buf, &net, &result).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id,x,y,poi,existing");
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[1], "100,0,0,1,0");
    }
}
