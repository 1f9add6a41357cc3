//! Synthetic grid city used by the demo.
//!
//! A `SIDE × SIDE` street grid with 100 m blocks, two diagonal avenues that
//! cut across it, a handful of already-built bike lanes, and a set of POIs
//! given as free coordinates and snapped onto the street graph.

use anyhow::Result;

use bg_core::{NodeId, Point};
use bg_spatial::{GraphData, NetworkBuilder, WeightedNetwork, snap_pois};

pub const SIDE: u64 = 12;
const BLOCK: f64 = 100.0;

fn node_id(row: u64, col: u64) -> u64 {
    row * SIDE + col
}

fn block_pos(row: u64, col: u64) -> (f64, f64) {
    (col as f64 * BLOCK, row as f64 * BLOCK)
}

/// Streets: the full grid plus the two diagonals.
fn base_graph() -> GraphData {
    let mut g = GraphData::new();
    for row in 0..SIDE {
        for col in 0..SIDE {
            let (x, y) = block_pos(row, col);
            g.add_node(node_id(row, col), x, y, false);
        }
    }
    for row in 0..SIDE {
        for col in 0..SIDE {
            if col + 1 < SIDE {
                g.add_edge(node_id(row, col), node_id(row, col + 1), BLOCK, false);
            }
            if row + 1 < SIDE {
                g.add_edge(node_id(row, col), node_id(row + 1, col), BLOCK, false);
            }
        }
    }
    let diagonal = BLOCK * std::f64::consts::SQRT_2;
    for i in 0..SIDE - 1 {
        g.add_edge(node_id(i, i), node_id(i + 1, i + 1), diagonal, false);
        g.add_edge(node_id(i, SIDE - 1 - i), node_id(i + 1, SIDE - 2 - i), diagonal, false);
    }
    g
}

/// Built bike lanes: one along row 3, one up column 8, and a short
/// riverside path that is not on any street.
fn existing_graph() -> GraphData {
    let mut g = GraphData::new();
    for col in 0..8 {
        let (x, y) = block_pos(3, col);
        g.add_node(node_id(3, col), x, y, false);
    }
    for row in 3..10 {
        let (x, y) = block_pos(row, 8);
        g.add_node(node_id(row, 8), x, y, false);
    }
    for col in 0..8 {
        g.add_edge(node_id(3, col), node_id(3, col + 1), BLOCK, true);
    }
    for row in 3..9 {
        g.add_edge(node_id(row, 8), node_id(row + 1, 8), BLOCK, true);
    }

    // Riverside path: two off-grid nodes joined to the grid corner.
    let river = SIDE * SIDE;
    g.add_node(river, -80.0, -60.0, false);
    g.add_node(river + 1, -160.0, -120.0, false);
    g.add_edge(river, river + 1, BLOCK, true);
    g.add_edge(river, node_id(0, 0), BLOCK, true);
    g
}

/// Schools, stations, a hospital, shops: roughly where a planner would put
/// them, not on exact intersections.
const POI_COORDS: [(f64, f64); 14] = [
    (20.0, 30.0),
    (480.0, 90.0),
    (1050.0, 40.0),
    (160.0, 520.0),
    (590.0, 610.0),
    (1080.0, 470.0),
    (310.0, 1020.0),
    (720.0, 1090.0),
    (1010.0, 1060.0),
    (830.0, 280.0),
    (250.0, 780.0),
    (900.0, 830.0),
    (600.0, 620.0),
    (-150.0, -110.0),
];

/// Build the merged street network and return it with the snapped POIs.
pub fn build_city() -> Result<(WeightedNetwork, Vec<NodeId>)> {
    let mut b = NetworkBuilder::from_graph(&base_graph())?;
    let added = b.merge_existing(&existing_graph())?;
    log::info!("existing infrastructure added {added} off-street edges");

    let network = b.build();
    let points: Vec<Point> = POI_COORDS.iter().copied().map(Point::from).collect();
    let pois = snap_pois(&network, &points);
    Ok((network, pois))
}
