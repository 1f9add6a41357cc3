//! CSV graph loader.
//!
//! # CSV format
//!
//! Two files, one for nodes and one for undirected edges.
//!
//! ```csv
//! id,x,y,poi
//! 101,-77.610,43.157,1
//! 102,-77.605,43.158,0
//! ```
//!
//! ```csv
//! u,v,length,existing
//! 101,102,412.5,false
//! ```
//!
//! `poi` and `existing` accept `1`/`0`, `true`/`false` or `yes`/`no` and may
//! be left empty (false).  The `poi` column may be omitted entirely in an
//! existing-infrastructure node file.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use bg_core::Point;

use crate::graph::{EdgeRecord, GraphData, NodeRecord};
use crate::{SpatialError, SpatialResult};

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct NodeRow {
    id: u64,
    x:  f64,
    y:  f64,
    #[serde(default)]
    poi: String,
}

#[derive(Deserialize)]
struct EdgeRow {
    u:      u64,
    v:      u64,
    length: f64,
    #[serde(default)]
    existing: String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a graph from a node CSV and an edge CSV on disk.
pub fn load_graph_csv(nodes: &Path, edges: &Path) -> SpatialResult<GraphData> {
    let nodes = std::fs::File::open(nodes)?;
    let edges = std::fs::File::open(edges)?;
    load_graph_reader(nodes, edges)
}

/// Like [`load_graph_csv`] but accepts any `Read` sources.
///
/// Useful for testing (pass a `std::io::Cursor`) or loading from network
/// streams.
pub fn load_graph_reader<N: Read, E: Read>(nodes: N, edges: E) -> SpatialResult<GraphData> {
    let mut graph = GraphData::new();

    let mut node_reader = csv::Reader::from_reader(nodes);
    for result in node_reader.deserialize::<NodeRow>() {
        let row = result?;
        graph.nodes.push(NodeRecord {
            id:  row.id,
            pos: Point::new(row.x, row.y),
            poi: parse_flag(&row.poi)?,
        });
    }

    let mut edge_reader = csv::Reader::from_reader(edges);
    for result in edge_reader.deserialize::<EdgeRow>() {
        let row = result?;
        graph.edges.push(EdgeRecord {
            u:        row.u,
            v:        row.v,
            length:   row.length,
            existing: parse_flag(&row.existing)?,
        });
    }

    log::info!(
        "loaded graph: {} nodes, {} edges",
        graph.nodes.len(),
        graph.edges.len()
    );
    Ok(graph)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_flag(s: &str) -> SpatialResult<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" => Ok(false),
        "1" | "true" | "yes" => Ok(true),
        other => Err(SpatialError::Parse(format!(
            "invalid flag {other:?}: expected 1/0, true/false or yes/no"
        ))),
    }
}
