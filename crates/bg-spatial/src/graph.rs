//! External-id based graph records.
//!
//! This is the shape in which collaborators (map loaders, CSV files, tests)
//! hand a street graph or an existing-infrastructure graph to
//! [`NetworkBuilder`](crate::NetworkBuilder).  Ids are whatever the source
//! uses (typically OSM node ids); they are resolved to dense [`NodeId`]s at
//! build time.
//!
//! [`NodeId`]: bg_core::NodeId

use bg_core::Point;

/// One node of an input graph.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeRecord {
    /// Stable external id.
    pub id: u64,
    pub pos: Point,
    /// Point-of-interest marker.
    pub poi: bool,
}

/// One undirected edge of an input graph, referencing nodes by external id.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeRecord {
    pub u: u64,
    pub v: u64,
    /// Physical length (the base routing weight).  Must be finite and
    /// non-negative.
    pub length: f64,
    /// Part of already-built bike infrastructure.
    pub existing: bool,
}

/// A complete input graph.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GraphData {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

impl GraphData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: u64, x: f64, y: f64, poi: bool) -> &mut Self {
        self.nodes.push(NodeRecord { id, pos: Point::new(x, y), poi });
        self
    }

    pub fn add_edge(&mut self, u: u64, v: u64, length: f64, existing: bool) -> &mut Self {
        self.edges.push(EdgeRecord { u, v, length, existing });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
