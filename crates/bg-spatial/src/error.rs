//! Spatial-subsystem error type.

use thiserror::Error;

use bg_core::NodeId;

/// Errors produced by `bg-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// No route between two nodes.  Callers in the growth pipeline absorb
    /// this and drop the pair rather than aborting.
    #[error("no path from {from} to {to}")]
    NoPath { from: NodeId, to: NodeId },

    #[error("node {0} not found in network")]
    NodeNotFound(NodeId),

    #[error("edge references unknown external node id {0}")]
    UnknownExternalId(u64),

    #[error("graph parse error: {0}")]
    Parse(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
