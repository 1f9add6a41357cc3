use bg_core::{CoreError, NodeId};
use bg_spatial::SpatialError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrowthError {
    /// A candidate pair references a node that is not in the triangulation
    /// graph.  Means the POI list and the network disagree; never retried.
    #[error("invariant violation: candidate endpoint {node} is not a triangulation node")]
    InvariantViolation { node: NodeId },

    /// Not a single pair of POIs is connected.  The pipeline turns this into
    /// an empty result.
    #[error("none of the {pois} points of interest are connected to each other")]
    DisconnectedInput { pois: usize },

    #[error("configuration: {0}")]
    Config(#[from] CoreError),

    #[error("spatial: {0}")]
    Spatial(#[from] SpatialError),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GrowthResult<T> = Result<T, GrowthError>;
