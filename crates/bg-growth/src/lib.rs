//! `bg-growth`: grows a bike network by triangulating POIs over a street
//! network, pruning by centrality, and re-expanding into street paths.
//!
//! # Pipeline
//!
//! ```text
//! WeightedNetwork + POIs
//!   ① Pairs        PairEnumerator: shortest discounted path for every
//!                  POI pair, sorted ascending by cost (stable).
//!   ② Triangulate  PlanarTriangulator: accept pairs in order unless the
//!                  straight segment properly crosses an accepted one.
//!   ③ Prune        CentralityPruner: betweenness / closeness quantile,
//!                  or iterative betweenness protecting existing edges.
//!   ④ Expand       PathExpander: union of street paths of surviving
//!                  edges, induced subgraph + existing infrastructure.
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                     |
//! |------------|------------------------------------------------------------|
//! | `parallel` | Runs ① per source and ④ per edge on Rayon's thread pool.   |
//! | `serde`    | Serde derives on `FinalNetwork`, `FinalEdge`, `Provenance`. |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use bg_core::GrowthConfig;
//! use bg_growth::{GrowthPipeline, NoopObserver};
//!
//! let pois = network.poi_nodes();
//! let out = GrowthPipeline::new(GrowthConfig::default())
//!     .run(&network, &pois, &mut NoopObserver)?;
//! ```

pub mod centrality;
pub mod error;
pub mod expand;
pub mod export;
pub mod geometry;
pub mod observer;
pub mod pairs;
pub mod pipeline;
pub mod prune;
pub mod triangulation;

#[cfg(test)]
mod tests;

pub use centrality::{closeness, edge_betweenness, quantile};
pub use error::{GrowthError, GrowthResult};
pub use expand::{Expansion, FinalEdge, FinalNetwork, PathExpander, Provenance};
pub use export::{write_final_csv, write_final_dir, write_final_nodes_csv};
pub use geometry::{Segment, ccw, segments_intersect};
pub use observer::{GrowthObserver, NoopObserver};
pub use pairs::{CandidatePair, PairEnumerator};
pub use pipeline::{GrowthOutput, GrowthPipeline, grow_network};
pub use prune::{BatchSchedule, CentralityPruner, PROTECTED_BETWEENNESS, PruneReport};
pub use triangulation::{GtEdge, GtNode, PlanarTriangulator, TriangulationGraph};
