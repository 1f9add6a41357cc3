//! `bg-spatial`: weighted street network, routing, and graph loading.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                        |
//! |-------------|-----------------------------------------------------------------|
//! | [`graph`]   | `GraphData`, `NodeRecord`, `EdgeRecord` (external-id input)     |
//! | [`network`] | `WeightedNetwork` (CSR + R-tree), `NetworkBuilder`, `snap_pois` |
//! | [`router`]  | `Router` trait, `Route`, `DiscountRouter`                       |
//! | [`loader`]  | `load_graph_csv`, `load_graph_reader`                           |
//! | [`error`]   | `SpatialError`, `SpatialResult<T>`                              |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public graph types.     |

pub mod error;
pub mod graph;
pub mod loader;
pub mod network;
pub mod router;


pub use error::{SpatialError, SpatialResult};
pub use graph::{EdgeRecord, GraphData, NodeRecord};
pub use loader::{load_graph_csv, load_graph_reader};
pub use network::{NetworkBuilder, WeightedNetwork, snap_pois};
pub use router::{DiscountRouter, Route, Router};
