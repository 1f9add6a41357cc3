//! `bg-core`: foundational types for the bike-network growth toolkit.
//!
//! This crate is a dependency of every other `bg-*` crate.  It has no `bg-*`
//! dependencies and a single required external one (`thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`ids`]     | `NodeId`, `EdgeId`                                        |
//! | [`geo`]     | `Point` (planar coordinates)                              |
//! | [`config`]  | `GrowthConfig`, `PruneMeasure`, `BatchMode`               |
//! | [`error`]   | `CoreError`, `CoreResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{ADAPTIVE_BATCH_SIZES, BatchMode, GrowthConfig, PruneMeasure};
pub use error::{CoreError, CoreResult};
pub use geo::Point;
pub use ids::{EdgeId, NodeId};
