//! `tf-spatial`: lane geometry, hashed lane segments, spatial indexing,
//! and routing.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                     |
//! |-------------|--------------------------------------------------------------|
//! | [`curve`]   | `Curve`: arc-length parameterized polyline, xy ↔ sl         |
//! | [`map`]     | `LaneMap` (lanes, links, R-tree), `LaneMapBuilder`          |
//! | [`hashed`]  | `HashedLaneInfo`, precomputed segment adjacency             |
//! | [`service`] | `GeometryService` trait consumed by events, vehicles, predictor |
//! | [`router`]  | `Router` trait, `Route`, `DijkstraRouter` over the road graph |
//! | [`error`]   | `SpatialError`, `SpatialResult<T>`                          |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public value types.     |

pub mod curve;
pub mod error;
pub mod hashed;
pub mod map;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use curve::{Curve, Projection};
pub use error::{SpatialError, SpatialResult};
pub use hashed::HashedLaneInfo;
pub use map::{Lane, LaneLink, LaneLocator, LaneMap, LaneMapBuilder, LanePosition};
pub use router::{DijkstraRouter, Route, Router};
pub use service::GeometryService;
