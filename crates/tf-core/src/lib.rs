//! `tf-core`: foundational types for the `rust_tf` traffic-flow core.
//!
//! This crate is a dependency of every other `tf-*` crate.  It has no `tf-*`
//! dependencies and only `rand` and `thiserror` externally, plus optional
//! `serde`.
//!
//! # What lives here
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`ids`]         | `ElementId`, `RoadId`, `LaneLinkId`, `LaneUid`            |
//! | [`geo`]         | `Vec2`, `Polygon`, angle helpers                          |
//! | [`time`]        | `Tick`, `TimeParam`, `SimClock`                           |
//! | [`config`]      | `SimConfig`, `BehaviorConfig`                             |
//! | [`direction`]   | `MoveDirection`, `Side`                                   |
//! | [`rng`]         | `AgentRng` (per-element deterministic RNG)                |
//! | [`error`]       | `TfError`, `TfResult`                                     |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod direction;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{BehaviorConfig, SimConfig};
pub use direction::{MoveDirection, Side};
pub use error::{TfError, TfResult};
pub use geo::{Polygon, Vec2};
pub use ids::{ElementId, LaneLinkId, LaneUid, RoadId};
pub use rng::AgentRng;
pub use time::{SimClock, Tick, TimeParam};
