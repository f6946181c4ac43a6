//! `tf-vehicle`: per-agent maneuver state machines.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                     |
//! |-----------------|--------------------------------------------------------------|
//! | [`maneuver`]    | `ManeuverState`                                              |
//! | [`kinetics`]    | `Kinetics`: speed integration, acceleration end conditions   |
//! | [`lane_change`] | `LaneChange`, feasible duration, lateral/heading profiles    |
//! | [`actions`]     | `LateralDistanceAction`, `MergeAction`                       |
//! | [`vehicle`]     | `VehicleSpec`, `VehicleElement`                              |
//! | [`pedestrian`]  | `PedestrianSpec`, `Pedestrian`                               |
//! | [`error`]       | `VehicleError`, `VehicleResult<T>`                           |
//!
//! Both element types implement [`tf_event::EventHandler`], so the event
//! dispatcher drives them without knowing their concrete type.

pub mod actions;
pub mod error;
pub mod kinetics;
pub mod lane_change;
pub mod maneuver;
pub mod pedestrian;
pub mod vehicle;

#[cfg(test)]
mod tests;

pub use actions::{LateralDistanceAction, MergeAction, signed_gap};
pub use error::{VehicleError, VehicleResult};
pub use kinetics::Kinetics;
pub use lane_change::{LaneChange, compute_min_lane_change_time};
pub use maneuver::ManeuverState;
pub use pedestrian::{Pedestrian, PedestrianSpec};
pub use vehicle::{VehicleElement, VehicleSpec, least_lane_change};
