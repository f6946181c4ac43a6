//! `tf-sim`: tick loop orchestrator for the rust_tf traffic-flow core.
//!
//! # Tick loop
//!
//! ```text
//! for tick in 0..config.total_ticks:
//!   ① Snapshot       HitUtilInfo of every element, keyed by ElementId.
//!   ② Events         EventDispatcher::flush against the snapshot; handlers
//!                    are the vehicles and pedestrians themselves.
//!   ③ Pre-update     accelerations and end conditions.
//!   ④ Update         lane changes, lateral actions, relocation, walking.
//!   ⑤ Trajectories   fill_trajectory per vehicle (parallel with `parallel`).
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Fills trajectories on Rayon's thread pool.             |
//! | `fx-hash`  | FxHash for the element index and snapshot maps.        |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use tf_core::{BehaviorConfig, ElementId, LaneUid, SimConfig};
//! use tf_sim::{NoopObserver, SimBuilder};
//! use tf_vehicle::VehicleSpec;
//!
//! let mut sim = SimBuilder::new(SimConfig::default(), BehaviorConfig::default(), map)
//!     .vehicle(VehicleSpec::on_lane(ElementId(0), LaneUid::new(1, 0, -1), 0.0, 20.0))
//!     .build()?;
//! sim.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod sim;


pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use sim::Sim;
