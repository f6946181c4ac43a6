//! `tf-trajectory`: forward trajectory prediction.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`sample`]    | `TrajectorySample`                                        |
//! | [`catmull`]   | Centripetal Catmull-Rom fitting into a `Curve`            |
//! | [`predictor`] | `PredictorInput`, `predict`, `predict_into`               |
//!
//! # Pipeline (summary)
//!
//! ```text
//! seed hashed segment ─► greedy walk over hashed successors (route first)
//!                     ─► sparse control points ─► Catmull-Rom ─► Curve
//!                     ─► fixed-step kinematic walk along the curve
//! ```

pub mod catmull;
pub mod predictor;
pub mod sample;


pub use catmull::fit_centripetal;
pub use predictor::{kinematic_reach, predict, predict_into, PredictorInput};
pub use sample::TrajectorySample;
