//! Run and behavior configuration.
//!
//! Both structs are constructed once (typically deserialized by the
//! application with the `serde` feature) and passed by reference into the
//! dispatcher, the vehicle constructors and the predictor.  Nothing in the
//! workspace reads tunables from process-wide state.

use crate::{TfError, TfResult};

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation run configuration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Seconds per tick (`dt`).
    pub step_secs: f64,

    /// Total ticks to simulate.
    pub total_ticks: u64,

    /// Absolute scenario time of tick 0.
    pub start_abs_secs: f64,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Call `SimObserver::on_snapshot` every N ticks.  0 disables snapshots.
    pub output_interval_ticks: u64,
}

impl SimConfig {
    pub fn validate(&self) -> TfResult<()> {
        if !(self.step_secs > 0.0) || !self.step_secs.is_finite() {
            return Err(TfError::Config(format!(
                "step_secs must be positive, got {}",
                self.step_secs
            )));
        }
        Ok(())
    }

    pub fn make_clock(&self) -> crate::SimClock {
        crate::SimClock::new(self.start_abs_secs, self.step_secs)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            step_secs:             0.1,
            total_ticks:           600,
            start_abs_secs:        0.0,
            seed:                  42,
            output_interval_ticks: 10,
        }
    }
}

// ── BehaviorConfig ────────────────────────────────────────────────────────────

/// Maneuver, event and trajectory tunables.
///
/// | Field                           | Default | Unit  |
/// |---------------------------------|---------|-------|
/// | `change_topology_threshold`     | 0.6     | ratio |
/// | `no_check_abort_threshold`      | 0.8     | ratio |
/// | `average_lane_change_duration`  | 4.5     | s     |
/// | `default_merge_duration`        | 4.5     | s     |
/// | `default_merge_offset`          | 0.0     | m     |
/// | `min_lane_change_time`          | 2.0     | s     |
/// | `junction_margin`               | 10.0    | m     |
/// | `default_road_end_distance`     | 100.0   | m     |
/// | `trajectory_horizon_secs`       | 8.0     | s     |
/// | `trajectory_search_margin`      | 10.0    | m     |
/// | `control_point_dedup_distance`  | 5.0     | m     |
/// | `lateral_clear_epsilon`         | 0.1     | m     |
/// | `max_speed`                     | 27.8    | m/s   |
/// | `hashed_segment_length`         | 20.0    | m     |
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BehaviorConfig {
    /// Fraction of a lane change after which `*Start` becomes `*Ing`.
    pub change_topology_threshold:    f64,
    /// Fraction of a lane change after which it can no longer be aborted.
    pub no_check_abort_threshold:     f64,
    /// Reference duration the lateral heading profile is normalized to.
    pub average_lane_change_duration: f64,
    /// Merge event duration when the scene leaves it unset.
    pub default_merge_duration:       f64,
    /// Merge event in-lane offset when the scene leaves it unset.
    pub default_merge_offset:         f64,
    /// Shortest lane change accepted when the road end forces a shorter one.
    pub min_lane_change_time:         f64,
    /// Distance before a junction within which lane changes must complete.
    pub junction_margin:              f64,
    /// Assumed distance to the road end when not on its last section.
    pub default_road_end_distance:    f64,
    pub trajectory_horizon_secs:      f64,
    pub trajectory_search_margin:     f64,
    /// Control points closer than this to the first one are dropped.
    pub control_point_dedup_distance: f64,
    /// Residual lateral error at which a lateral-distance action completes.
    pub lateral_clear_epsilon:        f64,
    /// Default maximum longitudinal speed for vehicles without their own.
    pub max_speed:                    f64,
    /// Arc length of one hashed lane segment.
    pub hashed_segment_length:        f64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            change_topology_threshold:    0.6,
            no_check_abort_threshold:     0.8,
            average_lane_change_duration: 4.5,
            default_merge_duration:       4.5,
            default_merge_offset:         0.0,
            min_lane_change_time:         2.0,
            junction_margin:              10.0,
            default_road_end_distance:    100.0,
            trajectory_horizon_secs:      8.0,
            trajectory_search_margin:     10.0,
            control_point_dedup_distance: 5.0,
            lateral_clear_epsilon:        0.1,
            max_speed:                    27.8,
            hashed_segment_length:        20.0,
        }
    }
}

impl BehaviorConfig {
    /// Check ratio fields are in `(0, 1]` and lengths/durations positive.
    pub fn validate(&self) -> TfResult<()> {
        for (name, v) in [
            ("change_topology_threshold", self.change_topology_threshold),
            ("no_check_abort_threshold",  self.no_check_abort_threshold),
        ] {
            if !(v > 0.0 && v <= 1.0) {
                return Err(TfError::Config(format!("{name} must be in (0, 1], got {v}")));
            }
        }
        for (name, v) in [
            ("average_lane_change_duration", self.average_lane_change_duration),
            ("trajectory_horizon_secs",      self.trajectory_horizon_secs),
            ("max_speed",                    self.max_speed),
            ("hashed_segment_length",        self.hashed_segment_length),
        ] {
            if !(v > 0.0) || !v.is_finite() {
                return Err(TfError::Config(format!("{name} must be positive, got {v}")));
            }
        }
        Ok(())
    }
}
