//! Lane-change timing and lateral profiles.
//!
//! A lane change moves the vehicle across by `|l|` (its lateral distance to
//! the target centerline) at `|l| / remaining` per second, so it lands on
//! the centerline on the last tick.  In-lane shifts move at the constant
//! `offset / duration`.  The heading during a change follows a separate
//! bell-shaped profile peaking at 15°.

use tf_core::{LaneUid, Side};

/// Remaining durations within this of zero count as finished.
pub(crate) const FINISH_EPSILON: f64 = 1e-6;

/// Largest heading deviation during a lane change, degrees.
const MAX_HEADING_DEG: f64 = 15.0;

/// Time at which the forward profile peaks.
const PROFILE_PEAK_SECS: f64 = 2.25;

/// Shortest feasible lane-change duration.
///
/// | Condition                                  | Result            |
/// |--------------------------------------------|-------------------|
/// | `velocity <= 0`                            | `requested`       |
/// | `road_end_dist < 0`                        | `-1`              |
/// | `road_end_dist / velocity >= requested`    | `requested`       |
/// | otherwise, if `> min_time`                 | `road_end_dist / velocity` |
/// | otherwise                                  | `-1`              |
///
/// A non-positive result means the lane change is infeasible.
pub fn compute_min_lane_change_time(
    requested:     f64,
    velocity:      f64,
    road_end_dist: f64,
    min_time:      f64,
) -> f64 {
    if velocity <= 0.0 {
        return requested;
    }
    if road_end_dist < 0.0 {
        return -1.0;
    }
    let reachable = road_end_dist / velocity;
    if reachable >= requested {
        requested
    } else if reachable > min_time {
        reachable
    } else {
        -1.0
    }
}

/// Forward lateral profile `t·1.037 − 0.2304444·t²` (zero at 0 and 4.5 s).
pub fn move_to_sideway(t: f64) -> f64 {
    let t = t.max(0.0);
    t * 1.037 - 0.230_444_4 * t * t
}

/// Move-back profile of an abort lasting `duration` seconds:
/// `t·b − (b/T)·t²` with `b = 3.11 + 1.5·(2.2 − T)`.
pub fn move_back_sideway(t: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        return 0.0;
    }
    let t = t.max(0.0);
    let b = 3.11 + 1.5 * (2.2 - duration);
    t * b - (b / duration) * t * t
}

/// Heading deviation in radians for a profile value, normalized so the
/// forward profile's peak maps to 15°.
pub fn heading_offset(profile: f64) -> f64 {
    let peak = move_to_sideway(PROFILE_PEAK_SECS);
    (profile * MAX_HEADING_DEG / peak)
        .clamp(-MAX_HEADING_DEG, MAX_HEADING_DEG)
        .to_radians()
}

/// Timer of an abort in progress.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AbortTimer {
    pub duration: f64,
    pub elapsed:  f64,
}

impl AbortTimer {
    #[inline]
    pub fn remaining(&self) -> f64 {
        self.duration - self.elapsed
    }
}

/// Bookkeeping of one lane change or in-lane shift.
#[derive(Clone, Debug, PartialEq)]
pub struct LaneChange {
    pub side:     Side,
    pub in_lane:  bool,
    pub duration: f64,
    pub elapsed:  f64,
    /// Lateral shift of an in-lane change, metres.
    pub offset:   f64,
    /// Lane being changed into.  Follows the vehicle across sections.
    pub target:   Option<LaneUid>,
    /// Lateral distance to cover, used when the target cannot be projected.
    pub span:     f64,
    pub abort:    Option<AbortTimer>,
}

impl LaneChange {
    pub(crate) fn lane_change(side: Side, duration: f64, target: LaneUid, span: f64) -> Self {
        Self {
            side,
            in_lane: false,
            duration,
            elapsed: 0.0,
            offset: 0.0,
            target: Some(target),
            span,
            abort: None,
        }
    }

    pub(crate) fn in_lane(side: Side, duration: f64, offset: f64) -> Self {
        Self {
            side,
            in_lane: true,
            duration,
            elapsed: 0.0,
            offset,
            target: None,
            span: offset,
            abort: None,
        }
    }

    #[inline]
    pub fn remaining(&self) -> f64 {
        self.duration - self.elapsed
    }

    /// Heading deviation at the current elapsed time, with `t` mapped onto
    /// the average lane-change duration.  Positive turns left.
    pub(crate) fn heading_offset(&self, average_duration: f64) -> f64 {
        if self.in_lane {
            return 0.0;
        }
        let sign = self.side.sign();
        match self.abort {
            Some(abort) => -sign * heading_offset(move_back_sideway(abort.elapsed, abort.duration)),
            None if self.duration > 0.0 => {
                let t = self.elapsed / self.duration * average_duration;
                sign * heading_offset(move_to_sideway(t))
            }
            None => 0.0,
        }
    }
}
