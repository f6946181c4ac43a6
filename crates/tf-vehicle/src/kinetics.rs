//! Longitudinal kinetics and acceleration end conditions.
//!
//! ```text
//! pre_update:  v' = clamp(v + a·dt, 0, v_max)
//! update:      Δs = ½·(v + v')·dt
//! ```
//!
//! An injected acceleration carries an optional end condition:
//!
//! | End condition     | Effect                                                  |
//! |-------------------|---------------------------------------------------------|
//! | none / invalid    | holds until replaced                                    |
//! | `Time(secs)`      | counts down by `dt`; acceleration drops to 0 at zero    |
//! | `Velocity(target)`| once `v` reaches `target` from the side it started on, it snaps to `target` and acceleration drops to 0 |
//!
//! The side is fixed by the speed at injection: starting at or below the
//! target ends on `v >= target`, starting at or above ends on `v <= target`.
//! Injecting at exactly the target ends on the next step.

use tf_event::{EndCondition, EndConditionKind};

/// Countdowns within this of zero count as expired.
const EXPIRY_EPSILON: f64 = 1e-9;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
enum AccelerationEnd {
    #[default]
    Hold,
    Countdown(f64),
    UntilVelocity { target: f64, injected_at: f64 },
}

#[derive(Clone, Debug)]
pub struct Kinetics {
    velocity:      f64,
    /// Velocity before the last `pre_update`; the start of the trapezoid.
    prev_velocity: f64,
    acceleration:  f64,
    max_velocity:  f64,
    end:           AccelerationEnd,
}

impl Kinetics {
    pub fn new(velocity: f64, max_velocity: f64) -> Self {
        let velocity = velocity.clamp(0.0, max_velocity);
        Self {
            velocity,
            prev_velocity: velocity,
            acceleration: 0.0,
            max_velocity,
            end: AccelerationEnd::Hold,
        }
    }

    #[inline]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    #[inline]
    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    #[inline]
    pub fn max_velocity(&self) -> f64 {
        self.max_velocity
    }

    /// Replace the acceleration and its end condition.
    pub fn set_acceleration(&mut self, acc: f64, end: &EndCondition) {
        self.acceleration = acc;
        self.end = if !end.is_active() {
            AccelerationEnd::Hold
        } else {
            match end.kind {
                EndConditionKind::Time     => AccelerationEnd::Countdown(end.value),
                EndConditionKind::Velocity => AccelerationEnd::UntilVelocity {
                    target:      end.value,
                    injected_at: self.velocity,
                },
                EndConditionKind::None     => AccelerationEnd::Hold,
            }
        };
    }

    /// Set the speed directly (clamped), dropping any injected acceleration.
    pub fn set_velocity(&mut self, velocity: f64) {
        self.velocity = velocity.clamp(0.0, self.max_velocity);
        self.prev_velocity = self.velocity;
        self.acceleration = 0.0;
        self.end = AccelerationEnd::Hold;
    }

    pub fn stop(&mut self) {
        self.set_velocity(0.0);
    }

    /// Apply one step of acceleration and evaluate the end condition.
    pub fn pre_update(&mut self, dt: f64) {
        self.prev_velocity = self.velocity;
        self.velocity = (self.velocity + self.acceleration * dt).clamp(0.0, self.max_velocity);

        match &mut self.end {
            AccelerationEnd::Hold => {}
            AccelerationEnd::Countdown(remaining) => {
                *remaining -= dt;
                if *remaining <= EXPIRY_EPSILON {
                    self.acceleration = 0.0;
                    self.end = AccelerationEnd::Hold;
                }
            }
            AccelerationEnd::UntilVelocity { target, injected_at } => {
                let (target, from, v) = (*target, *injected_at, self.velocity);
                let reached = (from <= target && v >= target) || (from >= target && v <= target);
                if reached {
                    self.velocity = target.clamp(0.0, self.max_velocity);
                    self.acceleration = 0.0;
                    self.end = AccelerationEnd::Hold;
                }
            }
        }
    }

    /// Distance covered this step: trapezoid of the speeds before and after
    /// the last `pre_update`.
    pub fn step_distance(&self, dt: f64) -> f64 {
        0.5 * (self.prev_velocity + self.velocity) * dt
    }

    /// Forget the trapezoid start so the next step uses the current speed.
    pub(crate) fn settle(&mut self) {
        self.prev_velocity = self.velocity;
    }
}
