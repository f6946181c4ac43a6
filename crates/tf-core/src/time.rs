//! Simulation time model.
//!
//! # Design
//!
//! Time is a monotonically increasing `Tick` counter.  The mapping to
//! seconds is held in `SimClock`:
//!
//!   pass_time = tick * step_secs
//!   abs_time  = start_abs_secs + pass_time
//!
//! `pass_time` is recomputed from the integer tick rather than accumulated,
//! so time triggers compare against a drift-free value no matter how long
//! the run is.  Everything below the clock works on a [`TimeParam`]
//! snapshot handed down once per tick.

use std::fmt;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── TimeParam ─────────────────────────────────────────────────────────────────

/// Per-tick time snapshot passed to every event, maneuver and predictor
/// call.  All values are seconds.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimeParam {
    pub tick:          Tick,
    /// Elapsed simulation time since tick 0.
    pub pass_time:     f64,
    /// Step length of this tick (`dt`).
    pub relative_time: f64,
    /// Absolute scenario time (`start + pass_time`).
    pub abs_time:      f64,
}

impl TimeParam {
    /// Time parameters for `tick` with a fixed step and zero start time.
    /// Mostly useful in tests.
    pub fn at(tick: u64, step_secs: f64) -> Self {
        let pass_time = tick as f64 * step_secs;
        Self {
            tick: Tick(tick),
            pass_time,
            relative_time: step_secs,
            abs_time: pass_time,
        }
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Converts between tick counts and simulation seconds.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Absolute scenario time of tick 0.
    pub start_abs_secs: f64,
    /// Seconds per tick.
    pub step_secs:      f64,
    /// Advanced by `SimClock::advance()` each iteration.
    pub current_tick:   Tick,
}

impl SimClock {
    pub fn new(start_abs_secs: f64, step_secs: f64) -> Self {
        Self { start_abs_secs, step_secs, current_tick: Tick::ZERO }
    }

    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Elapsed simulated seconds since tick 0.
    #[inline]
    pub fn pass_time(&self) -> f64 {
        self.current_tick.0 as f64 * self.step_secs
    }

    /// Snapshot for the current tick.
    pub fn time_param(&self) -> TimeParam {
        let pass_time = self.pass_time();
        TimeParam {
            tick:          self.current_tick,
            pass_time,
            relative_time: self.step_secs,
            abs_time:      self.start_abs_secs + pass_time,
        }
    }

    /// How many ticks span `secs` seconds? (rounds up)
    #[inline]
    pub fn ticks_for_secs(&self, secs: f64) -> u64 {
        if secs <= 0.0 || self.step_secs <= 0.0 {
            return 0;
        }
        // Tolerate representation error in e.g. 3.0 / 0.1.
        (secs / self.step_secs - 1e-9).ceil() as u64
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.3} s)", self.current_tick, self.pass_time())
    }
}
