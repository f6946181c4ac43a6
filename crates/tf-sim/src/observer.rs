//! Simulation observer trait for progress reporting and data collection.

use tf_core::Tick;
use tf_trajectory::TrajectorySample;
use tf_vehicle::{Pedestrian, VehicleElement};

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at key points in the
/// tick loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: event counter
///
/// ```rust,ignore
/// struct Fires(usize);
///
/// impl SimObserver for Fires {
///     fn on_tick_end(&mut self, _tick: Tick, fired: usize) {
///         self.0 += fired;
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each tick, before the hit-info snapshot.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called at the end of each tick.
    ///
    /// `fired` is the number of event handler invocations this tick.
    fn on_tick_end(&mut self, _tick: Tick, _fired: usize) {}

    /// Called every `config.output_interval_ticks` ticks.
    ///
    /// `trajectories[i]` is the prediction of `vehicles[i]` filled this tick;
    /// it is empty for dead vehicles.
    fn on_snapshot(
        &mut self,
        _tick:         Tick,
        _vehicles:     &[VehicleElement],
        _pedestrians:  &[Pedestrian],
        _trajectories: &[Vec<TrajectorySample>],
    ) {}

    /// Called once after the final tick completes.
    fn on_sim_end(&mut self, _final_tick: Tick) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
