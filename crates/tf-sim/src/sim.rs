//! The `Sim` struct and its tick loop.

use tracing::{debug, info, instrument};

use tf_core::{BehaviorConfig, ElementId, SimClock, SimConfig, Tick, TimeParam};
use tf_event::{EventDispatcher, EventHandler, HandlerRegistry, HitUtilInfo};
use tf_spatial::GeometryService;
use tf_trajectory::TrajectorySample;
use tf_vehicle::{Pedestrian, VehicleElement};

use crate::{SimObserver, SimResult};

#[cfg(feature = "fx-hash")]
pub(crate) type ElementMap<V> = rustc_hash::FxHashMap<ElementId, V>;
#[cfg(not(feature = "fx-hash"))]
pub(crate) type ElementMap<V> = std::collections::HashMap<ElementId, V>;

/// Where an element lives inside [`Sim`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Slot {
    Vehicle(usize),
    Pedestrian(usize),
}

// ── Handler registry over the element arrays ──────────────────────────────────

/// Mutable view of the elements handed to the dispatcher during the event
/// phase.
struct Registry<'a> {
    vehicles:    &'a mut [VehicleElement],
    pedestrians: &'a mut [Pedestrian],
    index:       &'a ElementMap<Slot>,
    ego:         Option<HitUtilInfo>,
}

impl HandlerRegistry for Registry<'_> {
    fn handler_mut(&mut self, id: ElementId) -> Option<&mut dyn EventHandler> {
        match *self.index.get(&id)? {
            Slot::Vehicle(i)    => self.vehicles.get_mut(i).map(|v| v as &mut dyn EventHandler),
            Slot::Pedestrian(i) => self.pedestrians.get_mut(i).map(|p| p as &mut dyn EventHandler),
        }
    }

    fn ego(&self) -> Option<HitUtilInfo> {
        self.ego.clone()
    }
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// Each tick runs five phases in a fixed order:
///
/// 1. **Snapshot**: collect every element's [`HitUtilInfo`].  Triggers and
///    lateral-distance actions read this snapshot, never live state.
/// 2. **Events**: [`EventDispatcher::flush`] evaluates every live event and
///    invokes handlers.
/// 3. **Pre-update**: apply accelerations and end conditions.
/// 4. **Update**: move vehicles (lane-change, lateral action, relocation)
///    and pedestrians, in ascending id order.
/// 5. **Trajectories**: refill every vehicle's prediction (parallel with the
///    `parallel` feature).
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim<G: GeometryService> {
    /// Global configuration (step, total ticks, seed, …).
    pub config: SimConfig,

    /// Simulation clock: current tick and its mapping to seconds.
    pub clock: SimClock,

    pub behavior: BehaviorConfig,

    /// The lane map.  Immutable for the whole run.
    pub geometry: G,

    /// Vehicles in ascending id order.
    pub vehicles: Vec<VehicleElement>,

    /// Pedestrians in ascending id order.
    pub pedestrians: Vec<Pedestrian>,

    /// `trajectories[i]` belongs to `vehicles[i]`.  Buffers are reused
    /// across ticks.
    pub trajectories: Vec<Vec<TrajectorySample>>,

    pub ego: Option<ElementId>,

    pub dispatcher: EventDispatcher,

    pub(crate) index:    ElementMap<Slot>,
    pub(crate) snapshot: ElementMap<HitUtilInfo>,
}

impl<G: GeometryService> Sim<G> {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run the simulation from the current tick to `config.total_ticks`.
    ///
    /// Calls observer hooks at every tick boundary.  Use
    /// [`NoopObserver`][crate::NoopObserver] if you don't need callbacks.
    #[instrument(skip_all, fields(total_ticks = self.config.total_ticks, step = self.config.step_secs))]
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        let end = Tick(self.config.total_ticks);
        let mut fired_total = 0;
        while self.clock.current_tick < end {
            fired_total += self.step(observer);
        }
        observer.on_sim_end(self.clock.current_tick);
        info!(
            final_tick = %self.clock.current_tick,
            fired = fired_total,
            alive = self.vehicles.iter().filter(|v| v.is_alive()).count(),
            "simulation finished"
        );
        Ok(())
    }

    /// Run exactly `n` ticks from the current position (ignores
    /// `total_ticks`).
    ///
    /// Useful for tests and incremental stepping.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.step(observer);
        }
        Ok(())
    }

    pub fn vehicle(&self, id: ElementId) -> Option<&VehicleElement> {
        match self.index.get(&id)? {
            Slot::Vehicle(i) => self.vehicles.get(*i),
            Slot::Pedestrian(_) => None,
        }
    }

    pub fn vehicle_mut(&mut self, id: ElementId) -> Option<&mut VehicleElement> {
        match self.index.get(&id)? {
            Slot::Vehicle(i) => self.vehicles.get_mut(*i),
            Slot::Pedestrian(_) => None,
        }
    }

    pub fn pedestrian(&self, id: ElementId) -> Option<&Pedestrian> {
        match self.index.get(&id)? {
            Slot::Pedestrian(i) => self.pedestrians.get(*i),
            Slot::Vehicle(_) => None,
        }
    }

    /// Prediction filled for vehicle `id` on the last tick.
    pub fn trajectory(&self, id: ElementId) -> Option<&[TrajectorySample]> {
        match self.index.get(&id)? {
            Slot::Vehicle(i) => self.trajectories.get(*i).map(Vec::as_slice),
            Slot::Pedestrian(_) => None,
        }
    }

    /// Snapshot taken at the start of the last tick.
    pub fn hit_info(&self, id: ElementId) -> Option<&HitUtilInfo> {
        self.snapshot.get(&id)
    }

    /// Remove an element from the scene.  Its events stay registered but its
    /// handler rejects everything from now on.  Returns `false` if `id` is
    /// unknown or already dead.
    pub fn kill(&mut self, id: ElementId) -> bool {
        let alive = match self.index.get(&id) {
            Some(Slot::Vehicle(i)) => self.vehicles.get_mut(*i).filter(|v| v.is_alive()).map(|v| v.kill()),
            Some(Slot::Pedestrian(i)) => {
                self.pedestrians.get_mut(*i).filter(|p| p.is_alive()).map(|p| p.kill())
            }
            None => None,
        };
        if alive.is_some() {
            debug!(element = %id, "element killed");
        }
        alive.is_some()
    }

    // ── Core tick processing ──────────────────────────────────────────────

    fn step<O: SimObserver>(&mut self, observer: &mut O) -> usize {
        let now = self.clock.current_tick;
        observer.on_tick_start(now);
        let fired = self.process_tick();
        observer.on_tick_end(now, fired);
        if self.config.output_interval_ticks > 0
            && now.0.is_multiple_of(self.config.output_interval_ticks)
        {
            observer.on_snapshot(now, &self.vehicles, &self.pedestrians, &self.trajectories);
        }
        self.clock.advance();
        fired
    }

    fn process_tick(&mut self) -> usize {
        let time = self.clock.time_param();

        // ── Phase 1: hit-info snapshot ────────────────────────────────────
        self.snapshot.clear();
        for v in &self.vehicles {
            self.snapshot.insert(v.id(), v.hit_info());
        }
        for p in &self.pedestrians {
            self.snapshot.insert(p.id(), p.hit_info());
        }

        // ── Phase 2: events ───────────────────────────────────────────────
        let ego = self.ego.and_then(|id| self.snapshot.get(&id)).cloned();
        let mut registry = Registry {
            vehicles:    &mut self.vehicles,
            pedestrians: &mut self.pedestrians,
            index:       &self.index,
            ego,
        };
        let fired = self.dispatcher.flush(&time, &mut registry, &self.geometry);

        // ── Phase 3: pre-update ───────────────────────────────────────────
        for v in self.vehicles.iter_mut().filter(|v| v.is_alive()) {
            v.pre_update(&time);
        }

        // ── Phase 4: update ───────────────────────────────────────────────
        for v in self.vehicles.iter_mut().filter(|v| v.is_alive()) {
            if !v.update(&time, &self.geometry, &self.snapshot) {
                debug!(tick = %time.tick, element = %v.id(), "vehicle stopped");
            }
        }
        for p in self.pedestrians.iter_mut().filter(|p| p.is_alive()) {
            p.update(&time);
        }

        // ── Phase 5: trajectories ─────────────────────────────────────────
        self.fill_trajectories(&time);

        fired
    }

    /// Refill every vehicle's prediction.  Dead vehicles get an empty one.
    fn fill_trajectories(&mut self, time: &TimeParam) {
        let geometry: &dyn GeometryService = &self.geometry;

        #[cfg(not(feature = "parallel"))]
        for (v, out) in self.vehicles.iter().zip(self.trajectories.iter_mut()) {
            v.fill_trajectory(time, geometry, out);
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            self.vehicles
                .par_iter()
                .zip(self.trajectories.par_iter_mut())
                .for_each(|(v, out)| {
                    v.fill_trajectory(time, geometry, out);
                });
        }
    }
}
