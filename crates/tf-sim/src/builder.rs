//! Fluent builder for constructing a [`Sim`].

use tracing::{info, warn};

use tf_core::{BehaviorConfig, ElementId, SimConfig};
use tf_event::{EventDispatcher, EventViewer};
use tf_spatial::GeometryService;
use tf_vehicle::{Pedestrian, PedestrianSpec, VehicleElement, VehicleSpec};

use crate::sim::{ElementMap, Slot};
use crate::{Sim, SimError, SimResult};

/// Fluent builder for [`Sim<G>`].
///
/// # Required inputs
///
/// - [`SimConfig`]: step, total ticks, seed, snapshot interval
/// - [`BehaviorConfig`]: maneuver, event and trajectory tunables
/// - `G: GeometryService`: the lane map (e.g. a built [`tf_spatial::LaneMap`])
///
/// # Optional inputs
///
/// | Method               | Default         |
/// |----------------------|-----------------|
/// | `.vehicle(spec)`     | no vehicles     |
/// | `.pedestrian(spec)`  | no pedestrians  |
/// | `.ego(id)`           | no ego; TTC and ego-distance triggers never fire |
/// | `.events(iter)`      | no events       |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config, BehaviorConfig::default(), map)
///     .vehicle(VehicleSpec::on_lane(ElementId(0), LaneUid::new(1, 0, -1), 0.0, 20.0))
///     .vehicle(VehicleSpec::on_lane(ElementId(1), LaneUid::new(1, 0, -2), 30.0, 15.0))
///     .ego(ElementId(0))
///     .events(load_viewers_csv(path)?)
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder<G: GeometryService> {
    config:      SimConfig,
    behavior:    BehaviorConfig,
    geometry:    G,
    vehicles:    Vec<VehicleSpec>,
    pedestrians: Vec<PedestrianSpec>,
    ego:         Option<ElementId>,
    events:      Vec<(ElementId, EventViewer)>,
}

impl<G: GeometryService> SimBuilder<G> {
    /// Create a builder with all required inputs.
    pub fn new(config: SimConfig, behavior: BehaviorConfig, geometry: G) -> Self {
        Self {
            config,
            behavior,
            geometry,
            vehicles:    Vec::new(),
            pedestrians: Vec::new(),
            ego:         None,
            events:      Vec::new(),
        }
    }

    pub fn vehicle(mut self, spec: VehicleSpec) -> Self {
        self.vehicles.push(spec);
        self
    }

    pub fn pedestrian(mut self, spec: PedestrianSpec) -> Self {
        self.pedestrians.push(spec);
        self
    }

    /// Mark one of the declared elements as the ego, the reference element
    /// for TTC and ego-distance triggers.
    pub fn ego(mut self, id: ElementId) -> Self {
        self.ego = Some(id);
        self
    }

    /// Bind event viewers to their handler elements, e.g. the output of
    /// [`tf_event::load_viewers_csv`].
    pub fn events(mut self, events: impl IntoIterator<Item = (ElementId, EventViewer)>) -> Self {
        self.events.extend(events);
        self
    }

    /// Validate inputs, spawn every element, register events and return a
    /// ready-to-run [`Sim`].
    ///
    /// Vehicles and pedestrians are stored in ascending id order so that the
    /// update order does not depend on declaration order.
    pub fn build(self) -> SimResult<Sim<G>> {
        self.config.validate()?;
        self.behavior.validate()?;

        let mut vehicle_specs = self.vehicles;
        vehicle_specs.sort_by_key(|s| s.id);
        let mut pedestrian_specs = self.pedestrians;
        pedestrian_specs.sort_by_key(|s| s.id);

        // ── Spawn elements ────────────────────────────────────────────────
        let mut index: ElementMap<Slot> = ElementMap::default();
        let mut vehicles = Vec::with_capacity(vehicle_specs.len());
        for spec in vehicle_specs {
            let id = spec.id;
            if index.insert(id, Slot::Vehicle(vehicles.len())).is_some() {
                return Err(SimError::DuplicateElement(id));
            }
            vehicles.push(VehicleElement::spawn(spec, &self.geometry, &self.behavior, self.config.seed)?);
        }
        let mut pedestrians = Vec::with_capacity(pedestrian_specs.len());
        for spec in pedestrian_specs {
            let id = spec.id;
            if index.insert(id, Slot::Pedestrian(pedestrians.len())).is_some() {
                return Err(SimError::DuplicateElement(id));
            }
            pedestrians.push(Pedestrian::spawn(spec)?);
        }

        if let Some(ego) = self.ego {
            if !index.contains_key(&ego) {
                return Err(SimError::UnknownElement { id: ego, what: "ego" });
            }
        }

        // ── Register events ───────────────────────────────────────────────
        let mut dispatcher = EventDispatcher::new(&self.behavior);
        for (id, viewer) in &self.events {
            if !index.contains_key(id) {
                return Err(SimError::UnknownElement { id: *id, what: "event" });
            }
            if !dispatcher.register(viewer, *id) {
                warn!(element = %id, kind = %viewer.kind, "event viewer not registered");
            }
        }

        info!(
            vehicles = vehicles.len(),
            pedestrians = pedestrians.len(),
            events = dispatcher.len(),
            "simulation built"
        );

        Ok(Sim {
            clock:        self.config.make_clock(),
            config:       self.config,
            behavior:     self.behavior,
            geometry:     self.geometry,
            trajectories: vec![Vec::new(); vehicles.len()],
            vehicles,
            pedestrians,
            ego:          self.ego,
            dispatcher,
            index,
            snapshot:     ElementMap::default(),
        })
    }
}
