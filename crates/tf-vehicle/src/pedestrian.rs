//! Pedestrians: straight-line walkers steered by pedestrian events.

use tracing::debug;

use tf_core::geo::wrap_angle;
use tf_core::{ElementId, Polygon, TimeParam, Vec2};
use tf_event::{EventHandler, EventPayload, FiredEvent, HitUtilInfo};

use crate::{VehicleError, VehicleResult};

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PedestrianSpec {
    pub id:       ElementId,
    pub position: Vec2,
    pub heading:  f64,
    pub velocity: f64,
    pub length:   f64,
    pub width:    f64,
}

impl PedestrianSpec {
    pub fn new(id: ElementId, position: Vec2, heading: f64, velocity: f64) -> Self {
        Self { id, position, heading, velocity, length: 0.5, width: 0.5 }
    }
}

#[derive(Clone, Debug)]
pub struct Pedestrian {
    id:       ElementId,
    alive:    bool,
    position: Vec2,
    heading:  f64,
    velocity: f64,
    length:   f64,
    width:    f64,
    polygon:  Polygon,
}

impl Pedestrian {
    pub fn spawn(spec: PedestrianSpec) -> VehicleResult<Self> {
        let id = spec.id;
        if !(spec.length > 0.0 && spec.width > 0.0) {
            return Err(VehicleError::InvalidDimensions { id, length: spec.length, width: spec.width });
        }
        if !spec.velocity.is_finite() || spec.velocity < 0.0 {
            return Err(VehicleError::InvalidSpeed { id, speed: spec.velocity });
        }
        Ok(Self {
            id,
            alive: true,
            position: spec.position,
            heading: spec.heading,
            velocity: spec.velocity,
            length: spec.length,
            width: spec.width,
            polygon: Polygon::oriented_box(spec.position, spec.heading, spec.length, spec.width),
        })
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn kill(&mut self) {
        self.alive = false;
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    /// Walk one step along the current heading.
    pub fn update(&mut self, time: &TimeParam) -> bool {
        if !self.alive {
            return false;
        }
        self.position += Vec2::from_heading(self.heading) * (self.velocity * time.relative_time);
        self.polygon = Polygon::oriented_box(self.position, self.heading, self.length, self.width);
        true
    }
}

impl EventHandler for Pedestrian {
    fn hit_info(&self) -> HitUtilInfo {
        if !self.alive {
            return HitUtilInfo::invalid(self.id);
        }
        HitUtilInfo {
            element:  self.id,
            valid:    true,
            center:   self.position,
            heading:  self.heading,
            velocity: Vec2::from_heading(self.heading) * self.velocity,
            polygon:  self.polygon.clone(),
            lane:     None,
        }
    }

    /// Only pedestrian events apply: the heading turns by `direction_deg`
    /// (counter-clockwise) and the walking speed is replaced.
    fn handle_event(&mut self, event: &FiredEvent) -> bool {
        if !self.alive {
            return false;
        }
        let EventPayload::PedestrianVelocity { direction_deg, velocity } = event.payload else {
            return false;
        };
        self.heading = wrap_angle(self.heading + direction_deg.to_radians());
        self.velocity = velocity.max(0.0);
        self.polygon = Polygon::oriented_box(self.position, self.heading, self.length, self.width);
        debug!(element = %self.id, heading = self.heading, v = self.velocity, "pedestrian redirected");
        true
    }
}
