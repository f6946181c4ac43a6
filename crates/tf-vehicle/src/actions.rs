//! Lateral-distance and merge actions.

use tf_core::{ElementId, MoveDirection, Polygon, Vec2};
use tf_event::HitUtilInfo;

/// Hold a signed lateral distance to another element.
///
/// Distances are measured along the target's left axis: positive when this
/// vehicle is to the target's left.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LateralDistanceAction {
    pub target:     ElementId,
    pub distance:   f64,
    /// Measure edge to edge between footprints instead of center to center.
    pub freespace:  bool,
    /// Keep holding after the distance is reached.
    pub continuous: bool,
    pub max_acc:    f64,
    pub max_dec:    f64,
    pub max_speed:  f64,
}

impl LateralDistanceAction {
    pub fn new(target: ElementId, distance: f64) -> Self {
        Self {
            target,
            distance,
            freespace:  false,
            continuous: false,
            max_acc:    3.0,
            max_dec:    3.0,
            max_speed:  2.0,
        }
    }

    pub fn freespace(mut self, freespace: bool) -> Self {
        self.freespace = freespace;
        self
    }

    pub fn continuous(mut self, continuous: bool) -> Self {
        self.continuous = continuous;
        self
    }

    pub fn limits(mut self, max_acc: f64, max_dec: f64, max_speed: f64) -> Self {
        self.max_acc = max_acc;
        self.max_dec = max_dec;
        self.max_speed = max_speed;
        self
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.target.is_valid()
            && self.distance.is_finite()
            && self.max_acc > 0.0
            && self.max_dec > 0.0
            && self.max_speed > 0.0
    }

    /// Current signed distance of `own` relative to `target`.
    pub fn measure(&self, own_center: Vec2, own_polygon: &Polygon, target: &HitUtilInfo) -> f64 {
        let axis = Vec2::from_heading(target.heading).perp();
        let center = (own_center - target.center).dot(axis);
        if !self.freespace {
            return center;
        }
        signed_gap(own_polygon, &target.polygon, target.center, axis).unwrap_or(center)
    }
}

/// Signed gap between two footprints along `axis`: zero when their
/// projections overlap, positive when `own` lies on the `+axis` side.
pub fn signed_gap(own: &Polygon, target: &Polygon, origin: Vec2, axis: Vec2) -> Option<f64> {
    let (own_lo, own_hi) = own.project_onto(origin, axis)?;
    let (tgt_lo, tgt_hi) = target.project_onto(origin, axis)?;
    Some(if own_lo >= tgt_hi {
        own_lo - tgt_hi
    } else if own_hi <= tgt_lo {
        own_hi - tgt_lo
    } else {
        0.0
    })
}

/// A lateral-distance action together with its controller state.
#[derive(Clone, Debug)]
pub(crate) struct LateralControl {
    pub action:     LateralDistanceAction,
    pub last_speed: f64,
}

impl LateralControl {
    pub(crate) fn new(action: LateralDistanceAction) -> Self {
        Self { action, last_speed: 0.0 }
    }

    /// One step of the capped difference equation closing `error` metres.
    /// Returns the new lateral speed along the target's left axis.
    pub(crate) fn step(&mut self, error: f64, dt: f64) -> f64 {
        let a = &self.action;
        let wanted = error / dt;
        let acc = ((wanted - self.last_speed) / dt).clamp(-a.max_dec, a.max_acc);
        let speed = (self.last_speed + acc * dt).clamp(-a.max_speed, a.max_speed);
        self.last_speed = speed;
        speed
    }
}

/// A merge injected by an event, launched on the next update.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MergeAction {
    pub direction: MoveDirection,
    pub duration:  f64,
    /// Lateral shift for in-lane merges.
    pub offset:    f64,
    /// Set once the underlying lane change has started.
    pub launched:  bool,
}
