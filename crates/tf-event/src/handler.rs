//! The handler side of event dispatch.
//!
//! Events never own the elements they act on.  An event stores the
//! `ElementId` of its bound handler and asks a [`HandlerRegistry`] for it at
//! flush time.  The registry is usually the simulation's element store.

use std::collections::HashMap;
use std::hash::BuildHasher;

use tf_core::{ElementId, Polygon, Vec2};
use tf_spatial::LanePosition;

use crate::event::FiredEvent;

/// Read-only geometric snapshot of one element, used by trigger evaluation
/// and by lateral-distance actions.
#[derive(Clone, Debug, PartialEq)]
pub struct HitUtilInfo {
    pub element:  ElementId,
    /// `false` when the element has no usable geometry (dead or not placed).
    pub valid:    bool,
    pub center:   Vec2,
    pub heading:  f64,
    pub velocity: Vec2,
    pub polygon:  Polygon,
    /// Position relative to the reference line the element is travelling on.
    pub lane:     Option<LanePosition>,
}

impl HitUtilInfo {
    /// Snapshot of an element that must not trigger anything.
    pub fn invalid(element: ElementId) -> Self {
        Self {
            element,
            valid:    false,
            center:   Vec2::ZERO,
            heading:  0.0,
            velocity: Vec2::ZERO,
            polygon:  Polygon::default(),
            lane:     None,
        }
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }
}

/// Anything an event can be bound to.
pub trait EventHandler {
    fn hit_info(&self) -> HitUtilInfo;

    /// Apply a fired event.  Returning `false` asks condition-based events to
    /// retry on a later tick.
    fn handle_event(&mut self, event: &FiredEvent) -> bool;
}

/// Lookup of live handlers by element id.
pub trait HandlerRegistry {
    fn handler_mut(&mut self, id: ElementId) -> Option<&mut dyn EventHandler>;

    /// Snapshot of the ego element, the reference for TTC and ego-distance
    /// triggers.  `None` when the scene has no ego.
    fn ego(&self) -> Option<HitUtilInfo>;
}

/// Lookup of snapshots by element id.
pub trait HitInfoSource {
    fn hit_info_of(&self, id: ElementId) -> Option<&HitUtilInfo>;
}

impl<S: BuildHasher> HitInfoSource for HashMap<ElementId, HitUtilInfo, S> {
    fn hit_info_of(&self, id: ElementId) -> Option<&HitUtilInfo> {
        self.get(&id)
    }
}
