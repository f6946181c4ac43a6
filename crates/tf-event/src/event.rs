//! Event kinds, payloads, and the per-event evaluation step.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use tf_core::{ElementId, MoveDirection, TimeParam};
use tf_spatial::GeometryService;

use crate::condition::{EndCondition, TriggerCondition};
use crate::handler::HandlerRegistry;
use crate::trigger::evaluate_condition;
use crate::EventError;

// ── EventKind ─────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    AccelerationByTime,
    AccelerationByCondition,
    MergeByTime,
    MergeByCondition,
    VelocityByTime,
    VelocityByCondition,
    PedestrianTimeVelocity,
    PedestrianConditionVelocity,
}

impl EventKind {
    /// Every kind, in flush order.
    pub const ALL: [EventKind; 8] = [
        EventKind::AccelerationByTime,
        EventKind::AccelerationByCondition,
        EventKind::MergeByTime,
        EventKind::MergeByCondition,
        EventKind::VelocityByTime,
        EventKind::VelocityByCondition,
        EventKind::PedestrianTimeVelocity,
        EventKind::PedestrianConditionVelocity,
    ];

    /// Position in [`ALL`](Self::ALL).
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn is_time_based(self) -> bool {
        matches!(
            self,
            EventKind::AccelerationByTime
                | EventKind::MergeByTime
                | EventKind::VelocityByTime
                | EventKind::PedestrianTimeVelocity
        )
    }

    /// `true` when `payload` belongs to this kind's family.
    pub fn accepts(self, payload: &EventPayload) -> bool {
        matches!(
            (self, payload),
            (
                EventKind::AccelerationByTime | EventKind::AccelerationByCondition,
                EventPayload::Acceleration { .. }
            ) | (EventKind::MergeByTime | EventKind::MergeByCondition, EventPayload::Merge { .. })
                | (
                    EventKind::VelocityByTime | EventKind::VelocityByCondition,
                    EventPayload::Velocity { .. }
                )
                | (
                    EventKind::PedestrianTimeVelocity | EventKind::PedestrianConditionVelocity,
                    EventPayload::PedestrianVelocity { .. }
                )
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::AccelerationByTime          => "acc_time",
            EventKind::AccelerationByCondition     => "acc_condition",
            EventKind::MergeByTime                 => "merge_time",
            EventKind::MergeByCondition            => "merge_condition",
            EventKind::VelocityByTime              => "velocity_time",
            EventKind::VelocityByCondition         => "velocity_condition",
            EventKind::PedestrianTimeVelocity      => "pedestrian_time",
            EventKind::PedestrianConditionVelocity => "pedestrian_condition",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        EventKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| EventError::Parse(format!("unknown event kind {s:?}")))
    }
}

// ── Payload ───────────────────────────────────────────────────────────────────

/// Value injected into the handler when a row fires.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventPayload {
    Acceleration { acc: f64 },
    Merge { direction: MoveDirection, duration: f64, offset: f64 },
    Velocity { velocity: f64 },
    /// Heading change in degrees (counter-clockwise) and new walking speed.
    PedestrianVelocity { direction_deg: f64, velocity: f64 },
}

/// One pending row of an event.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TriggerRow {
    pub condition: TriggerCondition,
    pub payload:   EventPayload,
    pub end:       EndCondition,
}

/// What a handler receives when a row fires.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FiredEvent {
    pub kind:          EventKind,
    pub payload:       EventPayload,
    pub end_condition: EndCondition,
}

// ── Event ─────────────────────────────────────────────────────────────────────

/// One registered event: a kind, its pending rows, and one bound handler.
#[derive(Clone, Debug)]
pub struct Event {
    kind:       EventKind,
    rows:       Vec<TriggerRow>,
    handler:    Option<ElementId>,
    alive:      bool,
    last_value: Option<EventPayload>,
}

impl Event {
    pub fn new(kind: EventKind, rows: Vec<TriggerRow>) -> Self {
        Self { kind, rows, handler: None, alive: true, last_value: None }
    }

    /// Bind the single handler of this event.
    ///
    /// # Panics
    ///
    /// If a handler is already bound.
    pub fn bind_handler(&mut self, handler: ElementId) {
        assert!(
            self.handler.is_none(),
            "{} event already bound to {:?}, refusing to rebind to {handler}",
            self.kind,
            self.handler,
        );
        self.handler = Some(handler);
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn rows(&self) -> &[TriggerRow] {
        &self.rows
    }

    pub fn handler(&self) -> Option<ElementId> {
        self.handler
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn kill(&mut self) {
        self.alive = false;
    }

    /// Payload of the last row that fired during the most recent evaluation.
    pub fn last_value(&self) -> Option<EventPayload> {
        self.last_value
    }

    /// Forget all edge observations; every condition row starts over.
    pub fn reset_triggers(&mut self) {
        for row in &mut self.rows {
            row.condition.reset();
        }
    }

    /// Evaluate every pending row once.  Always returns `true`; problems are
    /// logged so one event never stalls the rest of the flush.
    pub fn trigger_event(
        &mut self,
        time:     &TimeParam,
        registry: &mut dyn HandlerRegistry,
        geometry: &dyn GeometryService,
    ) -> bool {
        self.evaluate(time, registry, geometry);
        true
    }

    /// Returns the number of handler invocations.
    pub(crate) fn evaluate(
        &mut self,
        time:     &TimeParam,
        registry: &mut dyn HandlerRegistry,
        geometry: &dyn GeometryService,
    ) -> usize {
        self.last_value = None;
        if !self.alive || self.rows.is_empty() {
            return 0;
        }
        let Some(handler_id) = self.handler else {
            warn!(kind = %self.kind, "event has no bound handler");
            return 0;
        };
        let ego = registry.ego();
        let Some(handler) = registry.handler_mut(handler_id) else {
            warn!(kind = %self.kind, handler = %handler_id, "bound handler not found");
            return 0;
        };

        let kind = self.kind;
        let last_value = &mut self.last_value;
        let mut invoked = 0;

        self.rows.retain_mut(|row| {
            let other = handler.hit_info();
            if !evaluate_condition(&mut row.condition, time.pass_time, ego.as_ref(), &other, geometry) {
                return true;
            }
            *last_value = Some(row.payload);
            let accepted = handler.handle_event(&FiredEvent {
                kind,
                payload:       row.payload,
                end_condition: row.end,
            });
            invoked += 1;
            debug!(%kind, handler = %handler_id, accepted, t = time.pass_time, "event fired");
            // Time rows are one-shot; condition rows persist until accepted.
            !(kind.is_time_based() || accepted)
        });
        invoked
    }
}
