//! Scene-side event descriptions.
//!
//! An [`EventViewer`] is what a scene loader produces for one event of one
//! element: the kind, the raw trigger rows and the parallel end-condition
//! list.  It is validated and turned into an [`Event`] on registration.
//!
//! # Repairs
//!
//! | Defect                                   | Repair                               |
//! |------------------------------------------|--------------------------------------|
//! | fewer end conditions than rows           | pad with `EndCondition::none()`      |
//! | more end conditions than rows            | drop the surplus                     |
//! | time trigger on a condition kind (or the reverse) | drop the row               |
//! | payload from another kind's family       | drop the row                         |
//!
//! Every repair logs a `warn!`.  Merge rows without a duration or offset
//! take `BehaviorConfig::default_merge_duration` / `default_merge_offset`.

use tracing::warn;

use tf_core::{BehaviorConfig, MoveDirection};

use crate::condition::{DistanceProjection, EndCondition, TriggerCondition, TriggerKind};
use crate::event::{Event, EventKind, EventPayload, TriggerRow};

// ── Row specs ─────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TriggerSpec {
    Time(f64),
    Ttc { threshold: f64, projection: DistanceProjection, trigger_index: u32 },
    EgoDistance { threshold: f64, projection: DistanceProjection, trigger_index: u32 },
}

impl TriggerSpec {
    pub fn kind(&self) -> TriggerKind {
        match self {
            TriggerSpec::Time(_)            => TriggerKind::Time,
            TriggerSpec::Ttc { .. }         => TriggerKind::Ttc,
            TriggerSpec::EgoDistance { .. } => TriggerKind::EgoDistance,
        }
    }

    fn into_condition(self) -> TriggerCondition {
        match self {
            TriggerSpec::Time(t) => TriggerCondition::time(t),
            TriggerSpec::Ttc { threshold, projection, trigger_index } => {
                TriggerCondition::ttc(threshold, projection, trigger_index)
            }
            TriggerSpec::EgoDistance { threshold, projection, trigger_index } => {
                TriggerCondition::ego_distance(threshold, projection, trigger_index)
            }
        }
    }
}

/// Payload as written in scene data.  Merge duration and offset may be
/// missing.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PayloadSpec {
    Acceleration(f64),
    Merge { direction: MoveDirection, duration: Option<f64>, offset: Option<f64> },
    Velocity(f64),
    PedestrianVelocity { direction_deg: f64, velocity: f64 },
}

impl PayloadSpec {
    fn resolve(self, cfg: &BehaviorConfig) -> EventPayload {
        match self {
            PayloadSpec::Acceleration(acc) => EventPayload::Acceleration { acc },
            PayloadSpec::Merge { direction, duration, offset } => EventPayload::Merge {
                direction,
                duration: duration.unwrap_or(cfg.default_merge_duration),
                offset:   offset.unwrap_or(cfg.default_merge_offset),
            },
            PayloadSpec::Velocity(velocity) => EventPayload::Velocity { velocity },
            PayloadSpec::PedestrianVelocity { direction_deg, velocity } => {
                EventPayload::PedestrianVelocity { direction_deg, velocity }
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RowSpec {
    pub trigger: TriggerSpec,
    pub payload: PayloadSpec,
}

impl RowSpec {
    pub fn new(trigger: TriggerSpec, payload: PayloadSpec) -> Self {
        Self { trigger, payload }
    }
}

// ── EventViewer ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct EventViewer {
    pub kind:           EventKind,
    /// `false` when the scene loader could not read this event.
    pub initialized:    bool,
    pub rows:           Vec<RowSpec>,
    pub end_conditions: Vec<EndCondition>,
}

impl EventViewer {
    pub fn new(kind: EventKind) -> Self {
        Self { kind, initialized: true, rows: Vec::new(), end_conditions: Vec::new() }
    }

    /// A viewer the loader failed to read; registration rejects it.
    pub fn uninitialized(kind: EventKind) -> Self {
        Self { initialized: false, ..Self::new(kind) }
    }

    pub fn with_row(mut self, trigger: TriggerSpec, payload: PayloadSpec) -> Self {
        self.rows.push(RowSpec::new(trigger, payload));
        self
    }

    pub fn with_end_conditions(mut self, end_conditions: Vec<EndCondition>) -> Self {
        self.end_conditions = end_conditions;
        self
    }

    /// `(time, acceleration)` rows.
    pub fn acceleration_by_time(rows: impl IntoIterator<Item = (f64, f64)>) -> Self {
        rows.into_iter().fold(Self::new(EventKind::AccelerationByTime), |v, (t, acc)| {
            v.with_row(TriggerSpec::Time(t), PayloadSpec::Acceleration(acc))
        })
    }

    /// `(time, velocity)` rows.
    pub fn velocity_by_time(rows: impl IntoIterator<Item = (f64, f64)>) -> Self {
        rows.into_iter().fold(Self::new(EventKind::VelocityByTime), |v, (t, vel)| {
            v.with_row(TriggerSpec::Time(t), PayloadSpec::Velocity(vel))
        })
    }

    /// `(time, direction, duration, offset)` rows.
    pub fn merge_by_time(
        rows: impl IntoIterator<Item = (f64, MoveDirection, Option<f64>, Option<f64>)>,
    ) -> Self {
        rows.into_iter().fold(Self::new(EventKind::MergeByTime), |v, (t, direction, duration, offset)| {
            v.with_row(TriggerSpec::Time(t), PayloadSpec::Merge { direction, duration, offset })
        })
    }

    /// `(time, direction_deg, velocity)` rows.
    pub fn pedestrian_by_time(rows: impl IntoIterator<Item = (f64, f64, f64)>) -> Self {
        rows.into_iter().fold(
            Self::new(EventKind::PedestrianTimeVelocity),
            |v, (t, direction_deg, velocity)| {
                v.with_row(TriggerSpec::Time(t), PayloadSpec::PedestrianVelocity { direction_deg, velocity })
            },
        )
    }

    pub fn acceleration_by_condition() -> Self {
        Self::new(EventKind::AccelerationByCondition)
    }

    pub fn merge_by_condition() -> Self {
        Self::new(EventKind::MergeByCondition)
    }

    pub fn velocity_by_condition() -> Self {
        Self::new(EventKind::VelocityByCondition)
    }

    pub fn pedestrian_by_condition() -> Self {
        Self::new(EventKind::PedestrianConditionVelocity)
    }

    /// Validate and convert into an unbound [`Event`].
    pub(crate) fn build_event(&self, cfg: &BehaviorConfig) -> Event {
        let mut ends = self.end_conditions.clone();
        if ends.len() != self.rows.len() {
            warn!(
                kind = %self.kind,
                rows = self.rows.len(),
                end_conditions = ends.len(),
                "trigger rows and end conditions differ in length, repairing"
            );
            ends.resize(self.rows.len(), EndCondition::none());
        }

        let time_based = self.kind.is_time_based();
        let rows = self
            .rows
            .iter()
            .zip(ends)
            .filter_map(|(spec, end)| {
                let is_time = spec.trigger.kind() == TriggerKind::Time;
                let payload = spec.payload.resolve(cfg);
                if is_time != time_based || !self.kind.accepts(&payload) {
                    warn!(
                        kind = %self.kind,
                        trigger = %spec.trigger.kind(),
                        ?payload,
                        "dropping trigger row that does not match its event kind"
                    );
                    return None;
                }
                Some(TriggerRow { condition: spec.trigger.into_condition(), payload, end })
            })
            .collect();

        Event::new(self.kind, rows)
    }
}
