//! Trigger rows' conditions and their paired end conditions.

use std::fmt;

// ── TriggerKind / DistanceProjection ──────────────────────────────────────────

/// Which domain a trigger row is evaluated in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TriggerKind {
    /// Elapsed simulation time.
    Time,
    /// Time-to-collision between the ego and the handler's element.
    Ttc,
    /// Distance from the ego to the handler's element.
    EgoDistance,
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TriggerKind::Time        => "time",
            TriggerKind::Ttc         => "ttc",
            TriggerKind::EgoDistance => "ego_distance",
        })
    }
}

/// How the distance between two elements is measured.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DistanceProjection {
    /// Planar distance between geometric centers.
    #[default]
    Euclidean,
    /// Longitudinal gap along the ego's lane reference line.
    LaneProjected,
}

// ── EdgeState ─────────────────────────────────────────────────────────────────

/// Two-way edge detector over a boolean condition.
///
/// The counter is the number of rising edges (out → in transitions)
/// observed so far.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeState {
    /// No observation yet.
    #[default]
    Undefined,
    InCondition(u32),
    OutCondition(u32),
}

impl EdgeState {
    /// Record one observation and report whether it is a firing edge.
    ///
    /// A first observation that is already satisfied is not a crossing and
    /// never fires.  Rising edge number `n` fires when
    /// `n >= max(trigger_index, 1)`.
    pub fn advance(&mut self, satisfied: bool, trigger_index: u32) -> bool {
        let (next, fired) = match (*self, satisfied) {
            (EdgeState::Undefined, true)        => (EdgeState::InCondition(0), false),
            (EdgeState::Undefined, false)       => (EdgeState::OutCondition(0), false),
            (EdgeState::OutCondition(n), true)  => {
                let edge = n + 1;
                (EdgeState::InCondition(edge), edge >= trigger_index.max(1))
            }
            (EdgeState::OutCondition(n), false) => (EdgeState::OutCondition(n), false),
            (EdgeState::InCondition(n), true)   => (EdgeState::InCondition(n), false),
            (EdgeState::InCondition(n), false)  => (EdgeState::OutCondition(n), false),
        };
        *self = next;
        fired
    }

    /// Rising edges observed so far.
    pub fn crossings(self) -> u32 {
        match self {
            EdgeState::Undefined => 0,
            EdgeState::InCondition(n) | EdgeState::OutCondition(n) => n,
        }
    }
}

// ── TriggerCondition ──────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TriggerCondition {
    pub kind:          TriggerKind,
    /// Seconds for `Time` and `Ttc`, metres for `EgoDistance`.
    pub threshold:     f64,
    pub projection:    DistanceProjection,
    pub edge:          EdgeState,
    /// Which rising edge counts as the fire (1-based; 0 behaves as 1).
    pub trigger_index: u32,
}

impl TriggerCondition {
    pub fn time(threshold: f64) -> Self {
        Self {
            kind:          TriggerKind::Time,
            threshold,
            projection:    DistanceProjection::Euclidean,
            edge:          EdgeState::Undefined,
            trigger_index: 0,
        }
    }

    pub fn ttc(threshold: f64, projection: DistanceProjection, trigger_index: u32) -> Self {
        Self { kind: TriggerKind::Ttc, threshold, projection, edge: EdgeState::Undefined, trigger_index }
    }

    pub fn ego_distance(threshold: f64, projection: DistanceProjection, trigger_index: u32) -> Self {
        Self {
            kind: TriggerKind::EgoDistance,
            threshold,
            projection,
            edge: EdgeState::Undefined,
            trigger_index,
        }
    }

    #[inline]
    pub fn is_time(&self) -> bool {
        self.kind == TriggerKind::Time
    }

    pub fn reset(&mut self) {
        self.edge = EdgeState::Undefined;
    }
}

// ── EndCondition ──────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EndConditionKind {
    /// The injected value holds until replaced.
    #[default]
    None,
    /// The injected value holds for `value` seconds.
    Time,
    /// The injected value holds until the speed reaches `value`.
    Velocity,
}

/// When an injected acceleration stops applying.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EndCondition {
    pub valid: bool,
    pub kind:  EndConditionKind,
    pub value: f64,
}

impl EndCondition {
    pub fn none() -> Self {
        Self { valid: true, kind: EndConditionKind::None, value: 0.0 }
    }

    pub fn time(secs: f64) -> Self {
        Self { valid: true, kind: EndConditionKind::Time, value: secs }
    }

    pub fn velocity(target: f64) -> Self {
        Self { valid: true, kind: EndConditionKind::Velocity, value: target }
    }

    /// `true` when this carries an actual stop rule.
    pub fn is_active(&self) -> bool {
        self.valid && self.kind != EndConditionKind::None
    }
}

impl Default for EndCondition {
    /// The repair value used when a trigger row has no paired end condition.
    fn default() -> Self {
        Self::none()
    }
}
