//! Maneuver states of a vehicle.

use std::fmt;

use tf_core::Side;

/// What a vehicle is doing laterally.
///
/// ```text
/// LaneKeep ─switch_lane──► Turn{Left,Right}Start ─► Turn{Left,Right}Ing ─► LaneKeep
///          ─change_in_lane► Turn*InLaneStart ─────► Turn*InLaneIng ─────► LaneKeep
///                                  Turn{Left,Right}Ing ─abort─► Abort ──► LaneKeep
///          ─lateral action─► LateralAction ─────────────────────────────► LaneKeep
///          ─merge event───► MergeAction ─(next update)─► Turn*Start | LaneKeep
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ManeuverState {
    #[default]
    LaneKeep,
    TurnLeftStart,
    TurnLeftIng,
    TurnRightStart,
    TurnRightIng,
    TurnLeftInLaneStart,
    TurnLeftInLaneIng,
    TurnRightInLaneStart,
    TurnRightInLaneIng,
    Abort,
    LateralAction,
    MergeAction,
}

impl ManeuverState {
    pub(crate) fn start(side: Side, in_lane: bool) -> Self {
        match (side, in_lane) {
            (Side::Left, false)  => ManeuverState::TurnLeftStart,
            (Side::Right, false) => ManeuverState::TurnRightStart,
            (Side::Left, true)   => ManeuverState::TurnLeftInLaneStart,
            (Side::Right, true)  => ManeuverState::TurnRightInLaneStart,
        }
    }

    /// The `*Ing` state following a `*Start` state; other states map to
    /// themselves.
    pub(crate) fn to_ing(self) -> Self {
        match self {
            ManeuverState::TurnLeftStart        => ManeuverState::TurnLeftIng,
            ManeuverState::TurnRightStart       => ManeuverState::TurnRightIng,
            ManeuverState::TurnLeftInLaneStart  => ManeuverState::TurnLeftInLaneIng,
            ManeuverState::TurnRightInLaneStart => ManeuverState::TurnRightInLaneIng,
            other => other,
        }
    }

    pub fn is_start(self) -> bool {
        matches!(
            self,
            ManeuverState::TurnLeftStart
                | ManeuverState::TurnRightStart
                | ManeuverState::TurnLeftInLaneStart
                | ManeuverState::TurnRightInLaneStart
        )
    }

    pub fn is_ing(self) -> bool {
        matches!(
            self,
            ManeuverState::TurnLeftIng
                | ManeuverState::TurnRightIng
                | ManeuverState::TurnLeftInLaneIng
                | ManeuverState::TurnRightInLaneIng
        )
    }

    /// Any lane change or in-lane shift, including an abort in progress.
    pub fn is_lane_change(self) -> bool {
        self.is_start() || self.is_ing() || self == ManeuverState::Abort
    }

    pub fn is_in_lane(self) -> bool {
        matches!(
            self,
            ManeuverState::TurnLeftInLaneStart
                | ManeuverState::TurnLeftInLaneIng
                | ManeuverState::TurnRightInLaneStart
                | ManeuverState::TurnRightInLaneIng
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ManeuverState::LaneKeep             => "lane_keep",
            ManeuverState::TurnLeftStart        => "turn_left_start",
            ManeuverState::TurnLeftIng          => "turn_left_ing",
            ManeuverState::TurnRightStart       => "turn_right_start",
            ManeuverState::TurnRightIng         => "turn_right_ing",
            ManeuverState::TurnLeftInLaneStart  => "turn_left_in_lane_start",
            ManeuverState::TurnLeftInLaneIng    => "turn_left_in_lane_ing",
            ManeuverState::TurnRightInLaneStart => "turn_right_in_lane_start",
            ManeuverState::TurnRightInLaneIng   => "turn_right_in_lane_ing",
            ManeuverState::Abort                => "abort",
            ManeuverState::LateralAction        => "lateral_action",
            ManeuverState::MergeAction          => "merge_action",
        }
    }
}

impl fmt::Display for ManeuverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
