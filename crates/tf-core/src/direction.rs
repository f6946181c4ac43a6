//! Lane-relative movement directions.

use crate::TfError;

/// Lateral side of a lane, in the direction of travel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// `+1.0` for left, `-1.0` for right (left-positive lateral offsets).
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Side::Left  => 1.0,
            Side::Right => -1.0,
        }
    }
}

/// Requested lateral movement, as carried by merge events and explicit
/// maneuver requests.
///
/// The integer codes are the ones used by scene descriptions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoveDirection {
    RightInLane,
    Right,
    #[default]
    Straight,
    Left,
    LeftInLane,
}

impl MoveDirection {
    pub fn code(self) -> i32 {
        match self {
            MoveDirection::RightInLane => -2,
            MoveDirection::Right       => -1,
            MoveDirection::Straight    => 0,
            MoveDirection::Left        => 1,
            MoveDirection::LeftInLane  => 2,
        }
    }

    /// Side of the movement, `None` for `Straight`.
    pub fn side(self) -> Option<Side> {
        match self {
            MoveDirection::Left | MoveDirection::LeftInLane   => Some(Side::Left),
            MoveDirection::Right | MoveDirection::RightInLane => Some(Side::Right),
            MoveDirection::Straight                           => None,
        }
    }

    /// `true` for the shift-within-the-lane variants.
    pub fn is_in_lane(self) -> bool {
        matches!(self, MoveDirection::LeftInLane | MoveDirection::RightInLane)
    }
}

impl TryFrom<i32> for MoveDirection {
    type Error = TfError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            -2 => Ok(MoveDirection::RightInLane),
            -1 => Ok(MoveDirection::Right),
            0  => Ok(MoveDirection::Straight),
            1  => Ok(MoveDirection::Left),
            2  => Ok(MoveDirection::LeftInLane),
            other => Err(TfError::Parse(format!("invalid move direction code {other}"))),
        }
    }
}
