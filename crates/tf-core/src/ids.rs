//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

typed_id! {
    /// Scene element (vehicle, pedestrian, ego) identifier, as assigned by
    /// the scene description.
    pub struct ElementId(u32);
}

typed_id! {
    /// Road identifier in the HD map.
    pub struct RoadId(u32);
}

typed_id! {
    /// Junction connector ("lane link") identifier.
    pub struct LaneLinkId(u32);
}

/// Fully qualified lane identifier: road, section within the road, and the
/// signed lane index inside the section.
///
/// Lane indices follow the map convention for the driving side: `-1` is the
/// leftmost lane, `-2` the one to its right, and so on.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaneUid {
    pub road:    RoadId,
    pub section: u32,
    pub lane:    i32,
}

impl LaneUid {
    #[inline]
    pub const fn new(road: u32, section: u32, lane: i32) -> Self {
        Self { road: RoadId(road), section, lane }
    }

    /// Same road and section, different lane index.
    #[inline]
    pub fn with_lane(self, lane: i32) -> Self {
        Self { lane, ..self }
    }
}

impl fmt::Display for LaneUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lane({}, {}, {})", self.road.0, self.section, self.lane)
    }
}
