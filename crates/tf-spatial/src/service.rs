//! The geometry/query interface consumed by the event, vehicle and
//! trajectory crates.
//!
//! Everything above `tf-spatial` talks to the map through this trait, so a
//! host application can back it with its own HD-map cache.  [`LaneMap`] is
//! the in-memory implementation shipped with the workspace.
//!
//! # Thread safety
//!
//! Implementations must be `Send + Sync`: trajectory predictors of many
//! agents read the hashed-lane table concurrently within one tick.  The core
//! never mutates the service.

use tf_core::{LaneLinkId, LaneUid, RoadId, Side, Vec2};

use crate::curve::{Curve, Projection};
use crate::hashed::HashedLaneInfo;
use crate::map::{Lane, LaneLink, LaneLocator, LaneMap, LanePosition};

pub trait GeometryService: Send + Sync {
    fn lane(&self, uid: LaneUid) -> Option<&Lane>;

    fn lane_link(&self, id: LaneLinkId) -> Option<&LaneLink>;

    /// Reference line of a lane or link.
    fn curve(&self, locator: LaneLocator) -> Option<&Curve>;

    /// Lane immediately to the left in the same section.
    fn left_lane(&self, uid: LaneUid) -> Option<LaneUid>;

    /// Lane immediately to the right in the same section.
    fn right_lane(&self, uid: LaneUid) -> Option<LaneUid>;

    /// `true` when the boundary on `side` of `uid` must not be crossed.
    /// Unknown lanes report solid.
    fn is_boundary_solid(&self, uid: LaneUid, side: Side) -> bool;

    /// Lanes continuing `uid` in the next section of the same road.
    fn next_lanes(&self, uid: LaneUid) -> &[LaneUid];

    /// Junction connectors leaving the end of `uid`.
    fn links_from(&self, uid: LaneUid) -> &[LaneLinkId];

    /// `true` when `uid` is in the last section of its road.
    fn is_last_section(&self, uid: LaneUid) -> bool;

    /// Snap an absolute position onto the nearest reference line.
    fn locate(&self, pos: Vec2) -> Option<LanePosition>;

    /// Hashed span containing arc length `s` of `locator`.
    fn hashed_info(&self, locator: LaneLocator, s: f64) -> Option<HashedLaneInfo>;

    /// Spans directly following `info` in the direction of travel.
    fn hashed_successors(&self, info: &HashedLaneInfo) -> &[HashedLaneInfo];

    /// Road of a locator; links report the road they enter.
    fn road_of(&self, locator: LaneLocator) -> Option<RoadId>;

    // ── Provided ──────────────────────────────────────────────────────────

    fn adjacent_lane(&self, uid: LaneUid, side: Side) -> Option<LaneUid> {
        match side {
            Side::Left  => self.left_lane(uid),
            Side::Right => self.right_lane(uid),
        }
    }

    /// Arc length → `(position, heading)` with a lateral offset.
    fn pose_at(&self, locator: LaneLocator, s: f64, offset: f64) -> Option<(Vec2, f64)> {
        self.curve(locator).map(|c| c.pose_at(s, offset))
    }

    /// Position → `(s, l)` on the given reference line.
    fn project(&self, locator: LaneLocator, pos: Vec2) -> Option<Projection> {
        self.curve(locator).map(|c| c.project(pos))
    }
}

impl GeometryService for LaneMap {
    fn lane(&self, uid: LaneUid) -> Option<&Lane> {
        self.lanes.get(&uid)
    }

    fn lane_link(&self, id: LaneLinkId) -> Option<&LaneLink> {
        self.links.get(id.index())
    }

    fn curve(&self, locator: LaneLocator) -> Option<&Curve> {
        self.curve_of(locator)
    }

    fn left_lane(&self, uid: LaneUid) -> Option<LaneUid> {
        let left = uid.with_lane(uid.lane + 1);
        (left.lane < 0 && self.lanes.contains_key(&left)).then_some(left)
    }

    fn right_lane(&self, uid: LaneUid) -> Option<LaneUid> {
        let right = uid.with_lane(uid.lane - 1);
        self.lanes.contains_key(&right).then_some(right)
    }

    fn is_boundary_solid(&self, uid: LaneUid, side: Side) -> bool {
        self.lanes.get(&uid).is_none_or(|lane| match side {
            Side::Left  => lane.left_solid,
            Side::Right => lane.right_solid,
        })
    }

    fn next_lanes(&self, uid: LaneUid) -> &[LaneUid] {
        self.successors.get(&uid).map(Vec::as_slice).unwrap_or(&[])
    }

    fn links_from(&self, uid: LaneUid) -> &[LaneLinkId] {
        self.links_from.get(&uid).map(Vec::as_slice).unwrap_or(&[])
    }

    fn is_last_section(&self, uid: LaneUid) -> bool {
        self.last_section.get(&uid.road) == Some(&uid.section)
    }

    fn locate(&self, pos: Vec2) -> Option<LanePosition> {
        let locator = self.nearest_locator(pos)?;
        let proj = self.curve_of(locator)?.project(pos);
        Some(LanePosition { locator, s: proj.s, l: proj.l })
    }

    fn hashed_info(&self, locator: LaneLocator, s: f64) -> Option<HashedLaneInfo> {
        self.hashed_info_at(locator, s)
    }

    fn hashed_successors(&self, info: &HashedLaneInfo) -> &[HashedLaneInfo] {
        self.hashed.successors(info)
    }

    fn road_of(&self, locator: LaneLocator) -> Option<RoadId> {
        match locator {
            LaneLocator::Lane(uid) => Some(uid.road),
            LaneLocator::Link(id)  => self.links.get(id.index()).map(|l| l.to.road),
        }
    }
}
