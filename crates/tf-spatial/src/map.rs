//! In-memory lane-level map and builder.
//!
//! # Data layout
//!
//! Lanes are keyed by [`LaneUid`] in a `BTreeMap` so every iteration over
//! the map (index construction, hashed-segment tables, road graph) is in a
//! fixed order.  Lane links are stored densely and indexed by
//! `LaneLinkId`.  Adjacency is explicit:
//!
//! ```text
//! successors[lane]  → lanes of the next section of the same road
//! links_from[lane]  → junction connectors leaving the lane's end
//! link.to           → the lane a connector enters
//! ```
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) holds every polyline segment of every lane and
//! link.  `GeometryService::locate` uses it to snap an absolute position back onto
//! the nearest reference line, which is how vehicles recover their locator
//! after a lane change.

use std::collections::{BTreeMap, HashMap};

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use tf_core::{BehaviorConfig, LaneLinkId, LaneUid, RoadId, Side, Vec2};

use crate::curve::Curve;
use crate::hashed::{HashedLaneInfo, HashedTable};
use crate::{SpatialError, SpatialResult};

// ── Locators ──────────────────────────────────────────────────────────────────

/// Reference to the curve an element is travelling on: a lane, or a
/// junction connector.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LaneLocator {
    Lane(LaneUid),
    Link(LaneLinkId),
}

impl LaneLocator {
    #[inline]
    pub fn is_link(self) -> bool {
        matches!(self, LaneLocator::Link(_))
    }

    #[inline]
    pub fn lane(self) -> Option<LaneUid> {
        match self {
            LaneLocator::Lane(uid) => Some(uid),
            LaneLocator::Link(_)   => None,
        }
    }
}

impl std::fmt::Display for LaneLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaneLocator::Lane(uid) => write!(f, "{uid}"),
            LaneLocator::Link(id)  => write!(f, "{id}"),
        }
    }
}

/// A position expressed relative to a lane or link reference line.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LanePosition {
    pub locator: LaneLocator,
    /// Arc length along the reference line.
    pub s:       f64,
    /// Signed lateral offset, left positive.
    pub l:       f64,
}

// ── Lane / LaneLink ───────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Lane {
    pub uid:         LaneUid,
    pub curve:       Curve,
    pub width:       f64,
    /// Boundary markings; a solid boundary forbids crossing to that side.
    pub left_solid:  bool,
    pub right_solid: bool,
}

#[derive(Clone, Debug)]
pub struct LaneLink {
    pub id:    LaneLinkId,
    pub from:  LaneUid,
    pub to:    LaneUid,
    pub curve: Curve,
}

// ── R-tree segment entry ──────────────────────────────────────────────────────

/// One polyline segment of a lane or link reference line.
#[derive(Clone)]
struct SegmentEntry {
    a:       [f64; 2],
    b:       [f64; 2],
    locator: LaneLocator,
}

impl RTreeObject for SegmentEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.a, self.b)
    }
}

impl PointDistance for SegmentEntry {
    /// Squared distance from `point` to the closest point of the segment.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let a = Vec2::new(self.a[0], self.a[1]);
        let b = Vec2::new(self.b[0], self.b[1]);
        let p = Vec2::new(point[0], point[1]);
        let ab = b - a;
        let len2 = ab.dot(ab);
        let t = if len2 > 0.0 { ((p - a).dot(ab) / len2).clamp(0.0, 1.0) } else { 0.0 };
        let d = p - (a + ab * t);
        d.dot(d)
    }
}

// ── LaneMap ───────────────────────────────────────────────────────────────────

/// Immutable lane-level map.  Build with [`LaneMapBuilder`].
///
/// `LaneMap` is `Send + Sync` and never mutated after `build()`, so any
/// number of trajectory predictors may read it concurrently.
pub struct LaneMap {
    pub(crate) lanes:        BTreeMap<LaneUid, Lane>,
    pub(crate) links:        Vec<LaneLink>,
    pub(crate) successors:   HashMap<LaneUid, Vec<LaneUid>>,
    pub(crate) links_from:   HashMap<LaneUid, Vec<LaneLinkId>>,
    /// Highest section index of each road.
    pub(crate) last_section: HashMap<RoadId, u32>,
    pub(crate) hashed:       HashedTable,
    spatial_idx:             RTree<SegmentEntry>,
}

impl LaneMap {
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn lanes(&self) -> impl Iterator<Item = &Lane> + '_ {
        self.lanes.values()
    }

    pub fn links(&self) -> &[LaneLink] {
        &self.links
    }

    pub(crate) fn nearest_locator(&self, pos: Vec2) -> Option<LaneLocator> {
        self.spatial_idx.nearest_neighbor(&[pos.x, pos.y]).map(|e| e.locator)
    }

    pub(crate) fn curve_of(&self, locator: LaneLocator) -> Option<&Curve> {
        match locator {
            LaneLocator::Lane(uid) => self.lanes.get(&uid).map(|l| &l.curve),
            LaneLocator::Link(id)  => self.links.get(id.index()).map(|l| &l.curve),
        }
    }

    pub(crate) fn hashed_info_at(&self, locator: LaneLocator, s: f64) -> Option<HashedLaneInfo> {
        let curve = self.curve_of(locator)?;
        Some(self.hashed.info_at(locator, curve.length(), s))
    }

    /// Roads reachable from the end of `road` (next section continuation is
    /// internal to a road, so only lane links contribute).
    pub fn road_successors(&self, road: RoadId) -> Vec<RoadId> {
        let mut out: Vec<RoadId> = self
            .links
            .iter()
            .filter(|l| l.from.road == road)
            .map(|l| l.to.road)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Road length: sum over sections of the longest lane in the section.
    pub fn road_length(&self, road: RoadId) -> Option<f64> {
        let mut per_section: BTreeMap<u32, f64> = BTreeMap::new();
        for lane in self.lanes.values().filter(|l| l.uid.road == road) {
            let e = per_section.entry(lane.uid.section).or_insert(0.0);
            *e = e.max(lane.curve.length());
        }
        (!per_section.is_empty()).then(|| per_section.values().sum())
    }

    pub fn has_road(&self, road: RoadId) -> bool {
        self.last_section.contains_key(&road)
    }
}

// ── LaneMapBuilder ────────────────────────────────────────────────────────────

/// Construct a [`LaneMap`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use tf_core::{LaneUid, Vec2};
/// use tf_spatial::LaneMapBuilder;
///
/// let mut b = LaneMapBuilder::new();
/// let lanes = b.add_straight_section(1, 0, Vec2::ZERO, 0.0, 200.0, 2, 3.5).unwrap();
/// assert_eq!(lanes, vec![LaneUid::new(1, 0, -1), LaneUid::new(1, 0, -2)]);
/// let map = b.build();
/// assert_eq!(map.lane_count(), 2);
/// ```
pub struct LaneMapBuilder {
    lanes:          BTreeMap<LaneUid, Lane>,
    links:          Vec<LaneLink>,
    successors:     Vec<(LaneUid, LaneUid)>,
    segment_length: f64,
}

impl LaneMapBuilder {
    pub fn new() -> Self {
        Self {
            lanes:          BTreeMap::new(),
            links:          Vec::new(),
            successors:     Vec::new(),
            segment_length: 20.0,
        }
    }

    /// A builder using `behavior.hashed_segment_length`.
    pub fn from_behavior(behavior: &BehaviorConfig) -> Self {
        Self::new().hashed_segment_length(behavior.hashed_segment_length)
    }

    /// Arc length of one hashed lane segment (default 20 m).
    pub fn hashed_segment_length(mut self, len: f64) -> Self {
        if len > 0.0 {
            self.segment_length = len;
        }
        self
    }

    /// Add a lane with the given reference line and width.  Boundaries are
    /// dashed until [`set_solid_boundary`](Self::set_solid_boundary).
    pub fn add_lane(&mut self, uid: LaneUid, points: Vec<Vec2>, width: f64) -> SpatialResult<()> {
        if self.lanes.contains_key(&uid) {
            return Err(SpatialError::DuplicateLane(uid));
        }
        let curve = Curve::new(points)?;
        self.lanes.insert(uid, Lane {
            uid,
            curve,
            width,
            left_solid:  false,
            right_solid: false,
        });
        Ok(())
    }

    /// Add `lane_count` parallel straight lanes forming one road section.
    ///
    /// Lane `-1` runs along the reference line starting at `start`; lane
    /// `-k` is offset `(k-1) * lane_width` to its right.  Returns the new
    /// lane ids, leftmost first.
    #[allow(clippy::too_many_arguments)]
    pub fn add_straight_section(
        &mut self,
        road:       u32,
        section:    u32,
        start:      Vec2,
        heading:    f64,
        length:     f64,
        lane_count: u32,
        lane_width: f64,
    ) -> SpatialResult<Vec<LaneUid>> {
        let dir = Vec2::from_heading(heading);
        let right = -dir.perp();
        let mut uids = Vec::with_capacity(lane_count as usize);
        for k in 1..=lane_count {
            let uid = LaneUid::new(road, section, -(k as i32));
            let a = start + right * (lane_width * (k - 1) as f64);
            self.add_lane(uid, vec![a, a + dir * length], lane_width)?;
            uids.push(uid);
        }
        Ok(uids)
    }

    pub fn set_solid_boundary(&mut self, uid: LaneUid, side: Side, solid: bool) -> SpatialResult<()> {
        let lane = self.lanes.get_mut(&uid).ok_or(SpatialError::LaneNotFound(uid))?;
        match side {
            Side::Left  => lane.left_solid = solid,
            Side::Right => lane.right_solid = solid,
        }
        Ok(())
    }

    /// Declare that `to` (next section of the same road) continues `from`.
    pub fn connect(&mut self, from: LaneUid, to: LaneUid) -> SpatialResult<()> {
        for uid in [from, to] {
            if !self.lanes.contains_key(&uid) {
                return Err(SpatialError::LaneNotFound(uid));
            }
        }
        if from.road != to.road || to.section != from.section + 1 {
            return Err(SpatialError::InvalidConnection {
                from,
                to,
                reason: "successor must be in the next section of the same road",
            });
        }
        self.successors.push((from, to));
        Ok(())
    }

    /// Connect every lane of one section to the same-index lane of the next
    /// section, where both exist.
    pub fn connect_sections(&mut self, road: u32, section: u32) -> SpatialResult<()> {
        let pairs: Vec<(LaneUid, LaneUid)> = self
            .lanes
            .keys()
            .filter(|uid| uid.road.0 == road && uid.section == section)
            .map(|&uid| (uid, LaneUid { section: section + 1, ..uid }))
            .filter(|(_, next)| self.lanes.contains_key(next))
            .collect();
        for (from, to) in pairs {
            self.connect(from, to)?;
        }
        Ok(())
    }

    /// Add a junction connector from the end of `from` to the start of `to`.
    ///
    /// With `points = None` the connector is the straight chord between the
    /// two lane ends.
    pub fn add_lane_link(
        &mut self,
        from:   LaneUid,
        to:     LaneUid,
        points: Option<Vec<Vec2>>,
    ) -> SpatialResult<LaneLinkId> {
        let from_end = self.lanes.get(&from).ok_or(SpatialError::LaneNotFound(from))?.curve.end();
        let to_start = self.lanes.get(&to).ok_or(SpatialError::LaneNotFound(to))?.curve.start();
        let curve = Curve::new(points.unwrap_or_else(|| vec![from_end, to_start]))?;
        let id = LaneLinkId(self.links.len() as u32);
        self.links.push(LaneLink { id, from, to, curve });
        Ok(id)
    }

    /// Consume the builder and produce a [`LaneMap`].
    pub fn build(self) -> LaneMap {
        let mut successors: HashMap<LaneUid, Vec<LaneUid>> = HashMap::new();
        for (from, to) in self.successors {
            let v = successors.entry(from).or_default();
            if !v.contains(&to) {
                v.push(to);
            }
        }
        for v in successors.values_mut() {
            v.sort_unstable();
        }

        let mut links_from: HashMap<LaneUid, Vec<LaneLinkId>> = HashMap::new();
        for link in &self.links {
            links_from.entry(link.from).or_default().push(link.id);
        }

        let mut last_section: HashMap<RoadId, u32> = HashMap::new();
        for uid in self.lanes.keys() {
            let e = last_section.entry(uid.road).or_insert(uid.section);
            *e = (*e).max(uid.section);
        }

        // Bulk-load the R-tree: O(N log N), faster than N inserts.
        let mut entries = Vec::new();
        let curves = self
            .lanes
            .values()
            .map(|l| (LaneLocator::Lane(l.uid), &l.curve))
            .chain(self.links.iter().map(|l| (LaneLocator::Link(l.id), &l.curve)));
        for (locator, curve) in curves {
            for w in curve.points().windows(2) {
                entries.push(SegmentEntry {
                    a: [w[0].x, w[0].y],
                    b: [w[1].x, w[1].y],
                    locator,
                });
            }
        }
        let spatial_idx = RTree::bulk_load(entries);

        let hashed = HashedTable::build(
            self.segment_length,
            &self.lanes,
            &self.links,
            &successors,
            &links_from,
        );

        LaneMap {
            lanes: self.lanes,
            links: self.links,
            successors,
            links_from,
            last_section,
            hashed,
            spatial_idx,
        }
    }
}

impl Default for LaneMapBuilder {
    fn default() -> Self {
        Self::new()
    }
}
