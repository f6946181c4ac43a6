//! Hashed lane segments.
//!
//! Each lane and link is cut into fixed-length spans of arc length.  A span
//! is identified by `(locator, index)`; its bounds are a pure function of
//! the curve length, so lookup is O(1) without a table.  Forward adjacency
//! between spans (the expensive part: it crosses section boundaries and
//! junctions) is precomputed once at map build time.

use std::collections::{BTreeMap, HashMap};

use tf_core::{LaneLinkId, LaneUid};

use crate::map::{Lane, LaneLink, LaneLocator};

/// Descriptor of one bounded arc-length span of a lane or lane link.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HashedLaneInfo {
    pub locator: LaneLocator,
    pub index:   u32,
    pub start_s: f64,
    pub end_s:   f64,
}

impl HashedLaneInfo {
    #[inline]
    pub fn length(&self) -> f64 {
        self.end_s - self.start_s
    }
}

pub(crate) struct HashedTable {
    segment_length: f64,
    successors:     HashMap<(LaneLocator, u32), Vec<HashedLaneInfo>>,
}

impl HashedTable {
    fn segment_count(&self, curve_length: f64) -> u32 {
        ((curve_length / self.segment_length).ceil() as u32).max(1)
    }

    fn info(&self, locator: LaneLocator, curve_length: f64, index: u32) -> HashedLaneInfo {
        let start_s = index as f64 * self.segment_length;
        let end_s = ((index + 1) as f64 * self.segment_length).min(curve_length);
        HashedLaneInfo { locator, index, start_s, end_s }
    }

    /// Span containing arc length `s` (clamped to the curve).
    pub(crate) fn info_at(&self, locator: LaneLocator, curve_length: f64, s: f64) -> HashedLaneInfo {
        let n = self.segment_count(curve_length);
        let idx = ((s.max(0.0) / self.segment_length).floor() as u32).min(n - 1);
        self.info(locator, curve_length, idx)
    }

    pub(crate) fn successors(&self, info: &HashedLaneInfo) -> &[HashedLaneInfo] {
        self.successors
            .get(&(info.locator, info.index))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn build(
        segment_length: f64,
        lanes:          &BTreeMap<LaneUid, Lane>,
        links:          &[LaneLink],
        successors:     &HashMap<LaneUid, Vec<LaneUid>>,
        links_from:     &HashMap<LaneUid, Vec<LaneLinkId>>,
    ) -> Self {
        let mut table = HashedTable { segment_length, successors: HashMap::new() };

        let lane_len = |uid: &LaneUid| lanes.get(uid).map(|l| l.curve.length());
        let first_of = |table: &HashedTable, locator: LaneLocator, len: f64| table.info(locator, len, 0);

        let mut edges: Vec<((LaneLocator, u32), Vec<HashedLaneInfo>)> = Vec::new();

        for lane in lanes.values() {
            let locator = LaneLocator::Lane(lane.uid);
            let len = lane.curve.length();
            let n = table.segment_count(len);
            for idx in 0..n - 1 {
                edges.push(((locator, idx), vec![table.info(locator, len, idx + 1)]));
            }
            let mut tail = Vec::new();
            for next in successors.get(&lane.uid).into_iter().flatten() {
                if let Some(next_len) = lane_len(next) {
                    tail.push(first_of(&table, LaneLocator::Lane(*next), next_len));
                }
            }
            for link_id in links_from.get(&lane.uid).into_iter().flatten() {
                if let Some(link) = links.get(link_id.index()) {
                    tail.push(first_of(&table, LaneLocator::Link(link.id), link.curve.length()));
                }
            }
            edges.push(((locator, n - 1), tail));
        }

        for link in links {
            let locator = LaneLocator::Link(link.id);
            let len = link.curve.length();
            let n = table.segment_count(len);
            for idx in 0..n - 1 {
                edges.push(((locator, idx), vec![table.info(locator, len, idx + 1)]));
            }
            let tail = lane_len(&link.to)
                .map(|to_len| vec![first_of(&table, LaneLocator::Lane(link.to), to_len)])
                .unwrap_or_default();
            edges.push(((locator, n - 1), tail));
        }

        table.successors.extend(edges);
        table
    }
}
