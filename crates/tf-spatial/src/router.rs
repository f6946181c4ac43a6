//! Road-level routing.
//!
//! # Pluggability
//!
//! Vehicles follow a [`Route`], a sequence of roads.  A scene may supply
//! one directly ([`Route::from_roads`]); otherwise a [`Router`] computes it
//! from the map.  The default [`DijkstraRouter`] runs over the road graph
//! whose edges are lane links.
//!
//! # Cost units
//!
//! Costs are road lengths in **centimetres** (u64) internally so the heap
//! can order them exactly; `Route` exposes `total_length_m`.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use tf_core::RoadId;

use crate::map::LaneMap;
use crate::{SpatialError, SpatialResult};

// ── Route ─────────────────────────────────────────────────────────────────────

/// An ordered list of roads from source to destination.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    pub roads:          Vec<RoadId>,
    /// Sum of the lengths of all roads on the route.
    pub total_length_m: f64,
}

impl Route {
    /// Route given explicitly by the scene.  Length is left at zero.
    pub fn from_roads(roads: Vec<RoadId>) -> Self {
        Self { roads, total_length_m: 0.0 }
    }

    pub fn is_empty(&self) -> bool {
        self.roads.is_empty()
    }

    pub fn contains_road(&self, road: RoadId) -> bool {
        self.roads.contains(&road)
    }

    /// The road following the first occurrence of `road`.
    pub fn next_road_after(&self, road: RoadId) -> Option<RoadId> {
        let i = self.roads.iter().position(|&r| r == road)?;
        self.roads.get(i + 1).copied()
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable road-level routing engine.
pub trait Router: Send + Sync {
    /// Compute a route from road `from` to road `to`.  `from == to` yields a
    /// single-road route.
    fn route(&self, map: &LaneMap, from: RoadId, to: RoadId) -> SpatialResult<Route>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Dijkstra over roads; the cost of entering a road is its length.
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route(&self, map: &LaneMap, from: RoadId, to: RoadId) -> SpatialResult<Route> {
        dijkstra(map, from, to)
    }
}

#[inline]
fn road_cost_cm(map: &LaneMap, road: RoadId) -> u64 {
    (map.road_length(road).unwrap_or(0.0) * 100.0).round() as u64
}

fn dijkstra(map: &LaneMap, from: RoadId, to: RoadId) -> SpatialResult<Route> {
    for road in [from, to] {
        if !map.has_road(road) {
            return Err(SpatialError::RoadNotFound(road));
        }
    }

    let start_cost = road_cost_cm(map, from);
    let mut dist: HashMap<RoadId, u64> = HashMap::new();
    let mut prev: HashMap<RoadId, RoadId> = HashMap::new();
    dist.insert(from, start_cost);

    // Secondary key RoadId ensures deterministic tie-breaking.
    let mut heap: BinaryHeap<Reverse<(u64, RoadId)>> = BinaryHeap::new();
    heap.push(Reverse((start_cost, from)));

    while let Some(Reverse((cost, road))) = heap.pop() {
        if road == to {
            return Ok(reconstruct(&prev, from, to, cost));
        }
        // Skip stale heap entries.
        if dist.get(&road).is_some_and(|&d| cost > d) {
            continue;
        }
        for next in map.road_successors(road) {
            let new_cost = cost.saturating_add(road_cost_cm(map, next));
            if dist.get(&next).is_none_or(|&d| new_cost < d) {
                dist.insert(next, new_cost);
                prev.insert(next, road);
                heap.push(Reverse((new_cost, next)));
            }
        }
    }

    Err(SpatialError::NoRoute { from, to })
}

fn reconstruct(prev: &HashMap<RoadId, RoadId>, from: RoadId, to: RoadId, total_cm: u64) -> Route {
    let mut roads = vec![to];
    let mut cur = to;
    while cur != from {
        match prev.get(&cur) {
            Some(&p) => {
                roads.push(p);
                cur = p;
            }
            None => break,
        }
    }
    roads.reverse();
    Route { roads, total_length_m: total_cm as f64 / 100.0 }
}
