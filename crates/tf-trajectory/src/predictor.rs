//! Trajectory predictor.
//!
//! # Control points
//!
//! | Segment                           | Points (arc length on the segment)          |
//! |-----------------------------------|---------------------------------------------|
//! | current position                  | exact position                              |
//! | seed segment                      | `s + 0.3·rem`, `s + 0.6·rem`, `end_s`        |
//! | seed segment on a lane-change target | `end_s`                                  |
//! | every later segment               | `start + 0.35·len`, `start + 0.7·len`, `end_s` |
//!
//! `rem = end_s − s`.  Points closer than `control_point_dedup_distance` to
//! the current position are dropped.
//!
//! # Kinematics
//!
//! For `k = 1..=round(horizon / dt)`:
//!
//! ```text
//! v_k = clamp(v_0 + a·k·dt, 0, v_max)
//! s_k = s_{k-1} + ½·(v_{k-1} + v_k)·dt
//! ```
//!
//! Sampling stops early once `s_k` passes the end of the fitted curve.

use std::collections::HashSet;

use tracing::debug;

use tf_core::{BehaviorConfig, LaneUid, Vec2};
use tf_spatial::{GeometryService, HashedLaneInfo, LaneLocator, Route};

use crate::catmull::fit_centripetal;
use crate::sample::TrajectorySample;

/// Upper bound on segments walked per prediction.
const MAX_WALK: usize = 4096;

/// Everything the predictor needs to know about one agent.
#[derive(Clone, Debug)]
pub struct PredictorInput<'a> {
    pub position:           Vec2,
    pub heading:            f64,
    /// Reference line the agent is currently on, and its arc length there.
    pub locator:            LaneLocator,
    pub s:                  f64,
    pub velocity:           f64,
    pub acceleration:       f64,
    pub max_velocity:       f64,
    /// Target lane while a lane change is in progress.
    pub lane_change_target: Option<LaneUid>,
    pub route:              Option<&'a Route>,
    pub horizon:            f64,
    /// Sampling step, normally the simulation step.
    pub step:               f64,
    /// Absolute time of the current tick.
    pub abs_time:           f64,
}

/// Distance covered in `horizon` seconds starting at `v` under constant `a`,
/// with speed clamped to `[0, v_max]`.
pub fn kinematic_reach(v: f64, a: f64, v_max: f64, horizon: f64) -> f64 {
    let v = v.clamp(0.0, v_max);
    if a > 0.0 {
        let t_c = ((v_max - v) / a).clamp(0.0, horizon);
        v * t_c + 0.5 * a * t_c * t_c + v_max * (horizon - t_c)
    } else if a < 0.0 {
        let t_c = (v / -a).min(horizon);
        v * t_c + 0.5 * a * t_c * t_c
    } else {
        v * horizon
    }
}

/// Predict into a fresh `Vec`.
pub fn predict(
    input:    &PredictorInput<'_>,
    geometry: &dyn GeometryService,
    cfg:      &BehaviorConfig,
) -> Vec<TrajectorySample> {
    let mut out = Vec::new();
    predict_into(input, geometry, cfg, &mut out);
    out
}

/// Predict into `out` (cleared first).  Always leaves at least two samples.
pub fn predict_into(
    input:    &PredictorInput<'_>,
    geometry: &dyn GeometryService,
    cfg:      &BehaviorConfig,
    out:      &mut Vec<TrajectorySample>,
) {
    out.clear();
    let points = control_points(input, geometry, cfg);
    let curve = if points.len() >= 2 { fit_centripetal(&points) } else { None };
    let Some(curve) = curve else {
        debug!(points = points.len(), "degenerate trajectory, holding current pose");
        let hold = current_sample(input);
        out.extend([hold, hold]);
        return;
    };

    let dt = input.step;
    let steps = if dt > 0.0 { (input.horizon / dt).round() as u64 } else { 0 };
    let v0 = input.velocity.clamp(0.0, input.max_velocity);
    let (mut v, mut s) = (v0, 0.0);
    for k in 1..=steps {
        let elapsed = k as f64 * dt;
        let v_next = (v0 + input.acceleration * elapsed).clamp(0.0, input.max_velocity);
        let s_next = s + 0.5 * (v + v_next) * dt;
        if s_next > curve.length() {
            break;
        }
        let a = if v_next == v { 0.0 } else { input.acceleration };
        let (p, theta) = curve.pose_at(s_next, 0.0);
        out.push(TrajectorySample {
            t: input.abs_time + elapsed,
            x: p.x,
            y: p.y,
            theta,
            v: v_next,
            a,
            s: s_next,
        });
        v = v_next;
        s = s_next;
    }

    if out.len() < 2 {
        let hold = out.first().copied().unwrap_or_else(|| current_sample(input));
        out.clear();
        out.extend([hold, hold]);
    }
}

fn current_sample(input: &PredictorInput<'_>) -> TrajectorySample {
    TrajectorySample {
        t:     input.abs_time,
        x:     input.position.x,
        y:     input.position.y,
        theta: input.heading,
        v:     input.velocity,
        a:     input.acceleration,
        s:     0.0,
    }
}

/// Seed segment, the arc length on it, and whether it is a lane-change
/// target.
fn seed(
    input:    &PredictorInput<'_>,
    geometry: &dyn GeometryService,
) -> Option<(HashedLaneInfo, f64, bool)> {
    if let Some(target) = input.lane_change_target {
        let locator = LaneLocator::Lane(target);
        if let Some(proj) = geometry.project(locator, input.position) {
            let info = geometry.hashed_info(locator, proj.s)?;
            return Some((info, proj.s, true));
        }
    }
    let info = geometry.hashed_info(input.locator, input.s)?;
    Some((info, input.s, false))
}

/// Greedy forward walk from `seed` until `search_dist` (measured from the
/// seed's start) is covered or the graph dead-ends.
fn walk(
    seed:        HashedLaneInfo,
    search_dist: f64,
    route:       Option<&Route>,
    geometry:    &dyn GeometryService,
) -> Vec<HashedLaneInfo> {
    let mut segs = vec![seed];
    let mut visited: HashSet<(LaneLocator, u32)> = HashSet::new();
    visited.insert((seed.locator, seed.index));
    let mut covered = seed.length();

    while covered < search_dist && segs.len() < MAX_WALK {
        let Some(last) = segs.last() else { break };
        let next = geometry.hashed_successors(last);
        let on_route = route.and_then(|r| {
            next.iter().find(|n| geometry.road_of(n.locator).is_some_and(|road| r.contains_road(road)))
        });
        let Some(&chosen) = on_route.or_else(|| next.first()) else { break };
        if !visited.insert((chosen.locator, chosen.index)) {
            break;
        }
        covered += chosen.length();
        segs.push(chosen);
    }
    segs
}

fn control_points(
    input:    &PredictorInput<'_>,
    geometry: &dyn GeometryService,
    cfg:      &BehaviorConfig,
) -> Vec<Vec2> {
    let mut points = vec![input.position];
    let Some((seed_info, seed_s, on_target)) = seed(input, geometry) else {
        return points;
    };

    let reach = kinematic_reach(input.velocity, input.acceleration, input.max_velocity, input.horizon);
    let search_dist = (seed_s - seed_info.start_s) + reach + cfg.trajectory_search_margin;
    let segs = walk(seed_info, search_dist, input.route, geometry);

    let mut arc: Vec<(LaneLocator, f64)> = Vec::with_capacity(segs.len() * 3);
    for (i, seg) in segs.iter().enumerate() {
        if i == 0 {
            if !on_target {
                let rem = (seg.end_s - seed_s).max(0.0);
                arc.push((seg.locator, seed_s + 0.3 * rem));
                arc.push((seg.locator, seed_s + 0.6 * rem));
            }
        } else {
            let len = seg.length();
            arc.push((seg.locator, seg.start_s + 0.35 * len));
            arc.push((seg.locator, seg.start_s + 0.7 * len));
        }
        arc.push((seg.locator, seg.end_s));
    }

    let first = input.position;
    let min_gap = cfg.control_point_dedup_distance;
    points.extend(
        arc.into_iter()
            .filter_map(|(loc, s)| geometry.pose_at(loc, s, 0.0).map(|(p, _)| p))
            .filter(|p| p.distance(first) > min_gap),
    );
    points
}
