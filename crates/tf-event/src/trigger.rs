//! Trigger predicates.
//!
//! All functions are pure apart from the [`EdgeState`] the `hit_*` variants
//! advance.  A metric that cannot be computed (disconnected lanes, element
//! behind the ego, non-closing TTC) is `None` and counts as "not satisfied";
//! it is never an error.

use tf_spatial::GeometryService;

use crate::condition::{DistanceProjection, EdgeState, TriggerCondition, TriggerKind};
use crate::handler::HitUtilInfo;

/// Time rows fire on every tick at or after `threshold`.
#[inline]
pub fn evaluate_time(threshold: f64, pass_time: f64) -> bool {
    pass_time >= threshold
}

/// Longitudinal gap from the ego to `other` along the ego's reference line.
fn lane_gap(ego: &HitUtilInfo, other: &HitUtilInfo, geometry: &dyn GeometryService) -> Option<f64> {
    let pos = ego.lane?;
    let proj = geometry.project(pos.locator, other.center)?;
    if !proj.inside {
        return None;
    }
    let gap = proj.s - pos.s;
    (gap >= 0.0).then_some(gap)
}

/// Distance from the ego to `other`.
pub fn ego_distance(
    ego:        &HitUtilInfo,
    other:      &HitUtilInfo,
    projection: DistanceProjection,
    geometry:   &dyn GeometryService,
) -> Option<f64> {
    match projection {
        DistanceProjection::Euclidean     => Some(ego.center.distance(other.center)),
        DistanceProjection::LaneProjected => lane_gap(ego, other, geometry),
    }
}

/// Time until the ego reaches `other` at current velocities.
pub fn ttc_distance(
    ego:        &HitUtilInfo,
    other:      &HitUtilInfo,
    projection: DistanceProjection,
    geometry:   &dyn GeometryService,
) -> Option<f64> {
    let (gap, closing) = match projection {
        DistanceProjection::Euclidean => {
            let d = other.center - ego.center;
            let dir = d.normalized()?;
            (d.length(), (ego.velocity - other.velocity).dot(dir))
        }
        DistanceProjection::LaneProjected => {
            (lane_gap(ego, other, geometry)?, ego.speed() - other.speed())
        }
    };
    (closing > 0.0).then(|| gap / closing)
}

fn hit(
    metric:        Option<f64>,
    threshold:     f64,
    edge:          &mut EdgeState,
    trigger_index: u32,
) -> bool {
    let satisfied = metric.is_some_and(|m| m <= threshold);
    edge.advance(satisfied, trigger_index)
}

/// TTC crossing detector.  Invalid snapshots leave `edge` untouched.
pub fn hit_ttc(
    ego:           &HitUtilInfo,
    other:         &HitUtilInfo,
    threshold:     f64,
    edge:          &mut EdgeState,
    projection:    DistanceProjection,
    trigger_index: u32,
    geometry:      &dyn GeometryService,
) -> bool {
    if !ego.valid || !other.valid {
        return false;
    }
    hit(ttc_distance(ego, other, projection, geometry), threshold, edge, trigger_index)
}

/// Ego-distance crossing detector.  Invalid snapshots leave `edge` untouched.
pub fn hit_ego_distance(
    ego:           &HitUtilInfo,
    other:         &HitUtilInfo,
    threshold:     f64,
    edge:          &mut EdgeState,
    projection:    DistanceProjection,
    trigger_index: u32,
    geometry:      &dyn GeometryService,
) -> bool {
    if !ego.valid || !other.valid {
        return false;
    }
    hit(ego_distance(ego, other, projection, geometry), threshold, edge, trigger_index)
}

/// Evaluate a condition row against the ego and the handler's element.
/// Time rows ignore the snapshots.
pub(crate) fn evaluate_condition(
    cond:      &mut TriggerCondition,
    pass_time: f64,
    ego:       Option<&HitUtilInfo>,
    other:     &HitUtilInfo,
    geometry:  &dyn GeometryService,
) -> bool {
    let TriggerCondition { kind, threshold, projection, edge, trigger_index } = cond;
    match (*kind, ego) {
        (TriggerKind::Time, _) => evaluate_time(*threshold, pass_time),
        (_, None) => false,
        (TriggerKind::Ttc, Some(ego)) => {
            hit_ttc(ego, other, *threshold, edge, *projection, *trigger_index, geometry)
        }
        (TriggerKind::EgoDistance, Some(ego)) => {
            hit_ego_distance(ego, other, *threshold, edge, *projection, *trigger_index, geometry)
        }
    }
}
