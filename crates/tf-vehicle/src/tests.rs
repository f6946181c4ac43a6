//! Unit tests for tf-vehicle.

use std::collections::HashMap;

use tf_core::{BehaviorConfig, ElementId, LaneUid, MoveDirection, Polygon, RoadId, Side, TimeParam, Vec2};
use tf_event::{EndCondition, EventHandler, EventKind, EventPayload, FiredEvent, HitUtilInfo};
use tf_spatial::{GeometryService, LaneLocator, LaneMap, LaneMapBuilder, Route};

use crate::{ManeuverState, VehicleElement, VehicleSpec};

// ── Helpers ───────────────────────────────────────────────────────────────────

const SEED: u64 = 7;

/// Road 1: one section, two 300 m lanes heading east.  Lane -1 at y = 0,
/// lane -2 at y = -3.5.
fn two_lane_road() -> LaneMap {
    let mut b = LaneMapBuilder::new();
    b.add_straight_section(1, 0, Vec2::ZERO, 0.0, 300.0, 2, 3.5).unwrap();
    b.build()
}

/// Road 1 (100 m) joined to road 2 (100 m, starting at x = 110) by a 10 m
/// connector.
fn junction_road() -> LaneMap {
    let mut b = LaneMapBuilder::new();
    b.add_straight_section(1, 0, Vec2::ZERO, 0.0, 100.0, 1, 3.5).unwrap();
    b.add_straight_section(2, 0, Vec2::new(110.0, 0.0), 0.0, 100.0, 1, 3.5).unwrap();
    b.add_lane_link(LaneUid::new(1, 0, -1), LaneUid::new(2, 0, -1), None).unwrap();
    b.build()
}

/// Road 1 forks into road 2 (east) and road 3 (north).
fn fork_road() -> LaneMap {
    let mut b = LaneMapBuilder::new();
    b.add_straight_section(1, 0, Vec2::ZERO, 0.0, 100.0, 1, 3.5).unwrap();
    b.add_straight_section(2, 0, Vec2::new(110.0, 0.0), 0.0, 100.0, 1, 3.5).unwrap();
    b.add_straight_section(3, 0, Vec2::new(110.0, 10.0), std::f64::consts::FRAC_PI_2, 100.0, 1, 3.5)
        .unwrap();
    b.add_lane_link(LaneUid::new(1, 0, -1), LaneUid::new(2, 0, -1), None).unwrap();
    b.add_lane_link(LaneUid::new(1, 0, -1), LaneUid::new(3, 0, -1), None).unwrap();
    b.build()
}

fn lane(l: i32) -> LaneUid {
    LaneUid::new(1, 0, l)
}

fn spawn(map: &LaneMap, spec: VehicleSpec) -> VehicleElement {
    VehicleElement::spawn(spec, map, &BehaviorConfig::default(), SEED).unwrap()
}

fn car(map: &LaneMap, l: i32, s: f64, v: f64) -> VehicleElement {
    spawn(map, VehicleSpec::on_lane(ElementId(1), lane(l), s, v))
}

fn no_infos() -> HashMap<ElementId, HitUtilInfo> {
    HashMap::new()
}

/// Run `pre_update` + `update` for ticks `from..=to`; returns the first tick
/// at which `stop` holds.
fn run_until(
    v: &mut VehicleElement,
    map: &LaneMap,
    infos: &HashMap<ElementId, HitUtilInfo>,
    dt: f64,
    ticks: std::ops::RangeInclusive<u64>,
    stop: impl Fn(&VehicleElement) -> bool,
) -> Option<u64> {
    for k in ticks {
        let t = TimeParam::at(k, dt);
        v.pre_update(&t);
        v.update(&t, map, infos);
        if stop(v) {
            return Some(k);
        }
    }
    None
}

fn fired(kind: EventKind, payload: EventPayload) -> FiredEvent {
    FiredEvent { kind, payload, end_condition: EndCondition::none() }
}

// ── ManeuverState ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod maneuver_tests {
    use super::*;

    #[test]
    fn start_to_ing() {
        assert_eq!(ManeuverState::start(Side::Left, false), ManeuverState::TurnLeftStart);
        assert_eq!(ManeuverState::TurnRightInLaneStart.to_ing(), ManeuverState::TurnRightInLaneIng);
        assert_eq!(ManeuverState::LaneKeep.to_ing(), ManeuverState::LaneKeep);
    }

    #[test]
    fn classification() {
        assert!(ManeuverState::Abort.is_lane_change());
        assert!(ManeuverState::TurnLeftInLaneIng.is_in_lane());
        assert!(!ManeuverState::LateralAction.is_lane_change());
        assert!(!ManeuverState::MergeAction.is_lane_change());
        assert_eq!(ManeuverState::TurnRightIng.to_string(), "turn_right_ing");
    }
}

// ── Kinetics ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod kinetics_tests {
    use super::*;
    use crate::Kinetics;

    #[test]
    fn velocity_clamped_to_range() {
        let mut k = Kinetics::new(19.0, 20.0);
        k.set_acceleration(5.0, &EndCondition::none());
        k.pre_update(1.0);
        assert_eq!(k.velocity(), 20.0);
        k.set_acceleration(-50.0, &EndCondition::none());
        k.pre_update(1.0);
        assert_eq!(k.velocity(), 0.0);
    }

    #[test]
    fn trapezoid_step() {
        let mut k = Kinetics::new(10.0, 30.0);
        k.set_acceleration(2.0, &EndCondition::none());
        k.pre_update(1.0);
        assert!((k.step_distance(1.0) - 11.0).abs() < 1e-12);
    }

    #[test]
    fn time_end_condition_counts_down() {
        let mut k = Kinetics::new(10.0, 30.0);
        k.set_acceleration(2.0, &EndCondition::time(1.0));
        for _ in 0..20 {
            k.pre_update(0.1);
        }
        assert!((k.velocity() - 12.0).abs() < 1e-9);
        assert_eq!(k.acceleration(), 0.0);
    }

    #[test]
    fn velocity_end_condition_snaps_on_crossing() {
        let mut k = Kinetics::new(10.0, 30.0);
        k.set_acceleration(-2.0, &EndCondition::velocity(5.0));
        for _ in 0..40 {
            k.pre_update(0.1);
        }
        assert_eq!(k.velocity(), 5.0);
        assert_eq!(k.acceleration(), 0.0);

        // Upward crossing as well.
        k.set_acceleration(3.0, &EndCondition::velocity(6.0));
        for _ in 0..10 {
            k.pre_update(0.1);
        }
        assert_eq!(k.velocity(), 6.0);
    }

    #[test]
    fn velocity_end_condition_met_at_injection_ends_next_step() {
        let mut k = Kinetics::new(10.0, 30.0);
        k.set_acceleration(2.0, &EndCondition::velocity(10.0));
        for _ in 0..10 {
            k.pre_update(0.1);
        }
        assert_eq!(k.velocity(), 10.0);
        assert_eq!(k.acceleration(), 0.0);
    }

    #[test]
    fn velocity_end_condition_holds_while_moving_away() {
        let mut k = Kinetics::new(10.0, 30.0);
        k.set_acceleration(-1.0, &EndCondition::velocity(15.0));
        for _ in 0..20 {
            k.pre_update(0.1);
        }
        assert!((k.velocity() - 8.0).abs() < 1e-9);
        assert_eq!(k.acceleration(), -1.0);
    }

    #[test]
    fn invalid_end_condition_holds() {
        let mut k = Kinetics::new(10.0, 30.0);
        let end = EndCondition { valid: false, ..EndCondition::time(0.1) };
        k.set_acceleration(1.0, &end);
        for _ in 0..10 {
            k.pre_update(0.1);
        }
        assert_eq!(k.acceleration(), 1.0);
    }
}

// ── Lane-change timing and profiles ───────────────────────────────────────────

#[cfg(test)]
mod timing_tests {
    use crate::compute_min_lane_change_time;
    use crate::lane_change::{heading_offset, move_back_sideway, move_to_sideway};

    #[test]
    fn min_lane_change_time_rules() {
        assert_eq!(compute_min_lane_change_time(3.0, 0.0, -5.0, 2.0), 3.0);
        assert_eq!(compute_min_lane_change_time(3.0, 10.0, -1.0, 2.0), -1.0);
        assert_eq!(compute_min_lane_change_time(3.0, 10.0, 100.0, 2.0), 3.0);
        assert!((compute_min_lane_change_time(3.0, 10.0, 25.0, 2.0) - 2.5).abs() < 1e-12);
        assert_eq!(compute_min_lane_change_time(3.0, 10.0, 15.0, 2.0), -1.0);
    }

    #[test]
    fn profiles_vanish_at_ends() {
        assert_eq!(move_to_sideway(0.0), 0.0);
        assert!(move_to_sideway(4.5).abs() < 1e-5);
        assert_eq!(move_back_sideway(0.0, 1.8), 0.0);
        assert!(move_back_sideway(1.8, 1.8).abs() < 1e-12);
    }

    #[test]
    fn heading_peaks_at_fifteen_degrees() {
        assert!((heading_offset(move_to_sideway(2.25)) - 15f64.to_radians()).abs() < 1e-12);
        assert!((heading_offset(100.0) - 15f64.to_radians()).abs() < 1e-12);
    }
}

// ── switch_lane ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod switch_lane_tests {
    use super::*;

    #[test]
    fn reaches_lane_keep_at_ceil_duration_over_dt() {
        let map = two_lane_road();
        let mut v = car(&map, -1, 10.0, 10.0);
        assert!(v.switch_lane(MoveDirection::Right, false, false, 3.0, &map));
        assert_eq!(v.state(), ManeuverState::TurnRightStart);

        let done = run_until(&mut v, &map, &no_infos(), 0.1, 1..=40, |v| {
            v.state() == ManeuverState::LaneKeep
        });
        assert_eq!(done, Some(30));
        assert_eq!(v.locator(), LaneLocator::Lane(lane(-2)));
        assert!((v.position().y + 3.5).abs() < 1e-6);
        assert!(v.heading().abs() < 1e-9);
        assert!(v.lane_change().is_none());

        // Start becomes Ing once 60% of the duration has elapsed.
        let mut v = car(&map, -1, 10.0, 10.0);
        v.switch_lane(MoveDirection::Right, false, false, 3.0, &map);
        let ing = run_until(&mut v, &map, &no_infos(), 0.1, 1..=40, |v| {
            v.state() == ManeuverState::TurnRightIng
        });
        assert_eq!(ing, Some(18));
    }

    #[test]
    fn non_integer_duration_rounds_up() {
        let map = two_lane_road();
        let mut v = car(&map, -2, 10.0, 10.0);
        assert!(v.switch_lane(MoveDirection::Left, false, false, 2.6, &map));
        let done = run_until(&mut v, &map, &no_infos(), 0.25, 1..=20, |v| {
            v.state() == ManeuverState::LaneKeep
        });
        assert_eq!(done, Some(11));
        assert_eq!(v.locator(), LaneLocator::Lane(lane(-1)));
        assert!(v.position().y.abs() < 1e-6);
    }

    #[test]
    fn heading_blends_toward_target() {
        let map = two_lane_road();
        let mut v = car(&map, -1, 10.0, 10.0);
        v.switch_lane(MoveDirection::Right, false, false, 3.0, &map);
        // Update 16 sees elapsed 1.5 s, the profile peak.
        run_until(&mut v, &map, &no_infos(), 0.1, 1..=16, |_| false);
        assert!((v.heading() + 15f64.to_radians()).abs() < 1e-4);
        assert!(v.lateral_velocity() < 0.0);
    }

    #[test]
    fn rejects_invalid_requests() {
        let map = two_lane_road();
        let mut v = car(&map, -1, 10.0, 10.0);
        assert!(!v.switch_lane(MoveDirection::Straight, false, false, 3.0, &map));
        assert!(!v.switch_lane(MoveDirection::Left, false, false, 3.0, &map));
        assert!(!v.switch_lane(MoveDirection::RightInLane, false, false, 3.0, &map));
        assert_eq!(v.state(), ManeuverState::LaneKeep);

        assert!(v.switch_lane(MoveDirection::Right, false, false, 3.0, &map));
        assert!(!v.switch_lane(MoveDirection::Right, false, false, 3.0, &map));
    }

    #[test]
    fn rejects_solid_boundary() {
        let mut b = LaneMapBuilder::new();
        b.add_straight_section(1, 0, Vec2::ZERO, 0.0, 300.0, 2, 3.5).unwrap();
        b.set_solid_boundary(lane(-1), Side::Right, true).unwrap();
        let map = b.build();
        let mut v = car(&map, -1, 10.0, 10.0);
        assert!(!v.switch_lane(MoveDirection::Right, false, false, 3.0, &map));
        assert_eq!(v.state(), ManeuverState::LaneKeep);
    }

    #[test]
    fn rejects_on_lane_link() {
        let map = junction_road();
        let link = map.links()[0].id;
        let mut v = spawn(&map, VehicleSpec::on_locator(ElementId(1), LaneLocator::Link(link), 2.0, 10.0));
        assert!(!v.switch_lane(MoveDirection::Right, false, false, 3.0, &map));
    }

    #[test]
    fn rejects_near_road_end() {
        let map = two_lane_road();
        // 300 - 285 - 10 m margin leaves 5 m: 0.5 s, below the 2 s floor.
        let mut v = car(&map, -1, 285.0, 10.0);
        assert!(!v.switch_lane(MoveDirection::Right, false, false, 3.0, &map));
        // 300 - 265 - 10 = 25 m: shortened to 2.5 s.
        let mut v = car(&map, -1, 265.0, 10.0);
        assert!(v.switch_lane(MoveDirection::Right, false, false, 3.0, &map));
        assert!((v.lane_change().unwrap().duration - 2.5).abs() < 1e-12);
    }

    #[test]
    fn check_goal_keeps_route() {
        let mut b = LaneMapBuilder::new();
        b.add_straight_section(1, 0, Vec2::ZERO, 0.0, 300.0, 2, 3.5).unwrap();
        b.add_straight_section(2, 0, Vec2::new(310.0, 0.0), 0.0, 100.0, 1, 3.5).unwrap();
        b.add_lane_link(lane(-1), LaneUid::new(2, 0, -1), None).unwrap();
        let map = b.build();
        let route = Route::from_roads(vec![RoadId(1), RoadId(2)]);
        let spec = VehicleSpec::on_lane(ElementId(1), lane(-1), 10.0, 10.0).with_route(route);

        let mut v = spawn(&map, spec.clone());
        assert!(!v.switch_lane(MoveDirection::Right, true, false, 3.0, &map));
        assert!(v.switch_lane(MoveDirection::Right, true, true, 3.0, &map));
        let mut v = spawn(&map, spec);
        assert!(v.switch_lane(MoveDirection::Right, false, false, 3.0, &map));
    }

    #[test]
    fn frozen_when_stopped() {
        let map = two_lane_road();
        let mut v = car(&map, -1, 10.0, 0.0);
        assert!(v.switch_lane(MoveDirection::Right, false, false, 3.0, &map));
        let before = v.position();
        for k in 1..=5 {
            let t = TimeParam::at(k, 0.1);
            v.pre_update(&t);
            assert!(v.update(&t, &map, &no_infos()));
        }
        assert_eq!(v.position(), before);
        assert_eq!(v.lane_change().unwrap().elapsed, 0.0);
    }
}

// ── change_in_lane / abort ────────────────────────────────────────────────────

#[cfg(test)]
mod in_lane_tests {
    use super::*;

    #[test]
    fn rejects_bad_parameters() {
        let map = two_lane_road();
        let mut v = car(&map, -1, 10.0, 10.0);
        assert!(!v.change_in_lane(MoveDirection::LeftInLane, 0.0, 0.5));
        assert!(!v.change_in_lane(MoveDirection::LeftInLane, -1.0, 0.5));
        assert!(!v.change_in_lane(MoveDirection::LeftInLane, 1.0, 0.0));
        assert!(!v.change_in_lane(MoveDirection::Left, 1.0, 0.5));
        assert_eq!(v.state(), ManeuverState::LaneKeep);
    }

    #[test]
    fn shifts_and_keeps_offset() {
        let map = two_lane_road();
        let mut v = car(&map, -1, 10.0, 10.0);
        assert!(v.change_in_lane(MoveDirection::LeftInLane, 1.0, 0.5));
        assert_eq!(v.state(), ManeuverState::TurnLeftInLaneStart);
        assert!(!v.change_in_lane(MoveDirection::LeftInLane, 1.0, 0.5));

        let done = run_until(&mut v, &map, &no_infos(), 0.1, 1..=20, |v| {
            v.state() == ManeuverState::LaneKeep
        });
        assert_eq!(done, Some(10));
        assert!((v.position().y - 0.5).abs() < 1e-9);
        assert_eq!(v.locator(), LaneLocator::Lane(lane(-1)));

        // The offset survives the next straight step.
        run_until(&mut v, &map, &no_infos(), 0.1, 11..=12, |_| false);
        assert!((v.lateral_offset() - 0.5).abs() < 1e-9);
        assert_eq!(v.lateral_displacement(), 0.0);
    }

    #[test]
    fn abort_returns_to_origin_lane() {
        let map = two_lane_road();
        let mut v = car(&map, -2, 10.0, 10.0);
        assert!(v.switch_lane(MoveDirection::Left, false, false, 3.0, &map));
        run_until(&mut v, &map, &no_infos(), 0.1, 1..=5, |_| false);
        assert!(!v.abort_lane_change(), "abort refused before the Ing phase");

        let ing = run_until(&mut v, &map, &no_infos(), 0.1, 6..=40, |v| {
            v.state() == ManeuverState::TurnLeftIng
        });
        assert_eq!(ing, Some(18));
        assert!(v.position().y > -3.5);
        assert!(v.abort_lane_change());
        assert_eq!(v.state(), ManeuverState::Abort);

        let done = run_until(&mut v, &map, &no_infos(), 0.1, 19..=60, |v| {
            v.state() == ManeuverState::LaneKeep
        });
        assert_eq!(done, Some(36));
        assert_eq!(v.locator(), LaneLocator::Lane(lane(-2)));
        assert!((v.position().y + 3.5).abs() < 1e-6);
    }

    #[test]
    fn abort_refused_late_or_in_lane() {
        let map = two_lane_road();
        let mut v = car(&map, -2, 10.0, 10.0);
        v.switch_lane(MoveDirection::Left, false, false, 3.0, &map);
        run_until(&mut v, &map, &no_infos(), 0.1, 1..=25, |_| false);
        assert!(!v.abort_lane_change());
        assert_eq!(v.state(), ManeuverState::TurnLeftIng);

        let mut v = car(&map, -1, 10.0, 10.0);
        v.change_in_lane(MoveDirection::RightInLane, 2.0, 0.5);
        run_until(&mut v, &map, &no_infos(), 0.1, 1..=15, |_| false);
        assert!(!v.abort_lane_change());
    }
}

// ── Relocation ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod relocation_tests {
    use super::*;
    use crate::least_lane_change;

    #[test]
    fn crosses_link_into_next_road() {
        let map = junction_road();
        let mut v = car(&map, -1, 95.0, 10.0);
        run_until(&mut v, &map, &no_infos(), 1.0, 1..=1, |_| false);
        assert!(v.locator().is_link());
        assert!((v.s() - 5.0).abs() < 1e-9);

        run_until(&mut v, &map, &no_infos(), 1.0, 2..=2, |_| false);
        assert_eq!(v.locator(), LaneLocator::Lane(LaneUid::new(2, 0, -1)));
        assert!((v.s() - 5.0).abs() < 1e-9);
        assert!((v.position().x - 115.0).abs() < 1e-9);
    }

    #[test]
    fn follows_route_at_fork() {
        let map = fork_road();
        let route = Route::from_roads(vec![RoadId(1), RoadId(3)]);
        let spec = VehicleSpec::on_lane(ElementId(1), lane(-1), 95.0, 10.0).with_route(route);
        let mut v = spawn(&map, spec);
        run_until(&mut v, &map, &no_infos(), 1.0, 1..=1, |_| false);
        let LaneLocator::Link(id) = v.locator() else { panic!("expected a link, got {}", v.locator()) };
        assert_eq!(map.lane_link(id).unwrap().to.road, RoadId(3));
    }

    #[test]
    fn unrouted_pick_is_deterministic() {
        let map = fork_road();
        let pick = || {
            let mut v = car(&map, -1, 95.0, 10.0);
            run_until(&mut v, &map, &no_infos(), 1.0, 1..=1, |_| false);
            v.locator()
        };
        let first = pick();
        assert!(first.is_link());
        assert_eq!(first, pick());
    }

    #[test]
    fn dead_end_stops_vehicle() {
        let map = two_lane_road();
        let mut v = car(&map, -1, 295.0, 10.0);
        let t = TimeParam::at(1, 1.0);
        v.pre_update(&t);
        assert!(!v.update(&t, &map, &no_infos()));
        assert_eq!(v.velocity(), 0.0);
        assert!(v.is_alive());
    }

    #[test]
    fn least_lane_change_prefers_right_on_ties() {
        let cands = [LaneUid::new(1, 1, -1), LaneUid::new(1, 1, -3)];
        assert_eq!(least_lane_change(&cands, -2), Some(LaneUid::new(1, 1, -3)));
        assert_eq!(least_lane_change(&cands, -1), Some(LaneUid::new(1, 1, -1)));
        assert_eq!(least_lane_change(&[], -1), None);
    }

    #[test]
    fn section_handover_uses_least_lane_change() {
        let mut b = LaneMapBuilder::new();
        b.add_straight_section(1, 0, Vec2::ZERO, 0.0, 100.0, 2, 3.5).unwrap();
        b.add_straight_section(1, 1, Vec2::new(100.0, 0.0), 0.0, 100.0, 3, 3.5).unwrap();
        b.connect(lane(-2), LaneUid::new(1, 1, -1)).unwrap();
        b.connect(lane(-2), LaneUid::new(1, 1, -3)).unwrap();
        let map = b.build();

        let mut v = car(&map, -2, 99.0, 2.0);
        run_until(&mut v, &map, &no_infos(), 1.0, 1..=1, |_| false);
        assert_eq!(v.locator(), LaneLocator::Lane(LaneUid::new(1, 1, -3)));
        assert!((v.s() - 1.0).abs() < 1e-9);
    }
}

// ── Lateral-distance action ───────────────────────────────────────────────────

#[cfg(test)]
mod lateral_tests {
    use super::*;
    use crate::{LateralDistanceAction, signed_gap};

    fn target_at(y: f64) -> HashMap<ElementId, HitUtilInfo> {
        let center = Vec2::new(10.0, y);
        let info = HitUtilInfo {
            element:  ElementId(2),
            valid:    true,
            center,
            heading:  0.0,
            velocity: Vec2::ZERO,
            polygon:  Polygon::oriented_box(center, 0.0, 4.5, 1.8),
            lane:     None,
        };
        HashMap::from([(ElementId(2), info)])
    }

    #[test]
    fn gap_between_footprints() {
        let own = Polygon::oriented_box(Vec2::ZERO, 0.0, 4.5, 1.8);
        let other = Polygon::oriented_box(Vec2::new(0.0, -3.5), 0.0, 4.5, 1.8);
        let axis = Vec2::new(0.0, 1.0);
        let origin = Vec2::new(0.0, -3.5);
        assert!((signed_gap(&own, &other, origin, axis).unwrap() - 1.7).abs() < 1e-12);
        assert!((signed_gap(&other, &own, origin, axis).unwrap() + 1.7).abs() < 1e-12);
        let overlapping = Polygon::oriented_box(Vec2::new(0.0, -3.0), 0.0, 4.5, 1.8);
        assert_eq!(signed_gap(&overlapping, &other, origin, axis), Some(0.0));
    }

    #[test]
    fn closes_center_distance_and_clears() {
        let map = two_lane_road();
        let infos = target_at(-3.5);
        let mut v = car(&map, -1, 10.0, 10.0);
        assert!(v.set_lateral_distance_action(LateralDistanceAction::new(ElementId(2), 2.5)));
        assert_eq!(v.state(), ManeuverState::LateralAction);
        assert!(!v.switch_lane(MoveDirection::Right, false, false, 3.0, &map));

        let done = run_until(&mut v, &map, &infos, 0.1, 1..=30, |v| v.state() == ManeuverState::LaneKeep);
        assert!(done.is_some());
        assert!((v.position().y + 1.0).abs() < 0.1);
        assert!(v.lateral_action().is_none());
        assert!(!v.clear_lateral_distance_action());

        let y = v.position().y;
        run_until(&mut v, &map, &infos, 0.1, 31..=32, |_| false);
        assert!((v.position().y - y).abs() < 1e-9);
    }

    #[test]
    fn closes_freespace_distance() {
        let map = two_lane_road();
        let infos = target_at(-3.5);
        let mut v = car(&map, -1, 10.0, 10.0);
        let action = LateralDistanceAction::new(ElementId(2), 1.0).freespace(true);
        assert!(v.set_lateral_distance_action(action));
        let done = run_until(&mut v, &map, &infos, 0.1, 1..=30, |v| v.state() == ManeuverState::LaneKeep);
        assert!(done.is_some());
        // Edge gap 1.0 with 1.8 m wide boxes: centers 2.8 apart.
        assert!((v.position().y + 0.7).abs() < 0.1);
    }

    #[test]
    fn continuous_action_keeps_running() {
        let map = two_lane_road();
        let infos = target_at(-3.5);
        let mut v = car(&map, -1, 10.0, 10.0);
        let action = LateralDistanceAction::new(ElementId(2), 2.5).continuous(true);
        assert!(v.set_lateral_distance_action(action));
        run_until(&mut v, &map, &infos, 0.1, 1..=30, |_| false);
        assert_eq!(v.state(), ManeuverState::LateralAction);
        assert!(v.clear_lateral_distance_action());
        assert_eq!(v.state(), ManeuverState::LaneKeep);
    }

    #[test]
    fn missing_target_clears() {
        let map = two_lane_road();
        let mut v = car(&map, -1, 10.0, 10.0);
        assert!(v.set_lateral_distance_action(LateralDistanceAction::new(ElementId(9), 2.5)));
        run_until(&mut v, &map, &no_infos(), 0.1, 1..=1, |_| false);
        assert_eq!(v.state(), ManeuverState::LaneKeep);
        assert!(v.position().y.abs() < 1e-12);
    }

    #[test]
    fn rejected_outside_lane_keep() {
        let map = two_lane_road();
        let mut v = car(&map, -1, 10.0, 10.0);
        v.change_in_lane(MoveDirection::RightInLane, 1.0, 0.5);
        assert!(!v.set_lateral_distance_action(LateralDistanceAction::new(ElementId(2), 2.5)));
    }
}

// ── Events ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod event_tests {
    use super::*;

    fn merge(direction: MoveDirection, duration: f64, offset: f64) -> FiredEvent {
        fired(EventKind::MergeByTime, EventPayload::Merge { direction, duration, offset })
    }

    #[test]
    fn merge_is_launched_on_next_update() {
        let map = two_lane_road();
        let mut v = car(&map, -1, 10.0, 10.0);
        assert!(v.handle_event(&merge(MoveDirection::Right, 3.0, 0.0)));
        assert_eq!(v.state(), ManeuverState::MergeAction);
        assert!(!v.merge_action().unwrap().launched);
        assert!(!v.handle_event(&merge(MoveDirection::Right, 3.0, 0.0)));

        run_until(&mut v, &map, &no_infos(), 0.1, 1..=1, |_| false);
        assert_eq!(v.state(), ManeuverState::TurnRightStart);
        assert!(v.merge_action().unwrap().launched);

        let done = run_until(&mut v, &map, &no_infos(), 0.1, 2..=40, |v| {
            v.state() == ManeuverState::LaneKeep
        });
        assert_eq!(done, Some(30));
        assert!(v.merge_action().is_none());
        assert_eq!(v.locator(), LaneLocator::Lane(lane(-2)));
    }

    #[test]
    fn in_lane_merge() {
        let map = two_lane_road();
        let mut v = car(&map, -1, 10.0, 10.0);
        assert!(v.handle_event(&merge(MoveDirection::LeftInLane, 1.0, 0.5)));
        run_until(&mut v, &map, &no_infos(), 0.1, 1..=1, |_| false);
        assert_eq!(v.state(), ManeuverState::TurnLeftInLaneStart);
    }

    #[test]
    fn failed_merge_launch_clears() {
        let map = two_lane_road();
        let mut v = car(&map, -1, 10.0, 10.0);
        assert!(v.handle_event(&merge(MoveDirection::Left, 3.0, 0.0)));
        run_until(&mut v, &map, &no_infos(), 0.1, 1..=1, |_| false);
        assert_eq!(v.state(), ManeuverState::LaneKeep);
        assert!(v.merge_action().is_none());
    }

    #[test]
    fn straight_merge_is_a_no_op() {
        let map = two_lane_road();
        let mut v = car(&map, -1, 10.0, 10.0);
        assert!(v.handle_event(&merge(MoveDirection::Straight, 3.0, 0.0)));
        assert_eq!(v.state(), ManeuverState::LaneKeep);
        assert!(!v.clear_merge_action());
    }

    #[test]
    fn clear_merge_is_idempotent() {
        let map = two_lane_road();
        let mut v = car(&map, -1, 10.0, 10.0);
        v.handle_event(&merge(MoveDirection::Right, 3.0, 0.0));
        assert!(v.clear_merge_action());
        assert_eq!(v.state(), ManeuverState::LaneKeep);
        assert!(!v.clear_merge_action());
    }

    #[test]
    fn acceleration_with_end_condition() {
        let map = two_lane_road();
        let mut v = car(&map, -1, 10.0, 10.0);
        let ev = FiredEvent {
            kind:          EventKind::AccelerationByTime,
            payload:       EventPayload::Acceleration { acc: 2.0 },
            end_condition: EndCondition::time(1.0),
        };
        assert!(v.handle_event(&ev));
        run_until(&mut v, &map, &no_infos(), 0.1, 1..=20, |_| false);
        assert!((v.velocity() - 12.0).abs() < 1e-9);
        assert_eq!(v.acceleration(), 0.0);
    }

    #[test]
    fn braking_to_stop_covers_final_distance() {
        let map = two_lane_road();
        let mut v = car(&map, -1, 10.0, 1.0);
        v.handle_event(&fired(EventKind::AccelerationByTime, EventPayload::Acceleration { acc: -20.0 }));
        run_until(&mut v, &map, &no_infos(), 0.1, 1..=1, |_| false);
        assert_eq!(v.velocity(), 0.0);
        assert!((v.s() - 10.05).abs() < 1e-9);

        run_until(&mut v, &map, &no_infos(), 0.1, 2..=5, |_| false);
        assert!((v.s() - 10.05).abs() < 1e-9);
    }

    #[test]
    fn velocity_event_is_clamped() {
        let map = two_lane_road();
        let spec = VehicleSpec::on_lane(ElementId(1), lane(-1), 10.0, 10.0).with_max_velocity(20.0);
        let mut v = spawn(&map, spec);
        assert!(v.handle_event(&fired(EventKind::VelocityByTime, EventPayload::Velocity { velocity: 35.0 })));
        assert_eq!(v.velocity(), 20.0);
    }

    #[test]
    fn pedestrian_events_and_dead_vehicles_rejected() {
        let map = two_lane_road();
        let mut v = car(&map, -1, 10.0, 10.0);
        let ped = EventPayload::PedestrianVelocity { direction_deg: 90.0, velocity: 1.0 };
        assert!(!v.handle_event(&fired(EventKind::PedestrianTimeVelocity, ped)));

        v.kill();
        let acc = EventPayload::Acceleration { acc: 1.0 };
        assert!(!v.handle_event(&fired(EventKind::AccelerationByTime, acc)));
        assert!(!v.hit_info().valid);
    }

    #[test]
    fn hit_info_reflects_pose() {
        let map = two_lane_road();
        let v = car(&map, -2, 10.0, 10.0);
        let info = v.hit_info();
        assert!(info.valid);
        assert_eq!(info.center, Vec2::new(10.0, -3.5));
        assert!((info.velocity.x - 10.0).abs() < 1e-12);
        assert_eq!(info.lane.unwrap().locator, LaneLocator::Lane(lane(-2)));
        assert_eq!(info.polygon.vertices.len(), 4);
    }
}

// ── Trajectory ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod trajectory_tests {
    use super::*;

    #[test]
    fn fills_from_current_state() {
        let map = two_lane_road();
        let v = car(&map, -1, 10.0, 10.0);
        let mut out = Vec::new();
        assert!(v.fill_trajectory(&TimeParam::at(0, 0.1), &map, &mut out));
        assert!(out.len() >= 2);
        assert!((out[0].t - 0.1).abs() < 1e-12);
        assert_eq!(out[0].v, 10.0);
    }

    #[test]
    fn lane_change_trajectory_ends_on_target() {
        let map = two_lane_road();
        let mut v = car(&map, -1, 10.0, 10.0);
        v.switch_lane(MoveDirection::Right, false, false, 3.0, &map);
        run_until(&mut v, &map, &no_infos(), 0.1, 1..=1, |_| false);
        let mut out = Vec::new();
        assert!(v.fill_trajectory(&TimeParam::at(1, 0.1), &map, &mut out));
        let last = out.last().unwrap();
        assert!((last.y + 3.5).abs() < 1e-3);
    }

    #[test]
    fn dead_vehicle_has_no_trajectory() {
        let map = two_lane_road();
        let mut v = car(&map, -1, 10.0, 10.0);
        v.kill();
        let mut out = vec![Default::default()];
        assert!(!v.fill_trajectory(&TimeParam::at(0, 0.1), &map, &mut out));
        assert!(out.is_empty());
    }
}

// ── Spawn / pedestrians ───────────────────────────────────────────────────────

#[cfg(test)]
mod spawn_tests {
    use super::*;
    use crate::{Pedestrian, PedestrianSpec, VehicleError};

    #[test]
    fn spawn_validates_input() {
        let map = two_lane_road();
        let cfg = BehaviorConfig::default();
        let missing = VehicleSpec::on_lane(ElementId(1), LaneUid::new(9, 0, -1), 0.0, 10.0);
        assert!(matches!(
            VehicleElement::spawn(missing, &map, &cfg, SEED),
            Err(VehicleError::UnknownLocator { .. })
        ));
        let flat = VehicleSpec::on_lane(ElementId(1), lane(-1), 0.0, 10.0).with_dimensions(0.0, 1.8);
        assert!(matches!(
            VehicleElement::spawn(flat, &map, &cfg, SEED),
            Err(VehicleError::InvalidDimensions { .. })
        ));
        let reverse = VehicleSpec::on_lane(ElementId(1), lane(-1), 0.0, -1.0);
        assert!(matches!(
            VehicleElement::spawn(reverse, &map, &cfg, SEED),
            Err(VehicleError::InvalidSpeed { .. })
        ));
    }

    #[test]
    fn spawn_clamps_arc_length_and_speed() {
        let map = two_lane_road();
        let spec = VehicleSpec::on_lane(ElementId(1), lane(-1), 500.0, 50.0).with_offset(0.5);
        let v = spawn(&map, spec);
        assert_eq!(v.s(), 300.0);
        assert_eq!(v.velocity(), BehaviorConfig::default().max_speed);
        assert!((v.position().y - 0.5).abs() < 1e-12);
        assert!(map.curve(v.locator()).is_some());
    }

    #[test]
    fn pedestrian_turns_and_walks() {
        let mut p = Pedestrian::spawn(PedestrianSpec::new(ElementId(5), Vec2::ZERO, 0.0, 1.0)).unwrap();
        let ev = fired(
            EventKind::PedestrianConditionVelocity,
            EventPayload::PedestrianVelocity { direction_deg: 90.0, velocity: 1.5 },
        );
        assert!(p.handle_event(&ev));
        assert!((p.heading() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!(p.update(&TimeParam::at(1, 1.0)));
        assert!(p.position().x.abs() < 1e-12);
        assert!((p.position().y - 1.5).abs() < 1e-12);
        assert!((p.hit_info().velocity.y - 1.5).abs() < 1e-12);
    }

    #[test]
    fn pedestrian_rejects_vehicle_events() {
        let mut p = Pedestrian::spawn(PedestrianSpec::new(ElementId(5), Vec2::ZERO, 0.0, 1.0)).unwrap();
        assert!(!p.handle_event(&fired(EventKind::AccelerationByTime, EventPayload::Acceleration { acc: 1.0 })));
        p.kill();
        let ev = fired(
            EventKind::PedestrianTimeVelocity,
            EventPayload::PedestrianVelocity { direction_deg: 0.0, velocity: 1.0 },
        );
        assert!(!p.handle_event(&ev));
        assert!(!p.update(&TimeParam::at(1, 1.0)));
    }
}
