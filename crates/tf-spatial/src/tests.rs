//! Unit tests for the lane map, hashed segments and router.

#[cfg(test)]
mod fixtures {
    use tf_core::{LaneUid, Side, Vec2};

    use crate::{LaneMap, LaneMapBuilder};

    /// Road 1: two sections (100 m + 50 m), two lanes each, heading east.
    /// Road 2: one 100 m lane starting 10 m after road 1, reached via a link
    /// from the left lane of road 1's last section.
    pub fn two_roads() -> LaneMap {
        let mut b = LaneMapBuilder::new().hashed_segment_length(20.0);
        b.add_straight_section(1, 0, Vec2::ZERO, 0.0, 100.0, 2, 3.5).unwrap();
        b.add_straight_section(1, 1, Vec2::new(100.0, 0.0), 0.0, 50.0, 2, 3.5).unwrap();
        b.connect_sections(1, 0).unwrap();
        b.add_straight_section(2, 0, Vec2::new(160.0, 0.0), 0.0, 100.0, 1, 3.5).unwrap();
        b.add_lane_link(LaneUid::new(1, 1, -1), LaneUid::new(2, 0, -1), None).unwrap();
        b.set_solid_boundary(LaneUid::new(1, 0, -1), Side::Left, true).unwrap();
        b.build()
    }
}

#[cfg(test)]
mod curve {
    use tf_core::Vec2;

    use crate::{Curve, SpatialError};

    fn l_shape() -> Curve {
        Curve::new(vec![Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)]).unwrap()
    }

    #[test]
    fn length_and_point_at() {
        let c = l_shape();
        assert!((c.length() - 20.0).abs() < 1e-12);
        let p = c.point_at(15.0);
        assert!((p.x - 10.0).abs() < 1e-12 && (p.y - 5.0).abs() < 1e-12);
        // Clamped past the end.
        assert_eq!(c.point_at(99.0), Vec2::new(10.0, 10.0));
    }

    #[test]
    fn duplicate_vertices_merged() {
        let c = Curve::new(vec![Vec2::ZERO, Vec2::ZERO, Vec2::new(5.0, 0.0)]).unwrap();
        assert_eq!(c.points().len(), 2);
    }

    #[test]
    fn degenerate_curve_rejected() {
        let err = Curve::new(vec![Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0)]).unwrap_err();
        assert!(matches!(err, SpatialError::DegenerateCurve(2)));
    }

    #[test]
    fn project_left_is_positive() {
        let c = Curve::straight(Vec2::ZERO, 0.0, 50.0).unwrap();
        let p = c.project(Vec2::new(20.0, 1.5));
        assert!((p.s - 20.0).abs() < 1e-12);
        assert!((p.l - 1.5).abs() < 1e-12);
        assert!(p.inside);

        let right = c.project(Vec2::new(20.0, -2.0));
        assert!((right.l + 2.0).abs() < 1e-12);
    }

    #[test]
    fn project_outside_ends() {
        let c = Curve::straight(Vec2::ZERO, 0.0, 50.0).unwrap();
        let before = c.project(Vec2::new(-3.0, 0.0));
        assert!(!before.inside);
        assert_eq!(before.s, 0.0);
        let after = c.project(Vec2::new(60.0, 0.0));
        assert!(!after.inside);
        assert!((after.s - 50.0).abs() < 1e-12);
    }

    #[test]
    fn pose_at_offsets_to_the_left() {
        let c = l_shape();
        let (p, h) = c.pose_at(15.0, 1.0);
        // Second leg heads north; left of north is west.
        assert!((h - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!((p.x - 9.0).abs() < 1e-12 && (p.y - 5.0).abs() < 1e-12);
    }
}

#[cfg(test)]
mod map {
    use tf_core::{LaneLinkId, LaneUid, RoadId, Side, Vec2};

    use super::fixtures::two_roads;
    use crate::{GeometryService, LaneLocator, LaneMapBuilder, SpatialError};

    #[test]
    fn counts() {
        let map = two_roads();
        assert_eq!(map.lane_count(), 5);
        assert_eq!(map.link_count(), 1);
    }

    #[test]
    fn adjacency_within_section() {
        let map = two_roads();
        let l1 = LaneUid::new(1, 0, -1);
        let l2 = LaneUid::new(1, 0, -2);
        assert_eq!(map.left_lane(l2), Some(l1));
        assert_eq!(map.left_lane(l1), None);
        assert_eq!(map.right_lane(l1), Some(l2));
        assert_eq!(map.right_lane(l2), None);
        assert_eq!(map.adjacent_lane(l1, Side::Right), Some(l2));
    }

    #[test]
    fn solid_boundaries() {
        let map = two_roads();
        let l1 = LaneUid::new(1, 0, -1);
        assert!(map.is_boundary_solid(l1, Side::Left));
        assert!(!map.is_boundary_solid(l1, Side::Right));
        assert!(map.is_boundary_solid(LaneUid::new(9, 0, -1), Side::Right));
    }

    #[test]
    fn sections_and_links() {
        let map = two_roads();
        assert_eq!(map.next_lanes(LaneUid::new(1, 0, -2)), &[LaneUid::new(1, 1, -2)]);
        assert!(!map.is_last_section(LaneUid::new(1, 0, -1)));
        assert!(map.is_last_section(LaneUid::new(1, 1, -1)));
        assert_eq!(map.links_from(LaneUid::new(1, 1, -1)), &[LaneLinkId(0)]);
        assert!(map.links_from(LaneUid::new(1, 1, -2)).is_empty());
        assert_eq!(map.road_of(LaneLocator::Link(LaneLinkId(0))), Some(RoadId(2)));
    }

    #[test]
    fn locate_snaps_to_nearest_lane() {
        let map = two_roads();
        let pos = map.locate(Vec2::new(30.0, -3.0)).unwrap();
        assert_eq!(pos.locator, LaneLocator::Lane(LaneUid::new(1, 0, -2)));
        assert!((pos.s - 30.0).abs() < 1e-9);
        assert!((pos.l - 0.5).abs() < 1e-9);
    }

    #[test]
    fn locate_on_link() {
        let map = two_roads();
        let pos = map.locate(Vec2::new(155.0, 0.2)).unwrap();
        assert_eq!(pos.locator, LaneLocator::Link(LaneLinkId(0)));
        assert!((pos.s - 5.0).abs() < 1e-9);
    }

    #[test]
    fn connect_rejects_other_road() {
        let mut b = LaneMapBuilder::new();
        b.add_straight_section(1, 0, Vec2::ZERO, 0.0, 10.0, 1, 3.5).unwrap();
        b.add_straight_section(2, 1, Vec2::ZERO, 0.0, 10.0, 1, 3.5).unwrap();
        let err = b.connect(LaneUid::new(1, 0, -1), LaneUid::new(2, 1, -1)).unwrap_err();
        assert!(matches!(err, SpatialError::InvalidConnection { .. }));
    }

    #[test]
    fn duplicate_lane_rejected() {
        let mut b = LaneMapBuilder::new();
        b.add_straight_section(1, 0, Vec2::ZERO, 0.0, 10.0, 1, 3.5).unwrap();
        let err = b
            .add_lane(LaneUid::new(1, 0, -1), vec![Vec2::ZERO, Vec2::new(1.0, 0.0)], 3.5)
            .unwrap_err();
        assert!(matches!(err, SpatialError::DuplicateLane(_)));
    }
}

#[cfg(test)]
mod hashed {
    use tf_core::{BehaviorConfig, LaneLinkId, LaneUid, Vec2};

    use super::fixtures::two_roads;
    use crate::{GeometryService, LaneLocator, LaneMapBuilder};

    #[test]
    fn span_lookup_is_clamped() {
        let map = two_roads();
        let loc = LaneLocator::Lane(LaneUid::new(1, 1, -1));
        let info = map.hashed_info(loc, 45.0).unwrap();
        assert_eq!(info.index, 2);
        assert_eq!(info.start_s, 40.0);
        assert_eq!(info.end_s, 50.0);
        assert_eq!(map.hashed_info(loc, 1e6).unwrap().index, 2);
        assert_eq!(map.hashed_info(loc, -4.0).unwrap().index, 0);
    }

    #[test]
    fn segment_length_follows_behavior_config() {
        let behavior = BehaviorConfig { hashed_segment_length: 10.0, ..BehaviorConfig::default() };
        let mut b = LaneMapBuilder::from_behavior(&behavior);
        b.add_straight_section(1, 0, Vec2::ZERO, 0.0, 100.0, 1, 3.5).unwrap();
        let map = b.build();
        let info = map.hashed_info(LaneLocator::Lane(LaneUid::new(1, 0, -1)), 45.0).unwrap();
        assert_eq!(info.index, 4);
        assert_eq!(info.start_s, 40.0);
        assert_eq!(info.end_s, 50.0);
    }

    #[test]
    fn successors_within_lane() {
        let map = two_roads();
        let loc = LaneLocator::Lane(LaneUid::new(1, 0, -1));
        let info = map.hashed_info(loc, 10.0).unwrap();
        let next = map.hashed_successors(&info);
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].locator, loc);
        assert_eq!(next[0].index, 1);
    }

    #[test]
    fn successors_cross_section_and_junction() {
        let map = two_roads();
        let last = map.hashed_info(LaneLocator::Lane(LaneUid::new(1, 0, -1)), 99.0).unwrap();
        let next = map.hashed_successors(&last);
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].locator, LaneLocator::Lane(LaneUid::new(1, 1, -1)));
        assert_eq!(next[0].index, 0);

        let tail = map.hashed_info(LaneLocator::Lane(LaneUid::new(1, 1, -1)), 49.0).unwrap();
        let link = map.hashed_successors(&tail);
        assert_eq!(link[0].locator, LaneLocator::Link(LaneLinkId(0)));

        let after_link = map.hashed_successors(&link[0]);
        assert_eq!(after_link[0].locator, LaneLocator::Lane(LaneUid::new(2, 0, -1)));
    }

    #[test]
    fn dead_end_has_no_successors() {
        let map = two_roads();
        let tail = map.hashed_info(LaneLocator::Lane(LaneUid::new(1, 1, -2)), 49.0).unwrap();
        assert!(map.hashed_successors(&tail).is_empty());
    }
}

#[cfg(test)]
mod router {
    use tf_core::RoadId;

    use super::fixtures::two_roads;
    use crate::{DijkstraRouter, Route, Router, SpatialError};

    #[test]
    fn route_across_junction() {
        let map = two_roads();
        let route = DijkstraRouter.route(&map, RoadId(1), RoadId(2)).unwrap();
        assert_eq!(route.roads, vec![RoadId(1), RoadId(2)]);
        assert!((route.total_length_m - 250.0).abs() < 0.01);
        assert_eq!(route.next_road_after(RoadId(1)), Some(RoadId(2)));
        assert_eq!(route.next_road_after(RoadId(2)), None);
    }

    #[test]
    fn same_road_route() {
        let map = two_roads();
        let route = DijkstraRouter.route(&map, RoadId(2), RoadId(2)).unwrap();
        assert_eq!(route.roads, vec![RoadId(2)]);
    }

    #[test]
    fn no_route_backwards() {
        let map = two_roads();
        let err = DijkstraRouter.route(&map, RoadId(2), RoadId(1)).unwrap_err();
        assert!(matches!(err, SpatialError::NoRoute { .. }));
    }

    #[test]
    fn unknown_road() {
        let map = two_roads();
        let err = DijkstraRouter.route(&map, RoadId(1), RoadId(77)).unwrap_err();
        assert!(matches!(err, SpatialError::RoadNotFound(RoadId(77))));
    }

    #[test]
    fn explicit_route() {
        let route = Route::from_roads(vec![RoadId(3), RoadId(5)]);
        assert!(route.contains_road(RoadId(5)));
        assert!(!route.contains_road(RoadId(4)));
        assert!(!route.is_empty());
    }
}
