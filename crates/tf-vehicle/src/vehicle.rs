//! The vehicle element: maneuver state machine plus longitudinal motion.
//!
//! # Per-tick order
//!
//! ```text
//! pre_update(time)                 kinetics: v += a·dt, end conditions
//! update(time, geometry, infos)
//!   1. launch a pending merge
//!   2. v <= 0 → sync pose, return
//!   3. s += ½(v + v')·dt, relocating across section ends and junctions
//!   4. lane change / abort: lateral displacement, timers, heading blend
//!   5. lateral-distance action: capped control step
//!   6. pose and footprint from (locator, s, offset + displacement)
//!   7. finish a completed lane change: relocate from the absolute position
//! fill_trajectory(time, geometry, out)
//! ```
//!
//! Lateral position is split into a resting `offset` from the reference
//! line and the `displacement` accumulated by the maneuver in progress.
//! When a maneuver completes the displacement is folded away and the
//! offset is re-derived from geometry on the next update.

use tracing::{debug, info, warn};

use tf_core::geo::wrap_angle;
use tf_core::{AgentRng, BehaviorConfig, ElementId, LaneLinkId, LaneUid, MoveDirection, Polygon, TimeParam, Vec2};
use tf_event::{EventHandler, EventPayload, FiredEvent, HitInfoSource, HitUtilInfo};
use tf_spatial::{GeometryService, LaneLocator, LanePosition, Route};
use tf_trajectory::{PredictorInput, TrajectorySample, predict_into};

use crate::actions::{LateralControl, LateralDistanceAction, MergeAction};
use crate::kinetics::Kinetics;
use crate::lane_change::{AbortTimer, FINISH_EPSILON, LaneChange, compute_min_lane_change_time};
use crate::maneuver::ManeuverState;
use crate::{VehicleError, VehicleResult};

/// Longest chain of section/junction hand-overs in a single step.
const MAX_RELOCATIONS: usize = 16;

pub const DEFAULT_LENGTH: f64 = 4.5;
pub const DEFAULT_WIDTH: f64 = 1.8;

// ── VehicleSpec ───────────────────────────────────────────────────────────────

/// Scene-side description of one vehicle.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleSpec {
    pub id:           ElementId,
    pub locator:      LaneLocator,
    pub s:            f64,
    /// Lateral offset from the reference line, left positive.
    pub offset:       f64,
    pub velocity:     f64,
    /// Falls back to `BehaviorConfig::max_speed`.
    pub max_velocity: Option<f64>,
    pub length:       f64,
    pub width:        f64,
    pub route:        Option<Route>,
}

impl VehicleSpec {
    pub fn on_lane(id: ElementId, lane: LaneUid, s: f64, velocity: f64) -> Self {
        Self::on_locator(id, LaneLocator::Lane(lane), s, velocity)
    }

    pub fn on_locator(id: ElementId, locator: LaneLocator, s: f64, velocity: f64) -> Self {
        Self {
            id,
            locator,
            s,
            offset: 0.0,
            velocity,
            max_velocity: None,
            length: DEFAULT_LENGTH,
            width: DEFAULT_WIDTH,
            route: None,
        }
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_max_velocity(mut self, max_velocity: f64) -> Self {
        self.max_velocity = Some(max_velocity);
        self
    }

    pub fn with_dimensions(mut self, length: f64, width: f64) -> Self {
        self.length = length;
        self.width = width;
        self
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.route = Some(route);
        self
    }
}

// ── VehicleElement ────────────────────────────────────────────────────────────

/// Lane change outcome reported by the lateral step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Completion {
    None,
    LaneChange,
    Shift,
}

#[derive(Clone, Debug)]
pub struct VehicleElement {
    id:                ElementId,
    cfg:               BehaviorConfig,
    alive:             bool,
    length:            f64,
    width:             f64,

    locator:           LaneLocator,
    s:                 f64,
    offset:            f64,
    displacement:      f64,
    lateral_velocity:  f64,
    need_reset_offset: bool,

    position:          Vec2,
    heading:           f64,
    lane_heading:      f64,
    polygon:           Polygon,

    kinetics:          Kinetics,
    state:             ManeuverState,
    lane_change:       Option<LaneChange>,
    lateral:           Option<LateralControl>,
    merge:             Option<MergeAction>,
    route:             Option<Route>,
    rng:               AgentRng,
}

impl VehicleElement {
    /// Place a vehicle on the map.  `seed` is the run's global seed; route
    /// picks at junctions are drawn from a per-vehicle stream derived from it.
    pub fn spawn(
        spec:     VehicleSpec,
        geometry: &dyn GeometryService,
        cfg:      &BehaviorConfig,
        seed:     u64,
    ) -> VehicleResult<Self> {
        let id = spec.id;
        if !(spec.length > 0.0 && spec.width > 0.0) {
            return Err(VehicleError::InvalidDimensions { id, length: spec.length, width: spec.width });
        }
        let max_velocity = spec.max_velocity.unwrap_or(cfg.max_speed);
        if !(max_velocity > 0.0) || !spec.velocity.is_finite() || spec.velocity < 0.0 {
            return Err(VehicleError::InvalidSpeed { id, speed: spec.velocity });
        }
        let curve = geometry
            .curve(spec.locator)
            .ok_or(VehicleError::UnknownLocator { id, locator: spec.locator })?;
        let s = spec.s.clamp(0.0, curve.length());
        let (position, heading) = curve.pose_at(s, spec.offset);

        debug!(element = %id, locator = %spec.locator, s, v = spec.velocity, "vehicle spawned");
        Ok(Self {
            id,
            cfg: cfg.clone(),
            alive: true,
            length: spec.length,
            width: spec.width,
            locator: spec.locator,
            s,
            offset: spec.offset,
            displacement: 0.0,
            lateral_velocity: 0.0,
            need_reset_offset: false,
            position,
            heading,
            lane_heading: heading,
            polygon: Polygon::oriented_box(position, heading, spec.length, spec.width),
            kinetics: Kinetics::new(spec.velocity, max_velocity),
            state: ManeuverState::LaneKeep,
            lane_change: None,
            lateral: None,
            merge: None,
            route: spec.route,
            rng: AgentRng::new(seed, id),
        })
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Take the vehicle out of the simulation.  Dead vehicles reject events
    /// and produce no trajectory.
    pub fn kill(&mut self) {
        self.alive = false;
    }

    pub fn state(&self) -> ManeuverState {
        self.state
    }

    pub fn locator(&self) -> LaneLocator {
        self.locator
    }

    /// Arc length along the current reference line.
    pub fn s(&self) -> f64 {
        self.s
    }

    /// Total lateral offset from the current reference line.
    pub fn lateral_offset(&self) -> f64 {
        self.offset + self.displacement
    }

    pub fn lateral_displacement(&self) -> f64 {
        self.displacement
    }

    pub fn lateral_velocity(&self) -> f64 {
        self.lateral_velocity
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    pub fn velocity(&self) -> f64 {
        self.kinetics.velocity()
    }

    pub fn acceleration(&self) -> f64 {
        self.kinetics.acceleration()
    }

    pub fn kinetics(&self) -> &Kinetics {
        &self.kinetics
    }

    pub fn lane_change(&self) -> Option<&LaneChange> {
        self.lane_change.as_ref()
    }

    pub fn lateral_action(&self) -> Option<&LateralDistanceAction> {
        self.lateral.as_ref().map(|c| &c.action)
    }

    pub fn merge_action(&self) -> Option<&MergeAction> {
        self.merge.as_ref()
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn set_route(&mut self, route: Option<Route>) {
        self.route = route;
    }

    pub fn is_in_lane_change(&self) -> bool {
        self.state.is_lane_change()
    }

    // ── Maneuver requests ─────────────────────────────────────────────────

    /// Start a lane change to the adjacent lane on `direction`'s side.
    ///
    /// Returns `false`, leaving the state unchanged, when the direction is
    /// not `Left`/`Right`, another maneuver is active, the vehicle is on a
    /// lane link, there is no lane on that side, its boundary is solid, or
    /// the road ends too soon for any feasible duration.  With a route,
    /// `check_goal` also refuses targets on the road's last section that
    /// have no connector onto the route's next road, unless `force` is set.
    pub fn switch_lane(
        &mut self,
        direction: MoveDirection,
        check_goal: bool,
        force:     bool,
        duration:  f64,
        geometry:  &dyn GeometryService,
    ) -> bool {
        if !self.alive || direction.is_in_lane() {
            return false;
        }
        let Some(side) = direction.side() else {
            debug!(element = %self.id, "straight requested, no lane change needed");
            return false;
        };
        if self.state != ManeuverState::LaneKeep {
            debug!(element = %self.id, state = %self.state, "lane change refused, maneuver active");
            return false;
        }
        let LaneLocator::Lane(uid) = self.locator else {
            debug!(element = %self.id, "lane change refused on lane link");
            return false;
        };
        let Some(target) = geometry.adjacent_lane(uid, side) else {
            debug!(element = %self.id, lane = %uid, ?side, "no lane on that side");
            return false;
        };
        if geometry.is_boundary_solid(uid, side) {
            debug!(element = %self.id, lane = %uid, ?side, "boundary is solid");
            return false;
        }
        if check_goal && !force && !self.target_keeps_route(uid, target, geometry) {
            debug!(element = %self.id, target = %target, "target lane leaves the route");
            return false;
        }

        let road_end = self.distance_to_road_end(uid, geometry);
        let duration = compute_min_lane_change_time(
            duration,
            self.kinetics.velocity(),
            road_end,
            self.cfg.min_lane_change_time,
        );
        if duration <= 0.0 {
            warn!(element = %self.id, duration, road_end, "lane change duration invalid");
            return false;
        }

        let width_of = |u: LaneUid| geometry.lane(u).map(|l| l.width);
        let span = match (width_of(uid), width_of(target)) {
            (Some(a), Some(b)) => 0.5 * (a + b),
            _ => 0.0,
        };
        self.lane_change = Some(LaneChange::lane_change(side, duration, target, span));
        self.state = ManeuverState::start(side, false);
        debug!(element = %self.id, from = %uid, to = %target, duration, "lane change started");
        true
    }

    /// Start a lateral shift of `offset` metres within the current lane.
    pub fn change_in_lane(&mut self, direction: MoveDirection, duration: f64, offset: f64) -> bool {
        if !self.alive {
            return false;
        }
        if !direction.is_in_lane() {
            warn!(element = %self.id, ?direction, "in-lane change needs an in-lane direction");
            return false;
        }
        let Some(side) = direction.side() else { return false };
        if self.state != ManeuverState::LaneKeep {
            return false;
        }
        if !(duration > 0.0) || !(offset > 0.0) {
            return false;
        }
        self.lane_change = Some(LaneChange::in_lane(side, duration, offset));
        self.state = ManeuverState::start(side, true);
        debug!(element = %self.id, ?side, duration, offset, "in-lane change started");
        true
    }

    /// Abandon a lane change and return to the original lane.
    ///
    /// Only full lane changes past their `*Start` phase can be aborted, and
    /// only while the elapsed time is below `no_check_abort_threshold` of
    /// the duration.  The return takes as long as the change had run.
    pub fn abort_lane_change(&mut self) -> bool {
        if !self.alive || !self.state.is_ing() || self.state.is_in_lane() {
            return false;
        }
        let Some(lc) = self.lane_change.as_mut() else { return false };
        if lc.elapsed >= self.cfg.no_check_abort_threshold * lc.duration || lc.elapsed <= 0.0 {
            return false;
        }
        lc.abort = Some(AbortTimer { duration: lc.elapsed, elapsed: 0.0 });
        self.state = ManeuverState::Abort;
        self.merge = None;
        debug!(element = %self.id, back_in = lc.elapsed, "lane change aborted");
        true
    }

    /// Start holding a lateral distance to another element.  Accepted only
    /// while lane keeping.
    pub fn set_lateral_distance_action(&mut self, action: LateralDistanceAction) -> bool {
        if !self.alive || self.state != ManeuverState::LaneKeep || !action.is_valid() {
            return false;
        }
        self.lateral = Some(LateralControl::new(action));
        self.state = ManeuverState::LateralAction;
        debug!(element = %self.id, target = %action.target, distance = action.distance, "lateral action set");
        true
    }

    /// Returns `true` when an action was outstanding.
    pub fn clear_lateral_distance_action(&mut self) -> bool {
        if self.lateral.take().is_none() {
            return false;
        }
        self.fold_displacement();
        self.lateral_velocity = 0.0;
        if self.state == ManeuverState::LateralAction {
            self.state = ManeuverState::LaneKeep;
        }
        true
    }

    /// Returns `true` when a merge was outstanding.  A lane change the merge
    /// already started keeps running.
    pub fn clear_merge_action(&mut self) -> bool {
        if self.merge.take().is_none() {
            return false;
        }
        if self.state == ManeuverState::MergeAction {
            self.state = ManeuverState::LaneKeep;
        }
        true
    }

    // ── Per-tick ──────────────────────────────────────────────────────────

    pub fn pre_update(&mut self, time: &TimeParam) {
        if self.alive {
            self.kinetics.pre_update(time.relative_time);
        }
    }

    /// Advance one tick.  Returns `false` when the vehicle had to stop.
    pub fn update(
        &mut self,
        time:      &TimeParam,
        geometry:  &dyn GeometryService,
        hit_infos: &dyn HitInfoSource,
    ) -> bool {
        if !self.alive {
            return false;
        }
        let dt = time.relative_time;

        if self.state == ManeuverState::MergeAction {
            self.launch_merge(geometry);
        }
        if self.need_reset_offset {
            if let Some(proj) = geometry.project(self.locator, self.position) {
                self.offset = proj.l;
            }
            self.need_reset_offset = false;
        }

        let step = self.kinetics.step_distance(dt);
        self.kinetics.settle();

        if self.kinetics.velocity() <= 0.0 {
            // Braking to a stop still covers the tail of the trapezoid.
            if step > 0.0 && !self.advance(step, geometry) {
                self.stop("no way forward");
                return false;
            }
            self.lateral_velocity = 0.0;
            self.sync_pose(geometry, 0.0);
            return true;
        }

        if !self.advance(step, geometry) {
            self.stop("no way forward");
            return false;
        }

        let (heading_offset, completion) = self.step_lane_change(dt, geometry);
        if self.state == ManeuverState::LateralAction {
            self.step_lateral_action(dt, hit_infos);
        }

        if !self.sync_pose(geometry, heading_offset) {
            self.stop("pose lookup failed");
            return false;
        }
        if completion != Completion::None {
            self.finish_lane_change(completion, geometry);
        }
        true
    }

    /// Predict this vehicle's trajectory into `out`.  Returns `false` only
    /// for a dead vehicle, which leaves `out` empty.
    pub fn fill_trajectory(
        &self,
        time:     &TimeParam,
        geometry: &dyn GeometryService,
        out:      &mut Vec<TrajectorySample>,
    ) -> bool {
        if !self.alive {
            out.clear();
            return false;
        }
        let lane_change_target = self
            .lane_change
            .as_ref()
            .filter(|lc| !lc.in_lane && lc.abort.is_none())
            .and_then(|lc| lc.target);
        let input = PredictorInput {
            position: self.position,
            heading: self.heading,
            locator: self.locator,
            s: self.s,
            velocity: self.kinetics.velocity(),
            acceleration: self.kinetics.acceleration(),
            max_velocity: self.kinetics.max_velocity(),
            lane_change_target,
            route: self.route.as_ref(),
            horizon: self.cfg.trajectory_horizon_secs,
            step: time.relative_time,
            abs_time: time.abs_time,
        };
        predict_into(&input, geometry, &self.cfg, out);
        true
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn stop(&mut self, reason: &str) {
        warn!(element = %self.id, locator = %self.locator, s = self.s, reason, "vehicle stopped");
        self.kinetics.stop();
        self.lateral_velocity = 0.0;
    }

    fn fold_displacement(&mut self) {
        self.offset += self.displacement;
        self.displacement = 0.0;
        self.need_reset_offset = true;
    }

    fn sync_pose(&mut self, geometry: &dyn GeometryService, heading_offset: f64) -> bool {
        let Some((pos, lane_heading)) = geometry.pose_at(self.locator, self.s, self.offset + self.displacement)
        else {
            return false;
        };
        self.position = pos;
        self.lane_heading = lane_heading;
        self.heading = wrap_angle(lane_heading + heading_offset);
        self.polygon = Polygon::oriented_box(pos, self.heading, self.length, self.width);
        true
    }

    fn distance_to_road_end(&self, uid: LaneUid, geometry: &dyn GeometryService) -> f64 {
        if geometry.is_last_section(uid) {
            let len = geometry.curve(LaneLocator::Lane(uid)).map_or(0.0, |c| c.length());
            len - self.s - self.cfg.junction_margin
        } else {
            self.cfg.default_road_end_distance
        }
    }

    fn target_keeps_route(&self, from: LaneUid, target: LaneUid, geometry: &dyn GeometryService) -> bool {
        let Some(next_road) = self.route.as_ref().and_then(|r| r.next_road_after(from.road)) else {
            return true;
        };
        if !geometry.is_last_section(target) {
            return true;
        }
        geometry
            .links_from(target)
            .iter()
            .filter_map(|&id| geometry.lane_link(id))
            .any(|link| link.to.road == next_road)
    }

    /// Move `step` metres forward, handing over to following lanes and
    /// links as needed.
    fn advance(&mut self, step: f64, geometry: &dyn GeometryService) -> bool {
        let mut s = self.s + step;
        for _ in 0..MAX_RELOCATIONS {
            let Some(len) = geometry.curve(self.locator).map(|c| c.length()) else {
                return false;
            };
            if s <= len {
                self.s = s;
                return true;
            }
            let Some(next) = self.next_locator(geometry) else {
                self.s = len;
                return false;
            };
            debug!(element = %self.id, from = %self.locator, to = %next, "relocated");
            self.locator = next;
            s -= len;
            if let Some(lc) = self.lane_change.as_mut().filter(|lc| !lc.in_lane) {
                lc.target = next.lane().and_then(|uid| geometry.adjacent_lane(uid, lc.side));
            }
        }
        warn!(element = %self.id, step, "too many relocations in one step");
        false
    }

    fn next_locator(&mut self, geometry: &dyn GeometryService) -> Option<LaneLocator> {
        match self.locator {
            LaneLocator::Link(id) => geometry.lane_link(id).map(|link| LaneLocator::Lane(link.to)),
            LaneLocator::Lane(uid) => {
                let next = geometry.next_lanes(uid);
                if !next.is_empty() {
                    return least_lane_change(next, uid.lane).map(LaneLocator::Lane);
                }
                self.pick_link(uid, geometry).map(LaneLocator::Link)
            }
        }
    }

    /// Junction connector at the end of `uid`: the route's next road, else
    /// any road on the route, else a seeded random pick.
    fn pick_link(&mut self, uid: LaneUid, geometry: &dyn GeometryService) -> Option<LaneLinkId> {
        let links = geometry.links_from(uid);
        if links.is_empty() {
            return None;
        }
        if let Some(route) = self.route.as_ref() {
            let to_road = |id: &LaneLinkId| geometry.lane_link(*id).map(|l| l.to.road);
            if let Some(next_road) = route.next_road_after(uid.road) {
                if let Some(&id) = links.iter().find(|id| to_road(id) == Some(next_road)) {
                    return Some(id);
                }
            }
            if let Some(&id) = links.iter().find(|id| to_road(id).is_some_and(|r| route.contains_road(r))) {
                return Some(id);
            }
        }
        self.rng.choose(links).copied()
    }

    /// Lateral part of a lane change.  Returns the heading deviation and
    /// whether the maneuver completed this tick.
    fn step_lane_change(&mut self, dt: f64, geometry: &dyn GeometryService) -> (f64, Completion) {
        let Some(lc) = self.lane_change.as_mut() else {
            return (0.0, Completion::None);
        };
        let heading = lc.heading_offset(self.cfg.average_lane_change_duration);

        if let Some(abort) = lc.abort.as_mut() {
            let back = self.displacement.abs();
            let speed = back / abort.remaining().max(dt);
            let step = (speed * dt).min(back);
            self.displacement -= self.displacement.signum() * step;
            self.lateral_velocity = -lc.side.sign() * speed;
            abort.elapsed += dt;
            let done = abort.remaining() <= FINISH_EPSILON;
            return (heading, if done { Completion::Shift } else { Completion::None });
        }

        let sign = lc.side.sign();
        let speed = if lc.in_lane {
            let step = (lc.offset / lc.duration * dt).min((lc.offset - self.displacement.abs()).max(0.0));
            self.displacement += sign * step;
            lc.offset / lc.duration
        } else {
            let to_go = lc
                .target
                .and_then(|t| geometry.project(LaneLocator::Lane(t), self.position))
                .map(|p| p.l.abs())
                .unwrap_or_else(|| (lc.span - self.displacement.abs()).max(0.0));
            let speed = to_go / lc.remaining().max(dt);
            self.displacement += sign * (speed * dt).min(to_go);
            speed
        };
        self.lateral_velocity = sign * speed;

        lc.elapsed += dt;
        if self.state.is_start() && lc.elapsed > self.cfg.change_topology_threshold * lc.duration {
            self.state = self.state.to_ing();
            debug!(element = %self.id, state = %self.state, "lane change past topology threshold");
        }
        let completion = match (lc.remaining() <= FINISH_EPSILON, lc.in_lane) {
            (false, _)    => Completion::None,
            (true, false) => Completion::LaneChange,
            (true, true)  => Completion::Shift,
        };
        (heading, completion)
    }

    fn finish_lane_change(&mut self, completion: Completion, geometry: &dyn GeometryService) {
        let Some(lc) = self.lane_change.take() else { return };
        if completion == Completion::LaneChange {
            let relocated = geometry.locate(self.position).or_else(|| {
                let target = LaneLocator::Lane(lc.target?);
                geometry
                    .project(target, self.position)
                    .map(|p| LanePosition { locator: target, s: p.s, l: p.l })
            });
            match relocated {
                Some(pos) => {
                    self.locator = pos.locator;
                    self.s = pos.s;
                    self.offset = pos.l;
                    self.displacement = 0.0;
                    self.need_reset_offset = true;
                }
                None => {
                    warn!(element = %self.id, "relocation after lane change failed, keeping reference line");
                    self.fold_displacement();
                }
            }
        } else {
            self.fold_displacement();
        }
        self.lateral_velocity = 0.0;
        self.heading = self.lane_heading;
        self.polygon = Polygon::oriented_box(self.position, self.heading, self.length, self.width);
        info!(element = %self.id, state = %self.state, locator = %self.locator, "lane change finished");
        self.state = ManeuverState::LaneKeep;
        self.merge = None;
    }

    fn step_lateral_action(&mut self, dt: f64, hit_infos: &dyn HitInfoSource) {
        let Some(ctl) = self.lateral.as_mut() else { return };
        let Some(target) = hit_infos.hit_info_of(ctl.action.target).filter(|t| t.valid) else {
            warn!(element = %self.id, target = %ctl.action.target, "lateral action target unavailable");
            self.clear_lateral_distance_action();
            return;
        };
        let current = ctl.action.measure(self.position, &self.polygon, target);
        let error = ctl.action.distance - current;
        if error.abs() < self.cfg.lateral_clear_epsilon && !ctl.action.continuous {
            debug!(element = %self.id, error, "lateral action reached its distance");
            self.clear_lateral_distance_action();
            return;
        }
        let speed = ctl.step(error, dt);
        let axis = Vec2::from_heading(target.heading).perp();
        let own_left = Vec2::from_heading(self.lane_heading).perp();
        self.lateral_velocity = speed;
        self.displacement += speed * dt * axis.dot(own_left);
    }

    fn accept_merge(&mut self, direction: MoveDirection, duration: f64, offset: f64) -> bool {
        if direction == MoveDirection::Straight {
            return true;
        }
        if self.state != ManeuverState::LaneKeep {
            debug!(element = %self.id, state = %self.state, "merge deferred, maneuver active");
            return false;
        }
        self.merge = Some(MergeAction { direction, duration, offset, launched: false });
        self.state = ManeuverState::MergeAction;
        true
    }

    fn launch_merge(&mut self, geometry: &dyn GeometryService) {
        self.state = ManeuverState::LaneKeep;
        let Some(merge) = self.merge else { return };
        let launched = if merge.direction.is_in_lane() {
            self.change_in_lane(merge.direction, merge.duration, merge.offset)
        } else {
            self.switch_lane(merge.direction, true, true, merge.duration, geometry)
        };
        if launched {
            if let Some(m) = self.merge.as_mut() {
                m.launched = true;
            }
        } else {
            warn!(element = %self.id, direction = ?merge.direction, "merge could not start");
            self.merge = None;
        }
    }
}

/// Candidate whose lane index is closest to `goal`; ties go to the
/// right-hand lane.
pub fn least_lane_change(candidates: &[LaneUid], goal: i32) -> Option<LaneUid> {
    candidates.iter().copied().min_by_key(|c| ((c.lane - goal).abs(), c.lane))
}

impl EventHandler for VehicleElement {
    fn hit_info(&self) -> HitUtilInfo {
        if !self.alive {
            return HitUtilInfo::invalid(self.id);
        }
        let fwd = Vec2::from_heading(self.heading) * self.kinetics.velocity();
        let side = Vec2::from_heading(self.lane_heading).perp() * self.lateral_velocity;
        HitUtilInfo {
            element:  self.id,
            valid:    true,
            center:   self.position,
            heading:  self.heading,
            velocity: fwd + side,
            polygon:  self.polygon.clone(),
            lane:     Some(LanePosition { locator: self.locator, s: self.s, l: self.lateral_offset() }),
        }
    }

    fn handle_event(&mut self, event: &FiredEvent) -> bool {
        if !self.alive {
            return false;
        }
        match event.payload {
            EventPayload::Acceleration { acc } => {
                self.kinetics.set_acceleration(acc, &event.end_condition);
                debug!(element = %self.id, acc, end = ?event.end_condition.kind, "acceleration injected");
                true
            }
            EventPayload::Velocity { velocity } => {
                self.kinetics.set_velocity(velocity);
                debug!(element = %self.id, velocity, "velocity injected");
                true
            }
            EventPayload::Merge { direction, duration, offset } => self.accept_merge(direction, duration, offset),
            EventPayload::PedestrianVelocity { .. } => {
                debug!(element = %self.id, kind = %event.kind, "pedestrian event ignored by vehicle");
                false
            }
        }
    }
}
