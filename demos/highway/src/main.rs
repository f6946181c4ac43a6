//! highway: small end-to-end scene for the rust_tf traffic-flow core.
//!
//! Four vehicles and one pedestrian on a three-lane highway with an exit
//! ramp.  Events come from an embedded trigger table: a timed merge, a
//! timed acceleration with an end condition, an ego-distance speed-up and a
//! pedestrian turn.  Vehicle 1 is routed onto the ramp.
//!
//! ```text
//! cargo run -p highway -- [behavior.json]
//! RUST_LOG=debug cargo run -p highway
//! ```

mod network;

use std::io::Cursor;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tf_core::{BehaviorConfig, ElementId, LaneUid, RoadId, SimConfig, Tick, Vec2};
use tf_event::load_viewers_reader;
use tf_sim::{SimBuilder, SimObserver};
use tf_spatial::{DijkstraRouter, Router};
use tf_trajectory::TrajectorySample;
use tf_vehicle::{ManeuverState, Pedestrian, PedestrianSpec, VehicleElement, VehicleSpec};

use network::{EXIT_RAMP, MAINLINE, build_highway};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:                  u64 = 42;
const STEP_SECS:             f64 = 0.1;
const SIM_SECS:              u64 = 40;
const OUTPUT_INTERVAL_TICKS: u64 = 50; // every 5 s

// ── Trigger table ─────────────────────────────────────────────────────────────

// Vehicle 1 merges right at 5 s (and again at 12 s) to reach the ramp lane.
// Vehicle 2 accelerates at 2 s until it reaches 22 m/s.
// Vehicle 3 speeds up once the ego is within 40 m (lane-projected).
// Pedestrian 10 turns back at 8 s.
const EVENTS_CSV: &str = "\
element_id,kind,trigger,threshold,projection,trigger_index,value,direction,duration,offset,end_kind,end_value
1,merge_time,time,5.0,,,,-1,4.0,,,
1,merge_time,time,12.0,,,,-1,4.0,,,
2,acc_time,time,2.0,,,1.5,,,,velocity,22.0
3,velocity_condition,ego_distance,40.0,lane,1,24.0,,,,,
10,pedestrian_time,time,8.0,,,1.0,180,,,,
";

// ── Observer ──────────────────────────────────────────────────────────────────

/// Counts fired events and prints a one-line state summary per snapshot.
#[derive(Default)]
struct ProgressObserver {
    fired:     usize,
    snapshots: usize,
}

impl SimObserver for ProgressObserver {
    fn on_tick_end(&mut self, _tick: Tick, fired: usize) {
        self.fired += fired;
    }

    fn on_snapshot(
        &mut self,
        tick:         Tick,
        vehicles:     &[VehicleElement],
        pedestrians:  &[Pedestrian],
        trajectories: &[Vec<TrajectorySample>],
    ) {
        self.snapshots += 1;
        let changing = vehicles.iter().filter(|v| v.state() != ManeuverState::LaneKeep).count();
        let samples: usize = trajectories.iter().map(Vec::len).sum();
        println!(
            "{:>6}  vehicles {:>2}  pedestrians {:>2}  maneuvering {:>2}  trajectory samples {:>5}",
            tick.to_string(),
            vehicles.len(),
            pedestrians.len(),
            changing,
            samples,
        );
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 1. Behavior tunables: defaults, or a JSON file given as the first argument.
    let behavior = match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            serde_json::from_str::<BehaviorConfig>(&text).with_context(|| format!("parsing {path}"))?
        }
        None => BehaviorConfig::default(),
    };

    // 2. Map and route.
    let map = build_highway(&behavior)?;
    let exit_route = DijkstraRouter.route(&map, RoadId(MAINLINE), RoadId(EXIT_RAMP))?;
    info!(roads = exit_route.roads.len(), length_m = exit_route.total_length_m, "exit route planned");

    // 3. Events.
    let events = load_viewers_reader(Cursor::new(EVENTS_CSV))?;
    println!("Loaded {} event viewers", events.len());

    // 4. Sim config.
    let config = SimConfig {
        step_secs:             STEP_SECS,
        total_ticks:           (SIM_SECS as f64 / STEP_SECS).round() as u64,
        start_abs_secs:        0.0,
        seed:                  SEED,
        output_interval_ticks: OUTPUT_INTERVAL_TICKS,
    };
    println!(
        "Sim: {} ticks of {} s, snapshot every {} ticks",
        config.total_ticks, config.step_secs, config.output_interval_ticks
    );
    println!();

    // 5. Build sim.
    let lane = |section, index| LaneUid::new(MAINLINE, section, index);
    let mut sim = SimBuilder::new(config, behavior, map)
        .vehicle(VehicleSpec::on_lane(ElementId(0), lane(0, -1), 0.0, 25.0))
        .vehicle(VehicleSpec::on_lane(ElementId(1), lane(0, -1), 40.0, 18.0).with_route(exit_route))
        .vehicle(VehicleSpec::on_lane(ElementId(2), lane(0, -3), 80.0, 15.0))
        .vehicle(VehicleSpec::on_lane(ElementId(3), lane(0, -2), 150.0, 12.0).with_dimensions(12.0, 2.5))
        .pedestrian(PedestrianSpec::new(ElementId(10), Vec2::new(300.0, 8.0), 0.0, 1.2))
        .ego(ElementId(0))
        .events(events)
        .build()?;

    // 6. Run.
    let mut obs = ProgressObserver::default();
    let t0 = Instant::now();
    sim.run(&mut obs)?;
    let elapsed = t0.elapsed();

    // 7. Summary.
    println!();
    println!("Simulation complete in {:.3} s", elapsed.as_secs_f64());
    println!("  events fired : {}", obs.fired);
    println!("  snapshots    : {}", obs.snapshots);
    println!();

    println!("{:<8} {:<20} {:>9} {:>8} {:>10}", "Vehicle", "Locator", "s", "v", "State");
    println!("{}", "-".repeat(60));
    for v in &sim.vehicles {
        println!(
            "{:<8} {:<20} {:>9.1} {:>8.1} {:>10}",
            v.id().0,
            v.locator().to_string(),
            v.s(),
            v.velocity(),
            v.state().to_string(),
        );
    }
    for p in &sim.pedestrians {
        let pos = p.position();
        println!("pedestrian {} at ({:.1}, {:.1})", p.id().0, pos.x, pos.y);
    }

    Ok(())
}
