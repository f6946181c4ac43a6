//! Synthetic highway with an exit ramp.
//!
//! ```text
//!  road 1, section 0       road 1, section 1        road 2
//!  (0,0) ───────────── (400,0) ───────────── (800,0) ⇢ (820,0) ─────────── (1320,0)
//!   3 lanes, 3.5 m          3 lanes                 3 lanes
//!                                        lane -3 ⇢ road 3 (exit ramp, 1 lane)
//! ```

use anyhow::Result;

use tf_core::{BehaviorConfig, LaneUid, Vec2};
use tf_spatial::{LaneMap, LaneMapBuilder};

pub const MAINLINE: u32 = 1;
pub const CONTINUATION: u32 = 2;
pub const EXIT_RAMP: u32 = 3;

const LANE_WIDTH: f64 = 3.5;

pub fn build_highway(behavior: &BehaviorConfig) -> Result<LaneMap> {
    let mut b = LaneMapBuilder::from_behavior(behavior);

    b.add_straight_section(MAINLINE, 0, Vec2::ZERO, 0.0, 400.0, 3, LANE_WIDTH)?;
    b.add_straight_section(MAINLINE, 1, Vec2::new(400.0, 0.0), 0.0, 400.0, 3, LANE_WIDTH)?;
    b.connect_sections(MAINLINE, 0)?;

    b.add_straight_section(CONTINUATION, 0, Vec2::new(820.0, 0.0), 0.0, 500.0, 3, LANE_WIDTH)?;
    for lane in -3..=-1 {
        b.add_lane_link(LaneUid::new(MAINLINE, 1, lane), LaneUid::new(CONTINUATION, 0, lane), None)?;
    }

    // The ramp leaves to the right at roughly -11°.
    b.add_straight_section(EXIT_RAMP, 0, Vec2::new(820.0, -12.0), -0.2, 300.0, 1, LANE_WIDTH)?;
    b.set_solid_boundary(LaneUid::new(EXIT_RAMP, 0, -1), tf_core::Side::Left, true)?;
    b.add_lane_link(LaneUid::new(MAINLINE, 1, -3), LaneUid::new(EXIT_RAMP, 0, -1), None)?;

    Ok(b.build())
}
