//! CSV trigger-table loader.
//!
//! # CSV format
//!
//! One row per trigger row.  Rows of the same `(element_id, kind)` pair form
//! one event, in file order.
//!
//! ```csv
//! element_id,kind,trigger,threshold,projection,trigger_index,value,direction,duration,offset,end_kind,end_value
//! 3,acc_time,time,2.0,,,1.5,,,,time,3.0
//! 3,merge_condition,ego_distance,30.0,lane,1,,1,4.0,,,
//! 4,pedestrian_time,time,1.0,,,1.2,90,,,,
//! ```
//!
//! | Column          | Meaning                                                        |
//! |-----------------|----------------------------------------------------------------|
//! | `kind`          | `acc_time`, `acc_condition`, `merge_time`, `merge_condition`, `velocity_time`, `velocity_condition`, `pedestrian_time`, `pedestrian_condition` |
//! | `trigger`       | `time`, `ttc`, `ego_distance`                                  |
//! | `threshold`     | seconds (`time`, `ttc`) or metres (`ego_distance`)             |
//! | `projection`    | `euclidean` (default) or `lane`                                |
//! | `value`         | acceleration, velocity or walking speed                        |
//! | `direction`     | merge direction code (−2..2) or pedestrian heading change, degrees |
//! | `duration`, `offset` | merge only; empty takes the configured default            |
//! | `end_kind`      | empty/`none`, `time`, `velocity`                               |

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use tf_core::{ElementId, MoveDirection};

use crate::catalog::{EventViewer, PayloadSpec, RowSpec, TriggerSpec};
use crate::condition::{DistanceProjection, EndCondition};
use crate::event::EventKind;
use crate::{EventError, EventResult};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TriggerRecord {
    element_id:    u32,
    kind:          String,
    trigger:       String,
    threshold:     f64,
    projection:    Option<String>,
    trigger_index: Option<u32>,
    value:         Option<f64>,
    direction:     Option<f64>,
    duration:      Option<f64>,
    offset:        Option<f64>,
    end_kind:      Option<String>,
    end_value:     Option<f64>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load event viewers from a CSV file.
pub fn load_viewers_csv(path: &Path) -> EventResult<Vec<(ElementId, EventViewer)>> {
    let file = std::fs::File::open(path)?;
    load_viewers_reader(file)
}

/// Like [`load_viewers_csv`] but accepts any `Read` source.
pub fn load_viewers_reader<R: Read>(reader: R) -> EventResult<Vec<(ElementId, EventViewer)>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut out: Vec<(ElementId, EventViewer)> = Vec::new();
    let mut slot: HashMap<(ElementId, EventKind), usize> = HashMap::new();

    for result in csv_reader.deserialize::<TriggerRecord>() {
        let rec = result?;
        let element = ElementId(rec.element_id);
        let kind: EventKind = rec.kind.parse()?;
        let trigger = parse_trigger(&rec)?;
        let payload = parse_payload(kind, &rec)?;
        let end = parse_end(&rec)?;

        let idx = *slot.entry((element, kind)).or_insert_with(|| {
            out.push((element, EventViewer::new(kind)));
            out.len() - 1
        });
        let viewer = &mut out[idx].1;
        viewer.rows.push(RowSpec::new(trigger, payload));
        viewer.end_conditions.push(end);
    }

    Ok(out)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_trigger(rec: &TriggerRecord) -> EventResult<TriggerSpec> {
    let projection = match rec.projection.as_deref().map(str::trim) {
        None | Some("") | Some("euclidean") => DistanceProjection::Euclidean,
        Some("lane") => DistanceProjection::LaneProjected,
        Some(p) => {
            return Err(EventError::Parse(format!(
                "invalid projection {p:?}: expected \"euclidean\" or \"lane\""
            )));
        }
    };
    let threshold = rec.threshold;
    let trigger_index = rec.trigger_index.unwrap_or(0);
    match rec.trigger.trim() {
        "time" => Ok(TriggerSpec::Time(threshold)),
        "ttc" => Ok(TriggerSpec::Ttc { threshold, projection, trigger_index }),
        "ego_distance" => Ok(TriggerSpec::EgoDistance { threshold, projection, trigger_index }),
        t => Err(EventError::Parse(format!(
            "invalid trigger {t:?}: expected \"time\", \"ttc\" or \"ego_distance\""
        ))),
    }
}

fn required(value: Option<f64>, column: &str, kind: EventKind) -> EventResult<f64> {
    value.ok_or_else(|| EventError::Parse(format!("{kind} row is missing `{column}`")))
}

fn parse_payload(kind: EventKind, rec: &TriggerRecord) -> EventResult<PayloadSpec> {
    Ok(match kind {
        EventKind::AccelerationByTime | EventKind::AccelerationByCondition => {
            PayloadSpec::Acceleration(required(rec.value, "value", kind)?)
        }
        EventKind::VelocityByTime | EventKind::VelocityByCondition => {
            PayloadSpec::Velocity(required(rec.value, "value", kind)?)
        }
        EventKind::MergeByTime | EventKind::MergeByCondition => {
            let code = rec.direction.unwrap_or(0.0);
            if code.fract() != 0.0 {
                return Err(EventError::Parse(format!("merge direction {code} is not an integer code")));
            }
            let direction = MoveDirection::try_from(code as i32)
                .map_err(|e| EventError::Parse(e.to_string()))?;
            PayloadSpec::Merge { direction, duration: rec.duration, offset: rec.offset }
        }
        EventKind::PedestrianTimeVelocity | EventKind::PedestrianConditionVelocity => {
            PayloadSpec::PedestrianVelocity {
                direction_deg: rec.direction.unwrap_or(0.0),
                velocity:      required(rec.value, "value", kind)?,
            }
        }
    })
}

fn parse_end(rec: &TriggerRecord) -> EventResult<EndCondition> {
    let value = rec.end_value.unwrap_or(0.0);
    match rec.end_kind.as_deref().map(str::trim) {
        None | Some("") | Some("none") => Ok(EndCondition::none()),
        Some("time") => Ok(EndCondition::time(value)),
        Some("velocity") => Ok(EndCondition::velocity(value)),
        Some(k) => Err(EventError::Parse(format!(
            "invalid end_kind {k:?}: expected \"none\", \"time\" or \"velocity\""
        ))),
    }
}
