//! Loads an [`Instance`] from the six logical CSV tables that describe it on disk.
//!
//! Grounded in `original_source/src/continuous_casting/utils.py::get_instances` for the table
//! names, column meanings and the `"<from>-<to>"`/dash-separated route parsing conventions,
//! read with the crate's own [`super::csv`] helper the way the teacher's binaries do.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::data_structures::{
    CastId, ChargeId, ChargeRecord, Instance, MachineId, MachineRecord, Minutes, Route, Seconds,
    StageId, TimeEnvelope,
};
use crate::error::SchedulingError;

use super::csv::read_from_file;

const EAT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
struct CastPlanRow {
    #[serde(rename = "ChargeID")]
    charge_id: u32,
    #[serde(rename = "CC")]
    cc: u32,
    #[serde(rename = "ChargeRoute")]
    charge_route: String,
    #[serde(rename = "CastID")]
    cast_id: u32,
}

#[derive(Debug, Deserialize)]
struct NonCcProcessingTimeRow {
    #[serde(rename = "ChargeID")]
    charge_id: u32,
    #[serde(rename = "StageID")]
    stage_id: u32,
    #[serde(rename = "MinTime")]
    min_time: i64,
    #[serde(rename = "StandardTime")]
    standard_time: i64,
    #[serde(rename = "MaxTime")]
    max_time: i64,
}

#[derive(Debug, Deserialize)]
struct CcProcessingTimeRow {
    #[serde(rename = "ChargeID")]
    charge_id: u32,
    #[serde(rename = "MinTime")]
    min_time: i64,
    #[serde(rename = "StandardTime")]
    standard_time: i64,
    #[serde(rename = "MaxTime")]
    max_time: i64,
}

#[derive(Debug, Deserialize)]
struct EarliestAvailableTimeRow {
    #[serde(rename = "MachineID")]
    machine_id: u32,
    #[serde(rename = "EAT")]
    eat: String,
}

#[derive(Debug, Deserialize)]
struct StageRow {
    #[serde(rename = "MachineID")]
    machine_id: u32,
    #[serde(rename = "StageID")]
    stage_id: u32,
}

#[derive(Debug, Deserialize)]
struct TransportTimeRow {
    #[serde(rename = "Transport_line")]
    transport_line: String,
    #[serde(rename = "Transport_Time")]
    transport_time: i64,
}

fn parse_route(raw: &str, charge_id: ChargeId) -> Result<Route, SchedulingError> {
    raw.split('-')
        .map(|part| {
            part.trim()
                .parse::<u32>()
                .map(|n| StageId(n))
                .map_err(|_| SchedulingError::MalformedInstance {
                    reason: format!("charge {charge_id} has an unparseable route entry {part:?}"),
                })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Route)
}

fn parse_transport_line(raw: &str) -> Result<(MachineId, MachineId), SchedulingError> {
    let parts: Vec<&str> = raw.split('-').collect();
    let [from, to] = parts.as_slice() else {
        return Err(SchedulingError::MalformedInstance {
            reason: format!("transport line {raw:?} is not formatted \"<from>-<to>\""),
        });
    };
    let parse = |s: &str| {
        s.trim()
            .parse::<u32>()
            .map(MachineId)
            .map_err(|_| SchedulingError::MalformedInstance {
                reason: format!("transport line {raw:?} has an unparseable machine id"),
            })
    };
    Ok((parse(from)?, parse(to)?))
}

fn parse_eat(raw: &str, machine_id: MachineId) -> Result<Seconds, SchedulingError> {
    NaiveDateTime::parse_from_str(raw, EAT_FORMAT)
        .map(|dt| Seconds(dt.and_utc().timestamp()))
        .map_err(|_| SchedulingError::MalformedInstance {
            reason: format!("machine {machine_id} has an unparseable EAT timestamp {raw:?}"),
        })
}

/// Reads `Cast_plan.csv`, `nonCC_Processing_Time.csv`, `CC_Processing_Time.csv`,
/// `Earliest_available_time.csv`, `Stage.csv` and `Transport_Time.csv` from `dir` and
/// assembles them into an [`Instance`].
pub fn load_instance(dir: &Path) -> Result<Instance, SchedulingError> {
    let cast_plan: Vec<CastPlanRow> = read_from_file(dir.join("Cast_plan.csv"))?;
    let non_cc_rows: Vec<NonCcProcessingTimeRow> =
        read_from_file(dir.join("nonCC_Processing_Time.csv"))?;
    let cc_rows: Vec<CcProcessingTimeRow> = read_from_file(dir.join("CC_Processing_Time.csv"))?;
    let eat_rows: Vec<EarliestAvailableTimeRow> =
        read_from_file(dir.join("Earliest_available_time.csv"))?;
    let stage_rows: Vec<StageRow> = read_from_file(dir.join("Stage.csv"))?;
    let transport_rows: Vec<TransportTimeRow> = read_from_file(dir.join("Transport_Time.csv"))?;

    let mut ready_times: HashMap<MachineId, Seconds> = HashMap::with_capacity(eat_rows.len());
    for row in &eat_rows {
        let machine_id = MachineId(row.machine_id);
        ready_times.insert(machine_id, parse_eat(&row.eat, machine_id)?);
    }

    let mut machines = Vec::with_capacity(stage_rows.len());
    for row in &stage_rows {
        let id = MachineId(row.machine_id);
        let ready_time =
            ready_times
                .get(&id)
                .copied()
                .ok_or_else(|| SchedulingError::MalformedInstance {
                    reason: format!("machine {id} has no entry in the earliest-available-time table"),
                })?;
        machines.push(MachineRecord {
            id,
            stage: StageId(row.stage_id),
            ready_time,
        });
    }

    let mut non_cc_times: HashMap<ChargeId, HashMap<StageId, TimeEnvelope>> = HashMap::new();
    for row in &non_cc_rows {
        non_cc_times
            .entry(ChargeId(row.charge_id))
            .or_default()
            .insert(
                StageId(row.stage_id),
                TimeEnvelope {
                    min: Minutes(row.min_time),
                    std: Minutes(row.standard_time),
                    max: Minutes(row.max_time),
                },
            );
    }

    let mut cc_times: HashMap<ChargeId, TimeEnvelope> = HashMap::with_capacity(cc_rows.len());
    for row in &cc_rows {
        cc_times.insert(
            ChargeId(row.charge_id),
            TimeEnvelope {
                min: Minutes(row.min_time),
                std: Minutes(row.standard_time),
                max: Minutes(row.max_time),
            },
        );
    }

    let mut charges = Vec::with_capacity(cast_plan.len());
    let mut caster_by_charge: HashMap<ChargeId, MachineId> = HashMap::with_capacity(cast_plan.len());
    for row in &cast_plan {
        let charge_id = ChargeId(row.charge_id);
        let caster = MachineId(row.cc);
        caster_by_charge.insert(charge_id, caster);

        let cc_envelope =
            cc_times
                .get(&charge_id)
                .copied()
                .ok_or_else(|| SchedulingError::MalformedInstance {
                    reason: format!(
                        "charge {charge_id} has no row in the continuous-casting processing-time table"
                    ),
                })?;

        charges.push(ChargeRecord {
            id: charge_id,
            route: parse_route(&row.charge_route, charge_id)?,
            caster,
            cast_id: CastId(row.cast_id),
            non_cc_times: non_cc_times.remove(&charge_id).unwrap_or_default(),
            cc_times: cc_envelope,
        });
    }

    // The row order within `CC_Processing_Time.csv` defines the cast sequence on each caster.
    let mut cast_sequences: HashMap<MachineId, Vec<ChargeId>> = HashMap::new();
    for row in &cc_rows {
        let charge_id = ChargeId(row.charge_id);
        let caster = *caster_by_charge.get(&charge_id).ok_or_else(|| {
            SchedulingError::MalformedInstance {
                reason: format!(
                    "charge {charge_id} appears in the casting table but not in the cast plan"
                ),
            }
        })?;
        cast_sequences.entry(caster).or_default().push(charge_id);
    }

    let mut transport_times = HashMap::with_capacity(transport_rows.len());
    for row in &transport_rows {
        let (from, to) = parse_transport_line(&row.transport_line)?;
        transport_times.insert((from, to), Minutes(row.transport_time));
    }

    Instance::new(charges, machines, transport_times, cast_sequences)
}

#[cfg(test)]
mod test {
    use std::fs;

    use tempfile::tempdir;

    use super::load_instance;

    #[test]
    fn loads_a_two_stage_instance_from_csv() {
        let dir = tempdir().unwrap();

        fs::write(
            dir.path().join("Cast_plan.csv"),
            "ChargeID,CC,ChargeRoute,CastID\n1,20,1-2,1\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("nonCC_Processing_Time.csv"),
            "ChargeID,StageID,MinTime,StandardTime,MaxTime\n1,1,8,10,12\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("CC_Processing_Time.csv"),
            "ChargeID,MinTime,StandardTime,MaxTime\n1,13,15,18\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("Earliest_available_time.csv"),
            "MachineID,EAT\n10,2024-01-01 00:00:00\n20,2024-01-01 00:00:00\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("Stage.csv"),
            "MachineID,StageID\n10,1\n20,2\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("Transport_Time.csv"),
            "Transport_line,Transport_Time\n10-20,5\n",
        )
        .unwrap();

        let instance = load_instance(dir.path()).unwrap();

        assert_eq!(instance.charges.len(), 1);
        assert_eq!(instance.machines.len(), 2);
        assert_eq!(instance.last_stage, crate::data_structures::StageId(2));
        assert_eq!(
            instance.cast_sequences[&crate::data_structures::MachineId(20)],
            vec![crate::data_structures::ChargeId(1)]
        );
    }
}
