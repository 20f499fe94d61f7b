//! The three scalar penalties read off a finished simulation.

use crate::data_structures::Instance;

use super::scheduler::SimulationResult;

/// Per-objective weights applied before summing. Defaults to the unweighted sum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub lambda1: f64,
    pub lambda2: f64,
    pub lambda3: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            lambda1: 1.0,
            lambda2: 1.0,
            lambda3: 1.0,
        }
    }
}

/// z1: makespan. z2: inter-stage waiting, signed and unclamped. z3: processing-time deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Objectives {
    pub z1: f64,
    pub z2: f64,
    pub z3: f64,
}

/// Reads every final allocation and folds it into the three weighted penalties.
pub fn compute(instance: &Instance, result: &SimulationResult, weights: Weights) -> Objectives {
    Objectives {
        z1: weights.lambda1 * makespan(instance, result),
        z2: weights.lambda2 * waiting_time(instance, result),
        z3: weights.lambda3 * processing_time_deviation(instance, result),
    }
}

/// The latest end time over every allocation on a last-stage (caster) machine.
fn makespan(instance: &Instance, result: &SimulationResult) -> f64 {
    result
        .machines
        .in_stage(instance, instance.last_stage)
        .flat_map(|m| m.allocations.iter())
        .map(|a| a.end.as_f64())
        .fold(0.0, f64::max)
}

/// For every charge and every pair of consecutive allocations, adds
/// `start_{i+1} - end_i - tt[m_i][m_{i+1}] * 60`. Negative contributions (overlap induced by
/// reverse adjustment) are kept as-is, per the source this was distilled from.
fn waiting_time(instance: &Instance, result: &SimulationResult) -> f64 {
    let mut total = 0.0;
    for charge in result.charges.iter() {
        for pair in charge.allocations.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            let tt = instance
                .transport_time(Some(prev.machine), next.machine)
                .map(|m| m.to_seconds().as_f64())
                .unwrap_or(0.0);
            total += (next.start - prev.end).as_f64() - tt;
        }
    }
    total
}

/// Sums `|actual duration - standard duration|` over every allocation in the schedule.
fn processing_time_deviation(instance: &Instance, result: &SimulationResult) -> f64 {
    let mut total = 0.0;
    for charge in result.charges.iter() {
        for allocation in &charge.allocations {
            let std = if allocation.stage == instance.last_stage {
                instance.cc_time(allocation.charge).std
            } else {
                match instance.non_cc_time(allocation.charge, allocation.stage) {
                    Ok(envelope) => envelope.std,
                    Err(_) => continue,
                }
            };
            let actual = allocation.duration().as_f64();
            total += (actual - std.to_seconds().as_f64()).abs();
        }
    }
    total
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use float_cmp::approx_eq;

    use crate::data_structures::{
        CastId, ChargeId, ChargeRecord, Instance, MachineId, MachineRecord, Minutes, Route,
        Seconds, StageId, TimeEnvelope,
    };

    use super::super::scheduler::Scheduler;
    use super::{compute, Weights};

    fn env(std: i64) -> TimeEnvelope {
        TimeEnvelope {
            min: Minutes(std),
            std: Minutes(std),
            max: Minutes(std),
        }
    }

    /// z2 nets out the transport time spent moving between stages, leaving only the idle
    /// waiting as its signed contribution.
    #[test]
    fn waiting_time_nets_out_transport_time() {
        let m1 = MachineId(1);
        let m2 = MachineId(2);
        let mut non_cc = HashMap::new();
        non_cc.insert(StageId(1), env(10));
        let charge = ChargeRecord {
            id: ChargeId(1),
            route: Route(vec![StageId(1), StageId(2)]),
            caster: m2,
            cast_id: CastId(1),
            non_cc_times: non_cc,
            cc_times: env(15),
        };
        let machines = vec![
            MachineRecord {
                id: m1,
                stage: StageId(1),
                ready_time: Seconds(0),
            },
            MachineRecord {
                id: m2,
                stage: StageId(2),
                ready_time: Seconds(2000),
            },
        ];
        let transport = HashMap::from([((m1, m2), Minutes(5))]);
        let instance = Instance::new(
            vec![charge],
            machines,
            transport,
            HashMap::from([(m2, vec![ChargeId(1)])]),
        )
        .unwrap();

        // Machine m2 isn't ready until t=2000, well after m1 finishes (t=600) plus the 5 minute
        // transport (t=900), so the charge idles for 1100 seconds waiting for the caster.
        let result = Scheduler::new(0).run(&instance).unwrap();
        let objectives = compute(&instance, &result, Weights::default());

        assert!(approx_eq!(f64, objectives.z2, 1100.0, epsilon = 1e-9));
    }
}
