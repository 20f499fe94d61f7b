use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::SchedulingError;

use super::envelope::TimeEnvelope;
use super::ids::{CastId, ChargeId, MachineId, StageId};
use super::time::{Minutes, Seconds};

/// A charge's ordered sequence of stages. The last element is always the terminal stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route(pub Vec<StageId>);

impl Route {
    pub fn last_stage(&self) -> Option<StageId> {
        self.0.last().copied()
    }

    pub fn contains(&self, stage: StageId) -> bool {
        self.0.contains(&stage)
    }
}

/// A charge's immutable input data: its route, predefined caster, cast grouping and
/// processing-time envelopes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRecord {
    pub id: ChargeId,
    pub route: Route,
    pub caster: MachineId,
    pub cast_id: CastId,
    pub non_cc_times: HashMap<StageId, TimeEnvelope>,
    pub cc_times: TimeEnvelope,
}

/// A machine's immutable input data: which stage it belongs to and its earliest available time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineRecord {
    pub id: MachineId,
    pub stage: StageId,
    pub ready_time: Seconds,
}

/// The immutable input bundle the kernel dispatches against.
///
/// Built once by [`Instance::new`], which validates the invariants from the instance tables
/// and precomputes the `charges_in_stage`/`machines_in_stage` indices used by every stage of
/// the dispatch loop.
#[derive(Debug, Clone)]
pub struct Instance {
    pub charges: Vec<ChargeRecord>,
    pub machines: Vec<MachineRecord>,
    pub transport_times: HashMap<(MachineId, MachineId), Minutes>,
    /// Per caster machine, the predefined cast sequence (row order in the source table).
    pub cast_sequences: HashMap<MachineId, Vec<ChargeId>>,
    pub last_stage: StageId,

    charges_in_stage: HashMap<StageId, Vec<ChargeId>>,
    machines_in_stage: HashMap<StageId, Vec<MachineId>>,
    charges_by_id: HashMap<ChargeId, usize>,
    machines_by_id: HashMap<MachineId, usize>,
}

impl Instance {
    pub fn new(
        charges: Vec<ChargeRecord>,
        machines: Vec<MachineRecord>,
        transport_times: HashMap<(MachineId, MachineId), Minutes>,
        cast_sequences: HashMap<MachineId, Vec<ChargeId>>,
    ) -> Result<Self, SchedulingError> {
        let last_stage = machines
            .iter()
            .map(|m| m.stage)
            .max()
            .ok_or_else(|| SchedulingError::MalformedInstance {
                reason: "instance has no machines".into(),
            })?;

        let mut charges_in_stage: HashMap<StageId, Vec<ChargeId>> = HashMap::new();
        let mut charges_by_id = HashMap::with_capacity(charges.len());
        for (idx, charge) in charges.iter().enumerate() {
            charges_by_id.insert(charge.id, idx);

            match charge.route.last_stage() {
                Some(stage) if stage == last_stage => {}
                _ => {
                    return Err(SchedulingError::MalformedInstance {
                        reason: format!(
                            "charge {} does not end its route at the terminal stage {}",
                            charge.id, last_stage
                        ),
                    })
                }
            }

            for &stage in &charge.route.0 {
                charges_in_stage.entry(stage).or_default().push(charge.id);
            }
        }

        let mut machines_in_stage: HashMap<StageId, Vec<MachineId>> = HashMap::new();
        let mut machines_by_id = HashMap::with_capacity(machines.len());
        for (idx, machine) in machines.iter().enumerate() {
            machines_by_id.insert(machine.id, idx);
            machines_in_stage
                .entry(machine.stage)
                .or_default()
                .push(machine.id);
        }

        for charge in &charges {
            let caster_stage = machines_by_id
                .get(&charge.caster)
                .map(|&idx| machines[idx].stage);
            if caster_stage != Some(last_stage) {
                return Err(SchedulingError::MalformedInstance {
                    reason: format!(
                        "charge {}'s predefined caster {} does not belong to the terminal stage",
                        charge.id, charge.caster
                    ),
                });
            }

            match cast_sequences.get(&charge.caster) {
                Some(sequence) if sequence.contains(&charge.id) => {}
                _ => {
                    return Err(SchedulingError::InconsistentCastPlan {
                        charge: charge.id,
                        caster: charge.caster,
                    })
                }
            }
        }

        Ok(Self {
            charges,
            machines,
            transport_times,
            cast_sequences,
            last_stage,
            charges_in_stage,
            machines_in_stage,
            charges_by_id,
            machines_by_id,
        })
    }

    pub fn charge(&self, id: ChargeId) -> &ChargeRecord {
        &self.charges[self.charges_by_id[&id]]
    }

    pub fn machine(&self, id: MachineId) -> &MachineRecord {
        &self.machines[self.machines_by_id[&id]]
    }

    pub fn charges_in_stage(&self, stage: StageId) -> &[ChargeId] {
        self.charges_in_stage
            .get(&stage)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn machines_in_stage(&self, stage: StageId) -> &[MachineId] {
        self.machines_in_stage
            .get(&stage)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All non-terminal stages, in ascending order, the order the dispatch loop visits them in.
    ///
    /// Derived from the charges' routes (`charges_in_stage`), not from which stages happen to
    /// have a registered machine: a route stage with zero machines must still be visited so the
    /// dispatch loop can raise `StageWithNoMachines`, matching
    /// `original_source/src/continuous_casting/charges.py`, where stage identity comes from a
    /// charge's `ChargeRoute`.
    pub fn non_terminal_stages(&self) -> Vec<StageId> {
        let mut stages: Vec<StageId> = self
            .charges_in_stage
            .keys()
            .copied()
            .filter(|&s| s != self.last_stage)
            .collect();
        stages.sort_unstable();
        stages
    }

    pub fn transport_time(
        &self,
        from: Option<MachineId>,
        to: MachineId,
    ) -> Result<Minutes, SchedulingError> {
        match from {
            None => Ok(Minutes::ZERO),
            Some(from) => self
                .transport_times
                .get(&(from, to))
                .copied()
                .ok_or(SchedulingError::MissingTransportTime { from, to }),
        }
    }

    pub fn non_cc_time(
        &self,
        charge: ChargeId,
        stage: StageId,
    ) -> Result<TimeEnvelope, SchedulingError> {
        self.charge(charge)
            .non_cc_times
            .get(&stage)
            .copied()
            .ok_or_else(|| SchedulingError::MalformedInstance {
                reason: format!("charge {charge} has no processing-time envelope for stage {stage}"),
            })
    }

    pub fn cc_time(&self, charge: ChargeId) -> TimeEnvelope {
        self.charge(charge).cc_times
    }
}
