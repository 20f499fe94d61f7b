use std::collections::HashMap;

use crate::error::SchedulingError;

use super::allocation::Allocation;
use super::ids::{ChargeId, MachineId, StageId};
use super::instance::Instance;
use super::time::{Minutes, Seconds};

/// Mutable per-machine state: current ready time and the ordered list of allocations
/// recorded so far.
#[derive(Debug, Clone)]
pub struct MachineState {
    pub id: MachineId,
    pub stage: StageId,
    pub ready_time: Seconds,
    pub allocations: Vec<Allocation>,
}

impl MachineState {
    fn new(id: MachineId, stage: StageId, ready_time: Seconds) -> Self {
        Self {
            id,
            stage,
            ready_time,
            allocations: Vec::new(),
        }
    }

    pub fn allocate(&mut self, charge: ChargeId, stage: StageId, start: Seconds, end: Seconds) {
        self.allocations.push(Allocation {
            charge,
            machine: self.id,
            stage,
            start,
            end,
        });
        self.ready_time = end;
    }
}

/// The collection of [`MachineState`] for every machine in an instance, keyed by machine id.
#[derive(Debug, Clone)]
pub struct MachineStates(HashMap<MachineId, MachineState>);

impl MachineStates {
    pub fn new(instance: &Instance) -> Self {
        let states = instance
            .machines
            .iter()
            .map(|m| (m.id, MachineState::new(m.id, m.stage, m.ready_time)))
            .collect();
        Self(states)
    }

    pub fn get(&self, id: MachineId) -> &MachineState {
        &self.0[&id]
    }

    pub fn get_mut(&mut self, id: MachineId) -> &mut MachineState {
        self.0.get_mut(&id).expect("machine id from instance")
    }

    /// Machines belonging to `stage`, in no particular order.
    pub fn in_stage<'a>(
        &'a self,
        instance: &'a Instance,
        stage: StageId,
    ) -> impl Iterator<Item = &'a MachineState> + 'a {
        instance
            .machines_in_stage(stage)
            .iter()
            .map(move |id| self.get(*id))
    }

    pub fn transport_time(
        &self,
        instance: &Instance,
        from: Option<MachineId>,
        to: MachineId,
    ) -> Result<Minutes, SchedulingError> {
        instance.transport_time(from, to)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MachineState> {
        self.0.values()
    }
}
