use std::collections::HashMap;

use super::allocation::Allocation;
use super::ids::{ChargeId, MachineId, StageId};
use super::instance::Instance;
use super::time::Seconds;

/// Mutable per-charge state: current ready time, last-visited machine and the ordered
/// list of allocations recorded so far.
#[derive(Debug, Clone)]
pub struct ChargeState {
    pub id: ChargeId,
    pub ready_time: Seconds,
    pub prev_machine: Option<MachineId>,
    pub allocations: Vec<Allocation>,
}

impl ChargeState {
    fn new(id: ChargeId) -> Self {
        Self {
            id,
            ready_time: Seconds::EPOCH_ZERO,
            prev_machine: None,
            allocations: Vec::new(),
        }
    }

    pub fn allocate(&mut self, machine: MachineId, stage: StageId, start: Seconds, end: Seconds) {
        self.allocations.push(Allocation {
            charge: self.id,
            machine,
            stage,
            start,
            end,
        });
        self.ready_time = end;
        self.prev_machine = Some(machine);
    }
}

/// The collection of [`ChargeState`] for every charge in an instance, keyed by charge id.
#[derive(Debug, Clone)]
pub struct ChargeStates(HashMap<ChargeId, ChargeState>);

impl ChargeStates {
    pub fn new(instance: &Instance) -> Self {
        let states = instance
            .charges
            .iter()
            .map(|c| (c.id, ChargeState::new(c.id)))
            .collect();
        Self(states)
    }

    pub fn get(&self, id: ChargeId) -> &ChargeState {
        &self.0[&id]
    }

    pub fn get_mut(&mut self, id: ChargeId) -> &mut ChargeState {
        self.0.get_mut(&id).expect("charge id from instance")
    }

    /// Charges whose route visits `stage`, in no particular order.
    pub fn in_stage<'a>(
        &'a self,
        instance: &'a Instance,
        stage: StageId,
    ) -> impl Iterator<Item = &'a ChargeState> + 'a {
        instance
            .charges_in_stage(stage)
            .iter()
            .map(move |id| self.get(*id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChargeState> {
        self.0.values()
    }
}
