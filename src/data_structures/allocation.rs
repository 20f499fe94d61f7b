use serde::{Deserialize, Serialize};

use super::ids::{ChargeId, MachineId, StageId};
use super::time::Seconds;

/// One scheduling event: a charge occupying a machine for `[start, end)` at some stage.
///
/// Stored once per visit and indexed from both the charge's and the machine's allocation
/// list, so the two sides never drift out of sync under mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub charge: ChargeId,
    pub machine: MachineId,
    pub stage: StageId,
    pub start: Seconds,
    pub end: Seconds,
}

impl Allocation {
    pub fn duration(&self) -> Seconds {
        self.end - self.start
    }
}
