use std::fmt;

use crate::data_structures::ids::{ChargeId, MachineId, StageId};
use crate::io::IOError;

/// Everything that can go wrong building or running a scheduling instance.
///
/// `MalformedInstance` is raised at instance construction; the kernel itself is never invoked
/// on an instance that failed to build. The remaining variants are raised by the kernel while
/// dispatching and always carry enough context (charge, stage, machine) to locate the bad
/// record in the source tables.
#[derive(Debug)]
pub enum SchedulingError {
    MalformedInstance { reason: String },
    StageWithNoMachines { stage: StageId },
    MissingTransportTime { from: MachineId, to: MachineId },
    InconsistentCastPlan { charge: ChargeId, caster: MachineId },
    Io(IOError),
}

impl fmt::Display for SchedulingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulingError::MalformedInstance { reason } => {
                write!(f, "malformed instance: {reason}")
            }
            SchedulingError::StageWithNoMachines { stage } => {
                write!(f, "stage {stage} has charges to process but no machines")
            }
            SchedulingError::MissingTransportTime { from, to } => {
                write!(f, "no transport time recorded from machine {from} to machine {to}")
            }
            SchedulingError::InconsistentCastPlan { charge, caster } => {
                write!(
                    f,
                    "charge {charge} is not present in the cast sequence of its predefined caster {caster}"
                )
            }
            SchedulingError::Io(why) => write!(f, "{why}"),
        }
    }
}

impl std::error::Error for SchedulingError {}

impl From<IOError> for SchedulingError {
    fn from(why: IOError) -> Self {
        SchedulingError::Io(why)
    }
}
