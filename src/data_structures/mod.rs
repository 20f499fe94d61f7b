pub mod allocation;
pub mod charge_state;
pub mod envelope;
pub mod ids;
pub mod instance;
pub mod machine_state;
pub mod time;

pub use allocation::Allocation;
pub use charge_state::{ChargeState, ChargeStates};
pub use envelope::{ProcessingTimeKind, TimeEnvelope};
pub use ids::{CastId, ChargeId, MachineId, StageId};
pub use instance::{ChargeRecord, Instance, MachineRecord, Route};
pub use machine_state::{MachineState, MachineStates};
pub use time::{Minutes, Seconds};
