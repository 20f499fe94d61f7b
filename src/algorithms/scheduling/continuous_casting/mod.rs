//! The continuous-casting list-scheduling kernel.
//!
//! [`Scheduler::run`] dispatches every charge across its route, stage by stage, then allocates
//! the predefined terminal continuous-casting stage and back-shifts starts for casting
//! continuity. [`objectives::compute`] reads the resulting allocations to produce the three
//! scalar penalties.

mod scheduler;

pub mod objectives;

pub use scheduler::{Scheduler, SimulationResult};
