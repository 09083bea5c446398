//! The escalation scheduler (§4.E): a periodic sweep over eligible tickets
//! that applies the repeat/escalate/max-level decision table, plus the
//! process-wide start/stop lifecycle that drives it.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod deps;
pub mod handle;
pub mod tick;

pub use deps::SchedulerDeps;
pub use handle::EscalationScheduler;
pub use tick::run_once;
