//! Plan orchestration.
//!
//! A plan is an ordered list of commands. The runner walks it sequentially:
//! each command is re-classified, gated against policy, confirmed with the
//! operator when required, then executed. A decline or an interrupt cancels
//! everything that has not run yet; nothing in a plan ever runs out of order
//! or twice.

pub mod confirm;
pub mod report;
pub mod runner;

pub use confirm::{AutoApprove, ConfirmationPrompt};
pub use report::{RunReport, StepOutcome, StepReport};
pub use runner::{PlanRunner, RunError, RunOptions};
