//! Subprocess execution and run-record logging.
//!
//! The engine runs one admitted command at a time through the host shell and
//! reports everything, including launch failures and timeouts, as an
//! [`ExecutionResult`]; it never panics on a misbehaving child. The logger
//! appends one JSON line per step to stdout or a file.
//!
//! [`ExecutionResult`]: rudder_core::ExecutionResult

pub mod engine;
pub mod record;

pub use engine::ExecEngine;
pub use record::{RunDisposition, RunLogger, RunRecord};
