//! Domain model, configuration, and host snapshot shared across rudder crates.

pub mod command;
pub mod config;
pub mod host;
pub mod outcome;

pub use command::{Command, SafetyLevel};
pub use config::{AuditConfig, Config, ExecConfig, PolicyConfig, PolicyMode};
pub use host::{HostInfo, OsKind};
pub use outcome::{ExecutionResult, ExecutionStatus, MAX_CAPTURE_BYTES, bound_capture};
