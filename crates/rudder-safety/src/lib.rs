//! Safety classification and policy gating.
//!
//! The classifier assigns each raw command a [`SafetyLevel`], an elevation
//! flag, and a best-effort revert command; the gate turns a classified
//! command plus the active [`PolicyConfig`] into an admit/deny/confirm
//! verdict. Neither touches the process table: everything here is pure text
//! analysis, decided before any subprocess is spawned.
//!
//! [`SafetyLevel`]: rudder_core::SafetyLevel
//! [`PolicyConfig`]: rudder_core::PolicyConfig

pub mod classifier;
pub mod gate;
pub mod revert;

pub use classifier::{Classification, Classifier};
pub use gate::{PolicyGate, PolicyVerdict};
pub use revert::revert_command;
