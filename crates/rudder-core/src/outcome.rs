use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::command::Command;

/// Final state of one command in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Success,
    Failed,
    Timeout,
    Cancelled,
    Skipped,
}

impl ExecutionStatus {
    /// True for outcomes that make the overall invocation exit non-zero.
    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Timeout)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Per-stream capture cap. Output beyond this is truncated head+tail with an
/// explicit marker, never dropped silently.
pub const MAX_CAPTURE_BYTES: usize = 65_536;

/// Outcome of running (or deliberately not running) one admitted command.
///
/// `return_code` is present iff the process actually started: a launch
/// failure and a non-zero exit are both `Failed` but remain distinguishable.
/// Immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub command: Command,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_code: Option<i32>,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    /// Elapsed wall-clock seconds.
    pub execution_time: f64,
    /// Start time of the attempt.
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ExecutionResult {
    /// Synthetic result for dry-run mode: no process is spawned.
    #[must_use]
    pub fn skipped(command: Command) -> Self {
        Self {
            command,
            status: ExecutionStatus::Skipped,
            return_code: None,
            stdout: String::new(),
            stderr: String::new(),
            execution_time: 0.0,
            timestamp: Utc::now(),
            error_message: None,
        }
    }

    /// Synthetic result for a command the user declined or interrupted.
    #[must_use]
    pub fn cancelled(command: Command, reason: impl Into<String>) -> Self {
        Self {
            command,
            status: ExecutionStatus::Cancelled,
            return_code: None,
            stdout: String::new(),
            stderr: String::new(),
            execution_time: 0.0,
            timestamp: Utc::now(),
            error_message: Some(reason.into()),
        }
    }

    #[must_use]
    pub fn process_started(&self) -> bool {
        self.return_code.is_some()
    }
}

/// Bound captured output to [`MAX_CAPTURE_BYTES`] using a head+tail split.
#[must_use]
pub fn bound_capture(output: &str) -> String {
    if output.len() <= MAX_CAPTURE_BYTES {
        return output.to_string();
    }

    let half = MAX_CAPTURE_BYTES / 2;
    let head_end = floor_char_boundary(output, half);
    let tail_start = ceil_char_boundary(output, output.len() - half);
    let truncated = tail_start - head_end;

    format!(
        "{}\n... [truncated {truncated} bytes, showing first and last ~{half} bytes] ...\n{}",
        &output[..head_end],
        &output[tail_start..]
    )
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx < s.len() && !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}
