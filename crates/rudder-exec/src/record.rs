use std::path::Path;

use chrono::{DateTime, Utc};

use rudder_core::{AuditConfig, Command, ExecutionResult, ExecutionStatus, SafetyLevel};

/// Appends one JSON line per plan step to stdout or a file.
#[derive(Debug)]
pub struct RunLogger {
    destination: RunDestination,
}

#[derive(Debug)]
enum RunDestination {
    Stdout,
    File(tokio::sync::Mutex<tokio::fs::File>),
}

/// One line of run history: what was asked, what the gate said, what happened.
#[derive(serde::Serialize)]
pub struct RunRecord {
    pub timestamp: DateTime<Utc>,
    pub command: String,
    pub safety_level: SafetyLevel,
    pub disposition: RunDisposition,
    pub duration_ms: u64,
}

#[derive(serde::Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RunDisposition {
    Executed {
        status: ExecutionStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        return_code: Option<i32>,
    },
    Denied {
        reason: String,
    },
    Declined,
    Skipped,
}

impl RunRecord {
    /// Record for a command that reached the engine (or was skipped/declined
    /// after classification); the result carries the rest.
    #[must_use]
    pub fn from_result(result: &ExecutionResult) -> Self {
        let disposition = match result.status {
            ExecutionStatus::Skipped => RunDisposition::Skipped,
            ExecutionStatus::Cancelled if !result.process_started() => RunDisposition::Declined,
            status => RunDisposition::Executed {
                status,
                return_code: result.return_code,
            },
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let duration_ms = (result.execution_time * 1000.0) as u64;
        Self {
            timestamp: result.timestamp,
            command: result.command.text.clone(),
            safety_level: result.command.safety_level,
            disposition,
            duration_ms,
        }
    }

    /// Record for a command the gate refused; nothing was executed.
    #[must_use]
    pub fn denied(command: &Command, reason: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            command: command.text.clone(),
            safety_level: command.safety_level,
            disposition: RunDisposition::Denied {
                reason: reason.into(),
            },
            duration_ms: 0,
        }
    }
}

impl RunLogger {
    /// Build a logger from config.
    ///
    /// # Errors
    ///
    /// Returns an error if a file destination cannot be opened for append.
    pub async fn from_config(config: &AuditConfig) -> Result<Self, std::io::Error> {
        let destination = if config.destination == "stdout" {
            RunDestination::Stdout
        } else {
            let file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(Path::new(&config.destination))
                .await?;
            RunDestination::File(tokio::sync::Mutex::new(file))
        };

        Ok(Self { destination })
    }

    pub async fn log(&self, record: &RunRecord) {
        let Ok(json) = serde_json::to_string(record) else {
            return;
        };

        match &self.destination {
            RunDestination::Stdout => {
                tracing::info!(target: "run_history", "{json}");
            }
            RunDestination::File(file) => {
                use tokio::io::AsyncWriteExt;
                let mut f = file.lock().await;
                let line = format!("{json}\n");
                if let Err(e) = f.write_all(line.as_bytes()).await {
                    tracing::error!("failed to write run record: {e}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success_result() -> ExecutionResult {
        ExecutionResult {
            command: Command::new("echo hello"),
            status: ExecutionStatus::Success,
            return_code: Some(0),
            stdout: "hello\n".into(),
            stderr: String::new(),
            execution_time: 0.042,
            timestamp: Utc::now(),
            error_message: None,
        }
    }

    #[test]
    fn executed_record_serialization() {
        let record = RunRecord::from_result(&success_result());
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"type\":\"executed\""));
        assert!(json.contains("\"status\":\"success\""));
        assert!(json.contains("\"return_code\":0"));
        assert!(json.contains("\"duration_ms\":42"));
    }

    #[test]
    fn denied_record_serialization() {
        let record = RunRecord::denied(&Command::new("rm -rf /"), "matches blocked pattern `rm -rf`");
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"type\":\"denied\""));
        assert!(json.contains("blocked pattern"));
        assert!(json.contains("\"duration_ms\":0"));
    }

    #[test]
    fn skipped_result_maps_to_skipped_disposition() {
        let record = RunRecord::from_result(&ExecutionResult::skipped(Command::new("ls")));
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"type\":\"skipped\""));
    }

    #[test]
    fn declined_result_maps_to_declined_disposition() {
        let record = RunRecord::from_result(&ExecutionResult::cancelled(
            Command::new("rm -rf /"),
            "declined by user",
        ));
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"type\":\"declined\""));
    }

    #[test]
    fn timeout_result_stays_executed() {
        let mut result = success_result();
        result.status = ExecutionStatus::Timeout;
        result.return_code = None;
        let record = RunRecord::from_result(&result);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"type\":\"executed\""));
        assert!(json.contains("\"status\":\"timeout\""));
        assert!(!json.contains("return_code"));
    }

    #[tokio::test]
    async fn logger_stdout() {
        let config = AuditConfig {
            enabled: true,
            destination: "stdout".into(),
        };
        let logger = RunLogger::from_config(&config).await.unwrap();
        logger.log(&RunRecord::from_result(&success_result())).await;
    }

    #[tokio::test]
    async fn logger_appends_json_lines_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let config = AuditConfig {
            enabled: true,
            destination: path.display().to_string(),
        };
        let logger = RunLogger::from_config(&config).await.unwrap();

        for _ in 0..3 {
            logger.log(&RunRecord::from_result(&success_result())).await;
        }

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content.lines().count(), 3);
        assert!(content.contains("\"command\":\"echo hello\""));
    }

    #[tokio::test]
    async fn unopenable_destination_errors() {
        let config = AuditConfig {
            enabled: true,
            destination: "/nonexistent/dir/history.jsonl".into(),
        };
        assert!(RunLogger::from_config(&config).await.is_err());
    }
}
