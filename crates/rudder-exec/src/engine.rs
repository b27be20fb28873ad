use std::process::Stdio;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::io::AsyncReadExt;
use tokio::process::Command as ProcessCommand;
use tokio_util::sync::CancellationToken;

use rudder_core::{
    Command, ExecConfig, ExecutionResult, ExecutionStatus, HostInfo, bound_capture,
};

/// Runs one admitted command at a time through the host shell.
///
/// The engine assumes gating already happened: it applies no policy of its
/// own. Every outcome, including a binary that will not launch, comes back as
/// an [`ExecutionResult`] so a plan can keep its bookkeeping uniform.
#[derive(Debug, Clone)]
pub struct ExecEngine {
    host: HostInfo,
    timeout: Duration,
    shell_override: Option<String>,
}

impl ExecEngine {
    #[must_use]
    pub fn new(host: HostInfo, exec: &ExecConfig) -> Self {
        Self {
            host,
            timeout: Duration::from_secs(exec.timeout),
            shell_override: exec.shell.clone(),
        }
    }

    /// Program + flag handed the command line. An override replaces the
    /// program only; the flag stays the platform one.
    fn invocation(&self) -> (&str, &str) {
        let (program, flag) = self.host.shell_invocation();
        match &self.shell_override {
            Some(shell) => (shell.as_str(), flag),
            None => (program, flag),
        }
    }

    /// Run `command` to completion, timeout, or cancellation.
    ///
    /// stdout and stderr are captured separately and bounded; on timeout or
    /// cancellation the child is killed and whatever output arrived before
    /// the kill is kept.
    pub async fn run(&self, command: &Command, cancel: &CancellationToken) -> ExecutionResult {
        let timestamp = Utc::now();
        let start = Instant::now();
        let (program, flag) = self.invocation();

        tracing::debug!(command = %command.text, program, "spawning");

        let spawned = ProcessCommand::new(program)
            .arg(flag)
            .arg(&command.text)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                return ExecutionResult {
                    command: command.clone(),
                    status: ExecutionStatus::Failed,
                    return_code: None,
                    stdout: String::new(),
                    stderr: String::new(),
                    execution_time: start.elapsed().as_secs_f64(),
                    timestamp,
                    error_message: Some(format!("failed to launch `{program}`: {e}")),
                };
            }
        };

        let stdout = child.stdout.take().expect("stdout piped");
        let stderr = child.stderr.take().expect("stderr piped");

        // Drain both pipes concurrently so a chatty child cannot fill a pipe
        // buffer and wedge wait().
        let stdout_task = tokio::spawn(drain(stdout));
        let stderr_task = tokio::spawn(drain(stderr));

        enum Ending {
            Exited(std::process::ExitStatus),
            WaitFailed(std::io::Error),
            TimedOut,
            Interrupted,
        }

        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        let ending = tokio::select! {
            status = child.wait() => match status {
                Ok(s) => Ending::Exited(s),
                Err(e) => Ending::WaitFailed(e),
            },
            () = &mut deadline => {
                let _ = child.kill().await;
                Ending::TimedOut
            }
            () = cancel.cancelled() => {
                let _ = child.kill().await;
                Ending::Interrupted
            }
        };

        // The readers finish once the pipes close, kill included; partial
        // output from a killed child is still worth reporting.
        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();
        let execution_time = start.elapsed().as_secs_f64();

        let (status, return_code, error_message) = match ending {
            Ending::Exited(s) if s.success() => (ExecutionStatus::Success, s.code(), None),
            Ending::Exited(s) => match s.code() {
                Some(code) => (
                    ExecutionStatus::Failed,
                    Some(code),
                    Some(format!("exited with code {code}")),
                ),
                None => (
                    ExecutionStatus::Failed,
                    None,
                    Some("terminated by signal".to_owned()),
                ),
            },
            Ending::WaitFailed(e) => (
                ExecutionStatus::Failed,
                None,
                Some(format!("failed to reap child: {e}")),
            ),
            Ending::TimedOut => (
                ExecutionStatus::Timeout,
                None,
                Some(format!("timed out after {}s", self.timeout.as_secs())),
            ),
            Ending::Interrupted => (
                ExecutionStatus::Cancelled,
                None,
                Some("interrupted".to_owned()),
            ),
        };

        tracing::debug!(command = %command.text, %status, ?return_code, "finished");

        ExecutionResult {
            command: command.clone(),
            status,
            return_code,
            stdout: bound_capture(&stdout),
            stderr: bound_capture(&stderr),
            execution_time,
            timestamp,
            error_message,
        }
    }
}

async fn drain(mut reader: impl AsyncReadExt + Unpin) -> String {
    let mut buf = Vec::new();
    let _ = reader.read_to_end(&mut buf).await;
    String::from_utf8_lossy(&buf).into_owned()
}
