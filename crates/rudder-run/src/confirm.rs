use std::future::Future;

use rudder_core::Command;

/// Asks the operator whether a command may run.
///
/// Implementations decide the medium (terminal prompt, test script). The
/// runner only cares about the answer: `Ok(false)` declines the command and
/// cancels the remainder of the plan.
pub trait ConfirmationPrompt: Send + Sync {
    /// # Errors
    ///
    /// Returns an error when the operator cannot be reached, e.g. a closed
    /// terminal. The runner treats that as a decline.
    fn confirm(&self, command: &Command) -> impl Future<Output = anyhow::Result<bool>> + Send;
}

/// Approves everything without asking. For non-interactive contexts where a
/// session-level pre-authorization is already in force.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl ConfirmationPrompt for AutoApprove {
    async fn confirm(&self, _command: &Command) -> anyhow::Result<bool> {
        Ok(true)
    }
}
