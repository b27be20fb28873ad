use tokio_util::sync::CancellationToken;

use rudder_core::{Command, Config, ExecutionResult, HostInfo};
use rudder_exec::{ExecEngine, RunLogger, RunRecord};
use rudder_safety::{Classifier, PolicyGate, PolicyVerdict};

use crate::confirm::ConfirmationPrompt;
use crate::report::{RunReport, StepOutcome, StepReport};

/// Per-invocation switches, fixed before the first step runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Walk the whole pipeline but never spawn; every admitted step is
    /// reported as skipped.
    pub dry_run: bool,
    /// Session-level pre-authorization: dangerous steps run without a prompt.
    pub auto_run: bool,
    /// Cancel the remainder of the plan after a failed or timed-out step.
    pub stop_on_error: bool,
    /// Exit non-zero when any step was denied, declined, or cancelled, not
    /// just when one failed.
    pub strict: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("run history unavailable: {0}")]
    History(#[from] std::io::Error),
}

/// Walks a plan sequentially: classify, gate, confirm, execute, record.
///
/// Each step settles before the next starts. A decline or an interrupt
/// cancels everything not yet run; a denial only drops the denied step.
pub struct PlanRunner<P> {
    classifier: Classifier,
    gate: PolicyGate,
    engine: ExecEngine,
    logger: Option<RunLogger>,
    prompt: P,
    options: RunOptions,
}

impl<P: ConfirmationPrompt> PlanRunner<P> {
    /// Assemble a runner from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when run history is enabled but its destination
    /// cannot be opened.
    pub async fn new(
        host: HostInfo,
        config: &Config,
        prompt: P,
        options: RunOptions,
    ) -> Result<Self, RunError> {
        let logger = if config.audit.enabled {
            Some(RunLogger::from_config(&config.audit).await?)
        } else {
            None
        };
        Ok(Self {
            classifier: Classifier::new(host.clone()),
            gate: PolicyGate::new(&config.policy),
            engine: ExecEngine::new(host, &config.exec),
            logger,
            prompt,
            options,
        })
    }

    #[must_use]
    pub fn options(&self) -> RunOptions {
        self.options
    }

    /// Run a plan to completion. Infallible by construction: every step ends
    /// up in the report, whatever became of it.
    pub async fn run_plan(
        &self,
        commands: Vec<Command>,
        cancel: &CancellationToken,
    ) -> RunReport {
        let mut report = RunReport::default();
        let mut plan = commands.into_iter().enumerate();

        while let Some((index, raw)) = plan.next() {
            let command = self.number(self.classifier.annotate(raw), index);

            if cancel.is_cancelled() {
                self.settle(&mut report, command, "interrupted").await;
                self.cancel_remaining(&mut report, plan, "interrupted").await;
                break;
            }

            match self.gate.evaluate(&command, self.options.auto_run) {
                PolicyVerdict::Deny { reason } => {
                    tracing::info!(command = %command.text, %reason, "step denied");
                    self.log(RunRecord::denied(&command, reason.clone())).await;
                    report.steps.push(StepReport {
                        command,
                        outcome: StepOutcome::Denied { reason },
                    });
                    continue;
                }
                PolicyVerdict::Confirm if !self.options.dry_run => {
                    let Some(answer) = cancel
                        .run_until_cancelled(self.prompt.confirm(&command))
                        .await
                    else {
                        self.settle(&mut report, command, "interrupted").await;
                        self.cancel_remaining(&mut report, plan, "interrupted").await;
                        break;
                    };
                    let approved = match answer {
                        Ok(answer) => answer,
                        Err(e) => {
                            tracing::warn!("confirmation prompt failed, declining: {e}");
                            false
                        }
                    };
                    if !approved {
                        self.settle(&mut report, command, "declined by user").await;
                        self.cancel_remaining(&mut report, plan, "plan cancelled")
                            .await;
                        break;
                    }
                }
                PolicyVerdict::Admit | PolicyVerdict::Confirm => {}
            }

            if self.options.dry_run {
                let result = ExecutionResult::skipped(command);
                self.log(RunRecord::from_result(&result)).await;
                report.steps.push(StepReport {
                    command: result.command.clone(),
                    outcome: StepOutcome::Completed(result),
                });
                continue;
            }

            let result = self.engine.run(&command, cancel).await;
            let interrupted = result.status == rudder_core::ExecutionStatus::Cancelled;
            let failed = result.status.is_failure();
            self.log(RunRecord::from_result(&result)).await;
            report.steps.push(StepReport {
                command,
                outcome: StepOutcome::Completed(result),
            });

            if interrupted {
                self.cancel_remaining(&mut report, plan, "interrupted").await;
                break;
            }
            if failed && self.options.stop_on_error {
                self.cancel_remaining(&mut report, plan, "aborted after failed step")
                    .await;
                break;
            }
        }

        report
    }

    fn number(&self, mut command: Command, index: usize) -> Command {
        if command.step.is_none() {
            #[allow(clippy::cast_possible_truncation)]
            let ordinal = (index + 1) as u32;
            command.step = Some(ordinal);
        }
        command
    }

    /// Push a synthesized cancelled result for one command.
    async fn settle(&self, report: &mut RunReport, command: Command, reason: &str) {
        let result = ExecutionResult::cancelled(command, reason);
        self.log(RunRecord::from_result(&result)).await;
        report.steps.push(StepReport {
            command: result.command.clone(),
            outcome: StepOutcome::Completed(result),
        });
    }

    async fn cancel_remaining(
        &self,
        report: &mut RunReport,
        plan: impl Iterator<Item = (usize, Command)>,
        reason: &str,
    ) {
        for (index, raw) in plan {
            let command = self.number(self.classifier.annotate(raw), index);
            self.settle(report, command, reason).await;
        }
    }

    async fn log(&self, record: RunRecord) {
        if let Some(logger) = &self.logger {
            logger.log(&record).await;
        }
    }
}
