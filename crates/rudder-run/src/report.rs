use rudder_core::{Command, ExecutionResult, ExecutionStatus};

/// What became of one plan step.
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// The gate refused; nothing was spawned.
    Denied { reason: String },
    /// The step reached the engine, was skipped in dry-run, or was declined
    /// or interrupted; the result says which.
    Completed(ExecutionResult),
}

#[derive(Debug, Clone)]
pub struct StepReport {
    pub command: Command,
    pub outcome: StepOutcome,
}

impl StepReport {
    /// True for outcomes that count against the run in non-strict mode.
    #[must_use]
    pub fn failed(&self) -> bool {
        match &self.outcome {
            StepOutcome::Denied { .. } => false,
            StepOutcome::Completed(result) => result.status.is_failure(),
        }
    }

    /// True when the step did anything other than succeed or get skipped.
    #[must_use]
    pub fn imperfect(&self) -> bool {
        match &self.outcome {
            StepOutcome::Denied { .. } => true,
            StepOutcome::Completed(result) => !matches!(
                result.status,
                ExecutionStatus::Success | ExecutionStatus::Skipped
            ),
        }
    }
}

/// Full account of one plan run, in execution order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub steps: Vec<StepReport>,
}

impl RunReport {
    /// Process exit code for this run.
    ///
    /// Non-strict: non-zero only when a step actually failed or timed out.
    /// Strict: any denied, declined, cancelled, or failed step is non-zero;
    /// dry-run skips still count as clean.
    #[must_use]
    pub fn exit_code(&self, strict: bool) -> i32 {
        let bad = if strict {
            self.steps.iter().any(StepReport::imperfect)
        } else {
            self.steps.iter().any(StepReport::failed)
        };
        i32::from(bad)
    }

    #[must_use]
    pub fn executed(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| match &s.outcome {
                StepOutcome::Completed(r) => r.process_started(),
                StepOutcome::Denied { .. } => false,
            })
            .count()
    }

    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| {
                matches!(
                    &s.outcome,
                    StepOutcome::Completed(r) if r.status == ExecutionStatus::Success
                )
            })
            .count()
    }
}
