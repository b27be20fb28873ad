use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use rudder_core::{Command, Config, HostInfo};
use rudder_run::{ConfirmationPrompt, PlanRunner, RunOptions, RunReport, StepOutcome};

mod planner;

/// Turns a natural-language request into shell commands, classifies their
/// safety, and runs them under the configured policy.
#[derive(Debug, Parser)]
#[command(name = "rudder", version, about)]
struct Cli {
    /// What you want done, e.g. "list files in current directory".
    #[arg(required = true, num_args = 1..)]
    prompt: Vec<String>,

    /// Walk the plan without executing anything.
    #[arg(long)]
    dry_run: bool,

    /// Pre-authorize dangerous commands for this invocation.
    #[arg(short = 'y', long)]
    yes: bool,

    /// Exit non-zero when any step was denied, declined, or cancelled.
    #[arg(long)]
    strict: bool,

    /// Cancel the remainder of the plan after a failed step.
    #[arg(long)]
    stop_on_error: bool,

    /// Per-command timeout in seconds, overriding the config file.
    #[arg(long)]
    timeout: Option<u64>,

    /// Configuration file path.
    #[arg(long, default_value = "rudder.toml")]
    config: PathBuf,
}

/// Terminal confirmation via dialoguer, run off the async runtime.
struct TerminalPrompt;

impl ConfirmationPrompt for TerminalPrompt {
    async fn confirm(&self, command: &Command) -> anyhow::Result<bool> {
        let mut message = format!("run `{}` ({})?", command.text, command.safety_level);
        if let Some(revert) = &command.revert {
            message.push_str(&format!(" [revert: {revert}]"));
        }
        let answer = tokio::task::spawn_blocking(move || {
            dialoguer::Confirm::new()
                .with_prompt(message)
                .default(false)
                .interact()
        })
        .await??;
        Ok(answer)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_subscriber();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;
    if let Some(timeout) = cli.timeout {
        config.exec.timeout = timeout;
    }

    let host = HostInfo::detect();
    tracing::info!(os = %host.os, shell = %host.shell, "host detected");

    let prompt_text = cli.prompt.join(" ");
    let commands = planner::plan(&prompt_text, &host);
    if commands.is_empty() {
        eprintln!("rudder: no command mapping for: {prompt_text}");
        return Ok(ExitCode::from(2));
    }

    println!("plan:");
    for command in &commands {
        let step = command.step.unwrap_or(0);
        println!("  {step}. {command}  # {}", command.explanation);
    }

    let options = RunOptions {
        dry_run: cli.dry_run,
        auto_run: cli.yes,
        stop_on_error: cli.stop_on_error,
        strict: cli.strict,
    };
    let runner = PlanRunner::new(host, &config, TerminalPrompt, options).await?;

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("interrupt received, cancelling plan");
        signal_cancel.cancel();
    });

    let report = runner.run_plan(commands, &cancel).await;
    print_report(&report);

    let code = u8::try_from(report.exit_code(cli.strict)).unwrap_or(1);
    Ok(ExitCode::from(code))
}

fn print_report(report: &RunReport) {
    for step in &report.steps {
        let ordinal = step.command.step.unwrap_or(0);
        match &step.outcome {
            StepOutcome::Denied { reason } => {
                println!("[{ordinal}] {}: denied ({reason})", step.command.text);
            }
            StepOutcome::Completed(result) => {
                println!(
                    "[{ordinal}] {}: {} ({:.2}s)",
                    step.command.text, result.status, result.execution_time
                );
                if !result.stdout.is_empty() {
                    println!("{}", result.stdout.trim_end());
                }
                if !result.stderr.is_empty() {
                    eprintln!("{}", result.stderr.trim_end());
                }
                if let Some(message) = &result.error_message {
                    eprintln!("  {message}");
                }
            }
        }
    }
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
