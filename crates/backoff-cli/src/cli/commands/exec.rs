//! `backoff exec` – run a command until it exits successfully.

use anyhow::{Context, Result};
use backoff_core::config::BackoffConfig;
use backoff_core::metrics::MetricsRegistry;
use backoff_core::retry::run_with_retry;
use backoff_core::{RetryController, RetryDecision, RetryError};
use std::fmt;
use std::process::ExitCode;
use tokio::process::Command;

use crate::cli::{cancel_on_interrupt, RetryArgs};

/// Failure of a single attempt.
#[derive(Debug)]
enum AttemptError {
    /// The command could not be started (not found, not executable, ...).
    Spawn(std::io::Error),
    /// The command exited unsuccessfully; `None` when killed by a signal.
    Exit(Option<i32>),
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Spawn(e) => write!(f, "{}", e),
            AttemptError::Exit(Some(code)) => write!(f, "exit status {}", code),
            AttemptError::Exit(None) => write!(f, "terminated by signal"),
        }
    }
}

/// With no `--retry-on` list every failure is retried; otherwise only the
/// listed exit codes are (never a signal).
pub(crate) fn should_retry_exit(retry_on: &[i32], code: Option<i32>) -> bool {
    match code {
        Some(code) if !retry_on.is_empty() => retry_on.contains(&code),
        _ => retry_on.is_empty(),
    }
}

pub async fn run_exec(
    cfg: &BackoffConfig,
    args: &RetryArgs,
    retry_on: &[i32],
    command: &[String],
    registry: &MetricsRegistry,
) -> Result<ExitCode> {
    let (program, program_args) = command.split_first().context("no command given")?;

    let deadline = args.deadline();
    cancel_on_interrupt(&deadline);
    let mut controller = RetryController::with_config(&deadline, &args.retry_config(cfg));
    registry.register("exec", &controller);

    let outcome = run_with_retry(
        &mut controller,
        || {
            let mut cmd = Command::new(program);
            cmd.args(program_args);
            async move {
                let status = cmd.status().await.map_err(AttemptError::Spawn)?;
                if status.success() {
                    Ok(())
                } else {
                    Err(AttemptError::Exit(status.code()))
                }
            }
        },
        |e| match e {
            AttemptError::Exit(code) if should_retry_exit(retry_on, *code) => RetryDecision::Retry,
            AttemptError::Exit(_) | AttemptError::Spawn(_) => RetryDecision::NoRetry,
        },
    )
    .await;

    match outcome {
        Ok(()) => {
            tracing::info!(retries = controller.num_retries(), "{} succeeded", program);
            Ok(ExitCode::SUCCESS)
        }
        Err(RetryError::Fatal(AttemptError::Spawn(e))) => {
            Err(anyhow::Error::new(e).context(format!("failed to run {}", program)))
        }
        Err(err) => {
            eprintln!("backoff: {}: {}", program, err);
            Ok(exit_code(err.into_last()))
        }
    }
}

/// Mirror the command's own exit code when there is one.
fn exit_code(last: Option<AttemptError>) -> ExitCode {
    match last {
        Some(AttemptError::Exit(Some(code))) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        _ => ExitCode::FAILURE,
    }
}
