//! `backoff fetch` – GET a URL with retries.

use anyhow::{Context, Result};
use backoff_core::config::BackoffConfig;
use backoff_core::fetch::fetch_with_retry;
use backoff_core::metrics::MetricsRegistry;
use backoff_core::RetryController;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use crate::cli::{cancel_on_interrupt, RetryArgs};

/// Split "Name: value" arguments.
pub(crate) fn parse_header_args(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|h| -> Result<(String, String)> {
            let (name, value) = h
                .split_once(':')
                .with_context(|| format!("invalid header {:?}, expected \"Name: value\"", h))?;
            let name = name.trim();
            if name.is_empty() {
                anyhow::bail!("invalid header {:?}: empty name", h);
            }
            Ok((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

pub async fn run_fetch(
    cfg: &BackoffConfig,
    args: &RetryArgs,
    url: &str,
    headers: &[String],
    output: Option<&Path>,
    registry: &MetricsRegistry,
) -> Result<ExitCode> {
    let headers = parse_header_args(headers)?;

    let deadline = args.deadline();
    cancel_on_interrupt(&deadline);
    let mut controller = RetryController::with_config(&deadline, &args.retry_config(cfg));
    registry.register("fetch", &controller);

    let rsp = match fetch_with_retry(&mut controller, url, &headers, &cfg.http).await {
        Ok(rsp) => rsp,
        Err(err) => {
            eprintln!("backoff: GET {}: {}", url, err);
            return Ok(ExitCode::FAILURE);
        }
    };
    tracing::info!(
        retries = controller.num_retries(),
        status = rsp.status().as_u16(),
        "GET {} done",
        url
    );

    match output {
        Some(path) => {
            std::fs::write(path, rsp.body()).with_context(|| format!("write {}", path.display()))?
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rsp.body())?;
            stdout.flush()?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
