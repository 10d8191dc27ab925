//! CLI for running commands and HTTP requests under a retry controller.

mod commands;

use anyhow::{Context, Result};
use backoff_core::config::{self, BackoffConfig, RetryConfig};
use backoff_core::metrics::{create_meter, MetricsRegistry};
use backoff_core::Deadline;
use clap::{Args, Parser, Subcommand};
use opentelemetry::global;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_stdout::MetricExporter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use commands::{run_config, run_exec, run_fetch};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "backoff")]
#[command(about = "Retry commands and HTTP requests with exponential backoff", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of ~/.config/backoff/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Export retry gauges to stdout when done.
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Bounds for commands that retry; unset values come from the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct RetryArgs {
    /// Maximum number of retries (0 = bounded by time only).
    #[arg(short = 'n', long, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Give up after this many seconds.
    #[arg(short = 't', long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl RetryArgs {
    pub fn deadline(&self) -> Deadline {
        match self.timeout {
            Some(secs) => Deadline::after(Duration::from_secs(secs)),
            None => Deadline::never(),
        }
    }

    pub fn retry_config(&self, cfg: &BackoffConfig) -> RetryConfig {
        let mut retry = cfg.retry.clone();
        if let Some(n) = self.max_retries {
            retry.max_retries = n;
        }
        retry
    }
}

/// Cancel `deadline` on Ctrl-C so a pending wait ends right away.
pub fn cancel_on_interrupt(deadline: &Deadline) {
    let deadline = deadline.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, cancelling retries");
            deadline.cancel();
        }
    });
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run a command until it exits successfully.
    Exec {
        #[command(flatten)]
        retry: RetryArgs,

        /// Only retry these exit codes (comma-separated); default: any failure.
        #[arg(long, value_delimiter = ',', value_name = "CODES")]
        retry_on: Vec<i32>,

        /// Command to run, with its arguments.
        #[arg(
            required = true,
            trailing_var_arg = true,
            allow_hyphen_values = true,
            value_name = "COMMAND"
        )]
        command: Vec<String>,
    },

    /// GET a URL until it answers 2xx, honouring Retry-After on 429/5xx.
    Fetch {
        /// HTTP/HTTPS URL to fetch.
        url: String,

        #[command(flatten)]
        retry: RetryArgs,

        /// Extra request header as "Name: value"; may be repeated.
        #[arg(short = 'H', long = "header", value_name = "HEADER")]
        headers: Vec<String>,

        /// Write the body to this file instead of stdout.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show the config file path and the effective settings.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<ExitCode> {
        let cli = Cli::parse();
        let cfg = match &cli.config {
            Some(path) => config::load_from(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        // Without --metrics the gauges go to the no-op global provider.
        let meter_provider = cli.metrics.then(|| {
            SdkMeterProvider::builder()
                .with_periodic_exporter(MetricExporter::default())
                .build()
        });
        let meter = match &meter_provider {
            Some(provider) => create_meter(provider),
            None => create_meter(&*global::meter_provider()),
        };
        let registry = MetricsRegistry::new(&meter);
        let code = match cli.command {
            CliCommand::Exec {
                retry,
                retry_on,
                command,
            } => run_exec(&cfg, &retry, &retry_on, &command, &registry).await?,
            CliCommand::Fetch {
                url,
                retry,
                headers,
                output,
            } => run_fetch(&cfg, &retry, &url, &headers, output.as_deref(), &registry).await?,
            CliCommand::Config => run_config(&cfg, cli.config.as_deref())?,
        };

        if let Some(provider) = meter_provider {
            provider.shutdown().context("export retry gauges")?;
        }
        Ok(code)
    }
}

#[cfg(test)]
mod tests;
