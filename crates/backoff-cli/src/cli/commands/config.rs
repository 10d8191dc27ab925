//! `backoff config` – show where the config lives and what is in effect.

use anyhow::Result;
use backoff_core::config::{self, BackoffConfig};
use std::path::Path;
use std::process::ExitCode;

pub fn run_config(cfg: &BackoffConfig, explicit: Option<&Path>) -> Result<ExitCode> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => config::config_path()?,
    };
    println!("# {}", path.display());
    print!("{}", cfg.to_toml()?);
    Ok(ExitCode::SUCCESS)
}
