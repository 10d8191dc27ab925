use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::{DEFAULT_MAX_JITTER, DEFAULT_TIMEOUT, DEFAULT_UNIT};

/// Retry controller parameters (`[retry]` in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retries; 0 means unbounded (the deadline decides).
    pub max_retries: u32,
    /// Deadline applied when `max_retries` is 0 and the caller gave no deadline.
    pub default_timeout_secs: u64,
    /// Unit of the exponential law in milliseconds (retry n waits unit * 2^n).
    pub delay_unit_ms: u64,
    /// Upper bound (exclusive) of the random jitter, in milliseconds.
    pub max_jitter_ms: u64,
    /// Optional cap on the exponential part of the delay, in seconds.
    pub max_delay_secs: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            default_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            delay_unit_ms: DEFAULT_UNIT.as_millis() as u64,
            max_jitter_ms: DEFAULT_MAX_JITTER.as_millis() as u64,
            max_delay_secs: None,
        }
    }
}

impl RetryConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }
}

/// Timeouts for the libcurl fetch helper (`[http]` in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    /// Whole-transfer timeout for a single attempt.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            timeout_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/backoff/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub retry: RetryConfig,
    pub http: HttpConfig,
}

impl BackoffConfig {
    /// Pretty TOML, as written to a fresh config file.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("backoff")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from the XDG config dir, creating a default file if none exists.
pub fn load_or_init() -> Result<BackoffConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = BackoffConfig::default();
        let toml = default_cfg.to_toml()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit path; missing keys take defaults.
pub fn load_from(path: &Path) -> Result<BackoffConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: BackoffConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
