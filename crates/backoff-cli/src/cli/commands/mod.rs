//! CLI command handlers, one per file.

mod config;
mod exec;
mod fetch;

pub use config::run_config;
pub use exec::run_exec;
pub use fetch::run_fetch;

#[cfg(test)]
pub(crate) use exec::should_retry_exit;
#[cfg(test)]
pub(crate) use fetch::parse_header_args;
