//! Tests for the exec subcommand and its retry rules.

use super::{command, parse};
use crate::cli::commands::should_retry_exit;
use crate::cli::CliCommand;
use clap::Parser;

#[test]
fn cli_parse_exec_after_double_dash() {
    match command(&["backoff", "exec", "--", "curl", "-fsS", "http://localhost/health"]) {
        CliCommand::Exec {
            retry,
            retry_on,
            command,
        } => {
            assert_eq!(command, ["curl", "-fsS", "http://localhost/health"]);
            assert!(retry_on.is_empty());
            assert!(retry.max_retries.is_none());
            assert!(retry.timeout.is_none());
        }
        _ => panic!("expected Exec"),
    }
}

#[test]
fn cli_parse_exec_bounds_and_codes() {
    match command(&[
        "backoff",
        "exec",
        "-n",
        "3",
        "--timeout",
        "90",
        "--retry-on",
        "1,75",
        "sh",
        "-c",
        "exit 75",
    ]) {
        CliCommand::Exec {
            retry,
            retry_on,
            command,
        } => {
            assert_eq!(retry.max_retries, Some(3));
            assert_eq!(retry.timeout, Some(90));
            assert_eq!(retry_on, [1, 75]);
            assert_eq!(command, ["sh", "-c", "exit 75"]);
        }
        _ => panic!("expected Exec"),
    }
}

#[test]
fn cli_parse_exec_requires_command() {
    assert!(crate::cli::Cli::try_parse_from(["backoff", "exec", "-n", "2"]).is_err());
}

#[test]
fn cli_parse_global_flags_after_subcommand() {
    let cli = parse(&["backoff", "exec", "--metrics", "--config", "/tmp/b.toml", "--", "true"]);
    assert!(cli.metrics);
    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/b.toml")));
}

#[test]
fn any_failure_retries_without_list() {
    assert!(should_retry_exit(&[], Some(1)));
    assert!(should_retry_exit(&[], Some(255)));
    assert!(should_retry_exit(&[], None));
}

#[test]
fn only_listed_codes_retry_with_list() {
    assert!(should_retry_exit(&[75, 1], Some(75)));
    assert!(!should_retry_exit(&[75, 1], Some(2)));
    assert!(!should_retry_exit(&[75], None));
}
