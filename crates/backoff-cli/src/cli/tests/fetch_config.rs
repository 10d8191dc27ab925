//! Tests for fetch, config and the shared retry arguments.

use super::command;
use crate::cli::commands::parse_header_args;
use crate::cli::{CliCommand, RetryArgs};
use backoff_core::config::BackoffConfig;
use std::time::Duration;

#[test]
fn cli_parse_fetch() {
    match command(&[
        "backoff",
        "fetch",
        "https://example.com/api",
        "-H",
        "Accept: application/json",
        "--header",
        "X-Trace: 1",
        "-o",
        "/tmp/out.json",
        "-t",
        "30",
    ]) {
        CliCommand::Fetch {
            url,
            retry,
            headers,
            output,
        } => {
            assert_eq!(url, "https://example.com/api");
            assert_eq!(headers, ["Accept: application/json", "X-Trace: 1"]);
            assert_eq!(output.as_deref(), Some(std::path::Path::new("/tmp/out.json")));
            assert_eq!(retry.timeout, Some(30));
        }
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn cli_parse_config() {
    match command(&["backoff", "config"]) {
        CliCommand::Config => {}
        _ => panic!("expected Config"),
    }
}

#[test]
fn header_args_split_on_first_colon() {
    let raw = vec!["Accept: text/plain".to_string(), "X-Url: http://a:1".to_string()];
    let parsed = parse_header_args(&raw).unwrap();
    assert_eq!(
        parsed,
        [
            ("Accept".to_string(), "text/plain".to_string()),
            ("X-Url".to_string(), "http://a:1".to_string()),
        ]
    );
}

#[test]
fn header_args_reject_malformed() {
    assert!(parse_header_args(&["no-colon".to_string()]).is_err());
    assert!(parse_header_args(&[": value".to_string()]).is_err());
}

#[test]
fn retry_args_override_config() {
    let cfg = BackoffConfig::default();
    let args = RetryArgs {
        max_retries: Some(0),
        timeout: None,
    };
    let retry = args.retry_config(&cfg);
    assert_eq!(retry.max_retries, 0);
    assert_eq!(retry.default_timeout_secs, cfg.retry.default_timeout_secs);

    let defaults = RetryArgs::default().retry_config(&cfg);
    assert_eq!(defaults, cfg.retry);
}

#[test]
fn retry_args_deadline_from_timeout() {
    assert!(RetryArgs::default().deadline().expiry().is_none());
    let args = RetryArgs {
        max_retries: None,
        timeout: Some(5),
    };
    let remaining = args.deadline().remaining().unwrap();
    assert!(remaining <= Duration::from_secs(5));
    assert!(remaining > Duration::from_secs(4));
}
