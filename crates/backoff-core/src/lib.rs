//! Retry orchestration: exponential backoff with jitter, bounded by a
//! deadline or a retry count, plus policy helpers that decide whether an
//! HTTP response or database error is worth retrying.

pub mod config;
pub mod logging;

pub mod classify;
pub mod deadline;
pub mod fetch;
pub mod metrics;
pub mod retry;

pub use deadline::{Deadline, DeadlineError};
pub use retry::{BackoffError, RetryController, RetryDecision, RetryError};
