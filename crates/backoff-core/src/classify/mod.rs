//! Retry policies for common failure sources.
//!
//! These helpers only look at a finished response or a driver error and
//! turn it into a [`RetryDecision`](crate::RetryDecision) or a plain
//! retryable / not retryable answer; the waiting itself stays with the
//! controller.

pub mod database;
pub mod http;

pub use self::database::{should_retry_database, should_retry_postgres_code, should_retry_sqlite_code};
pub use self::http::{
    decide_http, retry_after, retry_after_at, should_retry_http, should_retry_status,
};
