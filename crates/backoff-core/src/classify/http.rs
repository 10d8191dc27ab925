//! HTTP status and `Retry-After` handling.

use std::time::Duration;

use chrono::{DateTime, Utc};
use http::header::RETRY_AFTER;
use http::{HeaderMap, Response, StatusCode};

use crate::retry::RetryDecision;

/// 429 and every 5xx are worth retrying.
pub fn should_retry_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

pub fn should_retry_http<B>(rsp: &Response<B>) -> bool {
    should_retry_status(rsp.status())
}

/// Delay requested by a `Retry-After` header (RFC 7231, section 7.1.3).
///
/// Accepts both an HTTP-date and a number of seconds. Missing or unparseable
/// values give zero, which [`RetryController::wait_for`](crate::RetryController::wait_for)
/// treats as "use the exponential law".
pub fn retry_after(headers: &HeaderMap) -> Duration {
    retry_after_at(headers, Utc::now())
}

/// [`retry_after`] against an explicit clock. Dates in the past give zero.
pub fn retry_after_at(headers: &HeaderMap, now: DateTime<Utc>) -> Duration {
    let Some(value) = headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
    else {
        return Duration::ZERO;
    };

    if let Ok(at) = DateTime::parse_from_rfc2822(value) {
        return (at.with_timezone(&Utc) - now)
            .to_std()
            .unwrap_or(Duration::ZERO);
    }

    value
        .parse::<u64>()
        .map(Duration::from_secs)
        .unwrap_or(Duration::ZERO)
}

/// Classify a finished response for [`run_with_retry`](crate::retry::run_with_retry).
///
/// Only failure statuses are meaningful here; callers treat success before
/// asking.
pub fn decide_http<B>(rsp: &Response<B>) -> RetryDecision {
    if !should_retry_http(rsp) {
        return RetryDecision::NoRetry;
    }
    match retry_after(rsp.headers()) {
        d if d.is_zero() => RetryDecision::Retry,
        d => RetryDecision::RetryAfter(d),
    }
}
