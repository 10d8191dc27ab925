use std::time::Duration;

/// Verdict of a classifier on a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the controller's own exponential delay.
    Retry,
    /// Retry after a delay suggested by the remote side (e.g. `Retry-After`).
    RetryAfter(Duration),
}

impl RetryDecision {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, RetryDecision::NoRetry)
    }

    /// Suggested delay for [`RetryController::wait_for`](super::RetryController::wait_for);
    /// zero means "use the exponential law".
    pub(crate) fn suggested_delay(&self) -> Duration {
        match self {
            RetryDecision::RetryAfter(d) => *d,
            RetryDecision::NoRetry | RetryDecision::Retry => Duration::ZERO,
        }
    }
}
