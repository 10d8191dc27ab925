//! Retry loop: run an async operation until success or the controller stops.

use std::fmt;
use std::future::Future;

use super::controller::RetryController;
use super::decision::RetryDecision;
use super::error::{BackoffError, RetryError};

/// Runs `op` until it succeeds, `classify` rejects its error, or `controller`
/// terminates.
///
/// Between attempts the controller waits: [`RetryDecision::Retry`] uses the
/// exponential law, [`RetryDecision::RetryAfter`] the suggested delay. With
/// `max_retries = N` the operation runs at most `N + 1` times.
pub async fn run_with_retry<T, E, F, Fut, C>(
    controller: &mut RetryController,
    mut op: F,
    classify: C,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> RetryDecision,
    E: fmt::Display,
{
    let mut last = None;
    loop {
        if let Some(reason) = controller.deadline().err() {
            tracing::warn!(retries = controller.num_retries(), "giving up: {}", reason);
            return Err(RetryError::GaveUp {
                reason: BackoffError::Deadline(reason),
                last,
            });
        }

        let e = match op().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        let decision = classify(&e);
        tracing::debug!(
            retries = controller.num_retries(),
            ?decision,
            "attempt failed: {}",
            e
        );
        if !decision.is_retryable() {
            return Err(RetryError::Fatal(e));
        }
        if let Some(reason) = controller.err() {
            tracing::warn!(retries = controller.num_retries(), "giving up: {}", reason);
            return Err(RetryError::GaveUp {
                reason,
                last: Some(e),
            });
        }

        controller.wait_for(decision.suggested_delay()).await;
        last = Some(e);
    }
}
