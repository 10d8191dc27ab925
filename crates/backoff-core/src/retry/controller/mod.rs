//! The retry state machine.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::RetryConfig;
use crate::deadline::Deadline;
use crate::metrics::RetryCounters;

use super::delay::DelayLaw;
use super::error::BackoffError;

/// Time bound applied when neither a retry count nor a caller deadline
/// limits the loop.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(64);

/// Exponential backoff with randomized waits, bounded by a deadline and/or a
/// maximum number of retries.
///
/// A controller belongs to one retry loop: build it, loop while
/// [`ongoing`](Self::ongoing), run the operation, then [`wait`](Self::wait)
/// (or [`wait_for`](Self::wait_for) with a server hint). Once the loop ends,
/// [`err`](Self::err) tells why.
///
/// ```no_run
/// # async fn call() -> Result<(), std::io::Error> { Ok(()) }
/// use backoff_core::{Deadline, RetryController};
///
/// # async fn example() {
/// let deadline = Deadline::after(std::time::Duration::from_secs(60));
/// let mut retry = RetryController::new(&deadline, 10);
/// while retry.ongoing() {
///     if call().await.is_ok() {
///         break;
///     }
///     retry.wait().await;
/// }
/// if let Some(err) = retry.err() {
///     tracing::warn!("giving up: {err}");
/// }
/// # }
/// ```
#[derive(Debug)]
pub struct RetryController {
    deadline: Deadline,
    /// True when `deadline` was synthesized here and must be released on exit.
    owns_deadline: bool,
    max_retries: u32,
    num_retries: u32,
    last_delay: Duration,
    law: DelayLaw,
    rng: StdRng,
    counters: Arc<RetryCounters>,
}

impl RetryController {
    /// Controller bounded by `deadline` and, when non-zero, by `max_retries`.
    ///
    /// With `max_retries == 0` and a deadline that never expires, a child
    /// deadline of [`DEFAULT_TIMEOUT`] is derived so the loop always ends.
    pub fn new(deadline: &Deadline, max_retries: u32) -> Self {
        Self::build(deadline, max_retries, DelayLaw::default(), DEFAULT_TIMEOUT)
    }

    /// Like [`new`](Self::new) with the retry section of the configuration.
    pub fn with_config(deadline: &Deadline, cfg: &RetryConfig) -> Self {
        Self::build(
            deadline,
            cfg.max_retries,
            DelayLaw::from(cfg),
            cfg.default_timeout(),
        )
    }

    /// Replace the delay law (unit, cap, jitter) used by subsequent waits.
    pub fn with_delay_law(mut self, law: DelayLaw) -> Self {
        self.law = law;
        self
    }

    fn build(
        deadline: &Deadline,
        max_retries: u32,
        law: DelayLaw,
        default_timeout: Duration,
    ) -> Self {
        let (deadline, owns_deadline) = if deadline.expiry().is_none() && max_retries == 0 {
            tracing::debug!(
                timeout_ms = default_timeout.as_millis() as u64,
                "no retry bound given, applying default deadline"
            );
            (deadline.child_with_timeout(default_timeout), true)
        } else {
            (deadline.clone(), false)
        };

        Self {
            deadline,
            owns_deadline,
            max_retries,
            num_retries: 0,
            last_delay: Duration::ZERO,
            law,
            rng: StdRng::from_entropy(),
            counters: Arc::new(RetryCounters::new(max_retries)),
        }
    }

    /// True while the caller should keep going: the deadline is still
    /// running and the retry count (if bounded) is not exhausted.
    pub fn ongoing(&self) -> bool {
        !self.deadline.is_done() && !self.exhausted()
    }

    fn exhausted(&self) -> bool {
        self.max_retries != 0 && self.num_retries >= self.max_retries
    }

    /// Why the controller terminated, or `None` while it is ongoing.
    /// The deadline takes priority over the retry count.
    pub fn err(&self) -> Option<BackoffError> {
        if let Some(e) = self.deadline.err() {
            return Some(BackoffError::Deadline(e));
        }
        if self.exhausted() {
            return Some(BackoffError::Exhausted {
                retries: self.num_retries,
            });
        }
        None
    }

    /// Count one retry, then compute its delay (`unit * 2^retries + jitter`).
    ///
    /// This advances the controller: every call consumes a retry. The count
    /// never moves past `max_retries`; once exhausted the last delay is
    /// recomputed without counting.
    pub fn next_delay(&mut self) -> Duration {
        self.advance();
        self.last_delay = self.law.delay(self.num_retries, &mut self.rng);
        self.last_delay
    }

    /// Sleep for the next exponential delay, or until the deadline ends.
    /// Returns immediately when the controller is no longer ongoing.
    pub async fn wait(&mut self) {
        if !self.ongoing() {
            return;
        }
        let delay = self.next_delay();
        tracing::debug!(
            retry = self.num_retries,
            delay_ms = delay.as_millis() as u64,
            "backing off"
        );
        self.sleep_or_deadline(delay).await;
    }

    /// Sleep for a delay suggested by the remote side (plus jitter), or until
    /// the deadline ends. A zero suggestion falls back to [`wait`](Self::wait).
    /// Either way the retry count moves by exactly one.
    pub async fn wait_for(&mut self, suggested: Duration) {
        if suggested.is_zero() {
            return self.wait().await;
        }
        if !self.ongoing() {
            return;
        }
        self.advance();
        let delay = suggested.saturating_add(self.law.jitter(&mut self.rng));
        tracing::debug!(
            retry = self.num_retries,
            delay_ms = delay.as_millis() as u64,
            "backing off as suggested"
        );
        self.sleep_or_deadline(delay).await;
    }

    async fn sleep_or_deadline(&mut self, delay: Duration) {
        let deadline = self.deadline.clone();
        let deadline_fired = tokio::select! {
            _ = deadline.done() => true,
            _ = tokio::time::sleep(delay) => false,
        };
        if deadline_fired {
            tracing::info!(retry = self.num_retries, "deadline ended backoff wait");
            self.release();
        }
    }

    fn advance(&mut self) {
        if self.exhausted() {
            return;
        }
        self.num_retries += 1;
        self.counters.set_num_retries(self.num_retries);
    }

    /// Cancel a synthesized deadline. Caller-supplied deadlines are left alone.
    fn release(&self) {
        if self.owns_deadline {
            self.deadline.cancel();
        }
    }

    /// Number of retries so far.
    pub fn num_retries(&self) -> u32 {
        self.num_retries
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// The most recent delay computed by [`next_delay`](Self::next_delay).
    pub fn last_delay(&self) -> Duration {
        self.last_delay
    }

    /// The deadline bounding this controller (synthesized or the caller's).
    pub fn deadline(&self) -> &Deadline {
        &self.deadline
    }

    /// Shared read-only view of the counters, for metrics export.
    pub fn counters(&self) -> Arc<RetryCounters> {
        Arc::clone(&self.counters)
    }
}

impl Drop for RetryController {
    fn drop(&mut self) {
        self.release();
    }
}
