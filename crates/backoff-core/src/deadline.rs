//! Cancellable deadlines.
//!
//! A [`Deadline`] pairs a shared cancellation signal with an optional absolute
//! expiry. Clones observe the same signal. Deadlines derived with
//! [`Deadline::child_with_timeout`] are cancelled together with their parent,
//! but cancelling a child never reaches the parent, so a retry loop can
//! release a deadline it synthesized without touching the caller's.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a deadline is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeadlineError {
    /// The expiry time was reached.
    #[error("deadline exceeded")]
    Exceeded,
    /// The deadline (or one of its parents) was cancelled before expiring.
    #[error("deadline cancelled")]
    Cancelled,
}

/// Cancellation signal with an optional expiry, shared by clones.
#[derive(Debug, Clone)]
pub struct Deadline {
    token: CancellationToken,
    expiry: Option<Instant>,
}

impl Default for Deadline {
    fn default() -> Self {
        Self::never()
    }
}

impl Deadline {
    /// A deadline without expiry; it only ends when cancelled.
    pub fn never() -> Self {
        Self {
            token: CancellationToken::new(),
            expiry: None,
        }
    }

    /// A deadline expiring `timeout` from now.
    ///
    /// Timeouts too large to represent saturate to a far-future expiry, so
    /// the deadline still counts as time-bounded.
    pub fn after(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            expiry: Some(expiry_after(timeout)),
        }
    }

    /// A deadline expiring at `expiry`.
    pub fn at(expiry: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            expiry: Some(expiry),
        }
    }

    /// Derive a deadline that ends when `self` ends or `timeout` elapses,
    /// whichever comes first. Cancelling the result does not cancel `self`.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let own = expiry_after(timeout);
        let expiry = Some(self.expiry.map_or(own, |parent| parent.min(own)));
        Self {
            token: self.token.child_token(),
            expiry,
        }
    }

    pub fn expiry(&self) -> Option<Instant> {
        self.expiry
    }

    /// Time left before expiry; `None` when the deadline never expires.
    pub fn remaining(&self) -> Option<Duration> {
        self.expiry
            .map(|expiry| expiry.saturating_duration_since(Instant::now()))
    }

    fn is_expired(&self) -> bool {
        self.expiry.is_some_and(|expiry| Instant::now() >= expiry)
    }

    /// True once the deadline expired or was cancelled.
    pub fn is_done(&self) -> bool {
        self.is_expired() || self.token.is_cancelled()
    }

    /// The reason the deadline is done, or `None` while it is still running.
    ///
    /// Expiry is checked first: a deadline that expired and was released
    /// afterwards still reports [`DeadlineError::Exceeded`].
    pub fn err(&self) -> Option<DeadlineError> {
        if self.is_expired() {
            Some(DeadlineError::Exceeded)
        } else if self.token.is_cancelled() {
            Some(DeadlineError::Cancelled)
        } else {
            None
        }
    }

    /// Cancel this deadline, its clones and every deadline derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Resolves once the deadline is cancelled or its expiry is reached.
    pub async fn done(&self) {
        match self.expiry {
            Some(expiry) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(expiry) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }
}

/// About 30 years; large enough to never fire, small enough to add to `now`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

fn expiry_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}
