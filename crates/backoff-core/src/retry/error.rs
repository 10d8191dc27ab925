//! Terminal reasons of a retry loop.

use std::fmt;

use crate::deadline::DeadlineError;

/// Why a [`RetryController`](super::RetryController) stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BackoffError {
    /// The time bound ended the loop; the deadline's own error is kept as is.
    #[error(transparent)]
    Deadline(#[from] DeadlineError),
    /// The count bound ended the loop.
    #[error("terminated after {retries} retries")]
    Exhausted { retries: u32 },
}

/// Error returned by [`run_with_retry`](super::run_with_retry).
///
/// Generic over the operation's own error so callers keep their types.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The operation failed with an error the classifier refused to retry.
    Fatal(E),
    /// The controller terminated; `last` is the most recent operation error,
    /// if the operation ran at all.
    GaveUp { reason: BackoffError, last: Option<E> },
}

impl<E> RetryError<E> {
    /// The operation error behind this failure, if any.
    pub fn into_last(self) -> Option<E> {
        match self {
            RetryError::Fatal(e) => Some(e),
            RetryError::GaveUp { last, .. } => last,
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Fatal(e) => write!(f, "{}", e),
            RetryError::GaveUp {
                reason,
                last: Some(e),
            } => write!(f, "{} (last error: {})", reason, e),
            RetryError::GaveUp { reason, last: None } => write!(f, "{}", reason),
        }
    }
}

impl<E> std::error::Error for RetryError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RetryError::Fatal(e) => Some(e),
            RetryError::GaveUp { reason, .. } => Some(reason),
        }
    }
}
