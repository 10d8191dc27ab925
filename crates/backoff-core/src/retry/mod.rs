//! Retry and backoff.
//!
//! [`RetryController`] is the state machine: it tracks the retry count
//! against an optional maximum, references a [`Deadline`](crate::Deadline),
//! and sleeps with exponential backoff plus jitter between attempts.
//! [`run_with_retry`] drives a fallible async operation with a controller and
//! a classifier deciding which failures are worth another attempt.

mod controller;
mod decision;
mod delay;
mod error;
mod run;

pub use controller::{RetryController, DEFAULT_TIMEOUT};
pub use decision::RetryDecision;
pub use delay::{DelayLaw, DEFAULT_MAX_JITTER, DEFAULT_UNIT};
pub use error::{BackoffError, RetryError};
pub use run::run_with_retry;
