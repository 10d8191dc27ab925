use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;

/// Growth unit of the exponential law: retry `n` waits `2^n` units.
pub const DEFAULT_UNIT: Duration = Duration::from_secs(1);

/// Upper bound (exclusive) of the random jitter added to every wait.
/// One second keeps many clients retrying the same server from lining up.
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(1000);

// 2^31 units is already far beyond any sensible wait; larger exponents saturate.
const MAX_EXPONENT: u32 = 31;

/// Exponential delay law with caps.
///
/// The law is pure: callers pass the retry number and a random source, so it
/// can be checked without going through a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayLaw {
    /// Base unit; the delay for retry `n` is `unit * 2^n`.
    pub unit: Duration,
    /// Upper bound on the exponential part (jitter is added on top).
    pub max_delay: Option<Duration>,
    /// Jitter is drawn uniformly from `[0, max_jitter)` at millisecond resolution.
    pub max_jitter: Duration,
}

impl Default for DelayLaw {
    fn default() -> Self {
        Self {
            unit: DEFAULT_UNIT,
            max_delay: None,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }
}

impl From<&RetryConfig> for DelayLaw {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            unit: Duration::from_millis(cfg.delay_unit_ms),
            max_delay: cfg.max_delay_secs.map(Duration::from_secs),
            max_jitter: Duration::from_millis(cfg.max_jitter_ms),
        }
    }
}

impl DelayLaw {
    /// Exponential part of the delay for the given retry number (1-based for
    /// waits: the first wait uses `retry = 1`, i.e. two units).
    pub fn base_delay(&self, retry: u32) -> Duration {
        let exp = retry.min(MAX_EXPONENT);
        let raw = self.unit.saturating_mul(1u32 << exp);
        match self.max_delay {
            Some(cap) => raw.min(cap),
            None => raw,
        }
    }

    /// Random jitter in `[0, max_jitter)`.
    pub fn jitter<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let max_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rng.gen_range(0..max_ms))
    }

    /// Full delay for a retry: exponential part plus jitter.
    pub fn delay<R: Rng + ?Sized>(&self, retry: u32, rng: &mut R) -> Duration {
        self.base_delay(retry).saturating_add(self.jitter(rng))
    }
}
