//! Backoff schedule between retry attempts.

use std::time::Duration;

/// Exponential backoff: the n-th retry waits `base × multiplier^(n-1)`,
/// optionally capped at `max`.
///
/// A multiplier of `1.0` yields a fixed interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialBackoff {
    base: Duration,
    multiplier: f64,
    max: Option<Duration>,
}

impl ExponentialBackoff {
    /// Creates a schedule starting at `base` and doubling on every retry.
    pub fn new(base: Duration) -> Self {
        Self {
            base,
            multiplier: 2.0,
            max: None,
        }
    }

    /// A fixed interval between retries.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            base: interval,
            multiplier: 1.0,
            max: None,
        }
    }

    /// Sets the growth factor applied per retry.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Caps every delay at `max`.
    pub fn max_delay(mut self, max: Option<Duration>) -> Self {
        self.max = max;
        self
    }

    /// The first delay.
    pub fn base(&self) -> Duration {
        self.base
    }

    /// The growth factor.
    pub fn growth(&self) -> f64 {
        self.multiplier
    }

    /// The cap, if any.
    pub fn cap(&self) -> Option<Duration> {
        self.max
    }

    /// Delay before the `retry`-th retry (1-based).
    ///
    /// Saturates at `Duration::MAX` instead of overflowing.
    pub fn delay(&self, retry: usize) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as usize) as i32;
        let secs = self.base.as_secs_f64() * self.multiplier.powi(exponent);
        let delay = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);
        match self.max {
            Some(max) => delay.min(max),
            None => delay,
        }
    }
}
