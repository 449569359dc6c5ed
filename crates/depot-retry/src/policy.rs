use crate::backoff::ExponentialBackoff;
use depot_core::{ConfigError, ErrorKind};
use std::collections::HashSet;
use std::time::Duration;

/// How many times to attempt an operation, how long to wait in between, and
/// which error kinds are worth another attempt.
///
/// Built once from configuration and validated at construction:
///
/// ```
/// use depot_core::ErrorKind;
/// use depot_retry::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::builder()
///     .max_attempts(4)
///     .base_delay(Duration::from_millis(50))
///     .backoff_multiplier(2.0)
///     .build()
///     .unwrap();
///
/// assert!(policy.should_retry(ErrorKind::Connection));
/// assert!(!policy.should_retry(ErrorKind::PoolExhausted));
/// assert_eq!(policy.delay_before_retry(3), Duration::from_millis(200));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: usize,
    backoff: ExponentialBackoff,
    retryable_kinds: HashSet<ErrorKind>,
}

impl RetryPolicy {
    /// Creates a builder with the defaults listed on [`RetryPolicyBuilder::new`].
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::new()
    }

    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff: ExponentialBackoff::fixed(Duration::ZERO),
            retryable_kinds: HashSet::new(),
        }
    }

    /// Total attempts, including the first one.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Delay before the first retry.
    pub fn base_delay(&self) -> Duration {
        self.backoff.base()
    }

    /// Growth factor applied per retry.
    pub fn backoff_multiplier(&self) -> f64 {
        self.backoff.growth()
    }

    /// Upper bound on a single delay, if configured.
    pub fn max_delay(&self) -> Option<Duration> {
        self.backoff.cap()
    }

    /// The kinds that are retried.
    pub fn retryable_kinds(&self) -> &HashSet<ErrorKind> {
        &self.retryable_kinds
    }

    /// Whether an error of `kind` may be retried.
    pub fn should_retry(&self, kind: ErrorKind) -> bool {
        self.retryable_kinds.contains(&kind)
    }

    /// Delay before the `retry`-th retry (1-based).
    pub fn delay_before_retry(&self, retry: usize) -> Duration {
        self.backoff.delay(retry)
    }

    /// Upper bound on the total time spent sleeping between attempts.
    pub fn worst_case_delay(&self) -> Duration {
        (1..self.max_attempts)
            .map(|retry| self.delay_before_retry(retry))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: ExponentialBackoff::new(Duration::from_millis(100)),
            retryable_kinds: default_retryable_kinds(),
        }
    }
}

fn default_retryable_kinds() -> HashSet<ErrorKind> {
    [ErrorKind::Connection, ErrorKind::Timeout]
        .into_iter()
        .collect()
}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    max_attempts: usize,
    base_delay: Duration,
    multiplier: f64,
    max_delay: Option<Duration>,
    retryable_kinds: HashSet<ErrorKind>,
}

impl Default for RetryPolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryPolicyBuilder {
    /// Creates a builder.
    ///
    /// Defaults:
    /// - max_attempts: 3
    /// - base_delay: 100ms
    /// - backoff_multiplier: 2.0
    /// - max_delay: none
    /// - retryable kinds: `Connection`, `Timeout`
    pub fn new() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: None,
            retryable_kinds: default_retryable_kinds(),
        }
    }

    /// Total attempts including the first; `3` means one attempt and two retries.
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Delay before the first retry.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Growth factor applied per retry. Must be at least `1.0`.
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Caps every individual delay.
    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Adds `kind` to the retryable set.
    pub fn retry_on(mut self, kind: ErrorKind) -> Self {
        self.retryable_kinds.insert(kind);
        self
    }

    /// Replaces the retryable set.
    pub fn retryable_kinds<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = ErrorKind>,
    {
        self.retryable_kinds = kinds.into_iter().collect();
        self
    }

    /// Validates and builds the policy.
    pub fn build(self) -> Result<RetryPolicy, ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::new("max_attempts", "must be at least 1"));
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(ConfigError::new(
                "backoff_multiplier",
                format!("must be a finite value >= 1.0, got {}", self.multiplier),
            ));
        }

        let backoff = ExponentialBackoff::new(self.base_delay)
            .multiplier(self.multiplier)
            .max_delay(self.max_delay);

        Ok(RetryPolicy {
            max_attempts: self.max_attempts,
            backoff,
            retryable_kinds: self.retryable_kinds,
        })
    }
}
