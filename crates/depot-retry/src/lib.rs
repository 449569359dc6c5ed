//! Bounded retry with exponential backoff for pooled resource access.
//!
//! A [`RetryExecutor`] re-invokes an operation when it fails with an error
//! whose [`ErrorKind`](depot_core::ErrorKind) is in the policy's retryable set, sleeping between
//! attempts according to an exponential schedule. Anything else is
//! returned to the caller immediately.
//!
//! Retrying re-invokes the *whole* operation, so a retried unit of work
//! acquires a fresh lease each time. Do not retry partial progress.
//!
//! # Examples
//!
//! ```
//! use depot_core::{AccessError, ErrorKind};
//! use depot_retry::{RetryConfig, RetryPolicy};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), AccessError> {
//! let executor = RetryConfig::builder()
//!     .name("relational")
//!     .policy(
//!         RetryPolicy::builder()
//!             .max_attempts(3)
//!             .base_delay(Duration::from_millis(10))
//!             .build()
//!             .unwrap(),
//!     )
//!     .build();
//!
//! let calls = AtomicUsize::new(0);
//! let value = executor
//!     .execute(|| async {
//!         if calls.fetch_add(1, Ordering::SeqCst) == 0 {
//!             Err(AccessError::connection("reset"))
//!         } else {
//!             Ok(42)
//!         }
//!     })
//!     .await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```
//!
//! The same policy can wrap a Tower service through [`RetryLayer`].

mod backoff;
mod config;
mod events;
mod layer;
mod policy;

pub use backoff::ExponentialBackoff;
pub use config::{RetryConfig, RetryConfigBuilder};
pub use events::RetryEvent;
pub use layer::RetryLayer;
pub use policy::{RetryPolicy, RetryPolicyBuilder};

use depot_core::Classify;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Service, ServiceExt};

#[cfg(feature = "metrics")]
use metrics::{counter, histogram};

/// Runs operations under a [`RetryPolicy`].
///
/// Cheap to clone; clones share configuration and listeners.
#[derive(Clone)]
pub struct RetryExecutor {
    config: Arc<RetryConfig>,
}

impl RetryExecutor {
    /// An executor with the given policy and no listeners.
    pub fn new(policy: RetryPolicy) -> Self {
        RetryConfig::builder().policy(policy).build()
    }

    /// Creates a configuration builder.
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    pub(crate) fn from_config(config: RetryConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// The policy in effect.
    pub fn policy(&self) -> &RetryPolicy {
        &self.config.policy
    }

    /// Name reported in events.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent.
    ///
    /// `operation` is invoked at most `max_attempts` times. On exhaustion
    /// the error of the last attempt is returned.
    pub async fn execute<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify,
    {
        let config = &self.config;
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    config.event_listeners.emit(&RetryEvent::Success {
                        source: config.name.clone(),
                        timestamp: Instant::now(),
                        attempts: attempt,
                    });

                    #[cfg(feature = "metrics")]
                    {
                        counter!("depot_retry_calls_total", "retry" => config.name.clone(), "result" => "success")
                            .increment(1);
                        histogram!("depot_retry_attempts", "retry" => config.name.clone())
                            .record(attempt as f64);
                    }

                    return Ok(value);
                }
                Err(error) => {
                    let kind = error.kind();

                    if !config.policy.should_retry(kind) {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(retry = %config.name, %kind, attempt, "error is not retryable");

                        config.event_listeners.emit(&RetryEvent::IgnoredError {
                            source: config.name.clone(),
                            timestamp: Instant::now(),
                            attempts: attempt,
                            kind,
                        });

                        #[cfg(feature = "metrics")]
                        counter!("depot_retry_calls_total", "retry" => config.name.clone(), "result" => "ignored")
                            .increment(1);

                        return Err(error);
                    }

                    if attempt >= config.policy.max_attempts() {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(retry = %config.name, %kind, attempts = attempt, "retries exhausted");

                        config.event_listeners.emit(&RetryEvent::Error {
                            source: config.name.clone(),
                            timestamp: Instant::now(),
                            attempts: attempt,
                            kind,
                        });

                        #[cfg(feature = "metrics")]
                        {
                            counter!("depot_retry_calls_total", "retry" => config.name.clone(), "result" => "exhausted")
                                .increment(1);
                            histogram!("depot_retry_attempts", "retry" => config.name.clone())
                                .record(attempt as f64);
                        }

                        return Err(error);
                    }

                    let delay = config.policy.delay_before_retry(attempt);

                    #[cfg(feature = "tracing")]
                    tracing::debug!(retry = %config.name, %kind, attempt, ?delay, "retrying");

                    config.event_listeners.emit(&RetryEvent::Retry {
                        source: config.name.clone(),
                        timestamp: Instant::now(),
                        attempt,
                        delay,
                        kind,
                    });

                    #[cfg(feature = "metrics")]
                    counter!("depot_retry_attempts_total", "retry" => config.name.clone())
                        .increment(1);

                    drop(error);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Wraps `service` so every call runs under this executor.
    pub fn wrap<S>(&self, service: S) -> Retry<S> {
        Retry::new(service, self.clone())
    }
}

impl std::fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("name", &self.config.name)
            .field("policy", &self.config.policy)
            .field("listeners", &self.config.event_listeners.len())
            .finish()
    }
}

/// Runs `operation` under `policy` without events.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify,
{
    RetryExecutor::new(policy.clone()).execute(operation).await
}

/// A Tower [`Service`] that retries classified failures of the inner service.
///
/// The request is cloned for every attempt.
pub struct Retry<S> {
    inner: S,
    executor: RetryExecutor,
}

impl<S> Retry<S> {
    /// Wraps `inner`.
    pub fn new(inner: S, executor: RetryExecutor) -> Self {
        Self { inner, executor }
    }

    /// Returns a reference to the inner service.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}

impl<S: Clone> Clone for Retry<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            executor: self.executor.clone(),
        }
    }
}

impl<S, Req> Service<Req> for Retry<S>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Classify + Send + 'static,
    Req: Clone + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let service = self.inner.clone();
        let executor = self.executor.clone();

        Box::pin(async move {
            executor
                .execute(move || {
                    let service = service.clone();
                    let req = req.clone();
                    async move { service.oneshot(req).await }
                })
                .await
        })
    }
}
