use crate::events::RetryEvent;
use crate::policy::RetryPolicy;
use crate::RetryExecutor;
use depot_core::events::{EventListener, EventListeners, FnListener};
use depot_core::ErrorKind;
use std::time::Duration;

/// Configuration for a [`RetryExecutor`].
pub struct RetryConfig {
    pub(crate) policy: RetryPolicy,
    pub(crate) event_listeners: EventListeners<RetryEvent>,
    pub(crate) name: String,
}

impl RetryConfig {
    /// Creates a configuration builder.
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }
}

/// Builder for [`RetryConfig`].
pub struct RetryConfigBuilder {
    policy: RetryPolicy,
    event_listeners: EventListeners<RetryEvent>,
    name: String,
}

impl Default for RetryConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryConfigBuilder {
    /// Creates a builder with [`RetryPolicy::default`] and the name `"<unnamed>"`.
    pub fn new() -> Self {
        Self {
            policy: RetryPolicy::default(),
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Sets the retry policy.
    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the name reported in events.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a listener for every retry event.
    pub fn listener<L>(mut self, listener: L) -> Self
    where
        L: EventListener<RetryEvent> + 'static,
    {
        self.event_listeners.add(listener);
        self
    }

    /// Registers a callback invoked before each retry.
    ///
    /// # Callback Signature
    /// `Fn(usize, Duration, ErrorKind)`: the 1-based retry number, the delay
    /// about to be slept, and the kind of the error that triggered it.
    ///
    /// # Example
    /// ```rust
    /// use depot_retry::RetryConfig;
    ///
    /// let executor = RetryConfig::builder()
    ///     .name("relational")
    ///     .on_retry(|attempt, delay, kind| {
    ///         println!("retry {attempt} in {delay:?} after {kind} error");
    ///     })
    ///     .build();
    /// ```
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration, ErrorKind) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Retry {
                attempt,
                delay,
                kind,
                ..
            } = event
            {
                f(*attempt, *delay, *kind);
            }
        }));
        self
    }

    /// Registers a callback invoked on success with the number of attempts made.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Success { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Registers a callback invoked when all attempts are exhausted.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, ErrorKind) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Error { attempts, kind, .. } = event {
                f(*attempts, *kind);
            }
        }));
        self
    }

    /// Registers a callback invoked when a non-retryable error is returned immediately.
    pub fn on_ignored_error<F>(mut self, f: F) -> Self
    where
        F: Fn(ErrorKind) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::IgnoredError { kind, .. } = event {
                f(*kind);
            }
        }));
        self
    }

    /// Builds the executor.
    pub fn build(self) -> RetryExecutor {
        RetryExecutor::from_config(RetryConfig {
            policy: self.policy,
            event_listeners: self.event_listeners,
            name: self.name,
        })
    }
}
