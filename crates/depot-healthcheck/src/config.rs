//! Configuration for health monitoring.

use crate::events::HealthEvent;
use crate::HealthStatus;
use depot_core::events::{EventListener, EventListeners, FnListener};
use depot_core::ConfigError;
use std::fmt;
use std::time::Duration;

/// Configuration for a [`HealthMonitor`](crate::HealthMonitor).
#[derive(Clone)]
pub struct HealthCheckConfig {
    pub(crate) name: String,
    pub(crate) interval: Duration,
    pub(crate) timeout: Duration,
    pub(crate) degraded_threshold: Duration,
    pub(crate) event_listeners: EventListeners<HealthEvent>,
}

impl HealthCheckConfig {
    /// Create a new builder.
    pub fn builder() -> HealthCheckConfigBuilder {
        HealthCheckConfigBuilder::new()
    }

    /// Name reported in events.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Period of the background checker.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Bound on each probe.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probes slower than this report `Degraded`.
    pub fn degraded_threshold(&self) -> Duration {
        self.degraded_threshold
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        HealthCheckConfigBuilder::new().into_config()
    }
}

impl fmt::Debug for HealthCheckConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthCheckConfig")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("timeout", &self.timeout)
            .field("degraded_threshold", &self.degraded_threshold)
            .field("listeners", &self.event_listeners.len())
            .finish()
    }
}

/// Builder for [`HealthCheckConfig`].
pub struct HealthCheckConfigBuilder {
    name: String,
    interval: Duration,
    timeout: Duration,
    degraded_threshold: Duration,
    event_listeners: EventListeners<HealthEvent>,
}

impl HealthCheckConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            name: "health".to_string(),
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(2),
            degraded_threshold: Duration::from_millis(500),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the monitor name.
    ///
    /// Default: `"health"`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the interval between background checks.
    ///
    /// Default: 30 seconds
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the timeout for each probe. A probe that times out is unhealthy.
    ///
    /// Default: 2 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the latency above which a successful probe reports `Degraded`.
    ///
    /// Default: 500 milliseconds
    pub fn degraded_threshold(mut self, threshold: Duration) -> Self {
        self.degraded_threshold = threshold;
        self
    }

    /// Registers a listener for every health event.
    pub fn listener<L>(mut self, listener: L) -> Self
    where
        L: EventListener<HealthEvent> + 'static,
    {
        self.event_listeners.add(listener);
        self
    }

    /// Registers a callback invoked when a target changes status.
    pub fn on_status_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, HealthStatus, HealthStatus) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let HealthEvent::StatusChanged {
                target, from, to, ..
            } = event
            {
                f(target, *from, *to);
            }
        }));
        self
    }

    /// Validates the settings and builds the configuration.
    pub fn build(self) -> Result<HealthCheckConfig, ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::new("interval", "must be greater than zero"));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::new("timeout", "must be greater than zero"));
        }
        Ok(self.into_config())
    }

    fn into_config(self) -> HealthCheckConfig {
        HealthCheckConfig {
            name: self.name,
            interval: self.interval,
            timeout: self.timeout,
            degraded_threshold: self.degraded_threshold,
            event_listeners: self.event_listeners,
        }
    }
}

impl Default for HealthCheckConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
