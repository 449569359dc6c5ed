//! Configuration for connection pools.

use crate::events::{DiscardReason, PoolEvent};
use depot_core::events::{EventListener, EventListeners, FnListener};
use depot_core::ConfigError;
use std::fmt;
use std::time::Duration;

/// Configuration for a [`ConnectionPool`](crate::ConnectionPool).
#[derive(Clone)]
pub struct PoolConfig {
    pub(crate) name: String,
    pub(crate) capacity: usize,
    pub(crate) max_overflow: usize,
    pub(crate) acquire_timeout: Duration,
    pub(crate) idle_recycle_after: Duration,
    pub(crate) validate_on_acquire: bool,
    pub(crate) health_check_interval: Duration,
    pub(crate) shutdown_grace: Duration,
    pub(crate) event_listeners: EventListeners<PoolEvent>,
}

impl PoolConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::new()
    }

    /// Name reported in events, logs and metrics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Steady-state number of connections kept open.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Connections allowed beyond `capacity` under load.
    pub fn max_overflow(&self) -> usize {
        self.max_overflow
    }

    /// `capacity + max_overflow`.
    pub fn max_size(&self) -> usize {
        self.capacity + self.max_overflow
    }

    /// Default time [`acquire`](crate::ConnectionPool::acquire) waits for a lease.
    pub fn acquire_timeout(&self) -> Duration {
        self.acquire_timeout
    }

    /// Idle connections unused for this long are destroyed when encountered.
    pub fn idle_recycle_after(&self) -> Duration {
        self.idle_recycle_after
    }

    /// Whether idle connections are probed before being handed out.
    pub fn validate_on_acquire(&self) -> bool {
        self.validate_on_acquire
    }

    /// Period of the maintenance task started by
    /// [`spawn_maintenance`](crate::ConnectionPool::spawn_maintenance).
    pub fn health_check_interval(&self) -> Duration {
        self.health_check_interval
    }

    /// How long [`shutdown`](crate::ConnectionPool::shutdown) waits for outstanding leases.
    pub fn shutdown_grace(&self) -> Duration {
        self.shutdown_grace
    }
}

impl fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfig")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("max_overflow", &self.max_overflow)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("idle_recycle_after", &self.idle_recycle_after)
            .field("validate_on_acquire", &self.validate_on_acquire)
            .field("health_check_interval", &self.health_check_interval)
            .field("shutdown_grace", &self.shutdown_grace)
            .field("listeners", &self.event_listeners.len())
            .finish()
    }
}

/// Builder for [`PoolConfig`].
pub struct PoolConfigBuilder {
    name: String,
    capacity: usize,
    max_overflow: usize,
    acquire_timeout: Duration,
    idle_recycle_after: Duration,
    validate_on_acquire: bool,
    health_check_interval: Duration,
    shutdown_grace: Duration,
    event_listeners: EventListeners<PoolEvent>,
}

impl PoolConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            name: "pool".to_string(),
            capacity: 10,
            max_overflow: 20,
            acquire_timeout: Duration::from_secs(30),
            idle_recycle_after: Duration::from_secs(3600),
            validate_on_acquire: true,
            health_check_interval: Duration::from_secs(30),
            shutdown_grace: Duration::from_secs(5),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the pool name.
    ///
    /// Default: `"pool"`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the steady-state number of connections.
    ///
    /// Default: 10. Must be greater than zero.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets how many connections may be opened beyond `capacity`.
    ///
    /// Overflow connections are destroyed on release. Default: 20
    pub fn max_overflow(mut self, max_overflow: usize) -> Self {
        self.max_overflow = max_overflow;
        self
    }

    /// Sets how long `acquire` waits before failing with `Exhausted`.
    ///
    /// Default: 30 seconds
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Sets how long a connection may sit idle before it is recycled.
    ///
    /// Default: 1 hour
    pub fn idle_recycle_after(mut self, age: Duration) -> Self {
        self.idle_recycle_after = age;
        self
    }

    /// Enables or disables probing idle connections before handing them out.
    ///
    /// Default: true
    pub fn validate_on_acquire(mut self, validate: bool) -> Self {
        self.validate_on_acquire = validate;
        self
    }

    /// Sets the period of the background maintenance task.
    ///
    /// Default: 30 seconds
    pub fn health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = interval;
        self
    }

    /// Sets how long shutdown waits for outstanding leases.
    ///
    /// Default: 5 seconds
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Registers a listener for every pool event.
    pub fn listener<L>(mut self, listener: L) -> Self
    where
        L: EventListener<PoolEvent> + 'static,
    {
        self.event_listeners.add(listener);
        self
    }

    /// Registers a callback invoked when a lease is handed out, with the time spent waiting.
    pub fn on_acquired<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let PoolEvent::ConnectionAcquired { wait, .. } = event {
                f(*wait);
            }
        }));
        self
    }

    /// Registers a callback invoked when an acquisition times out.
    pub fn on_timeout<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let PoolEvent::AcquireTimedOut { waited, .. } = event {
                f(*waited);
            }
        }));
        self
    }

    /// Registers a callback invoked when a connection is destroyed.
    pub fn on_discarded<F>(mut self, f: F) -> Self
    where
        F: Fn(u64, DiscardReason) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let PoolEvent::ConnectionDiscarded {
                connection_id,
                reason,
                ..
            } = event
            {
                f(*connection_id, *reason);
            }
        }));
        self
    }

    /// Validates the settings and builds the configuration.
    pub fn build(self) -> Result<PoolConfig, ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::new("capacity", "must be greater than zero"));
        }
        if self.acquire_timeout.is_zero() {
            return Err(ConfigError::new(
                "acquire_timeout",
                "must be greater than zero",
            ));
        }
        if self.idle_recycle_after.is_zero() {
            return Err(ConfigError::new(
                "idle_recycle_after",
                "must be greater than zero",
            ));
        }
        if self.health_check_interval.is_zero() {
            return Err(ConfigError::new(
                "health_check_interval",
                "must be greater than zero",
            ));
        }
        if self
            .capacity
            .checked_add(self.max_overflow)
            .map_or(true, |max| max > tokio::sync::Semaphore::MAX_PERMITS)
        {
            return Err(ConfigError::new(
                "max_overflow",
                "capacity + max_overflow exceeds the supported maximum",
            ));
        }

        Ok(PoolConfig {
            name: self.name,
            capacity: self.capacity,
            max_overflow: self.max_overflow,
            acquire_timeout: self.acquire_timeout,
            idle_recycle_after: self.idle_recycle_after,
            validate_on_acquire: self.validate_on_acquire,
            health_check_interval: self.health_check_interval,
            shutdown_grace: self.shutdown_grace,
            event_listeners: self.event_listeners,
        })
    }
}

impl Default for PoolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
