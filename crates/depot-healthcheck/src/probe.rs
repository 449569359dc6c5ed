//! Health probes.

use depot_pool::{ConnectionPool, ManageConnection, PoolError, PoolStats};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;

/// Why a probe did not complete its round-trip.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// The round-trip failed. The target is reported `Unhealthy`.
    #[error("{0}")]
    Failed(String),
    /// The target had no free capacity for the probe. The target is
    /// reported `Degraded`.
    #[error("{0}")]
    Busy(String),
}

impl From<String> for ProbeError {
    fn from(message: String) -> Self {
        ProbeError::Failed(message)
    }
}

impl From<&str> for ProbeError {
    fn from(message: &str) -> Self {
        ProbeError::Failed(message.to_string())
    }
}

impl From<PoolError> for ProbeError {
    fn from(err: PoolError) -> Self {
        if err.is_exhausted() {
            ProbeError::Busy(format!("every connection is leased: {err}"))
        } else {
            ProbeError::Failed(err.to_string())
        }
    }
}

/// A target the monitor can probe.
///
/// `probe` performs a trivial round-trip.
/// The trait is object safe so that targets of different types can be
/// monitored together.
///
/// ```
/// use depot_healthcheck::{Probe, ProbeError};
/// use futures::future::BoxFuture;
///
/// struct AlwaysUp;
///
/// impl Probe for AlwaysUp {
///     fn name(&self) -> &str {
///         "always-up"
///     }
///
///     fn probe(&self) -> BoxFuture<'_, Result<(), ProbeError>> {
///         Box::pin(async { Ok(()) })
///     }
/// }
/// ```
pub trait Probe: Send + Sync {
    /// Name of the target, unique within a monitor.
    fn name(&self) -> &str;

    /// Runs the round-trip.
    fn probe(&self) -> BoxFuture<'_, Result<(), ProbeError>>;

    /// Pool counters, for targets backed by a connection pool.
    fn pool_stats(&self) -> Option<PoolStats> {
        None
    }
}

impl<M: ManageConnection> Probe for ConnectionPool<M> {
    fn name(&self) -> &str {
        ConnectionPool::name(self)
    }

    /// Checks an idle or newly opened connection. Never waits for a lease
    /// held by another caller.
    fn probe(&self) -> BoxFuture<'_, Result<(), ProbeError>> {
        self.try_ping().map(|result| result.map_err(ProbeError::from)).boxed()
    }

    fn pool_stats(&self) -> Option<PoolStats> {
        Some(self.stats())
    }
}

/// Probes a pool under a name other than the pool's own.
pub struct PoolProbe<M: ManageConnection> {
    name: String,
    pool: ConnectionPool<M>,
}

impl<M: ManageConnection> PoolProbe<M> {
    /// Probes `pool` under its own name.
    pub fn new(pool: ConnectionPool<M>) -> Self {
        Self {
            name: pool.name().to_string(),
            pool,
        }
    }

    /// Probes `pool`, reporting it as `name`.
    pub fn named(name: impl Into<String>, pool: ConnectionPool<M>) -> Self {
        Self {
            name: name.into(),
            pool,
        }
    }

    /// The probed pool.
    pub fn pool(&self) -> &ConnectionPool<M> {
        &self.pool
    }
}

impl<M: ManageConnection> Clone for PoolProbe<M> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            pool: self.pool.clone(),
        }
    }
}

impl<M: ManageConnection> fmt::Debug for PoolProbe<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolProbe")
            .field("name", &self.name)
            .field("pool", &self.pool)
            .finish()
    }
}

impl<M: ManageConnection> Probe for PoolProbe<M> {
    fn name(&self) -> &str {
        &self.name
    }

    fn probe(&self) -> BoxFuture<'_, Result<(), ProbeError>> {
        self.pool.probe()
    }

    fn pool_stats(&self) -> Option<PoolStats> {
        Some(self.pool.stats())
    }
}
