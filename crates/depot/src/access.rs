//! One handle over both stores.

use crate::settings::{AccessConfig, AccessSettings};
use depot_cache::{CacheConfig, CacheFacade, KeyValueConnection};
use depot_core::ConfigError;
use depot_healthcheck::{HealthMonitor, HealthReport, PoolProbe};
use depot_pool::{ConnectionPool, MaintenanceHandle, ManageConnection, PoolError, ShutdownReport};
use depot_retry::RetryExecutor;
use depot_transaction::{BeginError, TransactionError, TransactionManager, TransactionScope, Transactional};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Outcome of [`DataAccess::shutdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessShutdown {
    /// Report from the relational pool.
    pub relational: ShutdownReport,
    /// Report from the cache pool.
    pub cache: ShutdownReport,
}

impl AccessShutdown {
    /// Returns true if both pools got every lease back within the grace period.
    pub fn is_clean(&self) -> bool {
        self.relational.is_clean() && self.cache.is_clean()
    }
}

struct Inner<R, K>
where
    R: ManageConnection,
    K: ManageConnection,
{
    transactions: TransactionManager<R>,
    cache: CacheFacade<K>,
    monitor: HealthMonitor,
    maintenance: Mutex<Vec<MaintenanceHandle>>,
}

/// The relational pool, the key-value pool, the cache facade and the health
/// monitor, wired together from one configuration.
///
/// Both pools share a retry policy but never share connections. The
/// monitor probes each pool under the pool's configured name.
///
/// Cheap to clone; clones share everything.
///
/// # Example
///
/// ```
/// use depot_chaos::{MemoryDatabase, MemoryKv};
/// use depot::settings::AccessSettings;
/// use depot::DataAccess;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let access = DataAccess::from_settings(
///     MemoryDatabase::new(),
///     MemoryKv::new(),
///     AccessSettings::default(),
/// )
/// .unwrap();
///
/// access
///     .transaction(|conn| Box::pin(async move { conn.insert("files", "1", "a.txt").await }))
///     .await
///     .unwrap();
/// access.cache().set("file", "1", &"a.txt", None).await.unwrap();
///
/// assert!(access.check_health().await.is_healthy());
/// assert!(access.shutdown().await.is_clean());
/// # }
/// ```
pub struct DataAccess<R, K>
where
    R: ManageConnection,
    K: ManageConnection,
{
    inner: Arc<Inner<R, K>>,
}

impl<R, K> Clone for DataAccess<R, K>
where
    R: ManageConnection,
    K: ManageConnection,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, K> DataAccess<R, K>
where
    R: ManageConnection,
    R::Connection: Transactional,
    K: ManageConnection,
    K::Connection: KeyValueConnection,
{
    /// Builds both pools from `config`. No connection is opened until first use
    /// or [`prewarm`](Self::prewarm).
    pub fn new(relational: R, kv: K, config: AccessConfig) -> Self {
        let retry = RetryExecutor::new(config.retry);
        let relational = ConnectionPool::new(relational, config.relational);
        let cache_pool = ConnectionPool::new(kv, config.cache);

        let cache_config = CacheConfig::builder()
            .name(cache_pool.name())
            .namespaces(config.namespaces)
            .build();

        let monitor = HealthMonitor::new(config.health);
        monitor.register(PoolProbe::new(relational.clone()));
        monitor.register(PoolProbe::new(cache_pool.clone()));

        #[cfg(feature = "tracing")]
        tracing::debug!(
            relational = %relational.name(),
            cache = %cache_pool.name(),
            "data access configured"
        );

        Self {
            inner: Arc::new(Inner {
                transactions: TransactionManager::new(relational, retry.clone()),
                cache: CacheFacade::with_config(cache_pool, retry, cache_config),
                monitor,
                maintenance: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Validates `settings` and builds the layer.
    pub fn from_settings(relational: R, kv: K, settings: AccessSettings) -> Result<Self, ConfigError> {
        Ok(Self::new(relational, kv, settings.validate()?))
    }

    /// Runs `work` in a transaction on the relational pool. `Ok` commits,
    /// `Err` rolls back.
    pub async fn transaction<T, E, F>(&self, work: F) -> Result<T, TransactionError<E>>
    where
        F: for<'c> FnOnce(&'c mut R::Connection) -> BoxFuture<'c, Result<T, E>>,
    {
        self.inner.transactions.run(work).await
    }

    /// Opens a transaction scope on the relational pool.
    pub async fn begin(&self) -> Result<TransactionScope<R>, BeginError> {
        self.inner.transactions.begin().await
    }

    /// The transaction manager over the relational pool.
    pub fn transactions(&self) -> &TransactionManager<R> {
        &self.inner.transactions
    }

    /// The cache facade.
    pub fn cache(&self) -> &CacheFacade<K> {
        &self.inner.cache
    }

    /// The relational connection pool.
    pub fn relational(&self) -> &ConnectionPool<R> {
        self.inner.transactions.pool()
    }

    /// The key-value connection pool behind the cache.
    pub fn cache_pool(&self) -> &ConnectionPool<K> {
        self.inner.cache.pool()
    }

    /// The health monitor probing both pools.
    pub fn health(&self) -> &HealthMonitor {
        &self.inner.monitor
    }

    /// Probes both pools now.
    pub async fn check_health(&self) -> HealthReport {
        self.inner.monitor.check().await
    }

    /// Opens `capacity` connections in each pool.
    ///
    /// Returns how many connections were opened in the relational and the
    /// cache pool.
    pub async fn prewarm(&self) -> Result<(usize, usize), PoolError> {
        let (relational, cache) = futures::join!(
            self.relational().prewarm(),
            self.cache_pool().prewarm()
        );
        Ok((relational?, cache?))
    }

    /// Starts the periodic health checks and both pools' maintenance tasks.
    ///
    /// Calling it again while they run does nothing. Must be called within
    /// a Tokio runtime.
    pub fn start_background(&self) {
        self.inner.monitor.start();

        let mut maintenance = self
            .inner
            .maintenance
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        maintenance.retain(|handle| !handle.is_finished());
        if maintenance.is_empty() {
            maintenance.push(self.relational().spawn_maintenance());
            maintenance.push(self.cache_pool().spawn_maintenance());
        }
    }

    /// Stops background work and shuts both pools down.
    ///
    /// Each pool waits up to its own `shutdown_grace` for outstanding leases.
    pub async fn shutdown(&self) -> AccessShutdown {
        self.inner.monitor.stop();
        let handles: Vec<_> = self
            .inner
            .maintenance
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .drain(..)
            .collect();
        for handle in handles {
            handle.stop();
        }

        let (relational, cache) = futures::join!(
            self.relational().shutdown(),
            self.cache_pool().shutdown()
        );

        #[cfg(feature = "tracing")]
        tracing::info!(
            relational_outstanding = relational.outstanding,
            cache_outstanding = cache.outstanding,
            "data access shut down"
        );

        AccessShutdown { relational, cache }
    }
}

impl<R, K> fmt::Debug for DataAccess<R, K>
where
    R: ManageConnection,
    K: ManageConnection,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataAccess")
            .field("transactions", &self.inner.transactions)
            .field("cache", &self.inner.cache)
            .finish_non_exhaustive()
    }
}
