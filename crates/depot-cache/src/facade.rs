use crate::config::CacheConfig;
use crate::connection::{KeyValueConnection, RemainingTtl};
use crate::error::{CacheError, CacheOutcome};
use crate::events::CacheEvent;
use crate::namespace::{CacheKey, NamespaceTable};
use crate::stats::{CacheStats, Counters};
use depot_core::{AccessError, Classify};
use depot_pool::{ConnectionPool, ManageConnection};
use depot_retry::RetryExecutor;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter};
#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// A value read from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedValue<T> {
    /// The stored value decoded as `T`.
    Value(T),
    /// The stored text, which did not decode as `T`.
    Raw(String),
}

impl<T> CachedValue<T> {
    /// The decoded value, discarding undecodable entries.
    pub fn value(self) -> Option<T> {
        match self {
            CachedValue::Value(value) => Some(value),
            CachedValue::Raw(_) => None,
        }
    }

    /// A reference to the decoded value.
    pub fn as_value(&self) -> Option<&T> {
        match self {
            CachedValue::Value(value) => Some(value),
            CachedValue::Raw(_) => None,
        }
    }

    /// Returns true if the entry did not decode as `T`.
    pub fn is_raw(&self) -> bool {
        matches!(self, CachedValue::Raw(_))
    }
}

/// One store command, replayable on a fresh connection.
trait CacheOp<C: KeyValueConnection>: Sync {
    type Output: Send;

    fn run<'a>(&'a self, conn: &'a mut C) -> BoxFuture<'a, Result<Self::Output, C::Error>>;
}

struct Get(CacheKey);
struct Set {
    key: CacheKey,
    value: String,
    ttl: Duration,
}
struct Delete(CacheKey);
struct Exists(CacheKey);
struct Ttl(CacheKey);
struct DeletePrefix(String);

impl<C: KeyValueConnection> CacheOp<C> for Get {
    type Output = Option<String>;

    fn run<'a>(&'a self, conn: &'a mut C) -> BoxFuture<'a, Result<Self::Output, C::Error>> {
        Box::pin(conn.get_raw(self.0.as_str()))
    }
}

impl<C: KeyValueConnection> CacheOp<C> for Set {
    type Output = ();

    fn run<'a>(&'a self, conn: &'a mut C) -> BoxFuture<'a, Result<Self::Output, C::Error>> {
        Box::pin(conn.set_raw(self.key.as_str(), &self.value, self.ttl))
    }
}

impl<C: KeyValueConnection> CacheOp<C> for Delete {
    type Output = bool;

    fn run<'a>(&'a self, conn: &'a mut C) -> BoxFuture<'a, Result<Self::Output, C::Error>> {
        Box::pin(conn.delete(self.0.as_str()))
    }
}

impl<C: KeyValueConnection> CacheOp<C> for Exists {
    type Output = bool;

    fn run<'a>(&'a self, conn: &'a mut C) -> BoxFuture<'a, Result<Self::Output, C::Error>> {
        Box::pin(conn.exists(self.0.as_str()))
    }
}

impl<C: KeyValueConnection> CacheOp<C> for Ttl {
    type Output = RemainingTtl;

    fn run<'a>(&'a self, conn: &'a mut C) -> BoxFuture<'a, Result<Self::Output, C::Error>> {
        Box::pin(conn.ttl(self.0.as_str()))
    }
}

impl<C: KeyValueConnection> CacheOp<C> for DeletePrefix {
    type Output = u64;

    fn run<'a>(&'a self, conn: &'a mut C) -> BoxFuture<'a, Result<Self::Output, C::Error>> {
        Box::pin(conn.delete_prefix(&self.0))
    }
}

struct Inner<M: ManageConnection> {
    pool: ConnectionPool<M>,
    retry: RetryExecutor,
    config: CacheConfig,
    counters: Counters,
}

/// Namespaced access to a pooled key-value store.
///
/// Every operation leases a connection from the cache pool through the
/// retry executor. Failures never escape as panics: each operation returns
/// a [`CacheOutcome`] and the caller treats an error as a miss. A
/// connection that fails with a transient error is destroyed rather than
/// returned to the pool.
///
/// Cheap to clone; clones share the pool and the hit/miss counters.
pub struct CacheFacade<M: ManageConnection> {
    inner: Arc<Inner<M>>,
}

impl<M: ManageConnection> Clone for CacheFacade<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M> CacheFacade<M>
where
    M: ManageConnection,
    M::Connection: KeyValueConnection,
{
    /// A facade over `pool` with the storage namespaces and no listeners.
    pub fn new(pool: ConnectionPool<M>, retry: RetryExecutor) -> Self {
        Self::with_config(pool, retry, CacheConfig::default())
    }

    /// A facade over `pool` with the given configuration.
    pub fn with_config(pool: ConnectionPool<M>, retry: RetryExecutor, config: CacheConfig) -> Self {
        #[cfg(feature = "metrics")]
        {
            METRICS_INIT.call_once(|| {
                describe_counter!(
                    "depot_cache_requests_total",
                    "Total number of cache lookups, by result"
                );
                describe_counter!(
                    "depot_cache_failures_total",
                    "Total number of failed cache operations, by operation"
                );
                describe_counter!(
                    "depot_cache_invalidated_total",
                    "Total number of entries removed by namespace invalidation"
                );
            });
        }

        Self {
            inner: Arc::new(Inner {
                pool,
                retry,
                config,
                counters: Counters::default(),
            }),
        }
    }

    /// Name reported in events, logs and metrics.
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// The registered namespaces.
    pub fn namespaces(&self) -> &NamespaceTable {
        &self.inner.config.namespaces
    }

    /// The cache pool.
    pub fn pool(&self) -> &ConnectionPool<M> {
        &self.inner.pool
    }

    /// Stores `value` under `id` in `namespace`.
    ///
    /// The entry expires after `ttl_override`, or the namespace TTL when
    /// the override is `None` or zero.
    pub async fn set<T>(
        &self,
        namespace: &str,
        id: &str,
        value: &T,
        ttl_override: Option<Duration>,
    ) -> CacheOutcome<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let result = self.store(namespace, id, value, ttl_override).await;
        self.settle("set", result)
    }

    async fn store<T>(
        &self,
        namespace: &str,
        id: &str,
        value: &T,
        ttl_override: Option<Duration>,
    ) -> CacheOutcome<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let (key, default_ttl) = self.inner.config.namespaces.resolve(namespace, id)?;
        let ttl = ttl_override
            .filter(|ttl| !ttl.is_zero())
            .unwrap_or(default_ttl);
        let value = serde_json::to_string(value)
            .map_err(|err| CacheError::Serialization(err.to_string()))?;

        let op = Set { key, value, ttl };
        self.run(&op).await?;

        #[cfg(feature = "tracing")]
        tracing::debug!(cache = %self.name(), key = %op.key, ?ttl, "cache set");

        self.inner.config.event_listeners.emit(&CacheEvent::Stored {
            source: self.name().to_string(),
            timestamp: Instant::now(),
            key: op.key.to_string(),
            ttl,
        });
        Ok(())
    }

    /// Reads the entry for `id` in `namespace`.
    ///
    /// Returns `Ok(None)` when absent. An entry that does not decode as `T`
    /// comes back as [`CachedValue::Raw`]. Every lookup that reaches the
    /// store counts as a hit or a miss; failed lookups count as misses.
    pub async fn get<T>(&self, namespace: &str, id: &str) -> CacheOutcome<Option<CachedValue<T>>>
    where
        T: DeserializeOwned,
    {
        let key = match self.inner.config.namespaces.resolve(namespace, id) {
            Ok((key, _)) => key,
            Err(err) => return self.settle("get", Err(err)),
        };

        let op = Get(key);
        match self.run(&op).await {
            Ok(Some(raw)) => {
                self.record_hit(&op.0);
                Ok(Some(decode(raw)))
            }
            Ok(None) => {
                self.record_miss(&op.0);
                Ok(None)
            }
            Err(err) => {
                self.inner.counters.miss();

                #[cfg(feature = "metrics")]
                counter!("depot_cache_requests_total", "cache" => self.name().to_string(), "result" => "miss")
                    .increment(1);

                self.settle("get", Err(err))
            }
        }
    }

    /// Removes the entry for `id` in `namespace`. Returns whether it existed.
    pub async fn delete(&self, namespace: &str, id: &str) -> CacheOutcome<bool> {
        let result = match self.inner.config.namespaces.resolve(namespace, id) {
            Ok((key, _)) => self.run(&Delete(key)).await,
            Err(err) => Err(err),
        };
        self.settle("delete", result)
    }

    /// Returns whether an entry exists for `id` in `namespace`.
    pub async fn exists(&self, namespace: &str, id: &str) -> CacheOutcome<bool> {
        let result = match self.inner.config.namespaces.resolve(namespace, id) {
            Ok((key, _)) => self.run(&Exists(key)).await,
            Err(err) => Err(err),
        };
        self.settle("exists", result)
    }

    /// Time left before the entry for `id` in `namespace` expires.
    pub async fn remaining_ttl(&self, namespace: &str, id: &str) -> CacheOutcome<RemainingTtl> {
        let result = match self.inner.config.namespaces.resolve(namespace, id) {
            Ok((key, _)) => self.run(&Ttl(key)).await,
            Err(err) => Err(err),
        };
        self.settle("remaining_ttl", result)
    }

    /// Removes every entry of `namespace`. Returns how many were removed.
    pub async fn invalidate_namespace(&self, namespace: &str) -> CacheOutcome<u64> {
        let result = match self.inner.config.namespaces.lookup(namespace) {
            Ok(policy) => {
                let prefix = policy.namespace().key_prefix();
                self.run(&DeletePrefix(prefix)).await
            }
            Err(err) => Err(err),
        };

        if let Ok(removed) = result {
            #[cfg(feature = "tracing")]
            tracing::debug!(cache = %self.name(), namespace, removed, "namespace invalidated");

            #[cfg(feature = "metrics")]
            counter!("depot_cache_invalidated_total", "cache" => self.name().to_string(), "namespace" => namespace.to_string())
                .increment(removed);

            self.inner
                .config
                .event_listeners
                .emit(&CacheEvent::Invalidated {
                    source: self.name().to_string(),
                    timestamp: Instant::now(),
                    namespace: namespace.to_string(),
                    removed,
                });
        }
        self.settle("invalidate_namespace", result)
    }

    /// Hits, misses and hit rate since creation or the last reset.
    pub fn get_stats(&self) -> CacheStats {
        self.inner.counters.snapshot()
    }

    /// Zeroes the hit and miss counters.
    pub fn reset_stats(&self) {
        self.inner.counters.reset();
    }

    async fn run<O>(&self, op: &O) -> CacheOutcome<O::Output>
    where
        O: CacheOp<M::Connection>,
    {
        let pool = &self.inner.pool;
        self.inner
            .retry
            .execute(move || async move {
                let mut lease = match pool.acquire().await {
                    Ok(lease) => lease,
                    Err(err) => return Err(CacheError::Pool(err)),
                };
                match op.run(&mut *lease).await {
                    Ok(output) => Ok(output),
                    Err(err) => {
                        let err = AccessError::from_classified(&err);
                        if err.kind().is_transient() {
                            lease.mark_broken();
                        }
                        Err(CacheError::Backend(err))
                    }
                }
            })
            .await
    }

    fn record_hit(&self, key: &CacheKey) {
        self.inner.counters.hit();

        #[cfg(feature = "tracing")]
        tracing::debug!(cache = %self.name(), %key, "cache hit");

        #[cfg(feature = "metrics")]
        counter!("depot_cache_requests_total", "cache" => self.name().to_string(), "result" => "hit")
            .increment(1);

        self.inner.config.event_listeners.emit(&CacheEvent::Hit {
            source: self.name().to_string(),
            timestamp: Instant::now(),
            key: key.to_string(),
        });
    }

    fn record_miss(&self, key: &CacheKey) {
        self.inner.counters.miss();

        #[cfg(feature = "tracing")]
        tracing::debug!(cache = %self.name(), %key, "cache miss");

        #[cfg(feature = "metrics")]
        counter!("depot_cache_requests_total", "cache" => self.name().to_string(), "result" => "miss")
            .increment(1);

        self.inner.config.event_listeners.emit(&CacheEvent::Miss {
            source: self.name().to_string(),
            timestamp: Instant::now(),
            key: key.to_string(),
        });
    }

    fn settle<T>(&self, operation: &'static str, result: CacheOutcome<T>) -> CacheOutcome<T> {
        if let Err(err) = &result {
            let kind = err.kind();

            #[cfg(feature = "tracing")]
            tracing::warn!(cache = %self.name(), operation, %kind, error = %err, "cache operation failed");

            #[cfg(feature = "metrics")]
            counter!(
                "depot_cache_failures_total",
                "cache" => self.name().to_string(),
                "operation" => operation,
                "error" => err.as_str()
            )
            .increment(1);

            self.inner.config.event_listeners.emit(&CacheEvent::Failed {
                source: self.name().to_string(),
                timestamp: Instant::now(),
                operation,
                kind,
            });
        }
        result
    }
}

fn decode<T: DeserializeOwned>(raw: String) -> CachedValue<T> {
    match serde_json::from_str(&raw) {
        Ok(value) => CachedValue::Value(value),
        Err(_) => CachedValue::Raw(raw),
    }
}

impl<M: ManageConnection> fmt::Debug for CacheFacade<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheFacade")
            .field("name", &self.inner.config.name)
            .field("pool", &self.inner.pool.name())
            .field("namespaces", &self.inner.config.namespaces.len())
            .field("stats", &self.inner.counters.snapshot())
            .finish()
    }
}
