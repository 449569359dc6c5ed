use crate::config::TransactionConfig;
use crate::error::{BeginError, TransactionError};
use crate::scope::TransactionScope;
use crate::transactional::Transactional;
use depot_pool::{ConnectionPool, ManageConnection};
use depot_retry::RetryExecutor;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// Opens transactions on one pool under one retry policy.
///
/// Cheap to clone.
pub struct TransactionManager<M: ManageConnection> {
    pool: ConnectionPool<M>,
    retry: RetryExecutor,
    config: Arc<TransactionConfig>,
}

impl<M> TransactionManager<M>
where
    M: ManageConnection,
    M::Connection: Transactional,
{
    /// Creates a manager with the default configuration.
    pub fn new(pool: ConnectionPool<M>, retry: RetryExecutor) -> Self {
        Self::with_config(pool, retry, TransactionConfig::default())
    }

    /// Creates a manager whose transactions report to `config`'s listeners.
    pub fn with_config(
        pool: ConnectionPool<M>,
        retry: RetryExecutor,
        config: TransactionConfig,
    ) -> Self {
        Self {
            pool,
            retry,
            config: Arc::new(config),
        }
    }

    /// The pool transactions draw connections from.
    pub fn pool(&self) -> &ConnectionPool<M> {
        &self.pool
    }

    /// The retry executor wrapped around acquisition and `begin`.
    pub fn retry(&self) -> &RetryExecutor {
        &self.retry
    }

    /// Opens a transaction.
    pub async fn begin(&self) -> Result<TransactionScope<M>, BeginError> {
        TransactionScope::start(&self.pool, &self.retry, Arc::clone(&self.config)).await
    }

    /// Runs `work` inside a transaction; see [`with_transaction`](crate::with_transaction).
    pub async fn run<T, E, F>(&self, work: F) -> Result<T, TransactionError<E>>
    where
        F: for<'c> FnOnce(&'c mut M::Connection) -> BoxFuture<'c, Result<T, E>>,
    {
        let mut scope = self.begin().await?;
        let outcome = work(scope.connection()).await;
        scope.complete(outcome).await
    }
}

impl<M: ManageConnection> Clone for TransactionManager<M> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            retry: self.retry.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<M: ManageConnection> fmt::Debug for TransactionManager<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionManager")
            .field("pool", &self.pool)
            .field("config", &self.config)
            .finish()
    }
}
