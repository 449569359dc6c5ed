use crate::config::TransactionConfig;
use crate::error::{BeginError, TransactionError};
use crate::events::{FailureStage, TransactionEvent};
use crate::transactional::Transactional;
use depot_core::{AccessError, Classify, ErrorKind};
use depot_pool::{ConnectionPool, Lease, ManageConnection};
use depot_retry::RetryExecutor;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "metrics")]
use metrics::{counter, histogram};

/// Where a transaction is in its life.
///
/// A scope only exists once `begin` succeeded, so it starts `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionState {
    /// `begin` succeeded; statements run inside the transaction.
    Active,
    /// The transaction committed.
    Committed,
    /// The transaction was rolled back, or its connection was destroyed.
    RolledBack,
}

/// One open transaction on a leased connection.
///
/// Finish it with [`complete`](Self::complete), which commits when the unit
/// of work succeeded and rolls back when it failed. The lease is released
/// exactly once whatever happens: `complete` consumes the scope, and a scope
/// dropped while still active (early return, panic, cancelled future) takes
/// its connection with it, so an unfinished transaction is never reused.
pub struct TransactionScope<M>
where
    M: ManageConnection,
    M::Connection: Transactional,
{
    lease: Lease<M>,
    state: TransactionState,
    config: Arc<TransactionConfig>,
    started: Instant,
}

impl<M> TransactionScope<M>
where
    M: ManageConnection,
    M::Connection: Transactional,
{
    /// Leases a connection from `pool` and opens a transaction on it.
    ///
    /// Acquisition and `begin` run together under `retry`, so a transient
    /// failure of either starts over on a fresh lease.
    pub async fn begin(
        pool: &ConnectionPool<M>,
        retry: &RetryExecutor,
    ) -> Result<Self, BeginError> {
        Self::start(pool, retry, Arc::new(TransactionConfig::default())).await
    }

    pub(crate) async fn start(
        pool: &ConnectionPool<M>,
        retry: &RetryExecutor,
        config: Arc<TransactionConfig>,
    ) -> Result<Self, BeginError> {
        let opened = retry
            .execute(move || async move {
                let mut lease = pool.acquire().await?;
                lease.set_broken(true);
                lease
                    .begin()
                    .await
                    .map_err(|err| BeginError::Begin(AccessError::from_classified(&err)))?;
                Ok::<_, BeginError>(lease)
            })
            .await;

        match opened {
            Ok(lease) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    transaction = %config.name,
                    connection_id = lease.connection_id(),
                    "transaction began"
                );

                config.event_listeners.emit(&TransactionEvent::Began {
                    source: config.name.clone(),
                    timestamp: Instant::now(),
                    connection_id: lease.connection_id(),
                });

                Ok(Self {
                    lease,
                    state: TransactionState::Active,
                    config,
                    started: Instant::now(),
                })
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(transaction = %config.name, error = %err, "could not begin transaction");

                fail(&config, FailureStage::Begin, Some(err.kind()));
                Err(err)
            }
        }
    }

    /// The connection the transaction runs on.
    pub fn connection(&mut self) -> &mut M::Connection {
        &mut self.lease
    }

    /// Pool-unique id of the connection.
    pub fn connection_id(&self) -> u64 {
        self.lease.connection_id()
    }

    /// The current state.
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Time since `begin` succeeded.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Finishes the transaction according to `outcome`.
    ///
    /// - `Ok(value)`: commits and returns `value`. A failed commit yields
    ///   [`TransactionError::Commit`].
    /// - `Err(cause)`: rolls back and returns
    ///   [`TransactionError::Aborted`] carrying `cause` unchanged. A failed
    ///   rollback yields [`TransactionError::Rollback`], still carrying
    ///   `cause`.
    ///
    /// The connection goes back to the pool only after a successful commit
    /// or rollback; otherwise it is destroyed.
    pub async fn complete<T, E>(mut self, outcome: Result<T, E>) -> Result<T, TransactionError<E>> {
        match outcome {
            Ok(value) => match self.lease.commit().await {
                Ok(()) => {
                    self.lease.set_broken(false);
                    self.finish(TransactionState::Committed);
                    Ok(value)
                }
                Err(err) => {
                    let err = AccessError::from_classified(&err);

                    #[cfg(feature = "tracing")]
                    tracing::warn!(transaction = %self.config.name, error = %err, "commit failed");

                    self.state = TransactionState::RolledBack;
                    fail(&self.config, FailureStage::Commit, Some(err.kind()));
                    Err(TransactionError::Commit(err))
                }
            },
            Err(cause) => match self.lease.rollback().await {
                Ok(()) => {
                    self.lease.set_broken(false);
                    self.finish(TransactionState::RolledBack);
                    Err(TransactionError::Aborted(cause))
                }
                Err(err) => {
                    let rollback = AccessError::from_classified(&err);

                    #[cfg(feature = "tracing")]
                    tracing::warn!(transaction = %self.config.name, error = %rollback, "rollback failed");

                    self.state = TransactionState::RolledBack;
                    fail(&self.config, FailureStage::Rollback, Some(rollback.kind()));
                    Err(TransactionError::Rollback { cause, rollback })
                }
            },
        }
    }

    fn finish(&mut self, state: TransactionState) {
        self.state = state;
        let duration = self.started.elapsed();
        let source = self.config.name.clone();
        let timestamp = Instant::now();

        let event = match state {
            TransactionState::Committed => TransactionEvent::Committed {
                source,
                timestamp,
                duration,
            },
            _ => TransactionEvent::RolledBack {
                source,
                timestamp,
                duration,
            },
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(transaction = %self.config.name, ?state, ?duration, "transaction finished");

        #[cfg(feature = "metrics")]
        {
            let outcome = match state {
                TransactionState::Committed => "committed",
                _ => "rolled_back",
            };
            counter!("depot_transactions_total", "transaction" => self.config.name.clone(), "outcome" => outcome)
                .increment(1);
            histogram!("depot_transaction_duration_seconds", "transaction" => self.config.name.clone())
                .record(duration.as_secs_f64());
        }

        self.config.event_listeners.emit(&event);
    }
}

impl<M> Drop for TransactionScope<M>
where
    M: ManageConnection,
    M::Connection: Transactional,
{
    fn drop(&mut self) {
        if self.state == TransactionState::Active {
            // The lease is still flagged broken from `begin`, so the
            // connection is destroyed together with its open transaction.
            #[cfg(feature = "tracing")]
            tracing::warn!(
                transaction = %self.config.name,
                connection_id = self.lease.connection_id(),
                "transaction scope dropped while active"
            );

            self.state = TransactionState::RolledBack;
            fail(&self.config, FailureStage::Abandoned, None);
        }
    }
}

impl<M> fmt::Debug for TransactionScope<M>
where
    M: ManageConnection,
    M::Connection: Transactional,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionScope")
            .field("name", &self.config.name)
            .field("state", &self.state)
            .field("connection_id", &self.lease.connection_id())
            .finish()
    }
}

fn fail(config: &TransactionConfig, stage: FailureStage, kind: Option<ErrorKind>) {
    #[cfg(feature = "metrics")]
    counter!(
        "depot_transactions_total",
        "transaction" => config.name.clone(),
        "outcome" => "failed",
        "stage" => stage.as_str()
    )
    .increment(1);

    config.event_listeners.emit(&TransactionEvent::Failed {
        source: config.name.clone(),
        timestamp: Instant::now(),
        stage,
        kind,
    });
}
