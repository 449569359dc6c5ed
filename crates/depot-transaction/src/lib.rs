//! Transaction scopes over pooled connections.
//!
//! A unit of work runs inside exactly one transaction on exactly one leased
//! connection. Success commits, failure rolls back and hands the caller's
//! error back unchanged, and the lease is released exactly once on every
//! path, including panics and cancelled futures.
//!
//! # Examples
//!
//! ```no_run
//! use depot_core::AccessError;
//! use depot_pool::{ConnectionPool, ManageConnection};
//! use depot_retry::RetryExecutor;
//! use depot_transaction::{with_transaction, Transactional, TransactionError};
//!
//! async fn rename<M>(
//!     pool: &ConnectionPool<M>,
//!     retry: &RetryExecutor,
//! ) -> Result<(), TransactionError<AccessError>>
//! where
//!     M: ManageConnection,
//!     M::Connection: Transactional,
//! {
//!     with_transaction(pool, retry, |conn| {
//!         Box::pin(async move {
//!             // issue statements on `conn`
//!             let _ = conn;
//!             Ok(())
//!         })
//!     })
//!     .await
//! }
//! ```
//!
//! Retrying is applied to acquisition and `begin` only. The unit of work is
//! not retried: it may not be idempotent.

mod config;
mod error;
mod events;
mod manager;
mod scope;
mod transactional;

pub use config::{TransactionConfig, TransactionConfigBuilder};
pub use error::{BeginError, TransactionError};
pub use events::{FailureStage, TransactionEvent};
pub use manager::TransactionManager;
pub use scope::{TransactionScope, TransactionState};
pub use transactional::Transactional;

use depot_pool::{ConnectionPool, ManageConnection};
use depot_retry::RetryExecutor;
use futures::future::BoxFuture;

/// Runs `work` inside a transaction on a connection leased from `pool`.
///
/// `work` receives the connection and returns a boxed future:
/// `|conn| Box::pin(async move { ... })`. Its result decides the outcome:
/// `Ok` commits, `Err` rolls back. See [`TransactionScope::complete`].
pub async fn with_transaction<M, T, E, F>(
    pool: &ConnectionPool<M>,
    retry: &RetryExecutor,
    work: F,
) -> Result<T, TransactionError<E>>
where
    M: ManageConnection,
    M::Connection: Transactional,
    F: for<'c> FnOnce(&'c mut M::Connection) -> BoxFuture<'c, Result<T, E>>,
{
    let mut scope = TransactionScope::begin(pool, retry).await?;
    let outcome = work(scope.connection()).await;
    scope.complete(outcome).await
}
