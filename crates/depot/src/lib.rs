//! Pooled, resilient access to a relational store and a key-value cache.
//!
//! `depot` wires the individual components together. Each is also usable
//! on its own:
//!
//! - **Connection pool** ([`pool`]): bounded leasing with overflow, FIFO
//!   waiting, validation and idle recycling
//! - **Retry** ([`retry`]): bounded attempts with exponential backoff for
//!   transient error kinds
//! - **Transactions** ([`transaction`]): scoped commit-or-rollback over a
//!   leased connection
//! - **Cache** ([`cache`]): namespaced keys with per-namespace TTLs and soft
//!   failures
//! - **Health** ([`healthcheck`]): probes with timeouts and aggregated
//!   reports
//!
//! The `chaos` feature adds in-memory backends with fault injection, used by
//! tests and the `storage_service` example.
//!
//! # Usage
//!
//! Describe the layer with [`settings::AccessSettings`], usually deserialised
//! from the host application's configuration, and hand it to
//! [`DataAccess::from_settings`] together with a connection manager for each
//! store.
//!
//! ```toml
//! [dependencies]
//! depot = { version = "0.1", features = ["tracing"] }
//! ```
//!
//! # Features
//!
//! - `tracing`: structured logs from every component
//! - `metrics`: counters, gauges and histograms from every component
//! - `chaos`: re-exports `depot-chaos` as [`chaos`]

mod access;
pub mod settings;

pub use depot_core as core;

pub use depot_cache as cache;
pub use depot_healthcheck as healthcheck;
pub use depot_pool as pool;
pub use depot_retry as retry;
pub use depot_transaction as transaction;

#[cfg(feature = "chaos")]
pub use depot_chaos as chaos;

pub use access::{AccessShutdown, DataAccess};
pub use settings::{AccessConfig, AccessSettings};

pub use depot_cache::{CacheError, CacheFacade};
pub use depot_core::{AccessError, Classify, ConfigError, ErrorKind};
pub use depot_healthcheck::{HealthMonitor, HealthReport, HealthStatus};
pub use depot_pool::{ConnectionPool, Lease, ManageConnection, PoolConfig, PoolError};
pub use depot_retry::{RetryExecutor, RetryPolicy};
pub use depot_transaction::{with_transaction, TransactionError, TransactionScope, Transactional};
