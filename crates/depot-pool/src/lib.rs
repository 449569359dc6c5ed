//! Bounded connection pooling for depot.
//!
//! A [`ConnectionPool`] owns every connection it opens and hands out
//! exclusive [`Lease`]s. It guarantees:
//!
//! - at most `capacity + max_overflow` connections are open at once;
//! - a caller that cannot be served within the acquire timeout gets
//!   [`PoolError::Exhausted`], and waiting callers are served in FIFO order;
//! - every lease returns its connection exactly once, when dropped;
//! - a connection flagged broken, failing validation, or idle for longer
//!   than `idle_recycle_after` is destroyed and never handed out again.
//!
//! The transport is supplied through the [`ManageConnection`] trait.
//!
//! # Feature Flags
//!
//! - `tracing`: structured logs for connection lifecycle and timeouts
//! - `metrics`: counters, gauges and histograms via the `metrics` crate
//! - `serde`: `Serialize`/`Deserialize` for [`PoolStats`]

mod config;
mod error;
mod events;
mod lease;
mod manager;
mod pool;
mod stats;

pub use config::{PoolConfig, PoolConfigBuilder};
pub use error::PoolError;
pub use events::{DiscardReason, PoolEvent};
pub use lease::Lease;
pub use manager::ManageConnection;
pub use pool::{ConnectionPool, MaintenanceHandle, ShutdownReport};
pub use stats::PoolStats;
