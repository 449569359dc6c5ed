//! In-process reference backends with fault injection.
//!
//! [`MemoryDatabase`] is a transactional row store and [`MemoryKv`] a
//! key-value store with expiry. Both implement the connection traits the
//! pool, transaction scope and cache facade are written against, and both
//! route every operation through a [`FaultInjector`] so that resets,
//! timeouts and slow responses can be produced randomly or on cue.
//!
//! # Examples
//!
//! ```
//! use depot_chaos::{FaultConfig, FaultInjector, MemoryDatabase};
//! use depot_pool::{ConnectionPool, PoolConfig};
//!
//! let faults = FaultInjector::new(
//!     FaultConfig::builder()
//!         .name("flaky-db")
//!         .error_rate(0.1)
//!         .seed(42)
//!         .build(),
//! );
//! let db = MemoryDatabase::with_faults(faults);
//! let pool = ConnectionPool::new(db.clone(), PoolConfig::builder().build().unwrap());
//! # let _ = pool;
//! ```

mod database;
mod events;
mod fault;
mod kv;

pub use database::{MemoryConnection, MemoryDatabase};
pub use events::ChaosEvent;
pub use fault::{FaultConfig, FaultConfigBuilder, FaultInjector};
pub use kv::{MemoryKv, MemoryKvConnection};
