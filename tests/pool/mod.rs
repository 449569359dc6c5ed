//! Connection pool tests.
//!
//! Test organization:
//! - acquisition.rs: bounds, overflow, timeouts and FIFO waiting
//! - validation.rs: validation on acquire, broken and stale connections
//! - lifecycle.rs: prewarm, maintenance and shutdown
//! - events.rs: listener callbacks

mod events;
mod lifecycle;

use depot_chaos::MemoryDatabase;
use depot_pool::{ConnectionPool, PoolConfig, PoolConfigBuilder};
use std::time::Duration;

pub(crate) fn config(capacity: usize, max_overflow: usize, timeout_ms: u64) -> PoolConfigBuilder {
    PoolConfig::builder()
        .name("test-pool")
        .capacity(capacity)
        .max_overflow(max_overflow)
        .acquire_timeout(Duration::from_millis(timeout_ms))
        .shutdown_grace(Duration::from_millis(50))
}

pub(crate) fn pool(
    capacity: usize,
    max_overflow: usize,
    timeout_ms: u64,
) -> (ConnectionPool<MemoryDatabase>, MemoryDatabase) {
    let db = MemoryDatabase::new();
    let config = config(capacity, max_overflow, timeout_ms).build().unwrap();
    (ConnectionPool::new(db.clone(), config), db)
}
