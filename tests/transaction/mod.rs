//! Transaction scope tests.
//!
//! Test organization:
//! - atomicity.rs: commit, rollback and failure stages
//! - events.rs: transaction events and callbacks

mod events;

use depot_chaos::MemoryDatabase;
use depot_pool::{ConnectionPool, PoolConfig};
use depot_retry::{RetryExecutor, RetryPolicy};
use std::time::Duration;

pub(crate) fn setup() -> (ConnectionPool<MemoryDatabase>, RetryExecutor, MemoryDatabase) {
    let db = MemoryDatabase::new();
    let config = PoolConfig::builder()
        .name("relational")
        .capacity(2)
        .max_overflow(0)
        .acquire_timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let retry = RetryExecutor::new(
        RetryPolicy::builder()
            .max_attempts(3)
            .base_delay(Duration::from_millis(1))
            .build()
            .unwrap(),
    );
    (ConnectionPool::new(db.clone(), config), retry, db)
}
