//! Property tests for transaction scopes.
//!
//! Invariants tested:
//! - A unit of work is applied completely or not at all
//! - The pool holds no lease once the transaction is finished

use depot_chaos::MemoryDatabase;
use depot_core::AccessError;
use depot_pool::{ConnectionPool, PoolConfig};
use depot_retry::{RetryExecutor, RetryPolicy};
use depot_transaction::with_transaction;
use proptest::prelude::*;
use std::time::Duration;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: Writes commit together or not at all
    #[test]
    fn writes_are_all_or_nothing(
        writes in 1usize..=8,
        fail_at in prop::option::of(0usize..8),
        fault_after in prop::option::of(0usize..10),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let db = MemoryDatabase::new();
            let pool = ConnectionPool::new(
                db.clone(),
                PoolConfig::builder().capacity(1).max_overflow(0).build().unwrap(),
            );
            let retry = RetryExecutor::new(
                RetryPolicy::builder()
                    .max_attempts(1)
                    .base_delay(Duration::from_millis(1))
                    .build()
                    .unwrap(),
            );
            let faults = db.faults().clone();

            let result = with_transaction(&pool, &retry, move |conn| {
                Box::pin(async move {
                    for i in 0..writes {
                        if fault_after == Some(i) {
                            faults.fail_next(1);
                        }
                        if fail_at == Some(i) {
                            return Err(AccessError::validation("rejected"));
                        }
                        conn.insert("rows", &i.to_string(), "v").await?;
                    }
                    if fault_after == Some(writes) {
                        // Fails the commit.
                        faults.fail_next(1);
                    }
                    Ok(())
                })
            })
            .await;

            let rows = db.row_count("rows");
            if result.is_ok() {
                prop_assert_eq!(rows, writes);
            } else {
                prop_assert_eq!(rows, 0);
            }
            prop_assert_eq!(pool.stats().in_use_count, 0);
            prop_assert_eq!(db.open_connections(), pool.stats().open_count());
            Ok(())
        })?;
    }
}
