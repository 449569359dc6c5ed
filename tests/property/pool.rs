//! Property tests for the connection pool.
//!
//! Invariants tested:
//! - Leases in use never exceed capacity + max_overflow
//! - Every connection is accounted for once all work has finished
//! - Broken connections are never handed out again

use depot_chaos::{FaultConfig, FaultInjector, MemoryDatabase};
use depot_core::{Classify, ErrorKind};
use depot_pool::{ConnectionPool, PoolConfig};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    /// Property: In-use leases never exceed max_size, and nothing leaks.
    #[test]
    fn pool_bound_holds_under_random_faults(
        capacity in 1usize..=5,
        max_overflow in 0usize..=3,
        callers in 1usize..=20,
        error_rate in 0.0f64..0.5,
        seed in any::<u64>(),
    ) {
        runtime().block_on(async {
            let faults = FaultInjector::new(
                FaultConfig::builder()
                    .error_rate(error_rate)
                    .latency_rate(0.5)
                    .latency(Duration::from_millis(1), Duration::from_millis(20))
                    .seed(seed)
                    .build(),
            );
            let db = MemoryDatabase::with_faults(faults);
            let config = PoolConfig::builder()
                .capacity(capacity)
                .max_overflow(max_overflow)
                .acquire_timeout(Duration::from_millis(50))
                .build()
                .unwrap();
            let pool = ConnectionPool::new(db.clone(), config);

            let active = Arc::new(AtomicUsize::new(0));
            let peak = Arc::new(AtomicUsize::new(0));
            let mut handles = Vec::new();
            for i in 0..callers {
                let pool = pool.clone();
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                handles.push(tokio::spawn(async move {
                    let mut lease = match pool.acquire().await {
                        Ok(lease) => lease,
                        Err(err) => return Err(err.kind()),
                    };
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);

                    let result = lease.upsert("t", &i.to_string(), "v").await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    result.map_err(|err| err.kind())
                }));
            }

            for handle in handles {
                match handle.await.unwrap() {
                    Ok(()) => {}
                    Err(kind) => {
                        prop_assert!(
                            matches!(kind, ErrorKind::Connection | ErrorKind::PoolExhausted),
                            "unexpected error kind {:?}",
                            kind
                        );
                    }
                }
            }

            let stats = pool.stats();
            prop_assert!(peak.load(Ordering::SeqCst) <= capacity + max_overflow);
            prop_assert_eq!(stats.in_use_count, 0);
            prop_assert_eq!(stats.overflow_count, 0);
            prop_assert!(stats.idle_count <= capacity);
            prop_assert_eq!(db.open_connections(), stats.open_count());
            Ok(())
        })?;
    }

    /// Property: A connection marked broken is destroyed, never reused.
    #[test]
    fn broken_connections_are_not_reused(
        capacity in 1usize..=4,
        rounds in 1usize..=10,
        break_mask in any::<u16>(),
    ) {
        runtime().block_on(async {
            let db = MemoryDatabase::new();
            let config = PoolConfig::builder()
                .capacity(capacity)
                .max_overflow(0)
                .build()
                .unwrap();
            let pool = ConnectionPool::new(db.clone(), config);
            let mut broken = Vec::new();

            for round in 0..rounds {
                let mut lease = pool.acquire().await.unwrap();
                prop_assert!(!broken.contains(&lease.connection_id()));
                if break_mask & (1 << round) != 0 {
                    broken.push(lease.connection_id());
                    lease.mark_broken();
                }
            }

            prop_assert_eq!(pool.stats().total_invalidated, broken.len() as u64);
            prop_assert_eq!(db.open_connections(), pool.stats().open_count());
            Ok(())
        })?;
    }
}
