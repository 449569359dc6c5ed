//! Cache stress tests

use depot_cache::CacheFacade;
use depot_chaos::{FaultConfig, FaultInjector, MemoryKv};
use depot_pool::{ConnectionPool, PoolConfig};
use depot_retry::{RetryExecutor, RetryPolicy};
use std::time::{Duration, Instant};

fn facade(kv: &MemoryKv, capacity: usize) -> CacheFacade<MemoryKv> {
    let pool = ConnectionPool::new(
        kv.clone(),
        PoolConfig::builder()
            .capacity(capacity)
            .max_overflow(0)
            .acquire_timeout(Duration::from_secs(5))
            .build()
            .unwrap(),
    );
    let retry = RetryExecutor::new(
        RetryPolicy::builder()
            .max_attempts(3)
            .base_delay(Duration::from_millis(1))
            .build()
            .unwrap(),
    );
    CacheFacade::new(pool, retry)
}

/// Test: Large namespace (50k entries) filled, read and invalidated
#[tokio::test]
#[ignore]
async fn stress_large_namespace() {
    let kv = MemoryKv::new();
    let cache = facade(&kv, 4);

    let start = Instant::now();
    for i in 0..50_000u32 {
        cache.set("file", &i.to_string(), &i, None).await.unwrap();
    }
    let fill_time = start.elapsed();

    let hit_start = Instant::now();
    for i in 0..50_000u32 {
        let cached = cache.get::<u32>("file", &i.to_string()).await.unwrap();
        assert_eq!(cached.and_then(|value| value.value()), Some(i));
    }
    let hit_time = hit_start.elapsed();

    let removed = cache.invalidate_namespace("file").await.unwrap();

    println!("50k cache entries");
    println!("Fill time: {:?}", fill_time);
    println!("Hit time: {:?}", hit_time);
    println!("Removed: {removed}");

    assert_eq!(removed, 50_000);
    assert!(kv.is_empty());
    assert_eq!(cache.get_stats().hits, 50_000);
}

/// Test: Concurrent readers during random backend failures stay soft
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn stress_concurrent_reads_under_faults() {
    let faults = FaultInjector::new(
        FaultConfig::builder()
            .error_rate(0.2)
            .seed(3)
            .build(),
    );
    let kv = MemoryKv::with_faults(faults.clone());
    let cache = facade(&kv, 8);

    let mut handles = vec![];
    for task in 0..32u32 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            let mut failures = 0u32;
            for i in 0..500u32 {
                let id = (task * 500 + i) % 1_000;
                if cache.set("session", &id.to_string(), &id, None).await.is_err() {
                    failures += 1;
                }
                if cache.get::<u32>("session", &id.to_string()).await.is_err() {
                    failures += 1;
                }
            }
            failures
        }));
    }

    let mut failures = 0;
    for handle in handles {
        failures += handle.await.unwrap();
    }

    let stats = cache.get_stats();
    println!("32k reads and writes with 20% injected errors");
    println!("Soft failures surfaced: {failures}");
    println!("Injected: {}", faults.injected_errors());
    println!("Stats: {stats:?}");

    assert_eq!(stats.lookups(), 16_000);
    assert_eq!(cache.pool().stats().in_use_count, 0);
    assert_eq!(kv.open_connections(), cache.pool().stats().open_count());
}
