//! Pool stress tests

use depot_chaos::{FaultConfig, FaultInjector, MemoryDatabase};
use depot_pool::{ConnectionPool, PoolConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use super::ConcurrencyTracker;

/// Test: Thousands of callers queue on a small pool
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn stress_many_waiters() {
    let db = MemoryDatabase::new();
    let config = PoolConfig::builder()
        .capacity(10)
        .max_overflow(5)
        .acquire_timeout(Duration::from_secs(30))
        .build()
        .unwrap();
    let pool = ConnectionPool::new(db.clone(), config);
    let tracker = ConcurrencyTracker::new();

    let start = Instant::now();
    let mut handles = vec![];
    for _ in 0..2_000 {
        let pool = pool.clone();
        let tracker = Arc::clone(&tracker);
        handles.push(tokio::spawn(async move {
            let _lease = pool.acquire().await.unwrap();
            tracker.enter();
            sleep(Duration::from_millis(1)).await;
            tracker.exit();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let stats = pool.stats();
    println!("2000 callers on capacity 10 + overflow 5");
    println!("Completed in: {:?}", start.elapsed());
    println!("Peak concurrency: {}", tracker.peak());
    println!("Connections created: {}", stats.total_created);

    assert!(tracker.peak() <= 15, "Should not exceed max_size");
    assert_eq!(tracker.current(), 0);
    assert_eq!(stats.in_use_count, 0);
    assert_eq!(stats.overflow_count, 0);
    assert_eq!(db.open_connections(), stats.open_count());
}

/// Test: Acquire/release churn under random faults
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn stress_churn_under_faults() {
    let faults = FaultInjector::new(
        FaultConfig::builder()
            .error_rate(0.1)
            .latency_rate(0.2)
            .latency(Duration::from_millis(1), Duration::from_millis(5))
            .seed(42)
            .build(),
    );
    let db = MemoryDatabase::with_faults(faults);
    let config = PoolConfig::builder()
        .capacity(8)
        .max_overflow(0)
        .acquire_timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let pool = ConnectionPool::new(db.clone(), config);
    let succeeded = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();
    let mut handles = vec![];
    for task in 0..50 {
        let pool = pool.clone();
        let succeeded = Arc::clone(&succeeded);
        let failed = Arc::clone(&failed);
        handles.push(tokio::spawn(async move {
            for i in 0..200 {
                let result = match pool.acquire().await {
                    Ok(mut lease) => lease.upsert("churn", &format!("{task}-{i}"), "v").await,
                    Err(err) => Err(err.into()),
                };
                match result {
                    Ok(()) => succeeded.fetch_add(1, Ordering::Relaxed),
                    Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                };
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let stats = pool.stats();
    let succeeded = succeeded.load(Ordering::Relaxed);
    let failed = failed.load(Ordering::Relaxed);
    println!("10k acquisitions with 10% injected errors");
    println!("Completed in: {:?}", start.elapsed());
    println!("Succeeded: {succeeded}, failed: {failed}");
    println!("Created: {}, invalidated: {}", stats.total_created, stats.total_invalidated);

    assert_eq!(succeeded + failed, 10_000);
    assert_eq!(db.row_count("churn"), succeeded);
    assert_eq!(stats.in_use_count, 0);
    assert!(stats.open_count() <= 8);
    assert_eq!(db.open_connections(), stats.open_count());
}

/// Test: Shutdown while thousands of callers are waiting
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn stress_shutdown_under_load() {
    let db = MemoryDatabase::new();
    let config = PoolConfig::builder()
        .capacity(4)
        .max_overflow(0)
        .acquire_timeout(Duration::from_secs(60))
        .shutdown_grace(Duration::from_secs(1))
        .build()
        .unwrap();
    let pool = ConnectionPool::new(db.clone(), config);

    let mut handles = vec![];
    for _ in 0..1_000 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            match pool.acquire().await {
                Ok(_lease) => {
                    sleep(Duration::from_millis(10)).await;
                    true
                }
                Err(_) => false,
            }
        }));
    }

    sleep(Duration::from_millis(50)).await;
    let report = pool.shutdown().await;

    let mut served = 0;
    for handle in handles {
        if handle.await.unwrap() {
            served += 1;
        }
    }

    println!("Served before shutdown: {served}");
    println!("Shutdown report: {report:?}");

    assert!(report.is_clean());
    assert!(served < 1_000);
    assert_eq!(db.open_connections(), 0);
    assert_eq!(pool.stats().open_count(), 0);
}
