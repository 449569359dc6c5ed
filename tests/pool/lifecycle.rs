//! Prewarming, background maintenance and shutdown.

use super::{config, pool};
use depot_chaos::MemoryDatabase;
use depot_pool::{ConnectionPool, PoolError};
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test]
async fn prewarm_opens_capacity_connections() {
    let (pool, db) = pool(3, 5, 100);

    assert_eq!(pool.prewarm().await.unwrap(), 3);
    assert_eq!(db.open_connections(), 3);
    assert_eq!(pool.stats().idle_count, 3);

    // Already full.
    assert_eq!(pool.prewarm().await.unwrap(), 0);
}

#[tokio::test]
async fn prewarm_stops_at_the_first_failure() {
    let (pool, db) = pool(3, 0, 100);

    db.faults().set_outage(true);
    assert!(matches!(
        pool.prewarm().await,
        Err(PoolError::Connect { .. })
    ));
    assert_eq!(pool.stats().open_count(), 0);

    db.faults().set_outage(false);
    assert_eq!(pool.prewarm().await.unwrap(), 3);
}

#[tokio::test(start_paused = true)]
async fn maintenance_recycles_stale_connections() {
    let db = MemoryDatabase::new();
    let config = config(2, 0, 100)
        .idle_recycle_after(Duration::from_secs(10))
        .health_check_interval(Duration::from_secs(5))
        .build()
        .unwrap();
    let pool = ConnectionPool::new(db.clone(), config);

    pool.prewarm().await.unwrap();
    let maintenance = pool.spawn_maintenance();

    sleep(Duration::from_secs(6)).await;
    assert_eq!(pool.stats().idle_count, 2);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(pool.stats().idle_count, 0);
    assert_eq!(db.open_connections(), 0);
    assert_eq!(pool.stats().total_invalidated, 2);

    maintenance.stop();
}

#[tokio::test(start_paused = true)]
async fn maintenance_ends_with_the_pool() {
    let (pool, _db) = pool(1, 0, 100);
    let maintenance = pool.spawn_maintenance();

    pool.shutdown().await;
    sleep(Duration::from_secs(120)).await;
    assert!(maintenance.is_finished());
}

#[tokio::test]
async fn shutdown_closes_idle_connections() {
    let (pool, db) = pool(2, 0, 100);
    pool.prewarm().await.unwrap();

    let report = pool.shutdown().await;
    assert!(report.is_clean());
    assert_eq!(report.drained, 2);
    assert_eq!(db.open_connections(), 0);
    assert!(pool.is_closed());

    assert!(matches!(pool.acquire().await, Err(PoolError::Closed)));
    assert!(matches!(pool.try_acquire().await, Err(PoolError::Closed)));
    assert!(matches!(pool.prewarm().await, Err(PoolError::Closed)));
}

#[tokio::test(start_paused = true)]
async fn shutdown_waits_for_leases_within_the_grace_period() {
    let (pool, db) = pool(2, 0, 100);
    let lease = pool.acquire().await.unwrap();

    let returner = tokio::spawn(async move {
        sleep(Duration::from_millis(20)).await;
        drop(lease);
    });

    let report = pool.shutdown().await;
    returner.await.unwrap();

    assert!(report.is_clean());
    assert_eq!(db.open_connections(), 0);
}

#[tokio::test(start_paused = true)]
async fn late_leases_are_reported_and_destroyed_on_return() {
    let (pool, db) = pool(2, 0, 100);
    let lease = pool.acquire().await.unwrap();

    let report = pool.shutdown().await;
    assert_eq!(report.outstanding, 1);
    assert!(!report.is_clean());
    assert_eq!(db.open_connections(), 1);

    drop(lease);
    assert_eq!(db.open_connections(), 0);
    assert_eq!(pool.stats().open_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn shutdown_wakes_waiting_callers() {
    let (pool, _db) = pool(1, 0, 60_000);
    let held = pool.acquire().await.unwrap();

    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.acquire().await })
    };
    sleep(Duration::from_millis(1)).await;
    assert_eq!(pool.stats().waiting, 1);

    let shutdown = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.shutdown().await })
    };

    assert!(matches!(waiter.await.unwrap(), Err(PoolError::Closed)));
    drop(held);
    assert!(shutdown.await.unwrap().is_clean());
}
