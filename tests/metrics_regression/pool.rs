//! Pool metrics regression tests

use super::helpers::*;
use depot_chaos::MemoryDatabase;
use depot_pool::{ConnectionPool, PoolConfig};
use serial_test::serial;
use std::time::Duration;

fn pool(name: &str) -> ConnectionPool<MemoryDatabase> {
    let config = PoolConfig::builder()
        .name(name)
        .capacity(1)
        .max_overflow(1)
        .acquire_timeout(Duration::from_millis(20))
        .build()
        .unwrap();
    ConnectionPool::new(MemoryDatabase::new(), config)
}

#[tokio::test]
#[serial]
async fn pool_metrics_exist() {
    init_recorder();

    let pool = pool("metrics_pool");
    let lease = pool.acquire().await.unwrap();
    drop(lease);

    assert_counter_exists("depot_pool_acquired_total");
    assert_metric_has_label("depot_pool_acquired_total", "pool", "metrics_pool");

    assert_counter_exists("depot_pool_connections_created_total");
    assert_metric_has_label("depot_pool_connections_created_total", "pool", "metrics_pool");

    assert_gauge_exists("depot_pool_connections_in_use");
    assert_metric_has_label("depot_pool_connections_in_use", "pool", "metrics_pool");

    assert_histogram_exists("depot_pool_wait_duration_seconds");
    assert_metric_has_label("depot_pool_wait_duration_seconds", "pool", "metrics_pool");
}

#[tokio::test]
#[serial]
async fn pool_timeout_and_discard_metrics() {
    init_recorder();

    let pool = pool("busy_pool");
    let mut pooled = pool.acquire().await.unwrap();
    let overflow = pool.acquire().await.unwrap();
    assert!(pool.acquire().await.is_err());
    drop(overflow);
    pooled.mark_broken();
    drop(pooled);

    assert_counter_exists("depot_pool_timeouts_total");
    assert_metric_has_label("depot_pool_timeouts_total", "pool", "busy_pool");

    assert_counter_exists("depot_pool_connections_discarded_total");
    assert_metric_has_label("depot_pool_connections_discarded_total", "reason", "overflow");
    assert_metric_has_label("depot_pool_connections_discarded_total", "reason", "broken");
}
