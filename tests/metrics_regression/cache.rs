//! Cache metrics regression tests

use super::helpers::*;
use depot_cache::{CacheConfig, CacheFacade};
use depot_chaos::MemoryKv;
use depot_pool::{ConnectionPool, PoolConfig};
use depot_retry::{RetryExecutor, RetryPolicy};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn cache_metrics_exist() {
    init_recorder();

    let kv = MemoryKv::new();
    let pool = ConnectionPool::new(kv.clone(), PoolConfig::builder().capacity(1).build().unwrap());
    let cache = CacheFacade::with_config(
        pool,
        RetryExecutor::new(RetryPolicy::no_retry()),
        CacheConfig::builder().name("metrics_cache").build(),
    );

    cache.set("file", "1", &"meta", None).await.unwrap();
    cache.get::<String>("file", "1").await.unwrap();
    cache.get::<String>("file", "2").await.unwrap();
    cache.invalidate_namespace("file").await.unwrap();
    let _ = cache.get::<String>("unknown", "1").await;

    assert_counter_exists("depot_cache_requests_total");
    assert_metric_has_label("depot_cache_requests_total", "cache", "metrics_cache");
    assert_metric_has_label("depot_cache_requests_total", "result", "hit");
    assert_metric_has_label("depot_cache_requests_total", "result", "miss");

    assert_counter_exists("depot_cache_invalidated_total");
    assert_metric_has_label("depot_cache_invalidated_total", "namespace", "file");

    assert_counter_exists("depot_cache_failures_total");
    assert_metric_has_label("depot_cache_failures_total", "operation", "get");
    assert_metric_has_label("depot_cache_failures_total", "error", "unknown_namespace");
}
