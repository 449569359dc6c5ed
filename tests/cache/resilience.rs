//! Soft failures and hit-rate accounting.

use super::{config, facade, facade_with, file, FileMeta};
use depot_cache::{CacheError, CacheStats};
use depot_core::{Classify, ErrorKind};
use depot_pool::PoolError;

#[tokio::test]
async fn hit_rate_counts_every_lookup() {
    let (cache, _kv) = facade();
    assert_eq!(cache.get_stats(), CacheStats::default());

    cache.set("file", "1", &file("a", 1), None).await.unwrap();
    for _ in 0..3 {
        cache.get::<FileMeta>("file", "1").await.unwrap();
    }
    cache.get::<FileMeta>("file", "2").await.unwrap();

    let stats = cache.get_stats();
    assert_eq!((stats.hits, stats.misses), (3, 1));
    assert!((stats.hit_rate - 0.75).abs() < f64::EPSILON);

    // Writes and existence checks are not lookups.
    cache.exists("file", "1").await.unwrap();
    assert_eq!(cache.get_stats().lookups(), 4);

    cache.reset_stats();
    assert_eq!(cache.get_stats().hit_rate, 0.0);
}

#[tokio::test]
async fn outage_is_soft_and_counts_as_a_miss() {
    let (cache, kv) = facade();
    cache.set("file", "1", &file("a", 1), None).await.unwrap();
    kv.faults().set_outage(true);

    let err = cache.get::<FileMeta>("file", "1").await.unwrap_err();
    assert!(matches!(err, CacheError::Backend(_) | CacheError::Pool(_)));
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert_eq!(cache.get_stats().misses, 1);

    assert!(cache.set("file", "2", &file("b", 2), None).await.is_err());
    assert!(cache.invalidate_namespace("file").await.is_err());

    kv.faults().set_outage(false);
    assert!(cache.get::<FileMeta>("file", "1").await.unwrap().is_some());
    assert_eq!(cache.pool().stats().in_use_count, 0);
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let (cache, kv) = facade();
    cache.set("file", "1", &file("a", 1), None).await.unwrap();
    kv.faults().fail_next(1);

    let cached = cache.get::<FileMeta>("file", "1").await.unwrap();
    assert!(cached.is_some());
    assert_eq!(cache.get_stats().hits, 1);
}

#[tokio::test]
async fn unknown_namespaces_are_rejected_softly() {
    let (cache, kv) = facade();

    let err = cache.set("thumbnails", "1", &"x", None).await.unwrap_err();
    assert_eq!(err, CacheError::UnknownNamespace("thumbnails".to_string()));
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert!(matches!(
        cache.get::<String>("thumbnails", "1").await,
        Err(CacheError::UnknownNamespace(_))
    ));
    assert!(cache.invalidate_namespace("thumbnails").await.is_err());
    assert!(kv.is_empty());
    // Never reached the store.
    assert_eq!(kv.open_connections(), 0);
}

#[tokio::test]
async fn closed_pool_is_soft() {
    let (cache, _kv) = facade_with(config().build());
    cache.pool().shutdown().await;

    let err = cache.get::<FileMeta>("file", "1").await.unwrap_err();
    assert_eq!(err, CacheError::Pool(PoolError::Closed));
    assert_eq!(err.kind(), ErrorKind::Closed);
}
