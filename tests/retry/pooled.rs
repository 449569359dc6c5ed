//! Retrying pooled work against a faulty backend.

use super::policy;
use depot_chaos::MemoryDatabase;
use depot_core::{AccessError, Classify, ErrorKind};
use depot_pool::{ConnectionPool, PoolConfig, PoolError};
use depot_retry::{RetryExecutor, RetryPolicy};
use std::time::Duration;

fn pool(db: &MemoryDatabase) -> ConnectionPool<MemoryDatabase> {
    let config = PoolConfig::builder()
        .name("relational")
        .capacity(2)
        .max_overflow(0)
        .acquire_timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    ConnectionPool::new(db.clone(), config)
}

async fn count_rows(
    pool: &ConnectionPool<MemoryDatabase>,
    retry: &RetryExecutor,
) -> Result<usize, AccessError> {
    retry
        .execute(|| async {
            let mut lease = match pool.acquire().await {
                Ok(lease) => lease,
                Err(err) => return Err(AccessError::from(err)),
            };
            match lease.count("files").await {
                Ok(count) => Ok(count),
                Err(err) => {
                    if err.kind().is_transient() {
                        lease.mark_broken();
                    }
                    Err(err)
                }
            }
        })
        .await
}

#[tokio::test(start_paused = true)]
async fn transient_failures_are_retried_on_fresh_connections() {
    let db = MemoryDatabase::new();
    let pool = pool(&db);
    let retry = RetryExecutor::new(policy(3, 10));

    pool.prewarm().await.unwrap();
    // Both idle connections fail their next round-trip.
    db.faults().fail_next(2);

    assert_eq!(count_rows(&pool, &retry).await.unwrap(), 0);
    assert_eq!(pool.stats().in_use_count, 0);
    assert!(db.open_connections() <= 2);
}

#[tokio::test(start_paused = true)]
async fn outage_exhausts_attempts_without_leaking() {
    let db = MemoryDatabase::new();
    let pool = pool(&db);
    let retry = RetryExecutor::new(policy(3, 10));

    db.faults().set_outage(true);
    let err = count_rows(&pool, &retry).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Connection);
    assert_eq!(pool.stats().in_use_count, 0);
    assert_eq!(db.open_connections(), 0);
}

#[tokio::test(start_paused = true)]
async fn exhaustion_is_only_retried_when_declared_retryable() {
    let db = MemoryDatabase::new();
    let pool = pool(&db);
    let _a = pool.acquire().await.unwrap();
    let _b = pool.acquire().await.unwrap();

    let default = RetryExecutor::new(policy(3, 10));
    let started = tokio::time::Instant::now();
    let err = count_rows(&pool, &default).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PoolExhausted);
    // One acquire timeout, no retries.
    assert!(started.elapsed() < Duration::from_millis(100));

    let patient = RetryExecutor::new(
        RetryPolicy::builder()
            .max_attempts(3)
            .base_delay(Duration::from_millis(10))
            .retry_on(ErrorKind::PoolExhausted)
            .build()
            .unwrap(),
    );
    let started = tokio::time::Instant::now();
    let err = count_rows(&pool, &patient).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PoolExhausted);
    assert!(started.elapsed() >= Duration::from_millis(150));
}

#[test]
fn pool_errors_classify() {
    let exhausted = PoolError::Exhausted {
        waited: Duration::from_millis(100),
        max_size: 3,
    };
    assert_eq!(exhausted.kind(), ErrorKind::PoolExhausted);
    assert_eq!(PoolError::Closed.kind(), ErrorKind::Closed);
    let connect = PoolError::Connect {
        kind: ErrorKind::Timeout,
        message: "handshake timed out".into(),
    };
    assert_eq!(connect.kind(), ErrorKind::Timeout);
    assert_eq!(AccessError::from(connect).kind(), ErrorKind::Timeout);
}
