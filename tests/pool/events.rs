//! Pool events and listener callbacks.

use super::config;
use depot_chaos::MemoryDatabase;
use depot_core::{AccessEvent, FnListener};
use depot_pool::{ConnectionPool, DiscardReason, PoolEvent};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn recorded() -> (Arc<Mutex<Vec<&'static str>>>, FnListener<PoolEvent, impl Fn(&PoolEvent) + Send + Sync>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let listener = FnListener::new(move |event: &PoolEvent| {
        assert_eq!(event.source(), "test-pool");
        sink.lock().unwrap().push(event.event_type());
    });
    (events, listener)
}

#[tokio::test]
async fn lease_lifecycle_is_reported_in_order() {
    let (events, listener) = recorded();
    let config = config(1, 1, 100).listener(listener).build().unwrap();
    let pool = ConnectionPool::new(MemoryDatabase::new(), config);

    let pooled = pool.acquire().await.unwrap();
    let overflow = pool.acquire().await.unwrap();
    drop(overflow);
    drop(pooled);
    pool.shutdown().await;

    assert_eq!(
        *events.lock().unwrap(),
        vec![
            "connection_created",
            "connection_acquired",
            "connection_created",
            "connection_acquired",
            "connection_discarded",
            "connection_released",
            "connection_discarded",
            "shutdown_completed",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn callbacks_receive_event_details() {
    let acquired = Arc::new(AtomicUsize::new(0));
    let timeouts = Arc::new(Mutex::new(Vec::new()));
    let discarded = Arc::new(Mutex::new(Vec::new()));

    let config = {
        let acquired = Arc::clone(&acquired);
        let timeouts = Arc::clone(&timeouts);
        let discarded = Arc::clone(&discarded);
        config(1, 0, 100)
            .on_acquired(move |_wait| {
                acquired.fetch_add(1, Ordering::SeqCst);
            })
            .on_timeout(move |waited| timeouts.lock().unwrap().push(waited))
            .on_discarded(move |id, reason| discarded.lock().unwrap().push((id, reason)))
            .build()
            .unwrap()
    };
    let pool = ConnectionPool::new(MemoryDatabase::new(), config);

    let mut lease = pool.acquire().await.unwrap();
    let id = lease.connection_id();
    assert!(pool.acquire().await.is_err());
    lease.mark_broken();
    drop(lease);

    assert_eq!(acquired.load(Ordering::SeqCst), 1);
    let timeouts = timeouts.lock().unwrap();
    assert_eq!(timeouts.len(), 1);
    assert!(timeouts[0] >= Duration::from_millis(100));
    assert_eq!(*discarded.lock().unwrap(), vec![(id, DiscardReason::Broken)]);
}

#[tokio::test]
async fn panicking_listener_does_not_break_the_pool() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let config = config(1, 0, 100)
        .listener(FnListener::new(|_: &PoolEvent| panic!("listener bug")))
        .listener(FnListener::new(move |_: &PoolEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
        .build()
        .unwrap();
    let pool = ConnectionPool::new(MemoryDatabase::new(), config);

    let lease = pool.acquire().await.unwrap();
    drop(lease);
    let lease = pool.acquire().await.unwrap();

    assert_eq!(pool.stats().in_use_count, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    drop(lease);
}
