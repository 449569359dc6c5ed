//! Retry events and callbacks.

use super::policy;
use depot_core::{AccessError, AccessEvent, ErrorKind, FnListener};
use depot_retry::{RetryConfig, RetryEvent};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn every_retry_is_reported_before_the_outcome() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let executor = RetryConfig::builder()
        .name("relational")
        .policy(policy(3, 10))
        .listener(FnListener::new(move |event: &RetryEvent| {
            sink.lock()
                .unwrap()
                .push((event.event_type(), event.source().to_string()));
        }))
        .build();

    let calls = AtomicUsize::new(0);
    let _ = executor
        .execute(|| async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(AccessError::timeout("slow"))
            } else {
                Ok(())
            }
        })
        .await;

    assert_eq!(
        *events.lock().unwrap(),
        vec![
            ("retry", "relational".to_string()),
            ("success", "relational".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn callbacks_receive_attempt_details() {
    let retries = Arc::new(Mutex::new(Vec::new()));
    let exhausted = Arc::new(Mutex::new(None));
    let ignored = Arc::new(Mutex::new(Vec::new()));

    let executor = {
        let retries = Arc::clone(&retries);
        let exhausted = Arc::clone(&exhausted);
        let ignored = Arc::clone(&ignored);
        RetryConfig::builder()
            .policy(policy(3, 10))
            .on_retry(move |attempt, delay, kind| retries.lock().unwrap().push((attempt, delay, kind)))
            .on_error(move |attempts, kind| *exhausted.lock().unwrap() = Some((attempts, kind)))
            .on_ignored_error(move |kind| ignored.lock().unwrap().push(kind))
            .build()
    };

    let _ = executor
        .execute(|| async { Err::<(), _>(AccessError::connection("refused")) })
        .await;
    let _ = executor
        .execute(|| async { Err::<(), _>(AccessError::validation("bad row")) })
        .await;

    assert_eq!(
        *retries.lock().unwrap(),
        vec![
            (1, Duration::from_millis(10), ErrorKind::Connection),
            (2, Duration::from_millis(20), ErrorKind::Connection),
        ]
    );
    assert_eq!(*exhausted.lock().unwrap(), Some((3, ErrorKind::Connection)));
    assert_eq!(*ignored.lock().unwrap(), vec![ErrorKind::Validation]);
}

#[tokio::test]
async fn success_reports_attempt_count() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let recorded = Arc::clone(&attempts);
    let executor = RetryConfig::builder()
        .policy(policy(2, 1))
        .on_success(move |n| recorded.store(n, Ordering::SeqCst))
        .build();

    executor
        .execute(|| async { Ok::<_, AccessError>(()) })
        .await
        .unwrap();
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}
