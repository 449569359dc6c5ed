//! Transaction events and callbacks.

use super::setup;
use depot_core::{AccessError, AccessEvent, ErrorKind, FnListener};
use depot_transaction::{FailureStage, TransactionConfig, TransactionEvent, TransactionManager};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn recording_manager() -> (
    TransactionManager<depot_chaos::MemoryDatabase>,
    depot_chaos::MemoryDatabase,
    Arc<Mutex<Vec<&'static str>>>,
) {
    let (pool, retry, db) = setup();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let config = TransactionConfig::builder()
        .name("uploads")
        .listener(FnListener::new(move |event: &TransactionEvent| {
            assert_eq!(event.source(), "uploads");
            sink.lock().unwrap().push(event.event_type());
        }))
        .build();
    (TransactionManager::with_config(pool, retry, config), db, events)
}

#[tokio::test]
async fn commit_and_rollback_are_reported() {
    let (manager, _db, events) = recording_manager();

    manager
        .run(|conn| Box::pin(async move { conn.insert("files", "1", "a.txt").await }))
        .await
        .unwrap();
    let _ = manager
        .run(|conn| Box::pin(async move { conn.insert("files", "1", "again.txt").await }))
        .await;

    assert_eq!(
        *events.lock().unwrap(),
        vec!["began", "committed", "began", "rolled_back"]
    );
}

#[tokio::test]
async fn abandoned_scopes_are_reported() {
    let (manager, _db, events) = recording_manager();

    let scope = manager.begin().await.unwrap();
    drop(scope);

    assert_eq!(*events.lock().unwrap(), vec!["began", "failed"]);
}

#[tokio::test]
async fn failed_begin_is_reported_once() {
    let (manager, db, events) = recording_manager();
    db.faults().set_outage(true);

    assert!(manager.begin().await.is_err());
    // Retried attempts are not reported individually.
    assert_eq!(*events.lock().unwrap(), vec!["failed"]);
}

#[tokio::test]
async fn callbacks_receive_durations_and_failure_stages() {
    let (pool, retry, db) = setup();
    let commits = Arc::new(AtomicUsize::new(0));
    let rollbacks = Arc::new(AtomicUsize::new(0));
    let failures = Arc::new(Mutex::new(Vec::new()));

    let config = {
        let commits = Arc::clone(&commits);
        let rollbacks = Arc::clone(&rollbacks);
        let failures = Arc::clone(&failures);
        TransactionConfig::builder()
            .name("uploads")
            .on_commit(move |_duration| {
                commits.fetch_add(1, Ordering::SeqCst);
            })
            .on_rollback(move |_duration| {
                rollbacks.fetch_add(1, Ordering::SeqCst);
            })
            .on_failure(move |stage, kind| failures.lock().unwrap().push((stage, kind)))
            .build()
    };
    let manager = TransactionManager::with_config(pool, retry, config);

    manager
        .run(|conn| Box::pin(async move { conn.upsert("files", "1", "a.txt").await }))
        .await
        .unwrap();
    let _ = manager
        .run(|_conn| Box::pin(async move { Err::<(), _>(AccessError::validation("bad name")) }))
        .await;

    let faults = db.faults().clone();
    let _ = manager
        .run(move |conn| {
            Box::pin(async move {
                conn.upsert("files", "2", "b.txt").await?;
                faults.fail_next(1);
                Ok::<_, AccessError>(())
            })
        })
        .await;

    drop(manager.begin().await.unwrap());

    assert_eq!(commits.load(Ordering::SeqCst), 1);
    assert_eq!(rollbacks.load(Ordering::SeqCst), 1);
    assert_eq!(
        *failures.lock().unwrap(),
        vec![
            (FailureStage::Commit, Some(ErrorKind::Connection)),
            (FailureStage::Abandoned, None),
        ]
    );
    assert_eq!(db.row("files", "1").as_deref(), Some("a.txt"));
    assert_eq!(db.row("files", "2"), None);
}
