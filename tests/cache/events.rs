//! Cache events and callbacks.

use super::{config, facade_with, file, FileMeta};
use depot_cache::CacheEvent;
use depot_core::{AccessEvent, ErrorKind, FnListener};
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn operations_are_reported_in_order() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let config = config()
        .listener(FnListener::new(move |event: &CacheEvent| {
            assert_eq!(event.source(), "cache");
            sink.lock().unwrap().push(event.event_type());
        }))
        .build();
    let (cache, _kv) = facade_with(config);

    cache.set("file", "1", &file("a", 1), None).await.unwrap();
    cache.get::<FileMeta>("file", "1").await.unwrap();
    cache.get::<FileMeta>("file", "2").await.unwrap();
    cache.invalidate_namespace("file").await.unwrap();
    let _ = cache.get::<FileMeta>("nope", "1").await;

    assert_eq!(
        *events.lock().unwrap(),
        vec!["stored", "hit", "miss", "invalidated", "failed"]
    );
}

#[tokio::test]
async fn callbacks_receive_keys_and_failures() {
    let hits = Arc::new(Mutex::new(Vec::new()));
    let misses = Arc::new(Mutex::new(Vec::new()));
    let failures = Arc::new(Mutex::new(Vec::new()));

    let config = {
        let hits = Arc::clone(&hits);
        let misses = Arc::clone(&misses);
        let failures = Arc::clone(&failures);
        config()
            .on_hit(move |key| hits.lock().unwrap().push(key.to_string()))
            .on_miss(move |key| misses.lock().unwrap().push(key.to_string()))
            .on_failure(move |operation, kind| failures.lock().unwrap().push((operation, kind)))
            .build()
    };
    let (cache, kv) = facade_with(config);

    cache.set("session", "alice", &"token", None).await.unwrap();
    cache.get::<String>("session", "alice").await.unwrap();
    cache.get::<String>("session", "bob").await.unwrap();

    kv.faults().set_outage(true);
    let _ = cache.delete("session", "alice").await;

    assert_eq!(*hits.lock().unwrap(), vec!["session:alice"]);
    assert_eq!(*misses.lock().unwrap(), vec!["session:bob"]);
    assert_eq!(
        *failures.lock().unwrap(),
        vec![("delete", ErrorKind::Connection)]
    );
}
