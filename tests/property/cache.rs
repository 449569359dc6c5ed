//! Property tests for the cache facade.
//!
//! Invariants tested:
//! - Hits and misses match what was stored
//! - hit_rate is hits / lookups
//! - Invalidation never touches other namespaces

use depot_cache::CacheFacade;
use depot_chaos::MemoryKv;
use depot_pool::{ConnectionPool, PoolConfig};
use depot_retry::{RetryExecutor, RetryPolicy};
use proptest::prelude::*;
use std::collections::HashSet;

fn facade(kv: &MemoryKv) -> CacheFacade<MemoryKv> {
    let pool = ConnectionPool::new(
        kv.clone(),
        PoolConfig::builder().capacity(2).build().unwrap(),
    );
    CacheFacade::new(pool, RetryExecutor::new(RetryPolicy::no_retry()))
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: Lookups split into hits and misses exactly as stored
    #[test]
    fn hit_rate_matches_lookups(
        stored in prop::collection::hash_set(0u8..32, 0..16),
        lookups in prop::collection::vec(0u8..32, 1..64),
    ) {
        runtime().block_on(async {
            let kv = MemoryKv::new();
            let cache = facade(&kv);
            for id in &stored {
                cache.set("file", &id.to_string(), id, None).await.unwrap();
            }

            let mut expected_hits = 0u64;
            for id in &lookups {
                let found = cache.get::<u8>("file", &id.to_string()).await.unwrap();
                if stored.contains(id) {
                    expected_hits += 1;
                    prop_assert_eq!(found.and_then(|v| v.value()), Some(*id));
                } else {
                    prop_assert!(found.is_none());
                }
            }

            let stats = cache.get_stats();
            prop_assert_eq!(stats.hits, expected_hits);
            prop_assert_eq!(stats.lookups(), lookups.len() as u64);
            let rate = expected_hits as f64 / lookups.len() as f64;
            prop_assert!((stats.hit_rate - rate).abs() < 1e-9);
            Ok(())
        })?;
    }

    /// Property: Invalidating one namespace leaves the others intact
    #[test]
    fn invalidation_is_namespace_scoped(
        files in prop::collection::hash_set("[a-z0-9]{1,8}", 0..10),
        sessions in prop::collection::hash_set("[a-z0-9]{1,8}", 0..10),
    ) {
        runtime().block_on(async {
            let kv = MemoryKv::new();
            let cache = facade(&kv);
            for id in &files {
                cache.set("file", id, &1, None).await.unwrap();
            }
            for id in &sessions {
                cache.set("session", id, &2, None).await.unwrap();
            }

            let removed = cache.invalidate_namespace("file").await.unwrap();
            prop_assert_eq!(removed, files.len() as u64);
            prop_assert_eq!(kv.len(), sessions.len());

            let mut remaining = HashSet::new();
            for id in &sessions {
                if cache.exists("session", id).await.unwrap() {
                    remaining.insert(id.clone());
                }
            }
            prop_assert_eq!(&remaining, &sessions);
            Ok(())
        })?;
    }
}
