//! Namespaced cache facade over a pooled key-value store.
//!
//! Keys are built from registered namespaces as `"{prefix}:{id}"`, and every
//! namespace carries the TTL applied to its entries. Values are serialised
//! as JSON.
//!
//! The cache is never the source of truth, so its failures are soft: every
//! operation returns a [`CacheOutcome`], a plain `Result` whose error the
//! caller logs and treats as a miss.
//!
//! # Examples
//!
//! ```no_run
//! use depot_cache::{namespace, CacheFacade, CachedValue, KeyValueConnection};
//! use depot_pool::ManageConnection;
//!
//! async fn cached_size<M>(cache: &CacheFacade<M>, file_id: &str) -> Option<u64>
//! where
//!     M: ManageConnection,
//!     M::Connection: KeyValueConnection,
//! {
//!     match cache.get::<u64>(namespace::FILE, file_id).await {
//!         Ok(Some(CachedValue::Value(size))) => Some(size),
//!         _ => None,
//!     }
//! }
//! ```

mod config;
mod connection;
mod error;
mod events;
mod facade;
pub mod namespace;
mod stats;

pub use config::{CacheConfig, CacheConfigBuilder};
pub use connection::{KeyValueConnection, RemainingTtl};
pub use error::{CacheError, CacheOutcome};
pub use events::CacheEvent;
pub use facade::{CacheFacade, CachedValue};
pub use namespace::{CacheKey, Namespace, NamespaceTable, TtlPolicy};
pub use stats::CacheStats;
