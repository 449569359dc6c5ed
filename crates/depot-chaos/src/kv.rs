//! In-process key-value backend with expiry.

use crate::fault::FaultInjector;
use depot_cache::{KeyValueConnection, RemainingTtl};
use depot_core::{AccessError, Classify, ErrorKind};
use depot_pool::ManageConnection;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

#[derive(Default)]
struct Shared {
    entries: Mutex<HashMap<String, Entry>>,
    open: AtomicUsize,
}

impl Shared {
    /// Locks the entries, dropping any that have expired.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();
        entries.retain(|_, entry| entry.is_live(now));
        entries
    }
}

/// A key-value store with per-key expiry, kept in memory.
///
/// Expiry follows the Tokio clock, so tests can advance it with
/// `tokio::time::pause` and `advance`. Every command passes through a
/// [`FaultInjector`].
///
/// Cheap to clone; clones share the same data.
#[derive(Clone)]
pub struct MemoryKv {
    shared: Arc<Shared>,
    faults: FaultInjector,
}

impl MemoryKv {
    /// An empty store that injects no faults.
    pub fn new() -> Self {
        Self::with_faults(FaultInjector::none())
    }

    /// An empty store whose commands pass through `faults`.
    pub fn with_faults(faults: FaultInjector) -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            faults,
        }
    }

    /// The fault injector.
    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    /// Connections currently open.
    pub fn open_connections(&self) -> usize {
        self.shared.open.load(Ordering::SeqCst)
    }

    /// Live keys.
    pub fn len(&self) -> usize {
        self.shared.entries().len()
    }

    /// Returns true if no live key exists.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores a value that never expires, bypassing connections.
    pub fn insert_persistent(&self, key: impl Into<String>, value: impl Into<String>) {
        self.shared.entries().insert(
            key.into(),
            Entry {
                value: value.into(),
                expires_at: None,
            },
        );
    }

    /// Reads a live value, bypassing connections.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.shared
            .entries()
            .get(key)
            .map(|entry| entry.value.clone())
    }
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryKv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryKv")
            .field("keys", &self.len())
            .field("open_connections", &self.open_connections())
            .field("faults", &self.faults)
            .finish()
    }
}

impl ManageConnection for MemoryKv {
    type Connection = MemoryKvConnection;
    type Error = AccessError;

    async fn connect(&self) -> Result<MemoryKvConnection, AccessError> {
        self.faults.inject("connect").await?;
        self.shared.open.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryKvConnection {
            shared: Arc::clone(&self.shared),
            faults: self.faults.clone(),
            broken: false,
        })
    }

    async fn is_valid(&self, conn: &mut MemoryKvConnection) -> Result<(), AccessError> {
        conn.guard("ping").await
    }

    fn has_broken(&self, conn: &MemoryKvConnection) -> bool {
        conn.broken
    }
}

/// A connection to a [`MemoryKv`].
pub struct MemoryKvConnection {
    shared: Arc<Shared>,
    faults: FaultInjector,
    broken: bool,
}

impl MemoryKvConnection {
    async fn guard(&mut self, operation: &'static str) -> Result<(), AccessError> {
        if self.broken {
            return Err(AccessError::connection("connection is closed"));
        }
        let result = self.faults.inject(operation).await;
        if let Err(err) = &result {
            if err.kind() == ErrorKind::Connection {
                self.broken = true;
            }
        }
        result
    }
}

impl KeyValueConnection for MemoryKvConnection {
    type Error = AccessError;

    async fn get_raw(&mut self, key: &str) -> Result<Option<String>, AccessError> {
        self.guard("get").await?;
        Ok(self
            .shared
            .entries()
            .get(key)
            .map(|entry| entry.value.clone()))
    }

    async fn set_raw(&mut self, key: &str, value: &str, ttl: Duration) -> Result<(), AccessError> {
        self.guard("set").await?;
        if ttl.is_zero() {
            return Err(AccessError::validation("expiry must be greater than zero"));
        }
        self.shared.entries().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&mut self, key: &str) -> Result<bool, AccessError> {
        self.guard("delete").await?;
        Ok(self.shared.entries().remove(key).is_some())
    }

    async fn exists(&mut self, key: &str) -> Result<bool, AccessError> {
        self.guard("exists").await?;
        Ok(self.shared.entries().contains_key(key))
    }

    async fn ttl(&mut self, key: &str) -> Result<RemainingTtl, AccessError> {
        self.guard("ttl").await?;
        let entries = self.shared.entries();
        Ok(match entries.get(key) {
            None => RemainingTtl::Absent,
            Some(Entry {
                expires_at: None, ..
            }) => RemainingTtl::NoExpiry,
            Some(Entry {
                expires_at: Some(at),
                ..
            }) => RemainingTtl::Expires(at.saturating_duration_since(Instant::now())),
        })
    }

    async fn delete_prefix(&mut self, prefix: &str) -> Result<u64, AccessError> {
        self.guard("delete_prefix").await?;
        let mut entries = self.shared.entries();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }
}

impl Drop for MemoryKvConnection {
    fn drop(&mut self) {
        self.shared.open.fetch_sub(1, Ordering::SeqCst);
    }
}

impl fmt::Debug for MemoryKvConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryKvConnection")
            .field("broken", &self.broken)
            .finish()
    }
}
