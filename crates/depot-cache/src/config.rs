//! Configuration for the cache facade.

use crate::events::CacheEvent;
use crate::namespace::NamespaceTable;
use depot_core::events::{EventListener, EventListeners, FnListener};
use depot_core::ErrorKind;
use std::fmt;

/// Configuration for a [`CacheFacade`](crate::CacheFacade).
#[derive(Clone)]
pub struct CacheConfig {
    pub(crate) name: String,
    pub(crate) namespaces: NamespaceTable,
    pub(crate) event_listeners: EventListeners<CacheEvent>,
}

impl CacheConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::new()
    }

    /// Name reported in events, logs and metrics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The registered namespaces.
    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfigBuilder::new().build()
    }
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("name", &self.name)
            .field("namespaces", &self.namespaces.len())
            .field("listeners", &self.event_listeners.len())
            .finish()
    }
}

/// Builder for [`CacheConfig`].
pub struct CacheConfigBuilder {
    name: String,
    namespaces: NamespaceTable,
    event_listeners: EventListeners<CacheEvent>,
}

impl CacheConfigBuilder {
    /// Creates a builder with the storage namespaces registered.
    pub fn new() -> Self {
        Self {
            name: "cache".to_string(),
            namespaces: NamespaceTable::storage_defaults(),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the cache name.
    ///
    /// Default: `"cache"`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replaces the namespace table.
    ///
    /// Default: [`NamespaceTable::storage_defaults`]
    pub fn namespaces(mut self, namespaces: NamespaceTable) -> Self {
        self.namespaces = namespaces;
        self
    }

    /// Registers a listener for every cache event.
    pub fn listener<L>(mut self, listener: L) -> Self
    where
        L: EventListener<CacheEvent> + 'static,
    {
        self.event_listeners.add(listener);
        self
    }

    /// Registers a callback invoked on a cache hit, with the key.
    pub fn on_hit<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CacheEvent::Hit { key, .. } = event {
                f(key);
            }
        }));
        self
    }

    /// Registers a callback invoked on a cache miss, with the key.
    pub fn on_miss<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CacheEvent::Miss { key, .. } = event {
                f(key);
            }
        }));
        self
    }

    /// Registers a callback invoked when an operation fails, with the
    /// operation name and the error kind.
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(&'static str, ErrorKind) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CacheEvent::Failed {
                operation, kind, ..
            } = event
            {
                f(operation, *kind);
            }
        }));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> CacheConfig {
        CacheConfig {
            name: self.name,
            namespaces: self.namespaces,
            event_listeners: self.event_listeners,
        }
    }
}

impl Default for CacheConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
