use crate::events::{FailureStage, TransactionEvent};
use depot_core::events::{EventListener, EventListeners, FnListener};
use depot_core::ErrorKind;
use std::fmt;
use std::time::Duration;

/// Naming and listeners shared by the transactions of one
/// [`TransactionManager`](crate::TransactionManager).
#[derive(Clone)]
pub struct TransactionConfig {
    pub(crate) name: String,
    pub(crate) event_listeners: EventListeners<TransactionEvent>,
}

impl TransactionConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> TransactionConfigBuilder {
        TransactionConfigBuilder::new()
    }

    /// Name reported in events.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for TransactionConfig {
    fn default() -> Self {
        TransactionConfigBuilder::new().build()
    }
}

impl fmt::Debug for TransactionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionConfig")
            .field("name", &self.name)
            .field("listeners", &self.event_listeners.len())
            .finish()
    }
}

/// Builder for [`TransactionConfig`].
pub struct TransactionConfigBuilder {
    name: String,
    event_listeners: EventListeners<TransactionEvent>,
}

impl TransactionConfigBuilder {
    /// Creates a builder named `"transaction"` with no listeners.
    pub fn new() -> Self {
        Self {
            name: "transaction".to_string(),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the name reported in events.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a listener for every transaction event.
    pub fn listener<L>(mut self, listener: L) -> Self
    where
        L: EventListener<TransactionEvent> + 'static,
    {
        self.event_listeners.add(listener);
        self
    }

    /// Registers a callback invoked after a commit, with the transaction duration.
    pub fn on_commit<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let TransactionEvent::Committed { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    /// Registers a callback invoked after a rollback, with the transaction duration.
    pub fn on_rollback<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let TransactionEvent::RolledBack { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    /// Registers a callback invoked when a transaction fails to open or finish.
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(FailureStage, Option<ErrorKind>) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let TransactionEvent::Failed { stage, kind, .. } = event {
                f(*stage, *kind);
            }
        }));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> TransactionConfig {
        TransactionConfig {
            name: self.name,
            event_listeners: self.event_listeners,
        }
    }
}

impl Default for TransactionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
