use depot_core::events::AccessEvent;
use depot_core::ErrorKind;
use std::time::{Duration, Instant};

/// Events emitted by a [`CacheFacade`](crate::CacheFacade).
#[derive(Debug, Clone)]
pub enum CacheEvent {
    /// A lookup found a value.
    Hit {
        source: String,
        timestamp: Instant,
        key: String,
    },
    /// A lookup found nothing.
    Miss {
        source: String,
        timestamp: Instant,
        key: String,
    },
    /// A value was written.
    Stored {
        source: String,
        timestamp: Instant,
        key: String,
        ttl: Duration,
    },
    /// Every entry of a namespace was removed.
    Invalidated {
        source: String,
        timestamp: Instant,
        namespace: String,
        removed: u64,
    },
    /// An operation failed. The caller received a soft error.
    Failed {
        source: String,
        timestamp: Instant,
        operation: &'static str,
        kind: ErrorKind,
    },
}

impl AccessEvent for CacheEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CacheEvent::Hit { .. } => "hit",
            CacheEvent::Miss { .. } => "miss",
            CacheEvent::Stored { .. } => "stored",
            CacheEvent::Invalidated { .. } => "invalidated",
            CacheEvent::Failed { .. } => "failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CacheEvent::Hit { timestamp, .. }
            | CacheEvent::Miss { timestamp, .. }
            | CacheEvent::Stored { timestamp, .. }
            | CacheEvent::Invalidated { timestamp, .. }
            | CacheEvent::Failed { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            CacheEvent::Hit { source, .. }
            | CacheEvent::Miss { source, .. }
            | CacheEvent::Stored { source, .. }
            | CacheEvent::Invalidated { source, .. }
            | CacheEvent::Failed { source, .. } => source,
        }
    }
}
