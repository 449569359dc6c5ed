use depot_core::events::AccessEvent;
use std::fmt;
use std::time::{Duration, Instant};

/// Why a connection was destroyed instead of returned to the idle set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscardReason {
    /// `is_valid` failed on acquisition.
    ValidationFailed,
    /// Idle for longer than `idle_recycle_after`.
    Stale,
    /// The lease was flagged broken, or the manager reported it broken.
    Broken,
    /// Overflow connections are never kept.
    Overflow,
    /// Made room for a fresh connection after validation attempts ran out.
    Evicted,
    /// The pool was shut down.
    Shutdown,
}

impl DiscardReason {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            DiscardReason::ValidationFailed => "validation_failed",
            DiscardReason::Stale => "stale",
            DiscardReason::Broken => "broken",
            DiscardReason::Overflow => "overflow",
            DiscardReason::Evicted => "evicted",
            DiscardReason::Shutdown => "shutdown",
        }
    }

    /// Whether the connection was retired because it was unusable.
    pub fn is_invalidation(self) -> bool {
        matches!(
            self,
            DiscardReason::ValidationFailed | DiscardReason::Stale | DiscardReason::Broken
        )
    }
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events emitted by a [`ConnectionPool`](crate::ConnectionPool).
#[derive(Debug, Clone)]
pub enum PoolEvent {
    /// A new connection was opened.
    ConnectionCreated {
        pool_name: String,
        timestamp: Instant,
        connection_id: u64,
        overflow: bool,
    },
    /// A lease was handed out.
    ConnectionAcquired {
        pool_name: String,
        timestamp: Instant,
        connection_id: u64,
        wait: Duration,
    },
    /// A lease was returned and its connection kept for reuse.
    ConnectionReleased {
        pool_name: String,
        timestamp: Instant,
        connection_id: u64,
        held: Duration,
    },
    /// A connection was destroyed.
    ConnectionDiscarded {
        pool_name: String,
        timestamp: Instant,
        connection_id: u64,
        reason: DiscardReason,
    },
    /// No connection became available within the acquire timeout.
    AcquireTimedOut {
        pool_name: String,
        timestamp: Instant,
        waited: Duration,
    },
    /// Shutdown finished.
    ShutdownCompleted {
        pool_name: String,
        timestamp: Instant,
        outstanding: usize,
    },
}

impl AccessEvent for PoolEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PoolEvent::ConnectionCreated { .. } => "connection_created",
            PoolEvent::ConnectionAcquired { .. } => "connection_acquired",
            PoolEvent::ConnectionReleased { .. } => "connection_released",
            PoolEvent::ConnectionDiscarded { .. } => "connection_discarded",
            PoolEvent::AcquireTimedOut { .. } => "acquire_timed_out",
            PoolEvent::ShutdownCompleted { .. } => "shutdown_completed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            PoolEvent::ConnectionCreated { timestamp, .. }
            | PoolEvent::ConnectionAcquired { timestamp, .. }
            | PoolEvent::ConnectionReleased { timestamp, .. }
            | PoolEvent::ConnectionDiscarded { timestamp, .. }
            | PoolEvent::AcquireTimedOut { timestamp, .. }
            | PoolEvent::ShutdownCompleted { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            PoolEvent::ConnectionCreated { pool_name, .. }
            | PoolEvent::ConnectionAcquired { pool_name, .. }
            | PoolEvent::ConnectionReleased { pool_name, .. }
            | PoolEvent::ConnectionDiscarded { pool_name, .. }
            | PoolEvent::AcquireTimedOut { pool_name, .. }
            | PoolEvent::ShutdownCompleted { pool_name, .. } => pool_name,
        }
    }
}
