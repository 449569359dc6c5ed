use crate::HealthStatus;
use depot_core::events::AccessEvent;
use std::time::{Duration, Instant};

/// Events emitted by a [`HealthMonitor`](crate::HealthMonitor).
#[derive(Debug, Clone)]
pub enum HealthEvent {
    /// A target's status differs from the previous check.
    StatusChanged {
        source: String,
        timestamp: Instant,
        target: String,
        from: HealthStatus,
        to: HealthStatus,
    },
    /// A check of every target finished.
    CheckCompleted {
        source: String,
        timestamp: Instant,
        status: HealthStatus,
        duration: Duration,
    },
}

impl AccessEvent for HealthEvent {
    fn event_type(&self) -> &'static str {
        match self {
            HealthEvent::StatusChanged { .. } => "status_changed",
            HealthEvent::CheckCompleted { .. } => "check_completed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            HealthEvent::StatusChanged { timestamp, .. }
            | HealthEvent::CheckCompleted { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            HealthEvent::StatusChanged { source, .. }
            | HealthEvent::CheckCompleted { source, .. } => source,
        }
    }
}
