use depot_core::events::AccessEvent;
use depot_core::ErrorKind;
use std::time::{Duration, Instant};

/// Events emitted by a [`FaultInjector`](crate::FaultInjector).
#[derive(Debug, Clone)]
pub enum ChaosEvent {
    /// The operation was failed on purpose.
    ErrorInjected {
        source: String,
        timestamp: Instant,
        operation: &'static str,
        kind: ErrorKind,
    },
    /// The operation was delayed on purpose.
    LatencyInjected {
        source: String,
        timestamp: Instant,
        operation: &'static str,
        delay: Duration,
    },
    /// The operation ran untouched.
    PassedThrough {
        source: String,
        timestamp: Instant,
        operation: &'static str,
    },
}

impl AccessEvent for ChaosEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ChaosEvent::ErrorInjected { .. } => "chaos.error_injected",
            ChaosEvent::LatencyInjected { .. } => "chaos.latency_injected",
            ChaosEvent::PassedThrough { .. } => "chaos.passed_through",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            ChaosEvent::ErrorInjected { timestamp, .. }
            | ChaosEvent::LatencyInjected { timestamp, .. }
            | ChaosEvent::PassedThrough { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            ChaosEvent::ErrorInjected { source, .. }
            | ChaosEvent::LatencyInjected { source, .. }
            | ChaosEvent::PassedThrough { source, .. } => source,
        }
    }
}
