use depot_core::events::AccessEvent;
use depot_core::ErrorKind;
use std::time::{Duration, Instant};

/// Events emitted by a [`RetryExecutor`](crate::RetryExecutor).
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// An attempt failed with a retryable error; another attempt follows after `delay`.
    Retry {
        source: String,
        timestamp: Instant,
        /// 1-based number of the retry about to be made.
        attempt: usize,
        delay: Duration,
        kind: ErrorKind,
    },
    /// The operation succeeded.
    Success {
        source: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// Every attempt failed; the last error is returned to the caller.
    Error {
        source: String,
        timestamp: Instant,
        attempts: usize,
        kind: ErrorKind,
    },
    /// The error kind is not retryable and was returned immediately.
    IgnoredError {
        source: String,
        timestamp: Instant,
        attempts: usize,
        kind: ErrorKind,
    },
}

impl AccessEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Retry { .. } => "retry",
            RetryEvent::Success { .. } => "success",
            RetryEvent::Error { .. } => "error",
            RetryEvent::IgnoredError { .. } => "ignored_error",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Retry { timestamp, .. }
            | RetryEvent::Success { timestamp, .. }
            | RetryEvent::Error { timestamp, .. }
            | RetryEvent::IgnoredError { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            RetryEvent::Retry { source, .. }
            | RetryEvent::Success { source, .. }
            | RetryEvent::Error { source, .. }
            | RetryEvent::IgnoredError { source, .. } => source,
        }
    }
}
