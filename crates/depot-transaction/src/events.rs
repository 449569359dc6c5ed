use depot_core::events::AccessEvent;
use depot_core::ErrorKind;
use std::fmt;
use std::time::{Duration, Instant};

/// The step at which a transaction failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureStage {
    /// `begin` failed or no connection could be leased.
    Begin,
    /// `commit` failed.
    Commit,
    /// `rollback` failed after the unit of work failed.
    Rollback,
    /// The scope was dropped without being completed.
    Abandoned,
}

impl FailureStage {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            FailureStage::Begin => "begin",
            FailureStage::Commit => "commit",
            FailureStage::Rollback => "rollback",
            FailureStage::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events emitted over the life of a transaction.
#[derive(Debug, Clone)]
pub enum TransactionEvent {
    /// `begin` succeeded.
    Began {
        source: String,
        timestamp: Instant,
        connection_id: u64,
    },
    /// The transaction committed.
    Committed {
        source: String,
        timestamp: Instant,
        duration: Duration,
    },
    /// The unit of work failed and the transaction was rolled back.
    RolledBack {
        source: String,
        timestamp: Instant,
        duration: Duration,
    },
    /// The transaction could not be opened or finished cleanly.
    Failed {
        source: String,
        timestamp: Instant,
        stage: FailureStage,
        kind: Option<ErrorKind>,
    },
}

impl AccessEvent for TransactionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TransactionEvent::Began { .. } => "began",
            TransactionEvent::Committed { .. } => "committed",
            TransactionEvent::RolledBack { .. } => "rolled_back",
            TransactionEvent::Failed { .. } => "failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            TransactionEvent::Began { timestamp, .. }
            | TransactionEvent::Committed { timestamp, .. }
            | TransactionEvent::RolledBack { timestamp, .. }
            | TransactionEvent::Failed { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            TransactionEvent::Began { source, .. }
            | TransactionEvent::Committed { source, .. }
            | TransactionEvent::RolledBack { source, .. }
            | TransactionEvent::Failed { source, .. } => source,
        }
    }
}
