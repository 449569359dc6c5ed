use depot_core::{AccessError, Classify, ErrorKind};
use std::time::Duration;

/// Errors returned by [`ConnectionPool`](crate::ConnectionPool).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// No connection became available within the acquire timeout.
    #[error("pool exhausted: no connection available after {waited:?} (max size {max_size})")]
    Exhausted {
        /// How long the caller waited.
        waited: Duration,
        /// `capacity + max_overflow`.
        max_size: usize,
    },
    /// The pool has been shut down.
    #[error("pool is closed")]
    Closed,
    /// Opening or probing a connection failed.
    #[error("connection failed: {message}")]
    Connect {
        /// Classification of the backend error.
        kind: ErrorKind,
        /// The backend error message.
        message: String,
    },
}

impl PoolError {
    pub(crate) fn connect<E>(err: &E) -> Self
    where
        E: Classify + std::fmt::Display,
    {
        PoolError::Connect {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Returns true if this is an `Exhausted` error.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, PoolError::Exhausted { .. })
    }
}

impl Classify for PoolError {
    fn kind(&self) -> ErrorKind {
        match self {
            PoolError::Exhausted { .. } => ErrorKind::PoolExhausted,
            PoolError::Closed => ErrorKind::Closed,
            PoolError::Connect { kind, .. } => *kind,
        }
    }
}

impl From<PoolError> for AccessError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Connect { kind, message } => AccessError::new(kind, message),
            other => AccessError::from_classified(&other),
        }
    }
}
