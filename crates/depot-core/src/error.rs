//! Error taxonomy shared by the resource-access layer.
//!
//! Every failure that crosses a component boundary is classified into an
//! [`ErrorKind`]. Retry decisions, lease invalidation and cache degradation
//! are all driven by the kind, never by matching on concrete error types.
//!
//! ```
//! use depot_core::{AccessError, Classify, ErrorKind};
//!
//! let err = AccessError::connection("connection reset by peer");
//! assert_eq!(err.kind(), ErrorKind::Connection);
//! assert!(err.kind().is_transient());
//!
//! let err = AccessError::transaction("commit rejected");
//! assert!(!err.kind().is_transient());
//! ```

use std::fmt;
use std::io;

/// Classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ErrorKind {
    /// Transport-level failure: refused, reset, dropped by infrastructure.
    Connection,
    /// The resource did not answer in time.
    Timeout,
    /// No connection could be leased within the acquire timeout.
    PoolExhausted,
    /// A value could not be serialised or deserialised.
    Validation,
    /// Commit or rollback failed.
    Transaction,
    /// The pool has been shut down.
    Closed,
    /// Anything else reported by a backend.
    Other,
}

impl ErrorKind {
    /// Kinds that are safe to retry without duplicating side effects.
    pub fn is_transient(self) -> bool {
        matches!(self, ErrorKind::Connection | ErrorKind::Timeout)
    }

    /// Stable lowercase name, used as a label in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Connection => "connection",
            ErrorKind::Timeout => "timeout",
            ErrorKind::PoolExhausted => "pool_exhausted",
            ErrorKind::Validation => "validation",
            ErrorKind::Transaction => "transaction",
            ErrorKind::Closed => "closed",
            ErrorKind::Other => "other",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that know their [`ErrorKind`].
pub trait Classify {
    /// Returns the classification of this error.
    fn kind(&self) -> ErrorKind;
}

impl Classify for ErrorKind {
    fn kind(&self) -> ErrorKind {
        *self
    }
}

impl Classify for io::Error {
    fn kind(&self) -> ErrorKind {
        match io::Error::kind(self) {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ErrorKind::Timeout,
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof => ErrorKind::Connection,
            io::ErrorKind::InvalidData => ErrorKind::Validation,
            _ => ErrorKind::Other,
        }
    }
}

/// A classified error carrying a human-readable message.
///
/// This is the common currency between components: backend errors are
/// converted into it at the boundary so that the kind survives while the
/// concrete backend type does not leak into callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct AccessError {
    kind: ErrorKind,
    message: String,
}

impl AccessError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Converts any classified, displayable error.
    pub fn from_classified<E>(err: &E) -> Self
    where
        E: Classify + fmt::Display + ?Sized,
    {
        Self::new(err.kind(), err.to_string())
    }

    /// Transport-level failure.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    /// Timeout talking to the resource.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Serialisation mismatch.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Commit or rollback failure.
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transaction, message)
    }

    /// Unclassified backend failure.
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Other, message)
    }

    /// The message without the kind prefix.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Classify for AccessError {
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// A configuration value failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid configuration for `{field}`: {reason}")]
pub struct ConfigError {
    /// Name of the offending field.
    pub field: &'static str,
    /// Why the value was rejected.
    pub reason: String,
}

impl ConfigError {
    /// Creates a configuration error for `field`.
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}
