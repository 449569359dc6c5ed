use depot_core::{AccessError, Classify, ErrorKind};
use depot_pool::PoolError;

/// A transaction could not be opened.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BeginError {
    /// No connection could be leased.
    #[error("could not acquire a connection: {0}")]
    Acquire(#[source] AccessError),
    /// The backend rejected `begin`.
    #[error("could not begin transaction: {0}")]
    Begin(#[source] AccessError),
}

impl From<PoolError> for BeginError {
    fn from(err: PoolError) -> Self {
        BeginError::Acquire(err.into())
    }
}

impl Classify for BeginError {
    fn kind(&self) -> ErrorKind {
        match self {
            BeginError::Acquire(err) | BeginError::Begin(err) => err.kind(),
        }
    }
}

/// Outcome of a failed transaction.
///
/// The caller's own error is never swallowed: `Aborted` and `Rollback`
/// both carry it.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError<E> {
    /// No connection could be leased.
    #[error("could not acquire a connection: {0}")]
    Acquire(#[source] AccessError),
    /// The backend rejected `begin`.
    #[error("could not begin transaction: {0}")]
    Begin(#[source] AccessError),
    /// The unit of work failed and its writes were rolled back.
    #[error("transaction rolled back: {0}")]
    Aborted(E),
    /// The unit of work succeeded but the commit failed; nothing was written.
    #[error("commit failed: {0}")]
    Commit(#[source] AccessError),
    /// The unit of work failed and the rollback failed as well.
    #[error("rollback failed after {cause}: {rollback}")]
    Rollback {
        /// The error returned by the unit of work.
        cause: E,
        /// Why the rollback failed.
        #[source]
        rollback: AccessError,
    },
}

impl<E> TransactionError<E> {
    /// The error returned by the unit of work, if it failed.
    pub fn caller_error(&self) -> Option<&E> {
        match self {
            TransactionError::Aborted(cause) | TransactionError::Rollback { cause, .. } => {
                Some(cause)
            }
            _ => None,
        }
    }

    /// Consumes the error, returning the unit of work's error if it failed.
    pub fn into_caller_error(self) -> Option<E> {
        match self {
            TransactionError::Aborted(cause) | TransactionError::Rollback { cause, .. } => {
                Some(cause)
            }
            _ => None,
        }
    }

    /// Returns true if nothing the unit of work wrote was persisted.
    ///
    /// Only a failed rollback leaves that in doubt, and even then the
    /// connection is destroyed, which backends treat as an implicit rollback.
    pub fn is_rolled_back(&self) -> bool {
        !matches!(self, TransactionError::Rollback { .. })
    }
}

impl<E> From<BeginError> for TransactionError<E> {
    fn from(err: BeginError) -> Self {
        match err {
            BeginError::Acquire(err) => TransactionError::Acquire(err),
            BeginError::Begin(err) => TransactionError::Begin(err),
        }
    }
}

impl<E: Classify> Classify for TransactionError<E> {
    fn kind(&self) -> ErrorKind {
        match self {
            TransactionError::Acquire(err) | TransactionError::Begin(err) => err.kind(),
            TransactionError::Aborted(cause) => cause.kind(),
            TransactionError::Commit(_) | TransactionError::Rollback { .. } => {
                ErrorKind::Transaction
            }
        }
    }
}
