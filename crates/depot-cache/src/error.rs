use depot_core::{AccessError, Classify, ErrorKind};
use depot_pool::PoolError;

/// Result of a cache operation.
///
/// Every failure is soft: callers log it and fall back to the source of
/// truth, treating the entry as missing.
pub type CacheOutcome<T> = Result<T, CacheError>;

/// Why a cache operation did not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// The namespace is not registered.
    #[error("unknown cache namespace `{0}`")]
    UnknownNamespace(String),
    /// The value could not be serialised.
    #[error("could not serialize cache value: {0}")]
    Serialization(String),
    /// No cache connection could be leased.
    #[error("cache pool: {0}")]
    Pool(#[from] PoolError),
    /// The store rejected or failed the command.
    #[error("cache backend: {0}")]
    Backend(AccessError),
}

impl CacheError {
    /// Stable lowercase name of the variant, used as a metrics label.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheError::UnknownNamespace(_) => "unknown_namespace",
            CacheError::Serialization(_) => "serialization",
            CacheError::Pool(_) => "pool",
            CacheError::Backend(_) => "backend",
        }
    }
}

impl Classify for CacheError {
    fn kind(&self) -> ErrorKind {
        match self {
            CacheError::UnknownNamespace(_) | CacheError::Serialization(_) => ErrorKind::Validation,
            CacheError::Pool(err) => err.kind(),
            CacheError::Backend(err) => err.kind(),
        }
    }
}
