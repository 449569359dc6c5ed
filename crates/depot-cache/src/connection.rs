use depot_core::Classify;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Time left before a key expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemainingTtl {
    /// The key expires after this much time.
    Expires(Duration),
    /// The key exists and never expires.
    NoExpiry,
    /// The key does not exist.
    Absent,
}

impl RemainingTtl {
    /// Returns true if the key exists.
    pub fn is_present(&self) -> bool {
        !matches!(self, RemainingTtl::Absent)
    }

    /// Remaining time, if the key expires.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            RemainingTtl::Expires(left) => Some(*left),
            _ => None,
        }
    }
}

/// One connection to a key-value store.
///
/// Values are opaque strings; the facade serialises them. Implementations
/// map their client errors to an [`ErrorKind`](depot_core::ErrorKind) so
/// that transient transport failures are retried on a fresh connection.
pub trait KeyValueConnection: Send {
    /// The error type returned by every command.
    type Error: Classify + fmt::Display + Send + 'static;

    /// Reads the value stored under `key`.
    fn get_raw(
        &mut self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send;

    /// Stores `value` under `key`, expiring after `ttl`.
    fn set_raw(
        &mut self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Removes `key`. Returns whether it existed.
    fn delete(&mut self, key: &str) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Returns whether `key` exists.
    fn exists(&mut self, key: &str) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Time left before `key` expires.
    fn ttl(&mut self, key: &str) -> impl Future<Output = Result<RemainingTtl, Self::Error>> + Send;

    /// Removes every key starting with `prefix`. Returns how many were removed.
    fn delete_prefix(
        &mut self,
        prefix: &str,
    ) -> impl Future<Output = Result<u64, Self::Error>> + Send;
}
