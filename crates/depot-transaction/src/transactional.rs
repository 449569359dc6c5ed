use depot_core::Classify;
use std::fmt;
use std::future::Future;

/// A connection that can run a transaction.
///
/// At most one transaction is open on a connection at a time; nesting is not
/// supported.
pub trait Transactional: Send {
    /// Error returned by the transaction statements.
    type Error: Classify + fmt::Display + Send + 'static;

    /// Opens a transaction.
    fn begin(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Makes every write since `begin` durable.
    fn commit(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Discards every write since `begin`.
    fn rollback(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
