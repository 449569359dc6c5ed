use depot_core::Classify;
use std::fmt;
use std::future::Future;

/// Opens and checks connections to one backing resource.
///
/// The pool never talks to the resource directly; everything goes through
/// the manager. Implementations wrap a conventional request/response client.
///
/// ```
/// use depot_core::AccessError;
/// use depot_pool::ManageConnection;
///
/// struct Echo;
///
/// impl ManageConnection for Echo {
///     type Connection = Vec<String>;
///     type Error = AccessError;
///
///     async fn connect(&self) -> Result<Self::Connection, Self::Error> {
///         Ok(Vec::new())
///     }
///
///     async fn is_valid(&self, _conn: &mut Self::Connection) -> Result<(), Self::Error> {
///         Ok(())
///     }
/// }
/// ```
pub trait ManageConnection: Send + Sync + 'static {
    /// The connection type.
    type Connection: Send + 'static;

    /// The error type returned by `connect` and `is_valid`.
    type Error: Classify + fmt::Display + Send + 'static;

    /// Opens a new connection.
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send;

    /// Runs a trivial round-trip on `conn`.
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Cheap synchronous check run when a lease is returned. No I/O.
    ///
    /// Connections reported broken are destroyed instead of being kept idle.
    fn has_broken(&self, _conn: &Self::Connection) -> bool {
        false
    }
}
