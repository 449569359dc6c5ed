use crate::manager::ManageConnection;
use crate::pool::{PoolInner, Slot};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OwnedSemaphorePermit;
use tokio::time::Instant;

/// Exclusive access to one pooled connection.
///
/// Dereferences to the connection. Dropping the lease returns the
/// connection to the pool exactly once, on every path: normal completion,
/// early return, panic or cancellation. A lease flagged broken has its
/// connection destroyed instead of kept.
pub struct Lease<M: ManageConnection> {
    slot: Option<Slot<M::Connection>>,
    pool: Arc<PoolInner<M>>,
    broken: bool,
    acquired_at: Instant,
    // Released after the connection is back in the pool.
    _permit: OwnedSemaphorePermit,
}

impl<M: ManageConnection> Lease<M> {
    pub(crate) fn new(
        slot: Slot<M::Connection>,
        pool: Arc<PoolInner<M>>,
        permit: OwnedSemaphorePermit,
    ) -> Self {
        Self {
            slot: Some(slot),
            pool,
            broken: false,
            acquired_at: Instant::now(),
            _permit: permit,
        }
    }

    fn slot(&self) -> &Slot<M::Connection> {
        self.slot.as_ref().expect("lease used after release")
    }

    /// Pool-unique id of the connection.
    pub fn connection_id(&self) -> u64 {
        self.slot().id
    }

    /// Whether this is an overflow connection, destroyed on release.
    pub fn is_overflow(&self) -> bool {
        self.slot().overflow
    }

    /// Time since the underlying connection was opened.
    pub fn connection_age(&self) -> Duration {
        self.slot().created_at.elapsed()
    }

    /// Time since this lease was handed out.
    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }

    /// Flags the connection unusable; it is destroyed on release.
    pub fn mark_broken(&mut self) {
        self.broken = true;
    }

    /// Sets or clears the broken flag.
    ///
    /// Holders that leave the connection in an intermediate state across an
    /// `.await` set the flag first and clear it once the connection is
    /// consistent again, so that cancellation destroys it.
    pub fn set_broken(&mut self, broken: bool) {
        self.broken = broken;
    }

    /// Returns true if the lease is flagged broken.
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Returns the connection to the pool. Same as dropping the lease.
    pub fn release(self) {}
}

impl<M: ManageConnection> Deref for Lease<M> {
    type Target = M::Connection;

    fn deref(&self) -> &Self::Target {
        &self.slot().conn
    }
}

impl<M: ManageConnection> DerefMut for Lease<M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self
            .slot
            .as_mut()
            .expect("lease used after release")
            .conn
    }
}

impl<M: ManageConnection> Drop for Lease<M> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            self.pool
                .put_back(slot, self.broken, self.acquired_at.elapsed());
        }
    }
}

impl<M: ManageConnection> fmt::Debug for Lease<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease")
            .field("connection_id", &self.slot.as_ref().map(|slot| slot.id))
            .field("broken", &self.broken)
            .finish()
    }
}
