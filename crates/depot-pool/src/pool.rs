use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::events::{DiscardReason, PoolEvent};
use crate::lease::Lease;
use crate::manager::ManageConnection;
use crate::stats::PoolStats;
use std::collections::VecDeque;
use std::fmt;
use std::pin::pin;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// A connection owned by the pool.
pub(crate) struct Slot<C> {
    pub(crate) id: u64,
    pub(crate) created_at: Instant,
    pub(crate) last_used_at: Instant,
    pub(crate) overflow: bool,
    pub(crate) conn: C,
}

struct PoolState<C> {
    /// Oldest `last_used_at` at the front.
    idle: VecDeque<Slot<C>>,
    pooled_open: usize,
    overflow_open: usize,
    /// Leases handed out plus checkouts still connecting or validating.
    in_use: usize,
}

impl<C> PoolState<C> {
    fn forget(&mut self, overflow: bool) {
        if overflow {
            self.overflow_open -= 1;
        } else {
            self.pooled_open -= 1;
        }
    }

    fn take_stale(&mut self, now: Instant, max_idle: Duration) -> Vec<Slot<C>> {
        let mut stale = Vec::new();
        while self
            .idle
            .front()
            .is_some_and(|slot| now.saturating_duration_since(slot.last_used_at) >= max_idle)
        {
            if let Some(slot) = self.idle.pop_front() {
                self.pooled_open -= 1;
                stale.push(slot);
            }
        }
        stale
    }
}

pub(crate) struct PoolInner<M: ManageConnection> {
    manager: M,
    config: PoolConfig,
    permits: Arc<Semaphore>,
    state: Mutex<PoolState<M::Connection>>,
    next_id: AtomicU64,
    total_created: AtomicU64,
    total_invalidated: AtomicU64,
    waiting: AtomicUsize,
    closed: AtomicBool,
    returned: Notify,
}

impl<M: ManageConnection> PoolInner<M> {
    fn lock(&self) -> MutexGuard<'_, PoolState<M::Connection>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn emit(&self, event: PoolEvent) {
        self.config.event_listeners.emit(&event);
    }

    fn new_slot(&self, conn: M::Connection, overflow: bool) -> Slot<M::Connection> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.total_created.fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "tracing")]
        tracing::debug!(pool = %self.config.name, connection_id = id, overflow, "connection opened");

        #[cfg(feature = "metrics")]
        counter!("depot_pool_connections_created_total", "pool" => self.config.name.clone())
            .increment(1);

        self.emit(PoolEvent::ConnectionCreated {
            pool_name: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
            connection_id: id,
            overflow,
        });

        let now = Instant::now();
        Slot {
            id,
            created_at: now,
            last_used_at: now,
            overflow,
            conn,
        }
    }

    /// Closes a connection that is no longer counted by the pool state.
    fn destroy(&self, slot: Slot<M::Connection>, reason: DiscardReason) {
        self.discarded(slot.id, reason);
        drop(slot);
    }

    fn discarded(&self, connection_id: u64, reason: DiscardReason) {
        if reason.is_invalidation() {
            self.total_invalidated.fetch_add(1, Ordering::Relaxed);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(pool = %self.config.name, connection_id, %reason, "connection discarded");

        #[cfg(feature = "metrics")]
        counter!(
            "depot_pool_connections_discarded_total",
            "pool" => self.config.name.clone(),
            "reason" => reason.as_str()
        )
        .increment(1);

        self.emit(PoolEvent::ConnectionDiscarded {
            pool_name: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
            connection_id,
            reason,
        });
    }

    /// Pops the most recently used idle connection, retiring stale ones on the way.
    fn take_idle(&self) -> Option<Slot<M::Connection>> {
        let (slot, stale) = {
            let mut state = self.lock();
            let stale = state.take_stale(Instant::now(), self.config.idle_recycle_after);
            let slot = state.idle.pop_back();
            if slot.is_some() {
                state.in_use += 1;
            }
            (slot, stale)
        };
        for slot in stale {
            self.destroy(slot, DiscardReason::Stale);
        }
        slot
    }

    /// Accounts for a connection about to be opened for a lease.
    ///
    /// Returns whether it is an overflow connection, and an idle connection
    /// that had to make room for it.
    fn reserve(&self) -> (bool, Option<Slot<M::Connection>>) {
        let mut state = self.lock();
        state.in_use += 1;
        if state.pooled_open < self.config.capacity {
            state.pooled_open += 1;
            (false, None)
        } else if let Some(victim) = state.idle.pop_front() {
            (false, Some(victim))
        } else {
            state.overflow_open += 1;
            (true, None)
        }
    }

    /// Takes back a leased connection.
    pub(crate) fn put_back(&self, mut slot: Slot<M::Connection>, broken: bool, held: Duration) {
        let reason = if broken || self.manager.has_broken(&slot.conn) {
            Some(DiscardReason::Broken)
        } else if slot.overflow {
            Some(DiscardReason::Overflow)
        } else {
            None
        };

        let mut state = self.lock();
        state.in_use -= 1;
        let reason = if self.is_closed() {
            Some(reason.unwrap_or(DiscardReason::Shutdown))
        } else {
            reason
        };

        match reason {
            None => {
                slot.last_used_at = Instant::now();
                let connection_id = slot.id;
                state.idle.push_back(slot);
                drop(state);

                self.emit(PoolEvent::ConnectionReleased {
                    pool_name: self.config.name.clone(),
                    timestamp: std::time::Instant::now(),
                    connection_id,
                    held,
                });
            }
            Some(reason) => {
                state.forget(slot.overflow);
                drop(state);
                self.destroy(slot, reason);
            }
        }

        #[cfg(feature = "metrics")]
        gauge!("depot_pool_connections_in_use", "pool" => self.config.name.clone()).decrement(1.0);

        self.returned.notify_waiters();
    }

    /// Destroys a connection that was checked out but never handed to a caller.
    fn discard_checked_out(&self, slot: Slot<M::Connection>, reason: DiscardReason) {
        {
            let mut state = self.lock();
            state.in_use -= 1;
            state.forget(slot.overflow);
        }
        self.destroy(slot, reason);
        self.returned.notify_waiters();
    }

    fn undo_open(&self, overflow: bool, leased: bool, connection_id: Option<u64>) {
        {
            let mut state = self.lock();
            if leased {
                state.in_use -= 1;
            }
            state.forget(overflow);
        }
        if let Some(id) = connection_id {
            self.discarded(id, DiscardReason::Broken);
        }
        self.returned.notify_waiters();
    }

    fn recycle(&self) -> usize {
        let stale = self
            .lock()
            .take_stale(Instant::now(), self.config.idle_recycle_after);
        let count = stale.len();
        for slot in stale {
            self.destroy(slot, DiscardReason::Stale);
        }
        count
    }

    fn in_use(&self) -> usize {
        self.lock().in_use
    }
}

/// Undoes the accounting of a connection being opened or validated if the
/// checkout does not finish.
struct OpenGuard<'a, M: ManageConnection> {
    inner: &'a PoolInner<M>,
    overflow: bool,
    leased: bool,
    connection_id: Option<u64>,
    armed: bool,
}

impl<'a, M: ManageConnection> OpenGuard<'a, M> {
    fn opening(inner: &'a PoolInner<M>, overflow: bool, leased: bool) -> Self {
        Self {
            inner,
            overflow,
            leased,
            connection_id: None,
            armed: true,
        }
    }

    fn validating(inner: &'a PoolInner<M>, slot: &Slot<M::Connection>) -> Self {
        Self {
            inner,
            overflow: slot.overflow,
            leased: true,
            connection_id: Some(slot.id),
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<M: ManageConnection> Drop for OpenGuard<'_, M> {
    fn drop(&mut self) {
        if self.armed {
            self.inner
                .undo_open(self.overflow, self.leased, self.connection_id);
        }
    }
}

struct WaitGuard<'a>(&'a AtomicUsize);

impl<'a> WaitGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(counter)
    }
}

impl Drop for WaitGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Outcome of [`ConnectionPool::shutdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Idle connections closed immediately.
    pub drained: usize,
    /// Leases still outstanding when the grace period ended. They are
    /// destroyed whenever they are eventually returned.
    pub outstanding: usize,
}

impl ShutdownReport {
    /// Returns true if every lease came back within the grace period.
    pub fn is_clean(&self) -> bool {
        self.outstanding == 0
    }
}

/// A bounded pool of connections to one resource.
///
/// At most `capacity + max_overflow` connections are open at once. Up to
/// `capacity` of them are kept idle between uses; overflow connections are
/// destroyed as soon as they are released. Callers that find the pool
/// saturated wait in FIFO order for up to the acquire timeout.
///
/// Cloning is cheap and yields a handle to the same pool.
///
/// # Example
///
/// ```
/// use depot_core::AccessError;
/// use depot_pool::{ConnectionPool, ManageConnection, PoolConfig};
/// use std::time::Duration;
///
/// struct Counter;
///
/// impl ManageConnection for Counter {
///     type Connection = u64;
///     type Error = AccessError;
///
///     async fn connect(&self) -> Result<u64, AccessError> {
///         Ok(0)
///     }
///
///     async fn is_valid(&self, _conn: &mut u64) -> Result<(), AccessError> {
///         Ok(())
///     }
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = PoolConfig::builder()
///     .name("counters")
///     .capacity(2)
///     .max_overflow(1)
///     .acquire_timeout(Duration::from_millis(100))
///     .build()?;
/// let pool = ConnectionPool::new(Counter, config);
///
/// let mut lease = pool.acquire().await?;
/// *lease += 1;
/// drop(lease);
///
/// assert_eq!(pool.stats().idle_count, 1);
/// # Ok(())
/// # }
/// ```
pub struct ConnectionPool<M: ManageConnection> {
    inner: Arc<PoolInner<M>>,
}

impl<M: ManageConnection> Clone for ConnectionPool<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: ManageConnection> ConnectionPool<M> {
    /// Creates a pool. No connection is opened until one is needed or
    /// [`prewarm`](Self::prewarm) is called.
    pub fn new(manager: M, config: PoolConfig) -> Self {
        #[cfg(feature = "metrics")]
        {
            METRICS_INIT.call_once(|| {
                describe_counter!(
                    "depot_pool_acquired_total",
                    "Total number of leases handed out"
                );
                describe_counter!(
                    "depot_pool_timeouts_total",
                    "Total number of acquisitions that timed out"
                );
                describe_counter!(
                    "depot_pool_connections_created_total",
                    "Total number of connections opened"
                );
                describe_counter!(
                    "depot_pool_connections_discarded_total",
                    "Total number of connections destroyed, by reason"
                );
                describe_gauge!(
                    "depot_pool_connections_in_use",
                    "Number of connections currently leased"
                );
                describe_histogram!(
                    "depot_pool_wait_duration_seconds",
                    "Time spent waiting for a lease"
                );
            });
        }

        let permits = Arc::new(Semaphore::new(config.max_size()));
        Self {
            inner: Arc::new(PoolInner {
                manager,
                config,
                permits,
                state: Mutex::new(PoolState {
                    idle: VecDeque::new(),
                    pooled_open: 0,
                    overflow_open: 0,
                    in_use: 0,
                }),
                next_id: AtomicU64::new(1),
                total_created: AtomicU64::new(0),
                total_invalidated: AtomicU64::new(0),
                waiting: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
                returned: Notify::new(),
            }),
        }
    }

    /// The pool name.
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// The configuration the pool was built with.
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// The connection manager.
    pub fn manager(&self) -> &M {
        &self.inner.manager
    }

    /// Returns true once [`shutdown`](Self::shutdown) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Opens connections until `capacity` pooled connections exist.
    ///
    /// Returns how many were opened. Stops at the first connection failure.
    pub async fn prewarm(&self) -> Result<usize, PoolError> {
        let inner = &*self.inner;
        let mut opened = 0;

        loop {
            {
                let mut state = inner.lock();
                if inner.is_closed() {
                    return Err(PoolError::Closed);
                }
                if state.pooled_open >= inner.config.capacity {
                    break;
                }
                state.pooled_open += 1;
            }

            let guard = OpenGuard::opening(inner, false, false);
            let conn = match inner.manager.connect().await {
                Ok(conn) => conn,
                Err(err) => return Err(PoolError::connect(&err)),
            };
            guard.disarm();

            let slot = inner.new_slot(conn, false);
            let mut state = inner.lock();
            if inner.is_closed() {
                state.pooled_open -= 1;
                drop(state);
                inner.destroy(slot, DiscardReason::Shutdown);
                return Err(PoolError::Closed);
            }
            state.idle.push_back(slot);
            opened += 1;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(pool = %inner.config.name, opened, "pool prewarmed");

        Ok(opened)
    }

    /// Leases a connection, waiting up to the configured acquire timeout.
    pub async fn acquire(&self) -> Result<Lease<M>, PoolError> {
        self.acquire_timeout(self.inner.config.acquire_timeout)
            .await
    }

    /// Leases a connection, waiting up to `timeout`.
    ///
    /// Fails with [`PoolError::Exhausted`] when no lease becomes available in
    /// time, [`PoolError::Closed`] after shutdown, and
    /// [`PoolError::Connect`] when a new connection cannot be opened.
    pub async fn acquire_timeout(&self, timeout: Duration) -> Result<Lease<M>, PoolError> {
        let inner = &*self.inner;
        if inner.is_closed() {
            return Err(PoolError::Closed);
        }

        let started = Instant::now();
        let permit = {
            let _waiting = WaitGuard::new(&inner.waiting);
            let admission = Arc::clone(&inner.permits).acquire_owned();
            match tokio::time::timeout(timeout, admission).await {
                Ok(Ok(permit)) => permit,
                Ok(Err(_)) => return Err(PoolError::Closed),
                Err(_) => return Err(self.timed_out(started.elapsed())),
            }
        };

        self.checkout(permit, started).await
    }

    /// Leases a connection only if one can be had without waiting for
    /// another caller to release theirs.
    pub async fn try_acquire(&self) -> Result<Lease<M>, PoolError> {
        let inner = &*self.inner;
        if inner.is_closed() {
            return Err(PoolError::Closed);
        }

        let started = Instant::now();
        let permit = match Arc::clone(&inner.permits).try_acquire_owned() {
            Ok(permit) => permit,
            Err(TryAcquireError::Closed) => return Err(PoolError::Closed),
            Err(TryAcquireError::NoPermits) => {
                return Err(PoolError::Exhausted {
                    waited: Duration::ZERO,
                    max_size: inner.config.max_size(),
                })
            }
        };

        self.checkout(permit, started).await
    }

    fn timed_out(&self, waited: Duration) -> PoolError {
        let inner = &*self.inner;

        #[cfg(feature = "tracing")]
        tracing::warn!(pool = %inner.config.name, ?waited, "timed out waiting for a connection");

        #[cfg(feature = "metrics")]
        counter!("depot_pool_timeouts_total", "pool" => inner.config.name.clone()).increment(1);

        inner.emit(PoolEvent::AcquireTimedOut {
            pool_name: inner.config.name.clone(),
            timestamp: std::time::Instant::now(),
            waited,
        });

        PoolError::Exhausted {
            waited,
            max_size: inner.config.max_size(),
        }
    }

    async fn checkout(
        &self,
        permit: OwnedSemaphorePermit,
        started: Instant,
    ) -> Result<Lease<M>, PoolError> {
        let inner = &*self.inner;
        let mut probes = 0;

        loop {
            if inner.config.validate_on_acquire && probes >= inner.config.capacity {
                break;
            }
            let Some(mut slot) = inner.take_idle() else {
                break;
            };
            if !inner.config.validate_on_acquire {
                return Ok(self.hand_out(slot, permit, started));
            }

            probes += 1;
            let guard = OpenGuard::validating(inner, &slot);
            let probe = inner.manager.is_valid(&mut slot.conn).await;
            guard.disarm();

            match probe {
                Ok(()) => return Ok(self.hand_out(slot, permit, started)),
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        pool = %inner.config.name,
                        connection_id = slot.id,
                        error = %_err,
                        "idle connection failed validation"
                    );
                    inner.discard_checked_out(slot, DiscardReason::ValidationFailed);
                }
            }
        }

        let (overflow, victim) = inner.reserve();
        if let Some(victim) = victim {
            inner.destroy(victim, DiscardReason::Evicted);
        }

        let guard = OpenGuard::opening(inner, overflow, true);
        let conn = match inner.manager.connect().await {
            Ok(conn) => conn,
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(pool = %inner.config.name, error = %err, "failed to open connection");
                return Err(PoolError::connect(&err));
            }
        };
        guard.disarm();

        let slot = inner.new_slot(conn, overflow);
        Ok(self.hand_out(slot, permit, started))
    }

    fn hand_out(
        &self,
        slot: Slot<M::Connection>,
        permit: OwnedSemaphorePermit,
        started: Instant,
    ) -> Lease<M> {
        let inner = &*self.inner;
        let wait = started.elapsed();

        #[cfg(feature = "metrics")]
        {
            counter!("depot_pool_acquired_total", "pool" => inner.config.name.clone()).increment(1);
            gauge!("depot_pool_connections_in_use", "pool" => inner.config.name.clone())
                .increment(1.0);
            histogram!("depot_pool_wait_duration_seconds", "pool" => inner.config.name.clone())
                .record(wait.as_secs_f64());
        }

        inner.emit(PoolEvent::ConnectionAcquired {
            pool_name: inner.config.name.clone(),
            timestamp: std::time::Instant::now(),
            connection_id: slot.id,
            wait,
        });

        Lease::new(slot, Arc::clone(&self.inner), permit)
    }

    /// Leases a connection and runs the manager's round-trip check on it.
    ///
    /// A connection that fails the check is destroyed.
    pub async fn ping(&self) -> Result<(), PoolError> {
        let lease = self.acquire().await?;
        self.check_lease(lease).await
    }

    /// Like [`ping`](Self::ping), but fails with [`PoolError::Exhausted`]
    /// instead of queueing when every lease is taken.
    pub async fn try_ping(&self) -> Result<(), PoolError> {
        let lease = self.try_acquire().await?;
        self.check_lease(lease).await
    }

    async fn check_lease(&self, mut lease: Lease<M>) -> Result<(), PoolError> {
        let manager = &self.inner.manager;
        match manager.is_valid(&mut lease).await {
            Ok(()) => Ok(()),
            Err(err) => {
                lease.mark_broken();
                Err(PoolError::connect(&err))
            }
        }
    }

    /// Destroys idle connections unused for longer than `idle_recycle_after`.
    ///
    /// Returns how many were destroyed.
    pub fn recycle(&self) -> usize {
        self.inner.recycle()
    }

    /// Takes a snapshot of the pool counters.
    pub fn stats(&self) -> PoolStats {
        let inner = &*self.inner;
        let state = inner.lock();
        PoolStats {
            capacity: inner.config.capacity,
            max_overflow: inner.config.max_overflow,
            in_use_count: state.in_use,
            idle_count: state.idle.len(),
            overflow_count: state.overflow_open,
            total_created: inner.total_created.load(Ordering::Relaxed),
            total_invalidated: inner.total_invalidated.load(Ordering::Relaxed),
            waiting: inner.waiting.load(Ordering::Relaxed),
        }
    }

    /// Closes the pool.
    ///
    /// New acquisitions fail with [`PoolError::Closed`] and waiting callers
    /// are woken with the same error. Idle connections are closed at once;
    /// outstanding leases get `shutdown_grace` to come back. Leases returned
    /// later are destroyed on return.
    pub async fn shutdown(&self) -> ShutdownReport {
        let inner = &*self.inner;
        inner.closed.store(true, Ordering::Release);
        inner.permits.close();

        let drained: Vec<_> = {
            let mut state = inner.lock();
            let drained: Vec<_> = state.idle.drain(..).collect();
            state.pooled_open -= drained.len();
            drained
        };
        let drained_count = drained.len();
        for slot in drained {
            inner.destroy(slot, DiscardReason::Shutdown);
        }

        let deadline = Instant::now() + inner.config.shutdown_grace;
        loop {
            let mut returned = pin!(inner.returned.notified());
            returned.as_mut().enable();
            if inner.in_use() == 0 {
                break;
            }
            if tokio::time::timeout_at(deadline, returned).await.is_err() {
                break;
            }
        }

        let outstanding = inner.in_use();

        #[cfg(feature = "tracing")]
        {
            if outstanding == 0 {
                tracing::info!(pool = %inner.config.name, drained = drained_count, "pool shut down");
            } else {
                tracing::warn!(
                    pool = %inner.config.name,
                    outstanding,
                    "pool shut down with leases still outstanding"
                );
            }
        }

        inner.emit(PoolEvent::ShutdownCompleted {
            pool_name: inner.config.name.clone(),
            timestamp: std::time::Instant::now(),
            outstanding,
        });

        ShutdownReport {
            drained: drained_count,
            outstanding,
        }
    }

    /// Spawns a task that recycles stale idle connections every
    /// `health_check_interval`.
    ///
    /// The task holds no strong reference to the pool and ends once the
    /// pool is dropped or shut down. Must be called within a Tokio runtime.
    pub fn spawn_maintenance(&self) -> MaintenanceHandle {
        let pool: Weak<PoolInner<M>> = Arc::downgrade(&self.inner);
        let period = self.inner.config.health_check_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(inner) = pool.upgrade() else {
                    break;
                };
                if inner.is_closed() {
                    break;
                }
                let _recycled = inner.recycle();

                #[cfg(feature = "tracing")]
                {
                    if _recycled > 0 {
                        tracing::debug!(pool = %inner.config.name, recycled = _recycled, "recycled stale connections");
                    }
                }
            }
        });

        MaintenanceHandle { handle }
    }
}

impl<M: ManageConnection> fmt::Debug for ConnectionPool<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("name", &self.inner.config.name)
            .field("closed", &self.is_closed())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Handle to the task started by [`ConnectionPool::spawn_maintenance`].
///
/// Dropping the handle stops the task.
#[derive(Debug)]
pub struct MaintenanceHandle {
    handle: JoinHandle<()>,
}

impl MaintenanceHandle {
    /// Stops the maintenance task.
    pub fn stop(self) {
        self.handle.abort();
    }

    /// Returns true if the task has ended.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for MaintenanceHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
