/// Point-in-time snapshot of a pool.
///
/// `in_use_count + idle_count <= capacity + overflow_count` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolStats {
    /// Steady-state size.
    pub capacity: usize,
    /// Additional connections allowed under load.
    pub max_overflow: usize,
    /// Connections currently leased out.
    pub in_use_count: usize,
    /// Connections waiting in the idle set.
    pub idle_count: usize,
    /// Overflow connections currently open.
    pub overflow_count: usize,
    /// Connections opened since the pool was created.
    pub total_created: u64,
    /// Connections destroyed because they were stale, broken or failed validation.
    pub total_invalidated: u64,
    /// Callers currently waiting for a lease.
    pub waiting: usize,
}

impl PoolStats {
    /// Open connections, leased or idle.
    pub fn open_count(&self) -> usize {
        self.in_use_count + self.idle_count
    }

    /// Upper bound on simultaneously open connections.
    pub fn max_size(&self) -> usize {
        self.capacity + self.max_overflow
    }

    /// Fraction of `max_size` currently leased, in `0.0..=1.0`.
    pub fn utilization(&self) -> f64 {
        match self.max_size() {
            0 => 0.0,
            max => self.in_use_count as f64 / max as f64,
        }
    }
}
