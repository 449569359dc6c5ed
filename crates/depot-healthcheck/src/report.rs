use crate::HealthStatus;
use depot_pool::PoolStats;
use serde::Serialize;
use std::time::{Duration, SystemTime};

/// Result of probing one target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetHealth {
    /// Target name.
    pub name: String,
    /// Outcome of the probe.
    pub status: HealthStatus,
    /// Time the probe took, or the timeout if it did not finish.
    pub latency: Duration,
    /// Why the probe failed or the target was degraded.
    pub error: Option<String>,
    /// Pool counters at the end of the probe.
    pub pool_stats: Option<PoolStats>,
}

/// Result of probing every target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    /// Worst target status, or `Unknown` with no targets.
    pub status: HealthStatus,
    /// When the check started.
    pub checked_at: SystemTime,
    /// Per-target results, in registration order.
    pub targets: Vec<TargetHealth>,
}

impl HealthReport {
    pub(crate) fn new(checked_at: SystemTime, targets: Vec<TargetHealth>) -> Self {
        let status = targets
            .iter()
            .map(|target| target.status)
            .reduce(HealthStatus::worst)
            .unwrap_or(HealthStatus::Unknown);
        Self {
            status,
            checked_at,
            targets,
        }
    }

    /// The result for the target named `name`.
    pub fn target(&self, name: &str) -> Option<&TargetHealth> {
        self.targets.iter().find(|target| target.name == name)
    }

    /// Returns true if every target is healthy.
    pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }

    /// Targets whose probe failed or timed out.
    pub fn unhealthy_targets(&self) -> impl Iterator<Item = &TargetHealth> {
        self.targets
            .iter()
            .filter(|target| target.status == HealthStatus::Unhealthy)
    }
}
