//! Health monitoring for pooled resources.
//!
//! A [`HealthMonitor`] probes every registered target concurrently, each
//! probe bounded by a timeout, and aggregates the results into a
//! [`HealthReport`] whose status is the worst target status. It can run on
//! demand with [`HealthMonitor::check`] or periodically in the background.
//!
//! Probe failures are data, not errors: the monitor never fails or panics
//! because a target is down.
//!
//! # Examples
//!
//! ```no_run
//! use depot_healthcheck::{HealthCheckConfig, HealthMonitor, PoolProbe};
//! use depot_pool::{ConnectionPool, ManageConnection};
//! use std::time::Duration;
//!
//! async fn diagnostics<M: ManageConnection>(pool: ConnectionPool<M>) {
//!     let monitor = HealthMonitor::new(
//!         HealthCheckConfig::builder()
//!             .timeout(Duration::from_secs(1))
//!             .build()
//!             .unwrap(),
//!     );
//!     monitor.register(PoolProbe::named("relational", pool));
//!
//!     let report = monitor.check().await;
//!     println!("{:?}: {} targets", report.status, report.targets.len());
//! }
//! ```

mod config;
mod events;
mod monitor;
mod probe;
mod report;

pub use config::{HealthCheckConfig, HealthCheckConfigBuilder};
pub use events::HealthEvent;
pub use monitor::HealthMonitor;
pub use probe::{PoolProbe, Probe, ProbeError};
pub use report::{HealthReport, TargetHealth};

use serde::Serialize;
use std::fmt;

/// Health status of a monitored target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// The probe succeeded within the degraded threshold.
    Healthy,
    /// The probe succeeded but was slow.
    Degraded,
    /// The probe failed or timed out.
    Unhealthy,
    /// Not checked yet.
    Unknown,
}

impl HealthStatus {
    /// Check if the status indicates the target is usable (Healthy or Degraded).
    pub fn is_usable(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded)
    }

    /// Check if the status indicates the target is healthy.
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    /// The more severe of two statuses.
    pub fn worst(self, other: HealthStatus) -> HealthStatus {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
            HealthStatus::Unknown => "unknown",
        }
    }

    fn severity(self) -> u8 {
        match self {
            HealthStatus::Healthy => 0,
            HealthStatus::Degraded => 1,
            HealthStatus::Unknown => 2,
            HealthStatus::Unhealthy => 3,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
