//! Health monitor tests against pooled chaos backends.
//!
//! Test organization:
//! - probes.rs: per-target status from pool probes
//! - monitor.rs: transitions and the background checker


use depot_healthcheck::{HealthCheckConfig, HealthCheckConfigBuilder};
use depot_pool::{ConnectionPool, ManageConnection, PoolConfig};
use std::time::Duration;

pub(crate) fn pool<M: ManageConnection>(name: &str, manager: M) -> ConnectionPool<M> {
    let config = PoolConfig::builder()
        .name(name)
        .capacity(1)
        .max_overflow(0)
        .acquire_timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    ConnectionPool::new(manager, config)
}

/// 1s interval, 2s probe timeout, 500ms degraded threshold.
pub(crate) fn config() -> HealthCheckConfigBuilder {
    HealthCheckConfig::builder()
        .name("storage")
        .interval(Duration::from_secs(1))
        .timeout(Duration::from_secs(2))
        .degraded_threshold(Duration::from_millis(500))
}
