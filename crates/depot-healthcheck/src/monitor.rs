use crate::config::HealthCheckConfig;
use crate::events::HealthEvent;
use crate::probe::{Probe, ProbeError};
use crate::report::{HealthReport, TargetHealth};
use crate::HealthStatus;
use futures::future::join_all;
use futures::FutureExt;
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Instant, SystemTime};
use tokio::task::JoinHandle;

#[cfg(feature = "metrics")]
use metrics::{describe_gauge, describe_histogram, gauge, histogram};
#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

struct Inner {
    config: HealthCheckConfig,
    probes: RwLock<Vec<Arc<dyn Probe>>>,
    statuses: Mutex<HashMap<String, HealthStatus>>,
    last_report: Mutex<Option<HealthReport>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Inner {
    async fn check(&self) -> HealthReport {
        let probes: Vec<Arc<dyn Probe>> = self
            .probes
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();

        let checked_at = SystemTime::now();
        let started = Instant::now();
        let targets = join_all(probes.iter().map(|probe| self.check_one(probe.as_ref()))).await;
        let report = HealthReport::new(checked_at, targets);

        self.record_transitions(&report);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            monitor = %self.config.name,
            status = %report.status,
            targets = report.targets.len(),
            "health check completed"
        );

        self.config
            .event_listeners
            .emit(&HealthEvent::CheckCompleted {
                source: self.config.name.clone(),
                timestamp: Instant::now(),
                status: report.status,
                duration: started.elapsed(),
            });

        *lock(&self.last_report) = Some(report.clone());
        report
    }

    async fn check_one(&self, probe: &dyn Probe) -> TargetHealth {
        let timeout = self.config.timeout;
        let started = tokio::time::Instant::now();
        let outcome = tokio::time::timeout(timeout, AssertUnwindSafe(probe.probe()).catch_unwind()).await;
        let latency = started.elapsed();

        let (status, error) = match outcome {
            Ok(Ok(Ok(()))) if latency > self.config.degraded_threshold => {
                (HealthStatus::Degraded, None)
            }
            Ok(Ok(Ok(()))) => (HealthStatus::Healthy, None),
            Ok(Ok(Err(ProbeError::Busy(note)))) => (HealthStatus::Degraded, Some(note)),
            Ok(Ok(Err(ProbeError::Failed(message)))) => (HealthStatus::Unhealthy, Some(message)),
            Ok(Err(_)) => (HealthStatus::Unhealthy, Some("probe panicked".to_string())),
            Err(_) => (
                HealthStatus::Unhealthy,
                Some(format!("probe timed out after {timeout:?}")),
            ),
        };

        #[cfg(feature = "metrics")]
        histogram!("depot_health_probe_duration_seconds", "target" => probe.name().to_string())
            .record(latency.as_secs_f64());

        TargetHealth {
            name: probe.name().to_string(),
            status,
            latency,
            error,
            pool_stats: probe.pool_stats(),
        }
    }

    fn record_transitions(&self, report: &HealthReport) {
        let mut changes = Vec::new();
        {
            let mut statuses = lock(&self.statuses);
            for target in &report.targets {
                let previous = statuses
                    .insert(target.name.clone(), target.status)
                    .unwrap_or(HealthStatus::Unknown);
                if previous != target.status {
                    changes.push((target.name.clone(), previous, target.status));
                }
            }
        }

        #[cfg(feature = "metrics")]
        for target in &report.targets {
            gauge!("depot_health_status", "target" => target.name.clone())
                .set(f64::from(u8::from(target.status.is_usable())));
        }

        for (target, from, to) in changes {
            #[cfg(feature = "tracing")]
            {
                if to == HealthStatus::Unhealthy {
                    tracing::warn!(monitor = %self.config.name, %target, %from, %to, "target became unhealthy");
                } else {
                    tracing::info!(monitor = %self.config.name, %target, %from, %to, "target status changed");
                }
            }

            self.config.event_listeners.emit(&HealthEvent::StatusChanged {
                source: self.config.name.clone(),
                timestamp: Instant::now(),
                target,
                from,
                to,
            });
        }
    }
}

/// Probes registered targets on demand or periodically.
///
/// Dropping the monitor stops the background checker.
pub struct HealthMonitor {
    inner: Arc<Inner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl HealthMonitor {
    /// Creates a monitor with no targets.
    pub fn new(config: HealthCheckConfig) -> Self {
        #[cfg(feature = "metrics")]
        {
            METRICS_INIT.call_once(|| {
                describe_gauge!(
                    "depot_health_status",
                    "1 when the target is healthy or degraded, 0 otherwise"
                );
                describe_histogram!(
                    "depot_health_probe_duration_seconds",
                    "Latency of health probes"
                );
            });
        }

        Self {
            inner: Arc::new(Inner {
                config,
                probes: RwLock::new(Vec::new()),
                statuses: Mutex::new(HashMap::new()),
                last_report: Mutex::new(None),
            }),
            task: Mutex::new(None),
        }
    }

    /// The configuration.
    pub fn config(&self) -> &HealthCheckConfig {
        &self.inner.config
    }

    /// Adds a target. Takes effect from the next check.
    pub fn register<P: Probe + 'static>(&self, probe: P) {
        self.register_shared(Arc::new(probe));
    }

    /// Adds a target that is shared with other owners.
    pub fn register_shared(&self, probe: Arc<dyn Probe>) {
        self.inner
            .probes
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(probe);
    }

    /// Names of the registered targets.
    pub fn targets(&self) -> Vec<String> {
        self.inner
            .probes
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|probe| probe.name().to_string())
            .collect()
    }

    /// Probes every target concurrently and returns the report.
    ///
    /// A target is `Unhealthy` if its probe fails, panics or exceeds the
    /// timeout, and `Degraded` if it succeeds slower than the degraded
    /// threshold or has no free capacity for the probe. The overall status is the worst target status, or
    /// `Unknown` without targets.
    pub async fn check(&self) -> HealthReport {
        self.inner.check().await
    }

    /// Starts checking every `interval` in the background, beginning now.
    ///
    /// Does nothing if the checker is already running. Must be called
    /// within a Tokio runtime.
    pub fn start(&self) {
        let mut task = lock(&self.task);
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let inner = Arc::clone(&self.inner);
        *task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(inner.config.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                inner.check().await;
            }
        }));

        #[cfg(feature = "tracing")]
        tracing::debug!(
            monitor = %self.inner.config.name,
            interval = ?self.inner.config.interval,
            "health monitor started"
        );
    }

    /// Stops the background checker.
    pub fn stop(&self) {
        if let Some(handle) = lock(&self.task).take() {
            handle.abort();

            #[cfg(feature = "tracing")]
            tracing::debug!(monitor = %self.inner.config.name, "health monitor stopped");
        }
    }

    /// Returns true while the background checker runs.
    pub fn is_running(&self) -> bool {
        lock(&self.task)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// The most recent report, from either an on-demand or a background check.
    pub fn last_report(&self) -> Option<HealthReport> {
        lock(&self.inner.last_report).clone()
    }

    /// The status each target had at its last check.
    pub fn status_of(&self, target: &str) -> HealthStatus {
        lock(&self.inner.statuses)
            .get(target)
            .copied()
            .unwrap_or(HealthStatus::Unknown)
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.task).take() {
            handle.abort();
        }
    }
}

impl fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("config", &self.inner.config)
            .field("targets", &self.targets())
            .field("running", &self.is_running())
            .finish()
    }
}
