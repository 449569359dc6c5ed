//! Error and latency injection.

use crate::events::ChaosEvent;
use depot_core::events::{EventListener, EventListeners, FnListener};
use depot_core::{AccessError, ErrorKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// What a [`FaultInjector`] injects.
#[derive(Clone)]
pub struct FaultConfig {
    pub(crate) name: String,
    pub(crate) error_rate: f64,
    pub(crate) error_kind: ErrorKind,
    pub(crate) latency_rate: f64,
    pub(crate) min_latency: Duration,
    pub(crate) max_latency: Duration,
    pub(crate) seed: Option<u64>,
    pub(crate) event_listeners: EventListeners<ChaosEvent>,
}

impl FaultConfig {
    /// Create a new builder for fault configuration.
    pub fn builder() -> FaultConfigBuilder {
        FaultConfigBuilder::new()
    }

    /// Name reported in events.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Probability that an operation fails.
    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    /// Probability that an operation is delayed.
    pub fn latency_rate(&self) -> f64 {
        self.latency_rate
    }

    fn create_rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl Default for FaultConfig {
    fn default() -> Self {
        FaultConfigBuilder::new().build()
    }
}

impl fmt::Debug for FaultConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultConfig")
            .field("name", &self.name)
            .field("error_rate", &self.error_rate)
            .field("error_kind", &self.error_kind)
            .field("latency_rate", &self.latency_rate)
            .field("min_latency", &self.min_latency)
            .field("max_latency", &self.max_latency)
            .field("seed", &self.seed)
            .finish()
    }
}

/// Builder for [`FaultConfig`].
pub struct FaultConfigBuilder {
    name: String,
    error_rate: f64,
    error_kind: ErrorKind,
    latency_rate: f64,
    min_latency: Duration,
    max_latency: Duration,
    seed: Option<u64>,
    event_listeners: EventListeners<ChaosEvent>,
}

impl FaultConfigBuilder {
    /// Create a new builder that injects nothing.
    pub fn new() -> Self {
        Self {
            name: "chaos".to_string(),
            error_rate: 0.0,
            error_kind: ErrorKind::Connection,
            latency_rate: 0.0,
            min_latency: Duration::from_millis(10),
            max_latency: Duration::from_millis(100),
            seed: None,
            event_listeners: EventListeners::new(),
        }
    }

    /// Set the name reported in events.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the error injection rate (0.0 - 1.0).
    pub fn error_rate(mut self, rate: f64) -> Self {
        self.error_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Set the kind of injected errors.
    ///
    /// Default: [`ErrorKind::Connection`]
    pub fn error_kind(mut self, kind: ErrorKind) -> Self {
        self.error_kind = kind;
        self
    }

    /// Set the latency injection rate (0.0 - 1.0).
    pub fn latency_rate(mut self, rate: f64) -> Self {
        self.latency_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Set the range injected delays are drawn from.
    ///
    /// Default: 10ms to 100ms
    pub fn latency(mut self, min: Duration, max: Duration) -> Self {
        self.min_latency = min;
        self.max_latency = max.max(min);
        self
    }

    /// Set a seed for deterministic injection.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Registers a listener for every chaos event.
    pub fn listener<L>(mut self, listener: L) -> Self
    where
        L: EventListener<ChaosEvent> + 'static,
    {
        self.event_listeners.add(listener);
        self
    }

    /// Registers a callback invoked when an error is injected.
    pub fn on_error_injected<F>(mut self, f: F) -> Self
    where
        F: Fn(&'static str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ChaosEvent::ErrorInjected { operation, .. } = event {
                f(operation);
            }
        }));
        self
    }

    /// Registers a callback invoked when latency is injected.
    pub fn on_latency_injected<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ChaosEvent::LatencyInjected { delay, .. } = event {
                f(*delay);
            }
        }));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> FaultConfig {
        FaultConfig {
            name: self.name,
            error_rate: self.error_rate,
            error_kind: self.error_kind,
            latency_rate: self.latency_rate,
            min_latency: self.min_latency,
            max_latency: self.max_latency,
            seed: self.seed,
            event_listeners: self.event_listeners,
        }
    }
}

impl Default for FaultConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct State {
    config: FaultConfig,
    rng: Mutex<StdRng>,
    outage: AtomicBool,
    scheduled: AtomicUsize,
    injected: AtomicU64,
}

/// Decides, per backend operation, whether to fail or delay it.
///
/// Besides random injection, faults can be scripted: [`fail_next`](Self::fail_next)
/// fails the next operations deterministically, and
/// [`set_outage`](Self::set_outage) fails everything until cleared.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct FaultInjector {
    state: Arc<State>,
}

impl FaultInjector {
    /// An injector driven by `config`.
    pub fn new(config: FaultConfig) -> Self {
        let rng = config.create_rng();
        Self {
            state: Arc::new(State {
                config,
                rng: Mutex::new(rng),
                outage: AtomicBool::new(false),
                scheduled: AtomicUsize::new(0),
                injected: AtomicU64::new(0),
            }),
        }
    }

    /// An injector that never injects unless scripted.
    pub fn none() -> Self {
        Self::new(FaultConfig::default())
    }

    /// The configuration.
    pub fn config(&self) -> &FaultConfig {
        &self.state.config
    }

    /// Fails the next `count` operations.
    pub fn fail_next(&self, count: usize) {
        self.state.scheduled.store(count, Ordering::SeqCst);
    }

    /// Fails every operation while `down` is true.
    pub fn set_outage(&self, down: bool) {
        self.state.outage.store(down, Ordering::SeqCst);
    }

    /// Returns true during an outage.
    pub fn is_down(&self) -> bool {
        self.state.outage.load(Ordering::SeqCst)
    }

    /// Total number of errors injected so far.
    pub fn injected_errors(&self) -> u64 {
        self.state.injected.load(Ordering::SeqCst)
    }

    /// Applies chaos to one `operation`: may sleep, may fail.
    pub async fn inject(&self, operation: &'static str) -> Result<(), AccessError> {
        let state = &self.state;
        let config = &state.config;

        let scheduled = state
            .scheduled
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();

        let (fail, delay) = if scheduled || state.outage.load(Ordering::SeqCst) {
            (true, None)
        } else {
            self.roll()
        };

        if fail {
            state.injected.fetch_add(1, Ordering::SeqCst);

            #[cfg(feature = "tracing")]
            tracing::warn!(chaos = %config.name, operation, kind = %config.error_kind, "chaos: error injected");

            #[cfg(feature = "metrics")]
            metrics::counter!("depot_chaos_errors_injected_total", "chaos" => config.name.clone(), "operation" => operation)
                .increment(1);

            config.event_listeners.emit(&ChaosEvent::ErrorInjected {
                source: config.name.clone(),
                timestamp: Instant::now(),
                operation,
                kind: config.error_kind,
            });
            return Err(AccessError::new(
                config.error_kind,
                format!("injected fault during {operation}"),
            ));
        }

        if let Some(delay) = delay {
            #[cfg(feature = "tracing")]
            tracing::debug!(chaos = %config.name, operation, delay_ms = delay.as_millis() as u64, "chaos: latency injected");

            #[cfg(feature = "metrics")]
            metrics::histogram!("depot_chaos_injected_latency_seconds", "chaos" => config.name.clone())
                .record(delay.as_secs_f64());

            config.event_listeners.emit(&ChaosEvent::LatencyInjected {
                source: config.name.clone(),
                timestamp: Instant::now(),
                operation,
                delay,
            });
            tokio::time::sleep(delay).await;
        } else if !config.event_listeners.is_empty() {
            config.event_listeners.emit(&ChaosEvent::PassedThrough {
                source: config.name.clone(),
                timestamp: Instant::now(),
                operation,
            });
        }
        Ok(())
    }

    fn roll(&self) -> (bool, Option<Duration>) {
        let config = &self.state.config;
        if config.error_rate <= 0.0 && config.latency_rate <= 0.0 {
            return (false, None);
        }

        let mut rng = self
            .state
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if config.error_rate > 0.0 && rng.gen::<f64>() < config.error_rate {
            return (true, None);
        }
        if config.latency_rate > 0.0 && rng.gen::<f64>() < config.latency_rate {
            let min = config.min_latency.as_millis() as u64;
            let max = config.max_latency.as_millis() as u64;
            let delay = if max > min {
                rng.gen_range(min..=max)
            } else {
                min
            };
            return (false, Some(Duration::from_millis(delay)));
        }
        (false, None)
    }
}

impl Default for FaultInjector {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for FaultInjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultInjector")
            .field("config", &self.state.config)
            .field("down", &self.is_down())
            .field("injected", &self.injected_errors())
            .finish()
    }
}
