//! Typed settings for the whole access layer.
//!
//! Settings are plain data: deserialise them from whatever the host
//! application reads (a config file, environment-derived maps, a test
//! literal), then call [`AccessSettings::validate`] once to obtain the
//! component configurations. Durations are expressed in milliseconds, TTLs
//! in seconds.
//!
//! ```
//! use depot::settings::AccessSettings;
//!
//! let settings: AccessSettings = serde_json::from_str(
//!     r#"{
//!         "relational": { "capacity": 4, "max_overflow": 2, "acquire_timeout_ms": 250 },
//!         "retry": { "max_attempts": 5 },
//!         "namespaces": [{ "name": "file", "ttl_seconds": 60 }]
//!     }"#,
//! )
//! .unwrap();
//!
//! let config = settings.validate().unwrap();
//! assert_eq!(config.relational.max_size(), 6);
//! assert_eq!(config.cache.name(), "cache");
//! ```

use depot_cache::NamespaceTable;
use depot_core::{ConfigError, ErrorKind};
use depot_healthcheck::HealthCheckConfig;
use depot_pool::PoolConfig;
use depot_retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for one connection pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    pub name: String,
    pub capacity: usize,
    pub max_overflow: usize,
    pub acquire_timeout_ms: u64,
    pub idle_recycle_after_ms: u64,
    pub validate_on_acquire: bool,
    pub health_check_interval_ms: u64,
    pub shutdown_grace_ms: u64,
}

impl PoolSettings {
    /// Defaults for a pool called `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Validates the settings into a [`PoolConfig`].
    pub fn into_config(self) -> Result<PoolConfig, ConfigError> {
        PoolConfig::builder()
            .name(self.name)
            .capacity(self.capacity)
            .max_overflow(self.max_overflow)
            .acquire_timeout(Duration::from_millis(self.acquire_timeout_ms))
            .idle_recycle_after(Duration::from_millis(self.idle_recycle_after_ms))
            .validate_on_acquire(self.validate_on_acquire)
            .health_check_interval(Duration::from_millis(self.health_check_interval_ms))
            .shutdown_grace(Duration::from_millis(self.shutdown_grace_ms))
            .build()
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            name: "pool".to_string(),
            capacity: 10,
            max_overflow: 20,
            acquire_timeout_ms: 30_000,
            idle_recycle_after_ms: 3_600_000,
            validate_on_acquire: true,
            health_check_interval_ms: 30_000,
            shutdown_grace_ms: 5_000,
        }
    }
}

/// Settings for the retry policy shared by both pools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub max_delay_ms: Option<u64>,
    pub retryable: Vec<ErrorKind>,
}

impl RetrySettings {
    /// Validates the settings into a [`RetryPolicy`].
    pub fn into_policy(self) -> Result<RetryPolicy, ConfigError> {
        let mut builder = RetryPolicy::builder()
            .max_attempts(self.max_attempts)
            .base_delay(Duration::from_millis(self.base_delay_ms))
            .backoff_multiplier(self.backoff_multiplier)
            .retryable_kinds(self.retryable);
        if let Some(max_delay_ms) = self.max_delay_ms {
            builder = builder.max_delay(Duration::from_millis(max_delay_ms));
        }
        builder.build()
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            backoff_multiplier: 2.0,
            max_delay_ms: None,
            retryable: vec![ErrorKind::Connection, ErrorKind::Timeout],
        }
    }
}

/// One cache namespace and the TTL of its entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamespaceSettings {
    pub name: String,
    pub ttl_seconds: u64,
}

/// Settings for the health monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HealthSettings {
    pub interval_ms: u64,
    pub timeout_ms: u64,
    pub degraded_threshold_ms: u64,
}

impl HealthSettings {
    /// Validates the settings into a [`HealthCheckConfig`].
    pub fn into_config(self) -> Result<HealthCheckConfig, ConfigError> {
        HealthCheckConfig::builder()
            .interval(Duration::from_millis(self.interval_ms))
            .timeout(Duration::from_millis(self.timeout_ms))
            .degraded_threshold(Duration::from_millis(self.degraded_threshold_ms))
            .build()
    }
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            interval_ms: 30_000,
            timeout_ms: 2_000,
            degraded_threshold_ms: 500,
        }
    }
}

/// Settings for the whole access layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessSettings {
    pub relational: PoolSettings,
    pub cache: PoolSettings,
    pub retry: RetrySettings,
    pub namespaces: Vec<NamespaceSettings>,
    pub health: HealthSettings,
}

impl Default for AccessSettings {
    fn default() -> Self {
        let namespaces = NamespaceTable::storage_defaults();
        let mut namespaces: Vec<_> = namespaces
            .iter()
            .map(|policy| NamespaceSettings {
                name: policy.namespace().to_string(),
                ttl_seconds: policy.ttl_seconds(),
            })
            .collect();
        namespaces.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            relational: PoolSettings::named("relational"),
            cache: PoolSettings::named("cache"),
            retry: RetrySettings::default(),
            namespaces,
            health: HealthSettings::default(),
        }
    }
}

impl AccessSettings {
    /// Validates every section and builds the component configurations.
    ///
    /// The first invalid field is reported.
    pub fn validate(self) -> Result<AccessConfig, ConfigError> {
        let mut table = NamespaceTable::new();
        for namespace in self.namespaces {
            if table.contains(&namespace.name) {
                return Err(ConfigError::new(
                    "namespaces",
                    format!("`{}` is defined twice", namespace.name),
                ));
            }
            table = table.define(&namespace.name, namespace.ttl_seconds)?;
        }

        Ok(AccessConfig {
            relational: self.relational.into_config()?,
            cache: self.cache.into_config()?,
            retry: self.retry.into_policy()?,
            namespaces: table,
            health: self.health.into_config()?,
        })
    }
}

/// Validated configuration produced by [`AccessSettings::validate`].
#[derive(Debug, Clone)]
pub struct AccessConfig {
    pub relational: PoolConfig,
    pub cache: PoolConfig,
    pub retry: RetryPolicy,
    pub namespaces: NamespaceTable,
    pub health: HealthCheckConfig,
}
