//! Namespaces, their TTL policies and key resolution.

use crate::error::CacheError;
use depot_core::ConfigError;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// File metadata, keyed by file id.
pub const FILE: &str = "file";
/// Sessions, keyed by user id.
pub const SESSION: &str = "session";
/// Upload progress, keyed by upload id.
pub const UPLOAD: &str = "upload";
/// Issued API key lookups, keyed by key id.
pub const APIKEY: &str = "apikey";

const STORAGE_DEFAULTS: [(&str, u64); 4] = [
    (FILE, 3600),
    (SESSION, 86_400),
    (UPLOAD, 300),
    (APIKEY, 600),
];

/// A key prefix grouping related cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(String);

impl Namespace {
    /// Creates a namespace. The prefix must be non-empty and contain no `:`.
    pub fn new(prefix: impl Into<String>) -> Result<Self, ConfigError> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(ConfigError::new("namespace", "must not be empty"));
        }
        if prefix.contains(':') {
            return Err(ConfigError::new(
                "namespace",
                format!("`{prefix}` must not contain ':'"),
            ));
        }
        Ok(Self(prefix))
    }

    /// The prefix.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key for `id` in this namespace.
    pub fn key(&self, id: &str) -> CacheKey {
        CacheKey(format!("{}:{}", self.0, id))
    }

    /// Prefix matching every key of this namespace.
    pub(crate) fn key_prefix(&self) -> String {
        format!("{}:", self.0)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully resolved key, `"{prefix}:{id}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// The key as sent to the store.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace part of the key.
    pub fn namespace(&self) -> &str {
        self.0.split_once(':').map_or(&self.0, |(prefix, _)| prefix)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Expiry applied to every entry written to one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlPolicy {
    namespace: Namespace,
    ttl_seconds: u64,
}

impl TtlPolicy {
    /// Creates a policy. `ttl_seconds` must be greater than zero.
    pub fn new(namespace: Namespace, ttl_seconds: u64) -> Result<Self, ConfigError> {
        if ttl_seconds == 0 {
            return Err(ConfigError::new("ttl_seconds", "must be greater than zero"));
        }
        Ok(Self {
            namespace,
            ttl_seconds,
        })
    }

    /// The namespace this policy applies to.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Expiry in whole seconds.
    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Expiry as a duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// The registered namespaces. Keys can only be built for these.
#[derive(Debug, Clone, Default)]
pub struct NamespaceTable {
    policies: HashMap<String, TtlPolicy>,
}

impl NamespaceTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The namespaces used by the storage service: `file` (1 hour),
    /// `session` (1 day), `upload` (5 minutes) and `apikey` (10 minutes).
    pub fn storage_defaults() -> Self {
        let mut table = Self::new();
        for (name, ttl_seconds) in STORAGE_DEFAULTS {
            table.policies.insert(
                name.to_string(),
                TtlPolicy {
                    namespace: Namespace(name.to_string()),
                    ttl_seconds,
                },
            );
        }
        table
    }

    /// Registers `policy`, replacing any policy for the same namespace.
    pub fn register(&mut self, policy: TtlPolicy) -> &mut Self {
        self.policies
            .insert(policy.namespace.as_str().to_string(), policy);
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, policy: TtlPolicy) -> Self {
        self.register(policy);
        self
    }

    /// Registers `namespace` with a TTL in seconds.
    pub fn define(self, namespace: &str, ttl_seconds: u64) -> Result<Self, ConfigError> {
        let policy = TtlPolicy::new(Namespace::new(namespace)?, ttl_seconds)?;
        Ok(self.with(policy))
    }

    /// The policy for `namespace`, if registered.
    pub fn policy(&self, namespace: &str) -> Option<&TtlPolicy> {
        self.policies.get(namespace)
    }

    /// Returns true if `namespace` is registered.
    pub fn contains(&self, namespace: &str) -> bool {
        self.policies.contains_key(namespace)
    }

    /// Number of registered namespaces.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// The registered policies, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &TtlPolicy> {
        self.policies.values()
    }

    /// Resolves `id` in `namespace` to a key and its expiry.
    pub fn resolve(&self, namespace: &str, id: &str) -> Result<(CacheKey, Duration), CacheError> {
        let policy = self.lookup(namespace)?;
        Ok((policy.namespace.key(id), policy.ttl()))
    }

    pub(crate) fn lookup(&self, namespace: &str) -> Result<&TtlPolicy, CacheError> {
        self.policies
            .get(namespace)
            .ok_or_else(|| CacheError::UnknownNamespace(namespace.to_string()))
    }
}
