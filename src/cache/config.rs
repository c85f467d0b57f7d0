//! Cache configuration.
//!
//! Runtime view of the `[cache]` settings section.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

use super::identifier::{CacheIdentifierGenerator, DEFAULT_KEY_PREFIX, PatternError};

// Default values for cache configuration
const DEFAULT_SHARED_LIMIT: usize = 10_000;
const DEFAULT_IN_MEMORY_LIMIT: usize = 100;
const DEFAULT_IN_MEMORY_TTL_MS: u64 = 3_000;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Decorate inner handlers with cache handlers at all.
    pub enabled: bool,
    /// Prefix prepended to every cache key.
    pub key_prefix: String,
    /// Maximum entries in the process-wide shared store.
    pub shared_limit: usize,
    /// Expiry for shared entries; `None` keeps them until invalidated.
    pub default_ttl_seconds: Option<u64>,
    /// Enable the short-lived request-local layer in front of the shared store.
    pub enable_in_memory: bool,
    /// Maximum entries in the request-local layer.
    pub in_memory_limit: usize,
    /// Lifetime (ms) of request-local entries.
    pub in_memory_ttl_ms: u64,
    /// Collapse concurrent misses on one key into a single inner call.
    pub single_flight: bool,
    /// Tag pattern overrides keyed by semantic type name.
    pub tag_patterns: BTreeMap<String, String>,
    /// Key pattern overrides keyed by semantic type name.
    pub key_patterns: BTreeMap<String, String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            shared_limit: DEFAULT_SHARED_LIMIT,
            default_ttl_seconds: None,
            enable_in_memory: true,
            in_memory_limit: DEFAULT_IN_MEMORY_LIMIT,
            in_memory_ttl_ms: DEFAULT_IN_MEMORY_TTL_MS,
            single_flight: false,
            tag_patterns: BTreeMap::new(),
            key_patterns: BTreeMap::new(),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            key_prefix: settings.key_prefix.clone(),
            shared_limit: settings.shared_limit.get(),
            default_ttl_seconds: settings.default_ttl.map(|ttl| ttl.as_secs()),
            enable_in_memory: settings.enable_in_memory,
            in_memory_limit: settings.in_memory_limit.get(),
            in_memory_ttl_ms: u64::try_from(settings.in_memory_ttl.as_millis())
                .unwrap_or(u64::MAX),
            single_flight: settings.single_flight,
            tag_patterns: settings.tag_patterns.clone(),
            key_patterns: settings.key_patterns.clone(),
        }
    }
}

impl CacheConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the shared store limit as NonZeroUsize, clamping to 1 if zero.
    pub fn shared_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.shared_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns the request-local limit as NonZeroUsize, clamping to 1 if zero.
    pub fn in_memory_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.in_memory_limit).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl_seconds.map(Duration::from_secs)
    }

    pub fn in_memory_ttl(&self) -> Duration {
        Duration::from_millis(self.in_memory_ttl_ms)
    }

    pub fn identifier_generator(&self) -> Result<CacheIdentifierGenerator, PatternError> {
        CacheIdentifierGenerator::with_overrides(
            self.key_prefix.clone(),
            &self.tag_patterns,
            &self.key_patterns,
        )
    }
}
