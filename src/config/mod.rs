//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{collections::BTreeMap, num::NonZeroUsize, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::CacheIdentifierGenerator;
use crate::cache::identifier::DEFAULT_KEY_PREFIX;

mod cli;

pub use cli::{CliArgs, Command, GlobalOverrides, IdentifierArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "persistence-cache";
const ENV_PREFIX: &str = "PCACHE";
const DEFAULT_SHARED_LIMIT: usize = 10_000;
const DEFAULT_IN_MEMORY_LIMIT: usize = 100;
const DEFAULT_IN_MEMORY_TTL_MS: u64 = 3_000;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub key_prefix: String,
    pub shared_limit: NonZeroUsize,
    pub default_ttl: Option<Duration>,
    pub enable_in_memory: bool,
    pub in_memory_limit: NonZeroUsize,
    pub in_memory_ttl: Duration,
    pub single_flight: bool,
    pub tag_patterns: BTreeMap<String, String>,
    pub key_patterns: BTreeMap<String, String>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(prefix) = overrides.key_prefix.as_ref() {
            self.cache.key_prefix = Some(prefix.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings { logging, cache } = raw;

        let logging = build_logging_settings(logging)?;
        let cache = build_cache_settings(cache)?;

        Ok(Self { logging, cache })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let key_prefix = cache
        .key_prefix
        .unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string());
    if key_prefix.trim().is_empty() {
        return Err(LoadError::invalid(
            "cache.key_prefix",
            "prefix must not be empty",
        ));
    }

    let shared_limit = non_zero_usize(
        cache.shared_limit.unwrap_or(DEFAULT_SHARED_LIMIT as u64),
        "cache.shared_limit",
    )?;
    let in_memory_limit = non_zero_usize(
        cache.in_memory_limit.unwrap_or(DEFAULT_IN_MEMORY_LIMIT as u64),
        "cache.in_memory_limit",
    )?;

    let default_ttl = match cache.default_ttl_seconds {
        Some(0) => {
            return Err(LoadError::invalid(
                "cache.default_ttl_seconds",
                "must be greater than zero when set",
            ));
        }
        Some(seconds) => Some(Duration::from_secs(seconds)),
        None => None,
    };

    let in_memory_ttl_ms = cache.in_memory_ttl_ms.unwrap_or(DEFAULT_IN_MEMORY_TTL_MS);
    if in_memory_ttl_ms == 0 {
        return Err(LoadError::invalid(
            "cache.in_memory_ttl_ms",
            "must be greater than zero",
        ));
    }

    CacheIdentifierGenerator::with_overrides(
        key_prefix.clone(),
        &cache.tag_patterns,
        &cache.key_patterns,
    )
    .map_err(|err| LoadError::invalid("cache.patterns", err.to_string()))?;

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        key_prefix,
        shared_limit,
        default_ttl,
        enable_in_memory: cache.in_memory.unwrap_or(true),
        in_memory_limit,
        in_memory_ttl: Duration::from_millis(in_memory_ttl_ms),
        single_flight: cache.single_flight.unwrap_or(false),
        tag_patterns: cache.tag_patterns,
        key_patterns: cache.key_patterns,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    key_prefix: Option<String>,
    shared_limit: Option<u64>,
    default_ttl_seconds: Option<u64>,
    in_memory: Option<bool>,
    in_memory_limit: Option<u64>,
    in_memory_ttl_ms: Option<u64>,
    single_flight: Option<bool>,
    tag_patterns: BTreeMap<String, String>,
    key_patterns: BTreeMap<String, String>,
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    let value_usize: usize = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for usize"))?;
    NonZeroUsize::new(value_usize).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}
