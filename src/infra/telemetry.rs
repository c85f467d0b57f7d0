use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register descriptions for every metric the cache layer emits.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "persistence_cache_hit_total",
            Unit::Count,
            "Total number of cache hits, labelled by handler operation."
        );
        describe_counter!(
            "persistence_cache_miss_total",
            Unit::Count,
            "Total number of cache misses, labelled by handler operation."
        );
        describe_counter!(
            "persistence_cache_store_error_total",
            Unit::Count,
            "Total number of failed cache store calls, labelled by store operation."
        );
        describe_counter!(
            "persistence_cache_invalidated_tags_total",
            Unit::Count,
            "Total number of tags sent to the store for invalidation."
        );
        describe_counter!(
            "persistence_cache_evict_total",
            Unit::Count,
            "Total number of in-memory entries evicted due to capacity."
        );
        describe_counter!(
            "persistence_cache_deferred_tags_total",
            Unit::Count,
            "Total number of tag invalidations deferred until transaction commit."
        );
        describe_histogram!(
            "persistence_cache_inner_call_ms",
            Unit::Milliseconds,
            "Latency of inner persistence handler calls in milliseconds."
        );
    });
}
