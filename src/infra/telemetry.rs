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

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "vitrine_publish_accepted_total",
            Unit::Count,
            "Total number of ads published or republished."
        );
        describe_counter!(
            "vitrine_publish_rejected_total",
            Unit::Count,
            "Total number of publish requests rejected, labelled by reason."
        );
        describe_counter!(
            "vitrine_unpublish_total",
            Unit::Count,
            "Total number of ads deactivated by their owner."
        );
        describe_histogram!(
            "vitrine_publish_quote_tokens",
            Unit::Count,
            "Quoted token total of each accepted publish."
        );
        describe_histogram!(
            "vitrine_publish_tx_ms",
            Unit::Milliseconds,
            "Publish transaction latency in milliseconds."
        );
    });
}
