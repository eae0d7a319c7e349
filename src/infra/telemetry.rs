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
            "lireddit_graphql_requests_total",
            Unit::Count,
            "Total number of GraphQL requests served."
        );
        describe_counter!(
            "lireddit_graphql_errors_total",
            Unit::Count,
            "Total number of GraphQL responses carrying errors."
        );
        describe_histogram!(
            "lireddit_graphql_request_ms",
            Unit::Milliseconds,
            "GraphQL request execution latency in milliseconds."
        );
        describe_counter!(
            "lireddit_votes_total",
            Unit::Count,
            "Total number of votes that changed a post's points."
        );
        describe_counter!(
            "lireddit_sessions_issued_total",
            Unit::Count,
            "Total number of sessions issued on login or register."
        );
    });
}

pub const GRAPHQL_REQUESTS_TOTAL: &str = "lireddit_graphql_requests_total";
pub const GRAPHQL_ERRORS_TOTAL: &str = "lireddit_graphql_errors_total";
pub const GRAPHQL_REQUEST_MS: &str = "lireddit_graphql_request_ms";
pub const VOTES_TOTAL: &str = "lireddit_votes_total";
pub const SESSIONS_ISSUED_TOTAL: &str = "lireddit_sessions_issued_total";
