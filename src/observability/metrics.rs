//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Translate finalized measurements into `metrics` facade calls
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `operation.duration` (histogram, seconds): default timer, labelled by
//!   result, status_group, exception and every normalized tag
//! - any configured counter name (counter): one increment per operation
//!
//! # Design Decisions
//! - Labels are the context's normalized tags; nothing high-cardinality
//! - Contexts without outcome or duration are skipped, not guessed

use std::net::SocketAddr;

use metrics::{counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::measure::{keys, MetricKind, MetricsContext, DEFAULT_METRIC_NAME};
use crate::providers::{MetricsRecorder, NONE};

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    describe_histogram!(
        DEFAULT_METRIC_NAME,
        Unit::Seconds,
        "Duration of operations run through the executor"
    );
    tracing::info!(address = %addr, "Prometheus exporter listening");
    Ok(())
}

/// Records into whatever `metrics` recorder is installed globally.
#[derive(Debug, Clone, Copy, Default)]
pub struct FacadeMetricsRecorder;

impl MetricsRecorder for FacadeMetricsRecorder {
    fn record(&self, ctx: MetricsContext) {
        let (Some(labels), Some(duration_ms)) = (labels_for(&ctx), ctx.duration_millis()) else {
            tracing::debug!(metric = %ctx.name(), "Skipping unfinished measurement");
            return;
        };
        let name = ctx.name().as_str().to_string();

        match ctx.kind() {
            MetricKind::Timer => {
                histogram!(name, &labels).record(duration_ms as f64 / 1000.0);
            }
            MetricKind::Counter => {
                counter!(name, &labels).increment(1);
            }
        }
    }
}

/// Normalized tags plus outcome labels. `None` without an outcome.
pub fn labels_for(ctx: &MetricsContext) -> Option<Vec<(String, String)>> {
    let outcome = ctx.outcome()?;
    let tags = ctx.tags();

    let mut builder = tags.to_builder();
    if !tags.contains_key(keys::RESULT) {
        builder.tag(keys::RESULT, outcome.result.as_tag());
    }
    if !tags.contains_key(keys::STATUS_GROUP) {
        builder.put(keys::STATUS_GROUP, outcome.status_group.map(|g| g.as_tag()));
    }
    if !tags.contains_key(keys::EXCEPTION) {
        builder.tag(keys::EXCEPTION, outcome.exception.as_deref().unwrap_or(NONE));
    }

    let normalized = ctx.policy().normalize(&builder.build());
    Some(
        normalized
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}
