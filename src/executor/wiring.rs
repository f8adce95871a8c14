//! Standard production wiring from an [`OperationConfig`].

use std::sync::Arc;

use crate::config::OperationConfig;
use crate::executor::OperationExecutor;
use crate::http::{
    HttpMetricsEnricher, HttpOutcomeClassifier, OperationLayer, RequestIdCorrelationProvider,
    RoutingMetricsRecorder, ScopedIssuerProvider,
};
use crate::invocation::ScopedInvocationInfoProvider;
use crate::measure::MetricName;
use crate::observability::{FacadeMetricsRecorder, LoggingListener, TraceparentTelemetryProvider};
use crate::providers::{
    CompositeOperationListener, DefaultMetricsContextFactory, MetricsRecorder, NoopMetricsRecorder,
};

/// Recorder that measurements finally reach: the `metrics` facade, or
/// nothing when metrics are disabled.
pub fn backend_recorder(config: &OperationConfig) -> Arc<dyn MetricsRecorder> {
    if config.metrics.enabled {
        Arc::new(FacadeMetricsRecorder)
    } else {
        Arc::new(NoopMetricsRecorder)
    }
}

impl OperationExecutor {
    /// Executor with request-aware providers, HTTP classification and
    /// per-request metric buffering.
    ///
    /// An invalid metric name falls back to the default; [`load_config`]
    /// rejects such files before they get here.
    ///
    /// [`load_config`]: crate::config::load_config
    pub fn from_config(config: &OperationConfig) -> Self {
        let metrics = &config.metrics;
        let name = MetricName::new(metrics.metric_name.as_str()).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid metric name, using default");
            MetricName::default()
        });
        let factory = DefaultMetricsContextFactory::new(name)
            .kind(metrics.kind)
            .policy(metrics.policy())
            .base_tags(metrics.base_tags());

        let mut listeners = CompositeOperationListener::new();
        if config.logging.enabled {
            listeners = listeners.with(LoggingListener::from_config(&config.logging));
        }

        OperationExecutor::builder()
            .invocation_info_provider(ScopedInvocationInfoProvider::new(
                config.invocation.capture_entrypoint,
                config.invocation.capture_service,
            ))
            .issuer_provider(ScopedIssuerProvider)
            .correlation_id_provider(RequestIdCorrelationProvider)
            .telemetry_provider(TraceparentTelemetryProvider::from_config(&config.telemetry))
            .listener(listeners)
            .metrics_context_factory(factory)
            .outcome_classifier(HttpOutcomeClassifier)
            .metrics_enricher(HttpMetricsEnricher)
            .metrics_recorder(RoutingMetricsRecorder::new(backend_recorder(config)))
            .build()
    }
}

impl OperationLayer {
    /// Layer flushing into the same backend [`OperationExecutor::from_config`]
    /// buffers for.
    pub fn from_config(config: &OperationConfig) -> Self {
        OperationLayer::new(backend_recorder(config)).with_headers(config.http.scope_headers())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::{keys, MetricKind};

    #[test]
    fn test_from_config_applies_metrics_section() {
        let mut config = OperationConfig::default();
        config.metrics.metric_name = "orders.calls".to_string();
        config.metrics.kind = MetricKind::Counter;
        config.metrics.base_tags.insert("env".into(), "staging".into());
        config.logging.enabled = false;

        let result = OperationExecutor::from_config(&config).call(|ctx| ctx.issuer.clone());
        assert_eq!(result.data, "anonymous");
        assert_eq!(result.metrics.name().as_str(), "orders.calls");
        assert_eq!(result.metrics.kind(), MetricKind::Counter);
        assert_eq!(result.metrics.tags().get("env"), Some("staging"));
        assert_eq!(result.metrics.tags().get(keys::HTTP_METHOD), Some("none"));
        assert_eq!(result.metrics.tags().get(keys::STATUS_GROUP), Some("s2xx"));
    }
}
