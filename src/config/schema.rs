//! Configuration schema definitions.
//!
//! Every section and field is defaulted, so an empty file is a valid config.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::http::ScopeHeaders;
use crate::measure::{MetricKind, MetricPolicy, MetricTags, DEFAULT_METRIC_NAME};

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct OperationConfig {
    /// Logging subscriber and operation logging listener.
    pub logging: LoggingConfig,

    /// Metrics naming, tag safety and exporter.
    pub metrics: MetricsConfig,

    /// Which invocation metadata is captured.
    pub invocation: InvocationConfig,

    /// Trace context pass-through.
    pub telemetry: TelemetryConfig,

    /// HTTP adapter and demo server.
    pub http: HttpConfig,
}

impl OperationConfig {
    /// Settings that differ in `next` but only take effect on restart: the
    /// flush backend, the exporter, the listener address, the log subscriber
    /// and the request header layers are all built once at startup.
    pub fn restart_required(&self, next: &OperationConfig) -> Vec<&'static str> {
        let checks = [
            ("metrics.enabled", self.metrics.enabled != next.metrics.enabled),
            (
                "metrics.exporter_address",
                self.metrics.exporter_address != next.metrics.exporter_address,
            ),
            ("http", self.http != next.http),
            ("logging.level", self.logging.level != next.logging.level),
            ("logging.format", self.logging.format != next.logging.format),
        ];
        checks
            .into_iter()
            .filter_map(|(field, changed)| changed.then_some(field))
            .collect()
    }
}

/// Severity used by the operation logging listener. `None` disables output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    None,
}

/// Subscriber output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Register the operation logging listener.
    pub enabled: bool,

    /// Boxed multi-line rendering instead of structured fields.
    pub pretty: bool,

    pub success_level: LogLevel,

    pub failure_level: LogLevel,

    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,

    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pretty: false,
            success_level: LogLevel::Info,
            failure_level: LogLevel::Error,
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Forward finalized measurements to the metrics facade.
    pub enabled: bool,

    pub metric_name: String,

    pub kind: MetricKind,

    pub max_tag_count: usize,

    pub max_value_length: usize,

    /// Tag keys allowed through normalization; absent means all.
    pub allowed_keys: Option<BTreeSet<String>>,

    /// Replacement for blank tag values.
    pub unknown: String,

    /// Environment tags attached to every measurement (`env`, `region`).
    pub base_tags: BTreeMap<String, String>,

    /// Prometheus scrape address, e.g. "0.0.0.0:9000". No exporter if unset.
    pub exporter_address: Option<String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        let policy = MetricPolicy::default();
        Self {
            enabled: true,
            metric_name: DEFAULT_METRIC_NAME.to_string(),
            kind: MetricKind::Timer,
            max_tag_count: policy.max_tag_count,
            max_value_length: policy.max_value_length,
            allowed_keys: None,
            unknown: policy.unknown,
            base_tags: BTreeMap::new(),
            exporter_address: None,
        }
    }
}

impl MetricsConfig {
    pub fn policy(&self) -> MetricPolicy {
        MetricPolicy {
            max_tag_count: self.max_tag_count,
            max_value_length: self.max_value_length,
            allowed_keys: self.allowed_keys.clone(),
            unknown: self.unknown.clone(),
        }
    }

    pub fn base_tags(&self) -> MetricTags {
        self.base_tags
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct InvocationConfig {
    /// Record the HTTP entrypoint ("GET /items/{id}").
    pub capture_entrypoint: bool,

    /// Record service/function labels from managed invocations.
    pub capture_service: bool,
}

impl Default for InvocationConfig {
    fn default() -> Self {
        Self {
            capture_entrypoint: true,
            capture_service: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Read W3C trace context from incoming requests.
    pub enabled: bool,

    pub include_baggage: bool,

    /// Baggage keys copied into the operation context. Empty copies none.
    pub baggage_allow_list: BTreeSet<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            include_baggage: false,
            baggage_allow_list: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Demo server bind address.
    pub bind_address: String,

    /// Header carrying the caller identity.
    pub issuer_header: String,

    /// Header carrying the inbound request id.
    pub request_id_header: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let headers = ScopeHeaders::default();
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            issuer_header: headers.issuer,
            request_id_header: headers.request_id,
        }
    }
}

impl HttpConfig {
    pub fn scope_headers(&self) -> ScopeHeaders {
        ScopeHeaders {
            request_id: self.request_id_header.to_ascii_lowercase(),
            issuer: self.issuer_header.to_ascii_lowercase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: OperationConfig = toml::from_str("").unwrap();
        assert_eq!(config, OperationConfig::default());
        assert_eq!(config.metrics.metric_name, "operation.duration");
        assert_eq!(config.logging.failure_level, LogLevel::Error);
        assert!(config.invocation.capture_entrypoint);
    }

    #[test]
    fn test_restart_required_fields() {
        let current = OperationConfig::default();
        let mut next = current.clone();
        next.metrics.max_tag_count = 3;
        next.logging.success_level = LogLevel::Debug;
        assert!(current.restart_required(&next).is_empty());

        next.metrics.enabled = false;
        next.http.issuer_header = "x-caller".to_string();
        assert_eq!(current.restart_required(&next), vec!["metrics.enabled", "http"]);
    }

    #[test]
    fn test_partial_sections() {
        let config: OperationConfig = toml::from_str(
            r#"
            [logging]
            success_level = "none"
            format = "json"

            [metrics]
            kind = "counter"
            allowed_keys = ["result", "operation"]

            [metrics.base_tags]
            env = "prod"
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.success_level, LogLevel::None);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.logging.enabled);
        assert_eq!(config.metrics.kind, MetricKind::Counter);
        let policy = config.metrics.policy();
        assert!(policy.is_allowed("result"));
        assert!(!policy.is_allowed("http.route"));
        assert_eq!(config.metrics.base_tags().get("env"), Some("prod"));
    }
}
