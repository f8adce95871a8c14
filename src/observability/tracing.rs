//! Distributed tracing support.
//!
//! # Responsibilities
//! - Extract W3C trace context from the current request
//! - Copy allow-listed baggage entries into the operation context
//!
//! # Data Flow
//! ```text
//! RequestScope (traceparent, baggage headers)
//!     → HeaderMap → HeaderExtractor
//!     → TraceContextPropagator + BaggagePropagator
//!     → span context ids + decoded baggage → TelemetryContext
//! ```
//!
//! # Design Decisions
//! - Pass-through only: ids are never generated or propagated here
//! - An invalid `traceparent` yields an empty context, baggage included
//! - Baggage is opt-in and filtered; an empty allow-list copies nothing

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use opentelemetry::baggage::BaggageExt;
use opentelemetry::propagation::{TextMapCompositePropagator, TextMapPropagator};
use opentelemetry::trace::TraceContextExt;
use opentelemetry_http::HeaderExtractor;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};

use crate::config::TelemetryConfig;
use crate::http::scope::{BAGGAGE, TRACEPARENT};
use crate::http::RequestScope;
use crate::model::TelemetryContext;
use crate::providers::TelemetryContextProvider;

fn propagator() -> &'static TextMapCompositePropagator {
    static PROPAGATOR: OnceLock<TextMapCompositePropagator> = OnceLock::new();
    PROPAGATOR.get_or_init(|| {
        TextMapCompositePropagator::new(vec![
            Box::new(TraceContextPropagator::new()),
            Box::new(BaggagePropagator::new()),
        ])
    })
}

#[derive(Debug, Clone, Default)]
pub struct TraceparentTelemetryProvider {
    enabled: bool,
    include_baggage: bool,
    allow_list: BTreeSet<String>,
}

impl TraceparentTelemetryProvider {
    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self {
            enabled: config.enabled,
            include_baggage: config.include_baggage,
            allow_list: config.baggage_allow_list.clone(),
        }
    }

    /// Telemetry for explicit header values.
    pub fn resolve(&self, traceparent: Option<&str>, baggage: Option<&str>) -> TelemetryContext {
        self.extract(&propagation_headers(traceparent, baggage))
    }

    /// Telemetry carried by `headers`.
    pub fn extract(&self, headers: &HeaderMap) -> TelemetryContext {
        if !self.enabled {
            return TelemetryContext::empty();
        }

        let cx = propagator().extract(&HeaderExtractor(headers));
        let span = cx.span();
        let span_context = span.span_context();
        if !span_context.is_valid() {
            return TelemetryContext::empty();
        }

        let mut baggage = BTreeMap::new();
        if self.include_baggage {
            for key in &self.allow_list {
                let Some(value) = cx.baggage().get(key.clone()) else {
                    continue;
                };
                let value = value.to_string();
                if !value.trim().is_empty() {
                    baggage.insert(key.clone(), value);
                }
            }
        }

        TelemetryContext {
            trace_id: Some(span_context.trace_id().to_string()),
            span_id: Some(span_context.span_id().to_string()),
            baggage,
        }
    }
}

impl TelemetryContextProvider for TraceparentTelemetryProvider {
    fn current(&self) -> TelemetryContext {
        match RequestScope::current() {
            Some(scope) => self.resolve(scope.traceparent(), scope.baggage()),
            None => TelemetryContext::empty(),
        }
    }
}

/// Header values that are not valid header text are dropped.
fn propagation_headers(traceparent: Option<&str>, baggage: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let entries = [
        (HeaderName::from_static(TRACEPARENT), traceparent),
        (HeaderName::from_static(BAGGAGE), baggage),
    ];
    for (name, value) in entries {
        if let Some(value) = value.and_then(|v| HeaderValue::from_str(v).ok()) {
            headers.insert(name, value);
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;
    use std::sync::Arc;

    const VALID: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    fn provider(include_baggage: bool, allow: &[&str]) -> TraceparentTelemetryProvider {
        TraceparentTelemetryProvider::from_config(&TelemetryConfig {
            enabled: true,
            include_baggage,
            baggage_allow_list: allow.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn test_valid_traceparent_ids() {
        let telemetry = provider(false, &[]).resolve(Some(VALID), None);
        assert_eq!(telemetry.trace_id.as_deref(), Some("4bf92f3577b34da6a3ce929d0e0e4736"));
        assert_eq!(telemetry.span_id.as_deref(), Some("00f067aa0ba902b7"));
        assert!(telemetry.baggage.is_empty());
    }

    #[test]
    fn test_invalid_traceparent_is_empty() {
        let p = provider(true, &["tenant"]);
        for bad in [
            "00-00000000000000000000000000000000-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-0000000000000000-01",
            "ff-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
            "garbage",
        ] {
            assert!(p.resolve(Some(bad), Some("tenant=acme")).is_empty(), "{bad}");
        }
        assert!(p.resolve(None, Some("tenant=acme")).is_empty());
    }

    #[test]
    fn test_baggage_filtered_by_allow_list() {
        let telemetry = provider(true, &["tenant"]).resolve(Some(VALID), Some("tenant=acme;ttl=5, user=bob"));
        assert_eq!(telemetry.baggage.len(), 1);
        assert_eq!(telemetry.baggage.get("tenant").map(String::as_str), Some("acme"));
    }

    #[test]
    fn test_baggage_values_are_percent_decoded() {
        let telemetry = provider(true, &["tenant"]).resolve(Some(VALID), Some("tenant=acme%20corp%2Ceu"));
        assert_eq!(telemetry.baggage.get("tenant").map(String::as_str), Some("acme corp,eu"));
    }

    #[test]
    fn test_baggage_excluded_unless_enabled_and_listed() {
        assert!(provider(false, &["tenant"]).resolve(Some(VALID), Some("tenant=acme")).baggage.is_empty());
        assert!(provider(true, &[]).resolve(Some(VALID), Some("tenant=acme")).baggage.is_empty());
    }

    #[test]
    fn test_disabled_or_outside_request_is_empty() {
        assert!(TraceparentTelemetryProvider::default().resolve(Some(VALID), None).is_empty());
        assert!(provider(true, &[]).current().is_empty());
    }

    #[tokio::test]
    async fn test_current_reads_request_scope() {
        let scope = RequestScope::new(Method::GET, Some("/items/{id}".into()))
            .with_traceparent(VALID)
            .with_baggage("region=eu-west");
        let p = provider(true, &["region"]);

        let telemetry = RequestScope::enter(Arc::new(scope), async { p.current() }).await;
        assert_eq!(telemetry.trace_id.as_deref(), Some("4bf92f3577b34da6a3ce929d0e0e4736"));
        assert_eq!(telemetry.baggage.get("region").map(String::as_str), Some("eu-west"));
    }
}
