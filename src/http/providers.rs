//! Identity providers backed by the current [`RequestScope`].

use uuid::Uuid;

use crate::http::RequestScope;
use crate::model::ANONYMOUS_ISSUER;
use crate::providers::{CorrelationIdProvider, IssuerProvider};

/// Reuses the inbound request id so logs and operation records line up;
/// generates a UUID v4 otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdCorrelationProvider;

impl CorrelationIdProvider for RequestIdCorrelationProvider {
    fn new_correlation_id(&self) -> String {
        RequestScope::current()
            .and_then(|s| s.request_id().map(str::to_string))
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }
}

/// Issuer from the configured request header, `anonymous` otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopedIssuerProvider;

impl IssuerProvider for ScopedIssuerProvider {
    fn current_issuer(&self) -> String {
        RequestScope::current()
            .and_then(|s| s.issuer().map(str::to_string))
            .unwrap_or_else(|| ANONYMOUS_ISSUER.to_string())
    }
}
