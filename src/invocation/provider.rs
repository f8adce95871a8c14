use crate::http::RequestScope;
use crate::invocation::ManagedInvocation;
use crate::model::context::{
    UNKNOWN_ENTRY, UNKNOWN_EVENT, UNKNOWN_FUNCTION, UNKNOWN_OPERATION, UNKNOWN_SERVICE,
    UNKNOWN_USE_CASE,
};
use crate::model::InvocationInfo;
use crate::providers::InvocationInfoProvider;

/// Reads the active request scope and managed invocation.
///
/// Each capture can be disabled; disabled or missing values fall back to the
/// `Unknown*` placeholders.
#[derive(Debug, Clone, Copy)]
pub struct ScopedInvocationInfoProvider {
    capture_entrypoint: bool,
    capture_service: bool,
}

impl ScopedInvocationInfoProvider {
    pub fn new(capture_entrypoint: bool, capture_service: bool) -> Self {
        Self {
            capture_entrypoint,
            capture_service,
        }
    }
}

impl Default for ScopedInvocationInfoProvider {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl InvocationInfoProvider for ScopedInvocationInfoProvider {
    fn current(&self) -> InvocationInfo {
        let entrypoint = self
            .capture_entrypoint
            .then(RequestScope::current)
            .flatten()
            .map(|scope| scope.entrypoint().to_string())
            .unwrap_or_else(|| UNKNOWN_ENTRY.to_string());

        let Some(managed) = self.capture_service.then(ManagedInvocation::current).flatten() else {
            return InvocationInfo {
                entrypoint,
                ..InvocationInfo::default()
            };
        };

        InvocationInfo {
            entrypoint,
            service: or_unknown(managed.service(), UNKNOWN_SERVICE),
            function: or_unknown(managed.function(), UNKNOWN_FUNCTION),
            operation: or_unknown(&managed.resolved_operation(), UNKNOWN_OPERATION),
            use_case: or_unknown(managed.resolved_use_case(), UNKNOWN_USE_CASE),
            event: or_unknown(managed.resolved_event(), UNKNOWN_EVENT),
            attributes: managed.attributes().clone(),
        }
    }
}

fn or_unknown(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
