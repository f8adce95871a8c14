//! Per-invocation identity carriers.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

pub const UNKNOWN_ENTRY: &str = "UnknownEntry";
pub const UNKNOWN_SERVICE: &str = "UnknownService";
pub const UNKNOWN_FUNCTION: &str = "UnknownFunction";
pub const UNKNOWN_OPERATION: &str = "UnknownOperation";
pub const UNKNOWN_USE_CASE: &str = "UnknownUseCase";
pub const UNKNOWN_EVENT: &str = "UnknownEvent";
pub const ANONYMOUS_ISSUER: &str = "anonymous";

/// Where an operation originates. Resolved fresh for every invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationInfo {
    pub entrypoint: String,
    pub service: String,
    pub function: String,
    pub operation: String,
    pub use_case: String,
    pub event: String,
    pub attributes: BTreeMap<String, String>,
}

impl Default for InvocationInfo {
    fn default() -> Self {
        Self {
            entrypoint: UNKNOWN_ENTRY.to_string(),
            service: UNKNOWN_SERVICE.to_string(),
            function: UNKNOWN_FUNCTION.to_string(),
            operation: UNKNOWN_OPERATION.to_string(),
            use_case: UNKNOWN_USE_CASE.to_string(),
            event: UNKNOWN_EVENT.to_string(),
            attributes: BTreeMap::new(),
        }
    }
}

/// Trace identifiers passed through opaquely.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TelemetryContext {
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub baggage: BTreeMap<String, String>,
}

impl TelemetryContext {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.trace_id.is_none() && self.span_id.is_none() && self.baggage.is_empty()
    }
}

/// Immutable snapshot of one execution.
///
/// The executor builds a base instance before running the work and a
/// completed copy afterwards with `duration_ms` and `response` filled in.
/// Identity fields here (correlation id, issuer) are for logs and audit only;
/// they must never be copied into metric tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationContext {
    pub correlation_id: String,
    pub issuer: String,
    pub entrypoint: String,
    pub service: String,
    pub function: String,
    pub operation: String,
    pub use_case: String,
    pub event: String,
    pub message: Option<String>,
    pub response: Option<String>,
    pub duration_ms: Option<u64>,
    /// Creation time in epoch milliseconds.
    pub timestamp: i64,
    pub attributes: BTreeMap<String, String>,
    pub telemetry: TelemetryContext,
    #[serde(skip)]
    note: MessageSlot,
}

/// Message the work leaves for the completed context. Shared between clones
/// so an owned copy moved into async work still reaches the executor.
#[derive(Clone, Default)]
struct MessageSlot(Arc<Mutex<Option<String>>>);

impl MessageSlot {
    fn set(&self, message: String) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(message);
    }

    fn get(&self) -> Option<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl PartialEq for MessageSlot {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.get() == other.get()
    }
}

impl Eq for MessageSlot {}

impl fmt::Debug for MessageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MessageSlot").field(&self.get()).finish()
    }
}

impl OperationContext {
    /// Base context assembled from resolved invocation metadata.
    pub fn new(
        correlation_id: impl Into<String>,
        issuer: impl Into<String>,
        info: InvocationInfo,
        telemetry: TelemetryContext,
        timestamp: i64,
    ) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            issuer: issuer.into(),
            entrypoint: info.entrypoint,
            service: info.service,
            function: info.function,
            operation: info.operation,
            use_case: info.use_case,
            event: info.event,
            message: None,
            response: None,
            duration_ms: None,
            timestamp,
            attributes: info.attributes,
            telemetry,
            note: MessageSlot::default(),
        }
    }

    /// Copy with the completion fields populated. A message set during the
    /// work wins over the base one.
    pub fn completed(&self, duration_ms: u64, response: impl Into<String>) -> Self {
        Self {
            duration_ms: Some(duration_ms),
            response: Some(response.into()),
            message: self.note.get().or_else(|| self.message.clone()),
            note: MessageSlot::default(),
            ..self.clone()
        }
    }

    /// Leave a human-readable note for logs and the result. Last call wins.
    pub fn set_message(&self, message: impl Into<String>) {
        self.note.set(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_info_defaults() {
        let info = InvocationInfo::default();
        assert_eq!(info.entrypoint, "UnknownEntry");
        assert_eq!(info.service, "UnknownService");
        assert_eq!(info.function, "UnknownFunction");
        assert_eq!(info.operation, "UnknownOperation");
        assert_eq!(info.use_case, "UnknownUseCase");
        assert_eq!(info.event, "UnknownEvent");
        assert!(info.attributes.is_empty());
    }

    #[test]
    fn test_completed_copy_leaves_base_untouched() {
        let base = OperationContext::new(
            "cid-1",
            ANONYMOUS_ISSUER,
            InvocationInfo::default(),
            TelemetryContext::empty(),
            1_700_000_000_000,
        );
        let done = base.completed(12, "Item { id: 7 }");

        assert_eq!(base.duration_ms, None);
        assert_eq!(base.response, None);
        assert_eq!(done.duration_ms, Some(12));
        assert_eq!(done.response.as_deref(), Some("Item { id: 7 }"));
        assert_eq!(done.correlation_id, "cid-1");
        assert_eq!(done.timestamp, base.timestamp);
        assert_eq!(done.message, None);
    }

    #[test]
    fn test_message_set_on_a_clone_reaches_completion() {
        let base = OperationContext::new(
            "cid-2",
            ANONYMOUS_ISSUER,
            InvocationInfo::default(),
            TelemetryContext::empty(),
            0,
        );
        let handed_to_work = base.clone();
        handed_to_work.set_message("first");
        handed_to_work.set_message("created 3 items");

        let done = base.completed(1, "3");
        assert_eq!(done.message.as_deref(), Some("created 3 items"));
        assert_eq!(base.message, None);
    }
}
