//! Final classification of an execution.
//!
//! # Result Semantics
//! - `Success`: completed normally (typically 2xx).
//! - `Reject`: refused for client-side or business reasons (validation,
//!   authorization, conflicts). Usually not an incident.
//! - `Failure`: server-side or infrastructure problem (5xx, unexpected
//!   errors, timeouts). Alert-worthy.
//!
//! The exception tag carries a simple type name or category, never a message
//! or stack trace.

use serde::Serialize;

/// High-level execution result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricResult {
    Success,
    Reject,
    Failure,
}

impl MetricResult {
    pub fn as_tag(&self) -> &'static str {
        match self {
            MetricResult::Success => "success",
            MetricResult::Reject => "reject",
            MetricResult::Failure => "failure",
        }
    }
}

/// Coarse HTTP status bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusGroup {
    S2xx,
    S3xx,
    S4xx,
    S5xx,
}

impl StatusGroup {
    /// Bucket for `code`, or `None` outside 200..=599.
    pub fn from_status(code: u16) -> Option<Self> {
        match code {
            200..=299 => Some(StatusGroup::S2xx),
            300..=399 => Some(StatusGroup::S3xx),
            400..=499 => Some(StatusGroup::S4xx),
            500..=599 => Some(StatusGroup::S5xx),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            StatusGroup::S2xx => "s2xx",
            StatusGroup::S3xx => "s3xx",
            StatusGroup::S4xx => "s4xx",
            StatusGroup::S5xx => "s5xx",
        }
    }
}

/// Outcome attached to a measurement when its scope ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricOutcome {
    pub result: MetricResult,
    pub status_group: Option<StatusGroup>,
    pub exception: Option<String>,
}

impl MetricOutcome {
    pub fn new(result: MetricResult) -> Self {
        Self {
            result,
            status_group: None,
            exception: None,
        }
    }

    pub fn with_status_group(mut self, group: Option<StatusGroup>) -> Self {
        self.status_group = group;
        self
    }

    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }
}
