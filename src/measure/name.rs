//! Metric identity: stable series name and recording kind.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Longest accepted metric name, in characters.
pub const MAX_METRIC_NAME_LEN: usize = 200;

/// Name of the timer recorded when nothing else is configured.
pub const DEFAULT_METRIC_NAME: &str = "operation.duration";

/// Errors raised when constructing a [`MetricName`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricNameError {
    /// Name was empty or whitespace only.
    #[error("metric name must not be blank")]
    Blank,

    /// Name exceeded [`MAX_METRIC_NAME_LEN`].
    #[error("metric name must be at most {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },
}

/// Stable identifier of a metric time series.
///
/// Backends group measurements by name, so names must be predefined
/// (`operation.duration`, `operation.calls`) and never carry runtime values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MetricName(String);

impl MetricName {
    /// Validate and wrap a metric name.
    pub fn new(value: impl Into<String>) -> Result<Self, MetricNameError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(MetricNameError::Blank);
        }
        let actual = value.chars().count();
        if actual > MAX_METRIC_NAME_LEN {
            return Err(MetricNameError::TooLong {
                max: MAX_METRIC_NAME_LEN,
                actual,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MetricName {
    fn default() -> Self {
        Self(DEFAULT_METRIC_NAME.to_string())
    }
}

impl TryFrom<String> for MetricName {
    type Error = MetricNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MetricName> for String {
    fn from(name: MetricName) -> Self {
        name.0
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a finalized measurement is recorded by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Duration-based; recorded as a histogram/timer.
    #[default]
    Timer,
    /// Count-based; recorded as a monotonically increasing counter.
    Counter,
}
