//! Tag safety policy.
//!
//! Backends store one time series per distinct (name, tag set) pair, so
//! unbounded tags blow up memory. The policy caps tag count and value
//! length, optionally restricts keys, and normalizes values into a
//! backend-friendly form.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::measure::tags::MetricTags;

pub const DEFAULT_MAX_TAG_COUNT: usize = 20;
pub const DEFAULT_MAX_VALUE_LENGTH: usize = 80;
pub const DEFAULT_UNKNOWN: &str = "unknown";

/// Safety rules applied to every tag set attached to a metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricPolicy {
    /// Entries beyond this count are dropped, first-inserted wins.
    pub max_tag_count: usize,

    /// Values are truncated to this many characters.
    pub max_value_length: usize,

    /// When set, only these keys survive.
    pub allowed_keys: Option<BTreeSet<String>>,

    /// Replacement for values that sanitize to nothing.
    pub unknown: String,
}

impl Default for MetricPolicy {
    fn default() -> Self {
        Self {
            max_tag_count: DEFAULT_MAX_TAG_COUNT,
            max_value_length: DEFAULT_MAX_VALUE_LENGTH,
            allowed_keys: None,
            unknown: DEFAULT_UNKNOWN.to_string(),
        }
    }
}

impl MetricPolicy {
    /// Filter and normalize `tags`.
    ///
    /// Steps, in order: key allow-list, value sanitizing, blank removal,
    /// count truncation in insertion order. The result is a fixed point:
    /// normalizing it again yields the same set.
    pub fn normalize(&self, tags: &MetricTags) -> MetricTags {
        let entries = tags
            .iter()
            .filter(|(key, _)| self.is_allowed(key))
            .map(|(key, value)| (key.to_string(), self.sanitize(value)))
            .filter(|(_, value)| !value.is_empty())
            .take(self.max_tag_count)
            .collect();

        MetricTags::from_entries(entries)
    }

    pub fn is_allowed(&self, key: &str) -> bool {
        match &self.allowed_keys {
            Some(allowed) => allowed.contains(key),
            None => true,
        }
    }

    fn sanitize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return self.clean(&self.unknown);
        }
        self.clean(trimmed)
    }

    /// Lowercase, whitespace to underscore, truncate.
    fn clean(&self, value: &str) -> String {
        value
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .take(self.max_value_length)
            .collect()
    }
}
