//! Low-cardinality metric tags.
//!
//! Tags are the labels a backend groups series by. They MUST stay
//! low-cardinality: never user ids, request ids, correlation ids, raw paths
//! or query strings. Those belong in invocation logs.

use serde::{Serialize, Serializer};
use serde::ser::SerializeMap;

/// Shared tag-key vocabulary used across adapters.
pub mod keys {
    /// success | reject | failure
    pub const RESULT: &str = "result";
    /// s2xx | s3xx | s4xx | s5xx
    pub const STATUS_GROUP: &str = "status_group";
    /// Simple error type name or category.
    pub const EXCEPTION: &str = "exception";
    pub const ERROR_CODE: &str = "error.code";
    pub const ERROR_CATEGORY: &str = "error.category";

    pub const OPERATION: &str = "operation";
    pub const USE_CASE: &str = "use_case";
    pub const EVENT: &str = "event";
    pub const ENTRYPOINT: &str = "entrypoint";
    pub const SERVICE: &str = "service";
    pub const FUNCTION: &str = "function";

    pub const HTTP_METHOD: &str = "http.method";
    /// Normalized route template, e.g. `/items/{id}`.
    pub const HTTP_ROUTE: &str = "http.route";
    /// Raw uri. High cardinality, avoid.
    pub const HTTP_URI: &str = "http.uri";
    pub const HTTP_STATUS: &str = "http.status";

    /// anonymous | user | system
    pub const ISSUER_TYPE: &str = "issuer.type";

    pub const ENV: &str = "env";
    pub const INSTANCE: &str = "instance";
    pub const REGION: &str = "region";
}

/// Immutable, insertion-ordered tag set with unique keys.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetricTags {
    entries: Vec<(String, String)>,
}

impl MetricTags {
    /// An empty tag set.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> MetricTagsBuilder {
        MetricTagsBuilder::default()
    }

    /// A builder seeded with the current entries.
    pub fn to_builder(&self) -> MetricTagsBuilder {
        MetricTagsBuilder {
            entries: self.entries.clone(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn from_entries(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }
}

impl Serialize for MetricTags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<K, V> FromIterator<(K, V)> for MetricTags
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut builder = MetricTagsBuilder::default();
        for (k, v) in iter {
            builder.put(k, Some(v.into()));
        }
        builder.build()
    }
}

/// Incremental builder for [`MetricTags`]. Never fails.
#[derive(Debug, Clone, Default)]
pub struct MetricTagsBuilder {
    entries: Vec<(String, String)>,
}

impl MetricTagsBuilder {
    /// Add or replace a tag. Blank or missing values are ignored.
    ///
    /// Replacing an existing key keeps its original position.
    pub fn put<V>(&mut self, key: impl Into<String>, value: Option<V>) -> &mut Self
    where
        V: Into<String>,
    {
        let Some(value) = value.map(Into::into) else {
            return self;
        };
        if value.trim().is_empty() {
            return self;
        }
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Shorthand for [`put`](Self::put) with a present value.
    pub fn tag(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.put(key, Some(value))
    }

    /// Merge every entry of `other`, replacing values on key collision.
    pub fn put_all(&mut self, other: &MetricTags) -> &mut Self {
        for (k, v) in other.iter() {
            self.tag(k, v);
        }
        self
    }

    pub fn build(&self) -> MetricTags {
        MetricTags::from_entries(self.entries.clone())
    }
}
