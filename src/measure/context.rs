//! Measurement scope for aggregated metrics.
//!
//! # Lifecycle
//! ```text
//! Created  (timing started, no outcome)
//!     → Enriched (0..n tag updates, each re-normalized)
//!     → Ended    (timing ended, outcome attached; terminal)
//! ```
//!
//! Every transition consumes the value and returns a new one, so a context
//! handed to a recorder cannot change underneath it. Callers treat `Ended`
//! as terminal even though the type allows further copies.
//!
//! This is not an audit record: correlation ids, issuers and payloads live in
//! [`OperationContext`](crate::model::OperationContext), never in tags.

use serde::Serialize;

use crate::measure::name::{MetricKind, MetricName};
use crate::measure::outcome::MetricOutcome;
use crate::measure::policy::MetricPolicy;
use crate::measure::tags::{MetricTags, MetricTagsBuilder};
use crate::measure::timing::{Clock, MetricTiming};

/// Low-cardinality identity of the measured operation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MetricDescriptor {
    pub operation: String,
    pub use_case: String,
    pub event: String,
}

/// Where a context is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementState {
    Created,
    Enriched,
    Ended,
}

/// A single measurement scope: one operation or one request.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsContext {
    name: MetricName,
    kind: MetricKind,
    tags: MetricTags,
    timing: MetricTiming,
    outcome: Option<MetricOutcome>,
    descriptor: Option<MetricDescriptor>,
    #[serde(skip)]
    policy: MetricPolicy,
    state: MeasurementState,
}

impl MetricsContext {
    /// A fresh scope whose timing starts now.
    pub fn new(name: MetricName, kind: MetricKind, policy: MetricPolicy, clock: &dyn Clock) -> Self {
        Self {
            name,
            kind,
            tags: MetricTags::empty(),
            timing: MetricTiming::started(clock),
            outcome: None,
            descriptor: None,
            policy,
            state: MeasurementState::Created,
        }
    }

    /// Add or update tags, then re-normalize with the context's policy.
    pub fn with_tags<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut MetricTagsBuilder),
    {
        let mut builder = self.tags.to_builder();
        f(&mut builder);
        let tags = self.policy.normalize(&builder.build());
        let state = match self.state {
            MeasurementState::Ended => MeasurementState::Ended,
            _ => MeasurementState::Enriched,
        };
        Self { tags, state, ..self }
    }

    pub fn inject_descriptor(self, descriptor: MetricDescriptor) -> Self {
        Self {
            descriptor: Some(descriptor),
            ..self
        }
    }

    /// Mark the start timestamp.
    pub fn start(self, clock: &dyn Clock) -> Self {
        Self {
            timing: self.timing.start(clock),
            ..self
        }
    }

    /// Mark the end timestamp and attach the final outcome.
    pub fn end(self, clock: &dyn Clock, outcome: MetricOutcome) -> Self {
        Self {
            timing: self.timing.end(clock),
            outcome: Some(outcome),
            state: MeasurementState::Ended,
            ..self
        }
    }

    /// Measured milliseconds once both timestamps exist.
    pub fn duration_millis(&self) -> Option<u64> {
        self.timing.duration_millis()
    }

    pub fn name(&self) -> &MetricName {
        &self.name
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn tags(&self) -> &MetricTags {
        &self.tags
    }

    pub fn timing(&self) -> &MetricTiming {
        &self.timing
    }

    pub fn outcome(&self) -> Option<&MetricOutcome> {
        self.outcome.as_ref()
    }

    pub fn descriptor(&self) -> Option<&MetricDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn policy(&self) -> &MetricPolicy {
        &self.policy
    }

    pub fn state(&self) -> MeasurementState {
        self.state
    }

    pub fn is_ended(&self) -> bool {
        self.state == MeasurementState::Ended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::outcome::MetricResult;
    use crate::measure::tags::keys;
    use crate::measure::timing::test_clock::ManualClock;

    fn context(clock: &ManualClock) -> MetricsContext {
        MetricsContext::new(
            MetricName::new("operation.duration").unwrap(),
            MetricKind::Timer,
            MetricPolicy::default(),
            clock,
        )
    }

    #[test]
    fn test_lifecycle_states() {
        let clock = ManualClock::at(10_000);
        let ctx = context(&clock);
        assert_eq!(ctx.state(), MeasurementState::Created);
        assert_eq!(ctx.duration_millis(), None);

        let ctx = ctx.with_tags(|t| {
            t.tag(keys::OPERATION, "Find Item");
        });
        assert_eq!(ctx.state(), MeasurementState::Enriched);
        assert_eq!(ctx.tags().get(keys::OPERATION), Some("find_item"));

        clock.advance(42);
        let ctx = ctx.end(&clock, MetricOutcome::new(MetricResult::Success));
        assert!(ctx.is_ended());
        assert_eq!(ctx.duration_millis(), Some(42));
        assert_eq!(ctx.outcome().map(|o| o.result), Some(MetricResult::Success));
    }

    #[test]
    fn test_enrichment_after_end_stays_ended() {
        let clock = ManualClock::at(0);
        let ctx = context(&clock)
            .end(&clock, MetricOutcome::new(MetricResult::Failure))
            .with_tags(|t| {
                t.tag(keys::HTTP_STATUS, "500");
            });
        assert_eq!(ctx.state(), MeasurementState::Ended);
        assert_eq!(ctx.tags().get(keys::HTTP_STATUS), Some("500"));
    }

    #[test]
    fn test_tags_respect_policy() {
        let clock = ManualClock::at(0);
        let ctx = MetricsContext::new(
            MetricName::new("operation.calls").unwrap(),
            MetricKind::Counter,
            MetricPolicy {
                max_tag_count: 1,
                ..MetricPolicy::default()
            },
            &clock,
        )
        .with_tags(|t| {
            t.tag("a", "1").tag("b", "2");
        });
        assert_eq!(ctx.tags().len(), 1);
    }
}
