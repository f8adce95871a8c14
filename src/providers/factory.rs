use std::sync::Arc;

use crate::measure::{Clock, MetricKind, MetricName, MetricPolicy, MetricTags, MetricsContext, SystemClock};

/// Builds a fresh, started measurement scope for each execution.
pub trait MetricsContextFactory: Send + Sync {
    fn create(&self) -> MetricsContext;
}

impl<F> MetricsContextFactory for F
where
    F: Fn() -> MetricsContext + Send + Sync,
{
    fn create(&self) -> MetricsContext {
        self()
    }
}

/// Fixed name, kind and policy, optionally pre-seeded with environment tags
/// such as `env` or `region`.
#[derive(Clone)]
pub struct DefaultMetricsContextFactory {
    name: MetricName,
    kind: MetricKind,
    policy: MetricPolicy,
    base_tags: MetricTags,
    clock: Arc<dyn Clock>,
}

impl DefaultMetricsContextFactory {
    pub fn new(name: MetricName) -> Self {
        Self {
            name,
            kind: MetricKind::default(),
            policy: MetricPolicy::default(),
            base_tags: MetricTags::empty(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn kind(mut self, kind: MetricKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn policy(mut self, policy: MetricPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn base_tags(mut self, tags: MetricTags) -> Self {
        self.base_tags = tags;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl Default for DefaultMetricsContextFactory {
    fn default() -> Self {
        Self::new(MetricName::default())
    }
}

impl MetricsContextFactory for DefaultMetricsContextFactory {
    fn create(&self) -> MetricsContext {
        let ctx = MetricsContext::new(
            self.name.clone(),
            self.kind,
            self.policy.clone(),
            self.clock.as_ref(),
        );
        if self.base_tags.is_empty() {
            return ctx;
        }
        ctx.with_tags(|t| {
            t.put_all(&self.base_tags);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::timing::test_clock::ManualClock;
    use crate::measure::{keys, MeasurementState};

    #[test]
    fn test_default_factory() {
        let ctx = DefaultMetricsContextFactory::default().create();
        assert_eq!(ctx.name().as_str(), "operation.duration");
        assert_eq!(ctx.kind(), MetricKind::Timer);
        assert_eq!(ctx.state(), MeasurementState::Created);
        assert!(ctx.timing().started_at_epoch_millis.is_some());
        assert!(ctx.tags().is_empty());
    }

    #[test]
    fn test_base_tags_are_normalized() {
        let base = MetricTags::builder().tag(keys::ENV, "Prod EU").build();
        let ctx = DefaultMetricsContextFactory::new(MetricName::new("jobs.calls").unwrap())
            .kind(MetricKind::Counter)
            .base_tags(base)
            .clock(Arc::new(ManualClock::at(5)))
            .create();

        assert_eq!(ctx.tags().get(keys::ENV), Some("prod_eu"));
        assert_eq!(ctx.timing().started_at_epoch_millis, Some(5));
    }
}
