use crate::measure::{keys, MetricsContext};

/// Adds tags to an ended context before it is recorded.
pub trait MetricsEnricher: Send + Sync {
    fn enrich(&self, ctx: MetricsContext) -> MetricsContext;
}

impl<F> MetricsEnricher for F
where
    F: Fn(MetricsContext) -> MetricsContext + Send + Sync,
{
    fn enrich(&self, ctx: MetricsContext) -> MetricsContext {
        self(ctx)
    }
}

/// Adds only the `result` tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMetricsEnricher;

impl MetricsEnricher for DefaultMetricsEnricher {
    fn enrich(&self, ctx: MetricsContext) -> MetricsContext {
        let result = ctx.outcome().map(|o| o.result.as_tag());
        ctx.with_tags(|t| {
            t.put(keys::RESULT, result);
        })
    }
}
