use crate::http::RequestScope;
use crate::measure::{keys, MetricsContext};
use crate::providers::{MetricsEnricher, NONE};

/// Adds outcome, descriptor and request tags.
///
/// Outside a request, method and route are `none`. The final status is added
/// later by the flush.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpMetricsEnricher;

impl MetricsEnricher for HttpMetricsEnricher {
    fn enrich(&self, ctx: MetricsContext) -> MetricsContext {
        let outcome = ctx.outcome().cloned();
        let descriptor = ctx.descriptor().cloned().unwrap_or_default();
        let scope = RequestScope::current();

        let method = scope
            .as_ref()
            .map(|s| s.method().as_str().to_string())
            .unwrap_or_else(|| NONE.to_string());
        let route = scope
            .as_ref()
            .and_then(|s| s.route().map(str::to_string))
            .unwrap_or_else(|| NONE.to_string());

        ctx.with_tags(|t| {
            if let Some(outcome) = &outcome {
                t.tag(keys::RESULT, outcome.result.as_tag())
                    .put(keys::STATUS_GROUP, outcome.status_group.map(|g| g.as_tag()))
                    .tag(keys::EXCEPTION, outcome.exception.as_deref().unwrap_or(NONE));
            }
            t.tag(keys::OPERATION, or_none(&descriptor.operation))
                .tag(keys::USE_CASE, or_none(&descriptor.use_case))
                .tag(keys::EVENT, or_none(&descriptor.event))
                .tag(keys::HTTP_METHOD, method)
                .tag(keys::HTTP_ROUTE, route);
        })
    }
}

fn or_none(value: &str) -> &str {
    if value.trim().is_empty() {
        NONE
    } else {
        value
    }
}
