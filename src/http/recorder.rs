use std::sync::Arc;

use crate::http::RequestScope;
use crate::measure::MetricsContext;
use crate::providers::MetricsRecorder;

/// Buffers measurements taken during a request until its status is known.
///
/// Outside a request (background jobs, tests) or after the request already
/// flushed, contexts go straight to the backend.
#[derive(Clone)]
pub struct RoutingMetricsRecorder {
    backend: Arc<dyn MetricsRecorder>,
}

impl RoutingMetricsRecorder {
    pub fn new(backend: Arc<dyn MetricsRecorder>) -> Self {
        Self { backend }
    }
}

impl MetricsRecorder for RoutingMetricsRecorder {
    fn record(&self, ctx: MetricsContext) {
        match RequestScope::current() {
            Some(scope) if !scope.is_flushed() => scope.buffer(ctx),
            Some(scope) => {
                tracing::debug!(
                    entrypoint = %scope.entrypoint(),
                    "Request already flushed, recording immediately"
                );
                self.backend.record(ctx);
            }
            None => self.backend.record(ctx),
        }
    }
}
