//! Deferred flush of buffered measurements.
//!
//! # Rules
//! - At most one drain per request (`flushed` flag)
//! - If the handler panicked, the request dispatch skips and the error
//!   dispatch flushes, so the recorded status is the rendered one
//! - Flushing adds status and route tags; it does not reclassify

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use axum::http::StatusCode;

use crate::http::RequestScope;
use crate::measure::{keys, StatusGroup};
use crate::providers::MetricsRecorder;

/// Which pass over the request is completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Normal completion of the handler chain.
    Request,
    /// Re-entry after an escaped failure was rendered.
    Error,
}

#[derive(Clone)]
pub struct MetricsFlusher {
    backend: Arc<dyn MetricsRecorder>,
}

impl MetricsFlusher {
    pub fn new(backend: Arc<dyn MetricsRecorder>) -> Self {
        Self { backend }
    }

    /// Drain `scope` into the backend if this dispatch is allowed to.
    ///
    /// Returns how many contexts were forwarded.
    pub fn flush(&self, scope: &RequestScope, dispatch: Dispatch, status: StatusCode) -> usize {
        if scope.is_flushed() {
            tracing::debug!(entrypoint = %scope.entrypoint(), ?dispatch, "Metrics already flushed");
            return 0;
        }
        if scope.is_thrown() && dispatch != Dispatch::Error {
            tracing::debug!(
                entrypoint = %scope.entrypoint(),
                "Handler failed, deferring metrics flush to error dispatch"
            );
            return 0;
        }
        if !scope.begin_flush() {
            return 0;
        }

        let buffered = scope.drain();
        let count = buffered.len();
        let code = status.as_u16();
        let group = StatusGroup::from_status(code).map(|g| g.as_tag());

        for ctx in buffered {
            let enriched = ctx.with_tags(|t| {
                t.tag(keys::HTTP_STATUS, code.to_string())
                    .put(keys::STATUS_GROUP, group)
                    .tag(keys::HTTP_METHOD, scope.method().as_str())
                    .put(keys::HTTP_ROUTE, scope.route());
            });
            if catch_unwind(AssertUnwindSafe(|| self.backend.record(enriched))).is_err() {
                tracing::error!(entrypoint = %scope.entrypoint(), "Metrics backend panicked during flush");
            }
        }

        tracing::debug!(entrypoint = %scope.entrypoint(), status = code, count, "Metrics flushed");
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::{MetricOutcome, MetricResult, MetricsContext, SystemClock};
    use crate::providers::{DefaultMetricsContextFactory, MetricsContextFactory};
    use axum::http::Method;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Sink(Mutex<Vec<MetricsContext>>);

    impl MetricsRecorder for Sink {
        fn record(&self, ctx: MetricsContext) {
            self.0.lock().unwrap().push(ctx);
        }
    }

    fn ended() -> MetricsContext {
        DefaultMetricsContextFactory::default()
            .create()
            .end(&SystemClock, MetricOutcome::new(MetricResult::Success))
    }

    #[test]
    fn test_flush_enriches_and_drains_once() {
        let sink = Arc::new(Sink::default());
        let flusher = MetricsFlusher::new(sink.clone());
        let scope = RequestScope::new(Method::GET, Some("/items/{id}".into()));
        scope.buffer(ended());
        scope.buffer(ended());

        assert_eq!(flusher.flush(&scope, Dispatch::Request, StatusCode::NOT_FOUND), 2);
        assert_eq!(flusher.flush(&scope, Dispatch::Error, StatusCode::NOT_FOUND), 0);

        let recorded = sink.0.lock().unwrap();
        assert_eq!(recorded.len(), 2);
        for ctx in recorded.iter() {
            assert_eq!(ctx.tags().get(keys::STATUS_GROUP), Some("s4xx"));
            assert_eq!(ctx.tags().get(keys::HTTP_STATUS), Some("404"));
            assert_eq!(ctx.tags().get(keys::HTTP_METHOD), Some("get"));
            assert_eq!(ctx.tags().get(keys::HTTP_ROUTE), Some("/items/{id}"));
        }
    }

    #[test]
    fn test_thrown_defers_to_error_dispatch() {
        let sink = Arc::new(Sink::default());
        let flusher = MetricsFlusher::new(sink.clone());
        let scope = RequestScope::new(Method::POST, None);
        scope.buffer(ended());
        scope.mark_thrown();

        assert_eq!(flusher.flush(&scope, Dispatch::Request, StatusCode::OK), 0);
        assert!(!scope.is_flushed());
        assert_eq!(
            flusher.flush(&scope, Dispatch::Error, StatusCode::INTERNAL_SERVER_ERROR),
            1
        );

        let recorded = sink.0.lock().unwrap();
        assert_eq!(recorded[0].tags().get(keys::STATUS_GROUP), Some("s5xx"));
        assert!(recorded[0].tags().get(keys::HTTP_ROUTE).is_none());
    }

    #[test]
    fn test_empty_buffer_still_marks_flushed() {
        let flusher = MetricsFlusher::new(Arc::new(Sink::default()));
        let scope = RequestScope::new(Method::GET, None);
        assert_eq!(flusher.flush(&scope, Dispatch::Request, StatusCode::OK), 0);
        assert!(scope.is_flushed());
    }
}
