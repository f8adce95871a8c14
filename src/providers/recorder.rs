use crate::measure::MetricsContext;

/// Sink for finalized measurements.
///
/// Implementations either push into a time-series backend or buffer until
/// the surrounding request knows its final status. They must be fast and
/// must not fail the operation being measured.
pub trait MetricsRecorder: Send + Sync {
    fn record(&self, ctx: MetricsContext);
}

impl<F> MetricsRecorder for F
where
    F: Fn(MetricsContext) + Send + Sync,
{
    fn record(&self, ctx: MetricsContext) {
        self(ctx)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetricsRecorder;

impl MetricsRecorder for NoopMetricsRecorder {
    fn record(&self, _ctx: MetricsContext) {}
}
