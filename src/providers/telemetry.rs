use crate::model::TelemetryContext;

/// Current trace identifiers, if a tracer is active.
pub trait TelemetryContextProvider: Send + Sync {
    fn current(&self) -> TelemetryContext;
}

impl<F> TelemetryContextProvider for F
where
    F: Fn() -> TelemetryContext + Send + Sync,
{
    fn current(&self) -> TelemetryContext {
        self()
    }
}

/// Always empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetryProvider;

impl TelemetryContextProvider for NoopTelemetryProvider {
    fn current(&self) -> TelemetryContext {
        TelemetryContext::empty()
    }
}
