use uuid::Uuid;

/// Generates the id tying together every record of one execution.
pub trait CorrelationIdProvider: Send + Sync {
    fn new_correlation_id(&self) -> String;
}

impl<F> CorrelationIdProvider for F
where
    F: Fn() -> String + Send + Sync,
{
    fn new_correlation_id(&self) -> String {
        self()
    }
}

/// Random 128-bit ids (UUID v4).
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidCorrelationIdProvider;

impl CorrelationIdProvider for UuidCorrelationIdProvider {
    fn new_correlation_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
