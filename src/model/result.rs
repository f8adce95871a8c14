use serde::Serialize;

use crate::measure::MetricsContext;
use crate::model::context::OperationContext;

/// Successful execution: the completed context, the finalized metrics scope
/// and the value the work produced.
#[derive(Debug, Clone, Serialize)]
pub struct OperationResult<T> {
    pub context: OperationContext,
    pub metrics: MetricsContext,
    pub data: T,
}

impl<T> OperationResult<T> {
    pub fn into_data(self) -> T {
        self.data
    }

    pub fn map<U, F>(self, f: F) -> OperationResult<U>
    where
        F: FnOnce(T) -> U,
    {
        OperationResult {
            context: self.context,
            metrics: self.metrics,
            data: f(self.data),
        }
    }
}
