//! Value objects describing one execution.

pub mod context;
pub mod failure;
pub mod result;

pub use context::{InvocationInfo, OperationContext, TelemetryContext, ANONYMOUS_ISSUER};
pub use failure::Failure;
pub use result::OperationResult;
