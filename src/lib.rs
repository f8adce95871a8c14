//! Operation execution with structured results, lifecycle logging and
//! policy-bounded metrics.

pub mod config;
pub mod executor;
pub mod http;
pub mod invocation;
pub mod lifecycle;
pub mod measure;
pub mod model;
pub mod observability;
pub mod providers;

pub use config::OperationConfig;
pub use executor::{OperationExecutor, OperationExecutorBuilder, Operations};
pub use http::HttpServer;
pub use invocation::ManagedInvocation;
pub use lifecycle::Shutdown;
pub use measure::MetricsContext;
pub use model::{Failure, OperationContext, OperationResult};
