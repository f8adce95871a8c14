//! Execution pipeline.
//!
//! # Data Flow
//! ```text
//! run(work)
//!     → resolve InvocationInfo, TelemetryContext, correlation id, issuer
//!     → base OperationContext
//!     → MetricsContextFactory::create → inject descriptor → start
//!     → work(&base)                       (panics caught)
//!     → completed context (duration, response summary)
//!     → classify → end → enrich
//!     → listener → recorder               (each guarded)
//!     → Ok(OperationResult) | Err(same error) | resume panic
//! ```
//!
//! # Design Decisions
//! - The executor never retries and never wraps the work's error
//! - Duration comes from a monotonic `Instant`, truncated to milliseconds
//! - A panicking hook is logged and ignored; it cannot mask the real outcome
//! - No shared mutable state per invocation; one executor serves all tasks

pub mod global;
pub mod runner;
pub mod wiring;

pub use global::Operations;
pub use runner::{OperationExecutor, OperationExecutorBuilder};
