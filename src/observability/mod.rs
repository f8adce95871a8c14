//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! OperationExecutor produces:
//!     → logging.rs  (LoggingListener: one event per finished operation)
//!     → metrics.rs  (FacadeMetricsRecorder: histogram/counter per measurement)
//!     → tracing.rs  (TraceparentTelemetryProvider: W3C ids into the context)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Correlation id flows through every operation record
//! - Metrics go through the `metrics` facade; the exporter is pluggable
//! - Trace ids are passed through, never generated here

pub mod logging;
pub mod metrics;
pub mod tracing;

pub use self::logging::{init_logging, LoggingListener};
pub use self::metrics::{init_metrics, FacadeMetricsRecorder};
pub use self::tracing::TraceparentTelemetryProvider;
