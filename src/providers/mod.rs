//! Pluggable collaborators of the executor.
//!
//! # Responsibilities
//! - One single-method capability per concern (metadata, identity, metrics)
//! - A safe default for every capability so an executor works unconfigured
//!
//! # Design Decisions
//! - Every trait is `Send + Sync`; executors are shared across tasks
//! - Single-method traits are implemented for matching closures
//! - An absent integration is a default provider, never a runtime lookup

pub mod classifier;
pub mod correlation;
pub mod enricher;
pub mod factory;
pub mod invocation;
pub mod issuer;
pub mod listener;
pub mod recorder;
pub mod telemetry;

pub use classifier::{DefaultMetricOutcomeClassifier, MetricOutcomeClassifier, NONE};
pub use correlation::{CorrelationIdProvider, UuidCorrelationIdProvider};
pub use enricher::{DefaultMetricsEnricher, MetricsEnricher};
pub use factory::{DefaultMetricsContextFactory, MetricsContextFactory};
pub use invocation::{DefaultInvocationInfoProvider, InvocationInfoProvider};
pub use issuer::{AnonymousIssuerProvider, IssuerProvider};
pub use listener::{CompositeOperationListener, NoopOperationListener, OperationListener};
pub use recorder::{MetricsRecorder, NoopMetricsRecorder};
pub use telemetry::{NoopTelemetryProvider, TelemetryContextProvider};
