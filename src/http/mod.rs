//! axum/tower adapter.
//!
//! # Data Flow
//! ```text
//! request
//!     → layer.rs (OperationLayer: RequestScope installed)
//!     → handler → OperationExecutor
//!         → providers.rs (request id, issuer from the scope)
//!         → classifier.rs / enricher.rs (HTTP-aware outcome + tags)
//!         → recorder.rs (buffer into the scope)
//!     → flush.rs (status known: tag + forward to backend, once)
//!     → response
//! ```
//!
//! # Design Decisions
//! - Request state lives in a task-local, never in thread-locals
//! - Metrics are buffered per request so the real status is recorded
//! - Buffer loss on a broken request is accepted; metrics never fail a response

pub mod classifier;
pub mod enricher;
pub mod error;
pub mod flush;
pub mod layer;
pub mod providers;
pub mod recorder;
pub mod scope;
pub mod server;

pub use classifier::HttpOutcomeClassifier;
pub use enricher::HttpMetricsEnricher;
pub use error::HttpError;
pub use flush::{Dispatch, MetricsFlusher};
pub use layer::{OperationLayer, OperationService};
pub use providers::{RequestIdCorrelationProvider, ScopedIssuerProvider};
pub use recorder::RoutingMetricsRecorder;
pub use scope::{RequestScope, ScopeHeaders};
pub use server::{build_router, AppState, HttpServer};
