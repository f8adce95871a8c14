//! Backend-agnostic metrics model.
//!
//! # Data Flow
//! ```text
//! MetricsContextFactory::create()       (name, kind, policy, base tags)
//!     → inject MetricDescriptor, start timing
//!     → work runs
//!     → end(outcome)                    (outcome from the classifier)
//!     → MetricsEnricher::enrich         (outcome/http tags, re-normalized)
//!     → MetricsRecorder::record         (backend or per-request buffer)
//! ```
//!
//! # Design Decisions
//! - No backend types leak in here; recorders translate at the edge
//! - Every tag mutation passes through `MetricPolicy::normalize`
//! - Contexts are values; transitions return new instances

pub mod context;
pub mod name;
pub mod outcome;
pub mod policy;
pub mod tags;
pub mod timing;

pub use context::{MeasurementState, MetricDescriptor, MetricsContext};
pub use name::{MetricKind, MetricName, MetricNameError, DEFAULT_METRIC_NAME};
pub use outcome::{MetricOutcome, MetricResult, StatusGroup};
pub use policy::MetricPolicy;
pub use tags::{keys, MetricTags, MetricTagsBuilder};
pub use timing::{Clock, MetricTiming, SystemClock};
