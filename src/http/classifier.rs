//! Outcome classification aware of axum errors.
//!
//! # Rules
//! 1. A recognized explicit status decides, exactly like the default policy.
//! 2. An [`HttpError`] decides by its own status (non-error statuses count
//!    as failure).
//! 3. Extractor rejections (JSON, query, path, form) are client errors:
//!    reject / s4xx.
//! 4. No failure: success / s2xx.
//! 5. Anything else: failure without a status group.

use axum::extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection};

use crate::http::HttpError;
use crate::measure::{MetricOutcome, MetricResult, StatusGroup};
use crate::model::Failure;
use crate::providers::{DefaultMetricOutcomeClassifier, MetricOutcomeClassifier, NONE};

#[derive(Debug, Clone, Copy, Default)]
pub struct HttpOutcomeClassifier;

impl MetricOutcomeClassifier for HttpOutcomeClassifier {
    fn classify(&self, status: Option<u16>, failure: Option<&Failure<'_>>) -> MetricOutcome {
        if status.and_then(StatusGroup::from_status).is_some() {
            return DefaultMetricOutcomeClassifier.classify(status, failure);
        }

        let Some(failure) = failure else {
            return MetricOutcome::new(MetricResult::Success)
                .with_status_group(Some(StatusGroup::S2xx))
                .with_exception(NONE);
        };
        let exception = failure.type_name();

        if let Some(err) = failure.downcast_ref::<HttpError>() {
            let group = StatusGroup::from_status(err.status().as_u16());
            let result = match group {
                Some(StatusGroup::S4xx) => MetricResult::Reject,
                _ => MetricResult::Failure,
            };
            return MetricOutcome::new(result)
                .with_status_group(group)
                .with_exception(exception);
        }

        if is_rejection(failure) {
            return MetricOutcome::new(MetricResult::Reject)
                .with_status_group(Some(StatusGroup::S4xx))
                .with_exception(exception);
        }

        MetricOutcome::new(MetricResult::Failure).with_exception(exception)
    }
}

fn is_rejection(failure: &Failure<'_>) -> bool {
    failure.downcast_ref::<JsonRejection>().is_some()
        || failure.downcast_ref::<QueryRejection>().is_some()
        || failure.downcast_ref::<PathRejection>().is_some()
        || failure.downcast_ref::<FormRejection>().is_some()
}
