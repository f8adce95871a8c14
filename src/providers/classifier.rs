//! Outcome classification.
//!
//! # Rules (default policy, in priority order)
//! 1. A recognized status code decides: 5xx → failure, 4xx → reject,
//!    2xx/3xx → success. Unrecognized codes fall through.
//! 2. Otherwise: no failure → success, any failure → failure.
//!
//! A failure without a status never becomes a reject here. Adapters that can
//! recognize client-side errors plug in their own classifier.

use crate::measure::{MetricOutcome, MetricResult, StatusGroup};
use crate::model::Failure;

/// Exception tag value when nothing failed.
pub const NONE: &str = "none";

/// Maps raw execution signals to a bounded outcome.
pub trait MetricOutcomeClassifier: Send + Sync {
    fn classify(&self, status: Option<u16>, failure: Option<&Failure<'_>>) -> MetricOutcome;
}

impl<F> MetricOutcomeClassifier for F
where
    F: Fn(Option<u16>, Option<&Failure<'_>>) -> MetricOutcome + Send + Sync,
{
    fn classify(&self, status: Option<u16>, failure: Option<&Failure<'_>>) -> MetricOutcome {
        self(status, failure)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMetricOutcomeClassifier;

impl MetricOutcomeClassifier for DefaultMetricOutcomeClassifier {
    fn classify(&self, status: Option<u16>, failure: Option<&Failure<'_>>) -> MetricOutcome {
        let exception = failure.map(|f| f.type_name()).unwrap_or(NONE);
        let group = status.and_then(StatusGroup::from_status);

        let result = match group {
            Some(StatusGroup::S5xx) => MetricResult::Failure,
            Some(StatusGroup::S4xx) => MetricResult::Reject,
            Some(StatusGroup::S2xx | StatusGroup::S3xx) => MetricResult::Success,
            None if failure.is_some() => MetricResult::Failure,
            None => MetricResult::Success,
        };

        MetricOutcome::new(result)
            .with_status_group(group)
            .with_exception(exception)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Timeout;

    impl fmt::Display for Timeout {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "timed out")
        }
    }

    impl std::error::Error for Timeout {}

    fn classify(status: Option<u16>, failure: Option<&Failure<'_>>) -> MetricOutcome {
        DefaultMetricOutcomeClassifier.classify(status, failure)
    }

    #[test]
    fn test_status_decides() {
        let ok = classify(Some(200), None);
        assert_eq!(ok.result, MetricResult::Success);
        assert_eq!(ok.status_group, Some(StatusGroup::S2xx));
        assert_eq!(ok.exception.as_deref(), Some("none"));

        let redirect = classify(Some(302), None);
        assert_eq!(redirect.result, MetricResult::Success);
        assert_eq!(redirect.status_group, Some(StatusGroup::S3xx));

        let not_found = classify(Some(404), None);
        assert_eq!(not_found.result, MetricResult::Reject);
        assert_eq!(not_found.status_group, Some(StatusGroup::S4xx));
    }

    #[test]
    fn test_server_error_with_failure() {
        let err = Timeout;
        let failure = Failure::from_error(&err);
        let outcome = classify(Some(500), Some(&failure));
        assert_eq!(outcome.result, MetricResult::Failure);
        assert_eq!(outcome.status_group, Some(StatusGroup::S5xx));
        assert_eq!(outcome.exception.as_deref(), Some("Timeout"));
    }

    #[test]
    fn test_no_status() {
        assert_eq!(classify(None, None).result, MetricResult::Success);
        assert_eq!(classify(None, None).status_group, None);

        let err = Timeout;
        let failure = Failure::from_error(&err);
        assert_eq!(classify(None, Some(&failure)).result, MetricResult::Failure);
    }

    #[test]
    fn test_unrecognized_status_falls_through() {
        assert_eq!(classify(Some(100), None).result, MetricResult::Success);
        assert_eq!(classify(Some(100), None).status_group, None);

        let err = Timeout;
        let failure = Failure::from_error(&err);
        assert_eq!(classify(Some(700), Some(&failure)).result, MetricResult::Failure);
    }
}
