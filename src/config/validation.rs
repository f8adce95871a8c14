//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and addresses
//! - Check base tags survive the configured allow-list
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: OperationConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::OperationConfig;
use crate::measure::{MetricName, MetricNameError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("metrics.metric_name is invalid: {0}")]
    MetricName(#[from] MetricNameError),

    #[error("metrics.max_tag_count must be greater than 0")]
    ZeroTagCount,

    #[error("metrics.max_value_length must be greater than 0")]
    ZeroValueLength,

    #[error("metrics.exporter_address '{0}' is not a socket address")]
    ExporterAddress(String),

    #[error("metrics.base_tags key '{0}' is not in metrics.allowed_keys")]
    BaseTagNotAllowed(String),

    #[error("http.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("http.{0} must not be blank")]
    BlankHeader(&'static str),

    #[error("http.{0} '{1}' is not a valid header name")]
    InvalidHeader(&'static str, String),
}

pub fn validate_config(config: &OperationConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let metrics = &config.metrics;

    if let Err(e) = MetricName::new(metrics.metric_name.as_str()) {
        errors.push(ValidationError::from(e));
    }
    if metrics.max_tag_count == 0 {
        errors.push(ValidationError::ZeroTagCount);
    }
    if metrics.max_value_length == 0 {
        errors.push(ValidationError::ZeroValueLength);
    }
    if let Some(addr) = &metrics.exporter_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::ExporterAddress(addr.clone()));
        }
    }

    let policy = metrics.policy();
    for key in metrics.base_tags.keys() {
        if !policy.is_allowed(key) {
            errors.push(ValidationError::BaseTagNotAllowed(key.clone()));
        }
    }

    let http = &config.http;
    if http.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(http.bind_address.clone()));
    }
    for (field, value) in [
        ("issuer_header", &http.issuer_header),
        ("request_id_header", &http.request_id_header),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::BlankHeader(field));
        } else if HeaderName::try_from(value.as_str()).is_err() {
            errors.push(ValidationError::InvalidHeader(field, value.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
