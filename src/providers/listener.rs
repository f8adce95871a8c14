//! Lifecycle callbacks.
//!
//! # Design Decisions
//! - Both hooks default to no-ops so listeners implement only what they need
//! - The composite isolates each delegate: a panicking delegate is logged
//!   and the remaining delegates still run

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::model::{Failure, OperationContext};

pub trait OperationListener: Send + Sync {
    fn on_success(&self, _ctx: &OperationContext) {}

    fn on_failure(&self, _ctx: &OperationContext, _failure: &Failure<'_>) {}
}

impl<T: OperationListener + ?Sized> OperationListener for Arc<T> {
    fn on_success(&self, ctx: &OperationContext) {
        (**self).on_success(ctx)
    }

    fn on_failure(&self, ctx: &OperationContext, failure: &Failure<'_>) {
        (**self).on_failure(ctx, failure)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopOperationListener;

impl OperationListener for NoopOperationListener {}

/// Fans out to every registered listener in registration order.
#[derive(Clone, Default)]
pub struct CompositeOperationListener {
    delegates: Vec<Arc<dyn OperationListener>>,
}

impl CompositeOperationListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, listener: impl OperationListener + 'static) -> Self {
        self.delegates.push(Arc::new(listener));
        self
    }

    pub fn push(&mut self, listener: Arc<dyn OperationListener>) {
        self.delegates.push(listener);
    }

    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }
}

impl OperationListener for CompositeOperationListener {
    fn on_success(&self, ctx: &OperationContext) {
        for (index, delegate) in self.delegates.iter().enumerate() {
            if catch_unwind(AssertUnwindSafe(|| delegate.on_success(ctx))).is_err() {
                tracing::error!(
                    listener = index,
                    correlation_id = %ctx.correlation_id,
                    "Operation listener panicked in on_success"
                );
            }
        }
    }

    fn on_failure(&self, ctx: &OperationContext, failure: &Failure<'_>) {
        for (index, delegate) in self.delegates.iter().enumerate() {
            if catch_unwind(AssertUnwindSafe(|| delegate.on_failure(ctx, failure))).is_err() {
                tracing::error!(
                    listener = index,
                    correlation_id = %ctx.correlation_id,
                    "Operation listener panicked in on_failure"
                );
            }
        }
    }
}
