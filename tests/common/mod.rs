//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use operation_result::measure::MetricsContext;
use operation_result::model::{Failure, OperationContext};
use operation_result::providers::{MetricsRecorder, OperationListener};

/// Recorder that keeps every measurement it receives.
#[derive(Clone, Default)]
pub struct CapturingRecorder {
    recorded: Arc<Mutex<Vec<MetricsContext>>>,
}

impl CapturingRecorder {
    pub fn recorded(&self) -> Vec<MetricsContext> {
        self.recorded.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.recorded.lock().unwrap().len()
    }
}

impl MetricsRecorder for CapturingRecorder {
    fn record(&self, ctx: MetricsContext) {
        self.recorded.lock().unwrap().push(ctx);
    }
}

/// One listener notification.
#[derive(Debug, Clone)]
pub enum Notification {
    Success(OperationContext),
    Failure(OperationContext, String),
}

/// Listener that keeps every callback it receives.
#[derive(Clone, Default)]
pub struct RecordingListener {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingListener {
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn failures(&self) -> usize {
        self.notifications()
            .iter()
            .filter(|n| matches!(n, Notification::Failure(..)))
            .count()
    }

    pub fn successes(&self) -> usize {
        self.notifications()
            .iter()
            .filter(|n| matches!(n, Notification::Success(_)))
            .count()
    }
}

impl OperationListener for RecordingListener {
    fn on_success(&self, ctx: &OperationContext) {
        self.seen.lock().unwrap().push(Notification::Success(ctx.clone()));
    }

    fn on_failure(&self, ctx: &OperationContext, failure: &Failure<'_>) {
        self.seen
            .lock()
            .unwrap()
            .push(Notification::Failure(ctx.clone(), failure.type_name().to_string()));
    }
}
