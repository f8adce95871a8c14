//! Wall-clock timing of a measurement scope.

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of epoch-millisecond timestamps.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// [`Clock`] backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default()
    }
}

/// Start/end timestamps in epoch milliseconds.
///
/// Duration is defined only once both ends are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MetricTiming {
    pub started_at_epoch_millis: Option<i64>,
    pub ended_at_epoch_millis: Option<i64>,
}

impl MetricTiming {
    /// A timing already started at `clock`'s current time.
    pub fn started(clock: &dyn Clock) -> Self {
        Self {
            started_at_epoch_millis: Some(clock.now_millis()),
            ended_at_epoch_millis: None,
        }
    }

    pub fn start(self, clock: &dyn Clock) -> Self {
        Self {
            started_at_epoch_millis: Some(clock.now_millis()),
            ..self
        }
    }

    pub fn end(self, clock: &dyn Clock) -> Self {
        Self {
            ended_at_epoch_millis: Some(clock.now_millis()),
            ..self
        }
    }

    /// Elapsed milliseconds, never negative. `None` until both ends exist.
    pub fn duration_millis(&self) -> Option<u64> {
        match (self.started_at_epoch_millis, self.ended_at_epoch_millis) {
            (Some(start), Some(end)) => Some(end.saturating_sub(start).max(0) as u64),
            _ => None,
        }
    }
}
