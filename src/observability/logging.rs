//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the logging subsystem
//! - Log every finished operation at a configurable level
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Log level configurable via config and environment (`RUST_LOG` wins)

use std::fmt::Write;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, LogLevel, LoggingConfig};
use crate::model::{Failure, OperationContext};
use crate::providers::OperationListener;

/// Install the global subscriber.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
    }
}

macro_rules! log_at {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            LogLevel::Trace => tracing::trace!($($arg)+),
            LogLevel::Debug => tracing::debug!($($arg)+),
            LogLevel::Info => tracing::info!($($arg)+),
            LogLevel::Warn => tracing::warn!($($arg)+),
            LogLevel::Error => tracing::error!($($arg)+),
            LogLevel::None => {}
        }
    };
}

/// Logs one event per finished operation.
#[derive(Debug, Clone)]
pub struct LoggingListener {
    pretty: bool,
    success_level: LogLevel,
    failure_level: LogLevel,
}

impl LoggingListener {
    pub fn new(pretty: bool, success_level: LogLevel, failure_level: LogLevel) -> Self {
        Self {
            pretty,
            success_level,
            failure_level,
        }
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        Self::new(config.pretty, config.success_level, config.failure_level)
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::from_config(&LoggingConfig::default())
    }
}

impl OperationListener for LoggingListener {
    fn on_success(&self, ctx: &OperationContext) {
        if self.pretty {
            log_at!(self.success_level, "{}", render_pretty(ctx, None));
            return;
        }
        log_at!(
            self.success_level,
            correlation_id = %ctx.correlation_id,
            issuer = %ctx.issuer,
            entrypoint = %ctx.entrypoint,
            service = %ctx.service,
            function = %ctx.function,
            operation = %ctx.operation,
            use_case = %ctx.use_case,
            event = %ctx.event,
            duration_ms = ctx.duration_ms.unwrap_or_default(),
            message = ctx.message.as_deref().unwrap_or(""),
            response = ctx.response.as_deref().unwrap_or(""),
            trace_id = ctx.telemetry.trace_id.as_deref().unwrap_or(""),
            "Operation succeeded"
        );
    }

    fn on_failure(&self, ctx: &OperationContext, failure: &Failure<'_>) {
        if self.pretty {
            log_at!(self.failure_level, "{}", render_pretty(ctx, Some(failure)));
            return;
        }
        log_at!(
            self.failure_level,
            correlation_id = %ctx.correlation_id,
            issuer = %ctx.issuer,
            entrypoint = %ctx.entrypoint,
            service = %ctx.service,
            function = %ctx.function,
            operation = %ctx.operation,
            use_case = %ctx.use_case,
            event = %ctx.event,
            duration_ms = ctx.duration_ms.unwrap_or_default(),
            message = ctx.message.as_deref().unwrap_or(""),
            exception = failure.type_name(),
            error = %failure.message(),
            panicked = failure.is_panic(),
            trace_id = ctx.telemetry.trace_id.as_deref().unwrap_or(""),
            "Operation failed"
        );
    }
}

/// Boxed multi-line summary for humans reading a terminal.
pub fn render_pretty(ctx: &OperationContext, failure: Option<&Failure<'_>>) -> String {
    const RULE: &str = "───────────────────────────────────────────────────────";
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "┌{RULE}");
    let _ = writeln!(out, "│ {}", if failure.is_some() { "Failed" } else { "Success" });
    let _ = writeln!(out, "├─ Correlation : {}", ctx.correlation_id);
    let _ = writeln!(out, "├─ Issuer      : {}", ctx.issuer);
    let _ = writeln!(out, "├─ Entry Point : {}", ctx.entrypoint);
    let _ = writeln!(out, "├─ Service     : {}", ctx.service);
    let _ = writeln!(out, "├─ Function    : {}", ctx.function);
    let _ = writeln!(out, "├─ Operation   : {}", ctx.operation);
    let _ = writeln!(out, "├─ UseCase     : {}", ctx.use_case);
    let _ = writeln!(out, "├─ Event       : {}", ctx.event);
    let _ = writeln!(out, "├─ Attributes  : {:?}", ctx.attributes);
    let _ = writeln!(out, "├─ Message     : {}", ctx.message.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "├─ Response    : {}", ctx.response.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "├─ Performance : {}ms", ctx.duration_ms.unwrap_or_default());
    let _ = writeln!(out, "├─ Timestamp   : {}", ctx.timestamp);
    if let Some(trace_id) = &ctx.telemetry.trace_id {
        let _ = writeln!(out, "├─ Trace       : {trace_id}");
    }
    if let Some(failure) = failure {
        let _ = writeln!(out, "├─ Exception   : {}: {}", failure.type_name(), failure.message());
    }
    let _ = writeln!(out, "└{RULE}");
    out
}
