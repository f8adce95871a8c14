//! Process-wide executor.
//!
//! Explicit injection of an [`OperationExecutor`] is preferred. This accessor
//! exists for call sites that cannot thread one through. Reads are lock-free
//! and always observe the latest [`Operations::configure`]; before any
//! configuration a default executor is built lazily.

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwapOption;

use crate::executor::OperationExecutor;
use crate::model::{OperationContext, OperationResult};

static CONFIGURED: ArcSwapOption<OperationExecutor> = ArcSwapOption::const_empty();
static FALLBACK: OnceLock<Arc<OperationExecutor>> = OnceLock::new();

/// Static facade over the current process-wide executor.
pub struct Operations;

impl Operations {
    /// Install `executor`. Last write wins.
    pub fn configure(executor: OperationExecutor) {
        CONFIGURED.store(Some(Arc::new(executor)));
        tracing::info!("Global operation executor configured");
    }

    /// Drop the configured executor; later reads use the default again.
    pub fn reset() {
        CONFIGURED.store(None);
    }

    pub fn is_configured() -> bool {
        CONFIGURED.load().is_some()
    }

    pub fn current() -> Arc<OperationExecutor> {
        match CONFIGURED.load_full() {
            Some(executor) => executor,
            None => FALLBACK
                .get_or_init(|| Arc::new(OperationExecutor::default()))
                .clone(),
        }
    }

    pub fn run<T, E, F>(work: F) -> Result<OperationResult<T>, E>
    where
        F: FnOnce(&OperationContext) -> Result<T, E>,
        T: fmt::Debug,
        E: Error + 'static,
    {
        Self::current().run(work)
    }

    pub fn call<T, F>(work: F) -> OperationResult<T>
    where
        F: FnOnce(&OperationContext) -> T,
        T: fmt::Debug,
    {
        Self::current().call(work)
    }

    pub async fn run_async<T, E, F, Fut>(work: F) -> Result<OperationResult<T>, E>
    where
        F: FnOnce(OperationContext) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: fmt::Debug,
        E: Error + 'static,
    {
        let executor = Self::current();
        executor.run_async(work).await
    }
}
