use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::future::Future;

use crate::executor::OperationExecutor;
use crate::model::{OperationContext, OperationResult};

/// Label for use case or event when none was declared.
pub const NOT_DECLARED: &str = "none";

tokio::task_local! {
    static CURRENT: ManagedInvocation;
}

/// Service-level labels for the code running inside a scope.
///
/// ```ignore
/// let item = ManagedInvocation::new("ItemService", "find")
///     .operation("items.find")
///     .use_case("catalog")
///     .scope(async { executor.run_async(|_| lookup(id)).await })
///     .await;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedInvocation {
    service: String,
    function: String,
    operation: Option<String>,
    use_case: Option<String>,
    event: Option<String>,
    attributes: BTreeMap<String, String>,
}

impl ManagedInvocation {
    pub fn new(service: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            function: function.into(),
            operation: None,
            use_case: None,
            event: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = non_blank(operation.into());
        self
    }

    pub fn use_case(mut self, use_case: impl Into<String>) -> Self {
        self.use_case = non_blank(use_case.into());
        self
    }

    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.event = non_blank(event.into());
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    /// Declared operation, or `Service#function`.
    pub fn resolved_operation(&self) -> String {
        match &self.operation {
            Some(op) => op.clone(),
            None => format!("{}#{}", self.service, self.function),
        }
    }

    pub fn resolved_use_case(&self) -> &str {
        self.use_case.as_deref().unwrap_or(NOT_DECLARED)
    }

    pub fn resolved_event(&self) -> &str {
        self.event.as_deref().unwrap_or(NOT_DECLARED)
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// The innermost active scope, if any.
    pub fn current() -> Option<ManagedInvocation> {
        CURRENT.try_with(Clone::clone).ok()
    }

    /// Run `fut` with this invocation active.
    pub async fn scope<F: Future>(self, fut: F) -> F::Output {
        CURRENT.scope(self, fut).await
    }

    /// Run `f` synchronously with this invocation active.
    pub fn sync_scope<R>(self, f: impl FnOnce() -> R) -> R {
        CURRENT.sync_scope(self, f)
    }

    /// `executor.run(work)` inside this scope.
    pub fn run<T, E, F>(self, executor: &OperationExecutor, work: F) -> Result<OperationResult<T>, E>
    where
        F: FnOnce(&OperationContext) -> Result<T, E>,
        T: fmt::Debug,
        E: Error + 'static,
    {
        self.sync_scope(|| executor.run(work))
    }

    /// `executor.run_async(work)` inside this scope.
    pub async fn run_async<T, E, F, Fut>(
        self,
        executor: &OperationExecutor,
        work: F,
    ) -> Result<OperationResult<T>, E>
    where
        F: FnOnce(OperationContext) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: fmt::Debug,
        E: Error + 'static,
    {
        self.scope(executor.run_async(work)).await
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
