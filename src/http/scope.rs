//! Request-local state shared by the layer, the recorder and the providers.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::MatchedPath;
use axum::http::{HeaderMap, Method, Request};

use crate::measure::MetricsContext;

pub const TRACEPARENT: &str = "traceparent";
pub const BAGGAGE: &str = "baggage";

tokio::task_local! {
    static REQUEST: Arc<RequestScope>;
}

/// Header names read when a request enters the layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeHeaders {
    pub request_id: String,
    pub issuer: String,
}

impl Default for ScopeHeaders {
    fn default() -> Self {
        Self {
            request_id: "x-request-id".to_string(),
            issuer: "x-issuer".to_string(),
        }
    }
}

/// Everything the pipeline needs to know about the request in flight.
///
/// Owned by a single request. The pending buffer is drained at most once;
/// `flushed` guards against a second drain and `thrown` defers the drain to
/// the error dispatch.
#[derive(Debug)]
pub struct RequestScope {
    method: Method,
    route: Option<String>,
    entrypoint: String,
    request_id: Option<String>,
    issuer: Option<String>,
    traceparent: Option<String>,
    baggage: Option<String>,
    pending: Mutex<Vec<MetricsContext>>,
    flushed: AtomicBool,
    thrown: AtomicBool,
}

impl RequestScope {
    pub fn new(method: Method, route: Option<String>) -> Self {
        let entrypoint = format!("{} {}", method, route.as_deref().unwrap_or("unmatched"));
        Self {
            method,
            route,
            entrypoint,
            request_id: None,
            issuer: None,
            traceparent: None,
            baggage: None,
            pending: Mutex::new(Vec::new()),
            flushed: AtomicBool::new(false),
            thrown: AtomicBool::new(false),
        }
    }

    /// Capture method, matched route and the configured headers.
    pub fn from_request<B>(req: &Request<B>, headers: &ScopeHeaders) -> Self {
        let route = req
            .extensions()
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_string());
        let mut scope = Self::new(req.method().clone(), route);
        if scope.route.is_none() {
            scope.entrypoint = format!("{} {}", scope.method, req.uri().path());
        }

        let map = req.headers();
        scope.request_id = header(map, &headers.request_id);
        scope.issuer = header(map, &headers.issuer);
        scope.traceparent = header(map, TRACEPARENT);
        scope.baggage = header(map, BAGGAGE);
        scope
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_traceparent(mut self, value: impl Into<String>) -> Self {
        self.traceparent = Some(value.into());
        self
    }

    pub fn with_baggage(mut self, value: impl Into<String>) -> Self {
        self.baggage = Some(value.into());
        self
    }

    /// Scope of the request currently being handled by this task.
    pub fn current() -> Option<Arc<RequestScope>> {
        REQUEST.try_with(Arc::clone).ok()
    }

    /// Run `fut` with `scope` as the current request.
    pub async fn enter<F: Future>(scope: Arc<RequestScope>, fut: F) -> F::Output {
        REQUEST.scope(scope, fut).await
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// `"GET /items/{id}"`, or the raw path when no route matched.
    pub fn entrypoint(&self) -> &str {
        &self.entrypoint
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    pub fn traceparent(&self) -> Option<&str> {
        self.traceparent.as_deref()
    }

    pub fn baggage(&self) -> Option<&str> {
        self.baggage.as_deref()
    }

    pub fn buffer(&self, ctx: MetricsContext) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ctx);
    }

    pub fn pending_len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub(crate) fn drain(&self) -> Vec<MetricsContext> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn mark_thrown(&self) {
        self.thrown.store(true, Ordering::SeqCst);
    }

    pub fn is_thrown(&self) -> bool {
        self.thrown.load(Ordering::SeqCst)
    }

    pub fn is_flushed(&self) -> bool {
        self.flushed.load(Ordering::SeqCst)
    }

    /// Set the flushed flag. Only the first caller gets `true`.
    pub(crate) fn begin_flush(&self) -> bool {
        self.flushed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

fn header(map: &HeaderMap, name: &str) -> Option<String> {
    map.get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
