//! Outermost request layer.
//!
//! # Data Flow
//! ```text
//! request
//!     → RequestScope::from_request (route, headers)
//!     → inner service, inside the scope, panics caught
//!         Ok(response)  → flush(Request, response status)
//!         panic         → mark thrown → flush(Request) skipped
//!                       → error dispatch: render 500 → flush(Error, 500)
//!         Err(e)        → error dispatch: flush(Error, 500) → Err(e)
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tower::{Layer, Service};

use crate::http::flush::{Dispatch, MetricsFlusher};
use crate::http::scope::{RequestScope, ScopeHeaders};
use crate::http::HttpError;
use crate::model::Failure;
use crate::providers::MetricsRecorder;

/// Installs a [`RequestScope`] around every request and flushes buffered
/// measurements once the final status is known.
#[derive(Clone)]
pub struct OperationLayer {
    flusher: MetricsFlusher,
    headers: Arc<ScopeHeaders>,
}

impl OperationLayer {
    pub fn new(backend: Arc<dyn MetricsRecorder>) -> Self {
        Self {
            flusher: MetricsFlusher::new(backend),
            headers: Arc::new(ScopeHeaders::default()),
        }
    }

    pub fn with_headers(mut self, headers: ScopeHeaders) -> Self {
        self.headers = Arc::new(headers);
        self
    }
}

impl<S> Layer<S> for OperationLayer {
    type Service = OperationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        OperationService {
            inner,
            flusher: self.flusher.clone(),
            headers: self.headers.clone(),
        }
    }
}

#[derive(Clone)]
pub struct OperationService<S> {
    inner: S,
    flusher: MetricsFlusher,
    headers: Arc<ScopeHeaders>,
}

impl<S, B> Service<Request<B>> for OperationService<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let scope = Arc::new(RequestScope::from_request(&req, &self.headers));
        let flusher = self.flusher.clone();

        // The readied service handles this request; a fresh clone takes its place.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let handled = RequestScope::enter(
                scope.clone(),
                AssertUnwindSafe(async move { inner.call(req).await }).catch_unwind(),
            )
            .await;

            match handled {
                Ok(Ok(response)) => {
                    flusher.flush(&scope, Dispatch::Request, response.status());
                    Ok(response)
                }
                Ok(Err(err)) => {
                    scope.mark_thrown();
                    error_dispatch(&scope, &flusher, StatusCode::INTERNAL_SERVER_ERROR).await;
                    Err(err)
                }
                Err(payload) => {
                    scope.mark_thrown();
                    let message = Failure::from_panic(payload.as_ref()).message();
                    tracing::error!(
                        entrypoint = %scope.entrypoint(),
                        request_id = scope.request_id().unwrap_or("-"),
                        panic = %message,
                        "Handler panicked, rendering 500"
                    );
                    flusher.flush(&scope, Dispatch::Request, StatusCode::INTERNAL_SERVER_ERROR);

                    let response = HttpError::internal("internal server error").into_response();
                    error_dispatch(&scope, &flusher, response.status()).await;
                    Ok(response)
                }
            }
        })
    }
}

/// Second pass over a failed request, run inside the same scope.
async fn error_dispatch(scope: &Arc<RequestScope>, flusher: &MetricsFlusher, status: StatusCode) {
    RequestScope::enter(scope.clone(), async {
        flusher.flush(scope, Dispatch::Error, status);
    })
    .await;
}
