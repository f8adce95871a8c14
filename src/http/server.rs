//! Demo HTTP server.
//!
//! # Responsibilities
//! - Create the axum Router with the item handlers
//! - Wire up middleware (operation scope, request id, tracing)
//! - Serve until the shutdown future resolves
//!
//! Handlers fetch the executor from [`AppState`] on every request, so a
//! reloaded configuration applies to the next request.

use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::OperationConfig;
use crate::executor::OperationExecutor;
use crate::http::{HttpError, OperationLayer};
use crate::invocation::ManagedInvocation;

const MAX_ITEM_ID: u64 = 1_000;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    executor: Arc<ArcSwap<OperationExecutor>>,
}

impl AppState {
    pub fn new(executor: OperationExecutor) -> Self {
        Self {
            executor: Arc::new(ArcSwap::from_pointee(executor)),
        }
    }

    pub fn executor(&self) -> Arc<OperationExecutor> {
        self.executor.load_full()
    }

    /// Swap in a new executor; requests already running keep the old one.
    pub fn replace(&self, executor: OperationExecutor) {
        self.executor.store(Arc::new(executor));
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    pub name: String,
}

/// HTTP server for the demo service.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a server wired from `config`.
    ///
    /// `config` is expected to have passed [`validate_config`]; an invalid
    /// request id header falls back to `x-request-id` with a warning.
    ///
    /// [`validate_config`]: crate::config::validate_config
    pub fn new(config: &OperationConfig) -> Self {
        let state = AppState::new(OperationExecutor::from_config(config));
        let request_id = HeaderName::try_from(config.http.request_id_header.as_str())
            .unwrap_or_else(|e| {
                tracing::warn!(
                    header = %config.http.request_id_header,
                    error = %e,
                    "Invalid request id header, using x-request-id"
                );
                HeaderName::from_static("x-request-id")
            });
        let router = build_router(state.clone(), OperationLayer::from_config(config), request_id);
        Self { router, state }
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState, operations: OperationLayer, request_id: HeaderName) -> Router {
    Router::new()
        .route("/items", post(create_item))
        .route("/items/{id}", get(get_item))
        .route("/items/{id}/explode", get(explode))
        .with_state(state)
        .layer(operations)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
}

async fn get_item(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<Item>, HttpError> {
    let executor = state.executor();
    let result = ManagedInvocation::new("ItemService", "find")
        .operation("items.find")
        .use_case("catalog")
        .run_async(&executor, |_ctx| async move { find_item(id) })
        .await?;
    Ok(Json(result.into_data()))
}

async fn create_item(
    State(state): State<AppState>,
    payload: Result<Json<NewItem>, JsonRejection>,
) -> Result<(StatusCode, Json<Item>), Response> {
    let executor = state.executor();
    let result = ManagedInvocation::new("ItemService", "create")
        .operation("items.create")
        .use_case("catalog")
        .event("item.created")
        .run(&executor, |ctx| {
            payload.map(|Json(new)| {
                ctx.set_message(format!("created '{}'", new.name));
                Item {
                    id: MAX_ITEM_ID + 1,
                    name: new.name,
                }
            })
        })
        .map_err(IntoResponse::into_response)?;
    Ok((StatusCode::CREATED, Json(result.data)))
}

async fn explode(State(state): State<AppState>, Path(id): Path<u64>) -> Json<Item> {
    let executor = state.executor();
    let result = ManagedInvocation::new("ItemService", "explode")
        .sync_scope(|| executor.call(|_ctx| -> Item { panic!("item {id} exploded") }));
    Json(result.data)
}

fn find_item(id: u64) -> Result<Item, HttpError> {
    match id {
        0 => Err(HttpError::bad_request("item id must be positive")),
        1..=MAX_ITEM_ID => Ok(Item {
            id,
            name: format!("item-{id}"),
        }),
        _ => Err(HttpError::not_found(format!("item {id} not found"))),
    }
}
