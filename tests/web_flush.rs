//! Request-scoped metric buffering through the real router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderName, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use operation_result::http::{
    build_router, AppState, HttpMetricsEnricher, HttpOutcomeClassifier, OperationLayer,
    RequestIdCorrelationProvider, RoutingMetricsRecorder, ScopedIssuerProvider,
};
use operation_result::invocation::ScopedInvocationInfoProvider;
use operation_result::measure::keys;
use operation_result::OperationExecutor;

mod common;

use common::{CapturingRecorder, Notification, RecordingListener};

struct Harness {
    router: Router,
    recorder: CapturingRecorder,
    listener: RecordingListener,
}

fn harness() -> Harness {
    let recorder = CapturingRecorder::default();
    let listener = RecordingListener::default();

    let executor = OperationExecutor::builder()
        .invocation_info_provider(ScopedInvocationInfoProvider::default())
        .issuer_provider(ScopedIssuerProvider)
        .correlation_id_provider(RequestIdCorrelationProvider)
        .listener(listener.clone())
        .outcome_classifier(HttpOutcomeClassifier)
        .metrics_enricher(HttpMetricsEnricher)
        .metrics_recorder(RoutingMetricsRecorder::new(Arc::new(recorder.clone())))
        .build();

    let router = build_router(
        AppState::new(executor),
        OperationLayer::new(Arc::new(recorder.clone())),
        HeaderName::from_static("x-request-id"),
    );

    Harness {
        router,
        recorder,
        listener,
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_found_item_flushes_success_with_route() {
    let h = harness();

    let response = h.router.oneshot(get("/items/7")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let recorded = h.recorder.recorded();
    assert_eq!(recorded.len(), 1);
    let tags = recorded[0].tags();
    assert_eq!(tags.get(keys::RESULT), Some("success"));
    assert_eq!(tags.get(keys::STATUS_GROUP), Some("s2xx"));
    assert_eq!(tags.get(keys::HTTP_STATUS), Some("200"));
    assert_eq!(tags.get(keys::HTTP_METHOD), Some("get"));
    assert_eq!(tags.get(keys::HTTP_ROUTE), Some("/items/{id}"));
    assert_eq!(tags.get(keys::OPERATION), Some("items.find"));
}

#[tokio::test]
async fn test_missing_item_flushes_exactly_one_reject() {
    let h = harness();

    let response = h.router.oneshot(get("/items/5000")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let recorded = h.recorder.recorded();
    assert_eq!(recorded.len(), 1);
    let tags = recorded[0].tags();
    assert_eq!(tags.get(keys::RESULT), Some("reject"));
    assert_eq!(tags.get(keys::STATUS_GROUP), Some("s4xx"));
    assert_eq!(tags.get(keys::HTTP_STATUS), Some("404"));
    assert_eq!(tags.get(keys::EXCEPTION), Some("httperror"));
    assert_eq!(h.listener.failures(), 1);
}

#[tokio::test]
async fn test_panicking_handler_renders_500_and_flushes_once() {
    let h = harness();

    let response = h.router.oneshot(get("/items/7/explode")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let recorded = h.recorder.recorded();
    assert_eq!(recorded.len(), 1);
    let tags = recorded[0].tags();
    assert_eq!(tags.get(keys::RESULT), Some("failure"));
    assert_eq!(tags.get(keys::STATUS_GROUP), Some("s5xx"));
    assert_eq!(tags.get(keys::HTTP_STATUS), Some("500"));
    assert_eq!(tags.get(keys::EXCEPTION), Some("panic"));
}

#[tokio::test]
async fn test_body_rejection_is_classified_as_reject() {
    let h = harness();

    let request = Request::builder()
        .method("POST")
        .uri("/items")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = h.router.oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());

    let recorded = h.recorder.recorded();
    assert_eq!(recorded.len(), 1);
    let tags = recorded[0].tags();
    assert_eq!(tags.get(keys::RESULT), Some("reject"));
    assert_eq!(tags.get(keys::STATUS_GROUP), Some("s4xx"));
    assert_eq!(tags.get(keys::EVENT), Some("item.created"));
}

#[tokio::test]
async fn test_created_item_carries_work_message() {
    let h = harness();

    let request = Request::builder()
        .method("POST")
        .uri("/items")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name":"lamp"}"#))
        .unwrap();
    let response = h.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    match &h.listener.notifications()[0] {
        Notification::Success(ctx) => {
            assert_eq!(ctx.message.as_deref(), Some("created 'lamp'"));
            assert_eq!(ctx.operation, "items.create");
        }
        other => panic!("unexpected notification: {other:?}"),
    }
    assert_eq!(h.recorder.recorded()[0].tags().get(keys::HTTP_STATUS), Some("201"));
}

#[tokio::test]
async fn test_request_headers_flow_into_context() {
    let h = harness();

    let request = Request::builder()
        .uri("/items/3")
        .header("x-request-id", "req-123")
        .header("x-issuer", "billing-service")
        .body(Body::empty())
        .unwrap();
    let response = h.router.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-123");

    match &h.listener.notifications()[0] {
        Notification::Success(ctx) => {
            assert_eq!(ctx.correlation_id, "req-123");
            assert_eq!(ctx.issuer, "billing-service");
            assert_eq!(ctx.entrypoint, "GET /items/{id}");
            assert_eq!(ctx.service, "ItemService");
        }
        other => panic!("unexpected notification: {other:?}"),
    }
}

#[test]
fn test_execution_outside_a_request_records_immediately() {
    let recorder = CapturingRecorder::default();
    let executor = OperationExecutor::builder()
        .metrics_recorder(RoutingMetricsRecorder::new(Arc::new(recorder.clone())))
        .build();

    executor.call(|_| "background job");

    let recorded = recorder.recorded();
    assert_eq!(recorded.len(), 1);
    assert!(recorded[0].tags().get(keys::HTTP_STATUS).is_none());
}
