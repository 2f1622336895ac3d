//! Integration tests for health and liveness endpoints.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::DateTime;
use ledgerhook_api::{
    create_router, middleware::auth::SharedSecret, server::AppState, store::mock::RecordingStore,
};
use ledgerhook_core::TestClock;
use serde_json::Value;
use tower::ServiceExt;

fn test_app(store: Arc<RecordingStore>) -> Router {
    let now = DateTime::from_timestamp(1_720_000_000, 0).expect("valid timestamp");
    let clock = Arc::new(TestClock::frozen_at(now));
    let state = AppState::new(store, SharedSecret::new("test-secret"), clock);
    create_router(state, Duration::from_secs(5))
}

async fn get(app: Router, uri: &str) -> axum::response::Response {
    let request = Request::builder().uri(uri).body(Body::empty()).expect("build request");
    app.oneshot(request).await.expect("execute request")
}

#[tokio::test]
async fn health_reports_healthy_store() {
    let store = Arc::new(RecordingStore::new());
    let response = get(test_app(store), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let body =
        axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("read response body");
    let json: Value = serde_json::from_slice(&body).expect("parse response json");

    assert_eq!(json["status"], "healthy");
    assert_eq!(json["checks"]["store"]["status"], "up");
}

#[tokio::test]
async fn health_reports_unhealthy_store() {
    let store = Arc::new(RecordingStore::new());
    store.set_unhealthy();
    let response = get(test_app(store), "/health").await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body =
        axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("read response body");
    let json: Value = serde_json::from_slice(&body).expect("parse response json");

    assert_eq!(json["status"], "unhealthy");
    assert_eq!(json["checks"]["store"]["status"], "down");
    assert!(json["checks"]["store"]["message"].is_string());
}

#[tokio::test]
async fn liveness_does_not_touch_the_store() {
    let store = Arc::new(RecordingStore::new());
    store.set_unhealthy();
    let response = get(test_app(store), "/live").await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_does_not_require_the_webhook_secret() {
    let store = Arc::new(RecordingStore::new());
    let response = get(test_app(store), "/health").await;

    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
}
