//! Integration tests for the health endpoint.

mod common;

use axum::http::StatusCode;
use fragments_test_support::ScriptedOracle;

#[tokio::test]
async fn test_health_returns_200_with_status_ok() {
    let app = common::build_test_app(ScriptedOracle::new());

    let (status, json) = common::get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["scenario"], "Fragments of Her Heart");
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = common::build_test_app(ScriptedOracle::new());

    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/api/v1/nonexistent")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
