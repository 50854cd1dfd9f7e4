//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use fragments_core::clock::Clock;
use fragments_core::oracle::{NarrativeOracle, ProposedFragment, TurnResponse, VitalsMap};
use fragments_engine::application::repository::InMemorySessionRepository;
use fragments_engine::domain::scenario::Scenario;
use fragments_test_support::FixedClock;
use http_body_util::BodyExt;
use tower::ServiceExt;

use fragments_api::state::AppState;

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock::default())
}

/// Build the full app router over a fresh in-memory session store, the
/// built-in scenario and the given oracle. Clone the returned router to send
/// several requests against the same sessions.
pub fn build_test_app(oracle: impl NarrativeOracle + 'static) -> Router {
    let app_state = AppState::new(
        Arc::new(Scenario::default()),
        fixed_clock(),
        Arc::new(oracle),
        Arc::new(InMemorySessionRepository::new()),
    );
    fragments_api::build_router(app_state)
}

/// A well-formed turn answer moving happiness by `change`.
pub fn turn(change: i32, interpretation: &str) -> TurnResponse {
    TurnResponse {
        vitals_delta: VitalsMap::from([("happiness".to_owned(), change)]),
        interpretation: interpretation.to_owned(),
        next_fragments: vec![
            ProposedFragment::new("The kettle clicks off.", false),
            ProposedFragment::new(
                "Every silence between us has a shape, and tonight it looks like a door.",
                true,
            ),
            ProposedFragment::new("Knock.", false),
            ProposedFragment::new("Or don't.", false),
        ],
        tone: Some("tender".to_owned()),
        ..TurnResponse::default()
    }
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a POST request without a body and return the response.
pub async fn post_empty(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    post_json(app, uri, &serde_json::Value::Null).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Create a session and start it; returns the session id.
pub async fn start_session(app: &Router) -> String {
    let (status, json) = post_empty(app.clone(), "/api/v1/sessions").await;
    assert_eq!(status, StatusCode::CREATED);
    let session_id = json["session_id"].as_str().unwrap().to_owned();

    let (status, json) =
        post_empty(app.clone(), &format!("/api/v1/sessions/{session_id}/start")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "playing");

    session_id
}
