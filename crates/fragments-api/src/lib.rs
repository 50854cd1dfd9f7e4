//! Fragments API — library surface shared by the server binary and the
//! integration tests.

use axum::Router;

pub mod error;
pub mod routes;
pub mod state;

/// Builds the application router with every route mounted.
pub fn build_router(state: state::AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/sessions", routes::session::router())
        .with_state(state)
}
