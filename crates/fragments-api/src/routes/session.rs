//! Routes for playing sessions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{
    Json, Router,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use fragments_engine::application::command_handlers;
use fragments_engine::application::query_handlers::{self, HistoryView, SessionView};
use fragments_engine::domain::aggregates::Session;
use fragments_engine::domain::commands::{self, DragGesture};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /{session_id}/moves.
#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    /// Index of the fragment to move.
    pub from: usize,
    /// Index to move it to.
    pub to: usize,
}

fn view(session: &Session) -> Json<SessionView> {
    Json(SessionView::from(session))
}

/// POST /
#[instrument(skip(state))]
async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let command = commands::CreateSession {
        correlation_id: Uuid::new_v4(),
        session_id: Uuid::new_v4(),
    };

    info!(correlation_id = %command.correlation_id, session_id = %command.session_id, "handling create_session command");

    let session = command_handlers::handle_create_session(
        &command,
        state.scenario.clone(),
        &*state.sessions,
    )
    .await?;

    Ok((StatusCode::CREATED, view(&session)))
}

/// GET /{session_id}
#[instrument(skip(state))]
async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let view = query_handlers::get_session_by_id(session_id, &*state.sessions).await?;
    Ok(Json(view))
}

/// GET /{session_id}/history
#[instrument(skip(state))]
async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<HistoryView>, ApiError> {
    let history = query_handlers::get_history(session_id, &*state.sessions).await?;
    Ok(Json(history))
}

/// POST /{session_id}/start
#[instrument(skip(state))]
async fn start_game(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let command = commands::StartGame {
        correlation_id: Uuid::new_v4(),
        session_id,
    };

    info!(correlation_id = %command.correlation_id, "handling start_game command");

    let session = command_handlers::handle_start_game(&command, &*state.sessions).await?;
    Ok(view(&session))
}

/// POST /{session_id}/moves
#[instrument(skip(state, request), fields(from = request.from, to = request.to))]
async fn move_fragment(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let command = commands::MoveFragment {
        correlation_id: Uuid::new_v4(),
        session_id,
        from: request.from,
        to: request.to,
    };

    let session = command_handlers::handle_move_fragment(&command, &*state.sessions).await?;
    Ok(view(&session))
}

/// POST /{session_id}/gesture
#[instrument(skip(state))]
async fn apply_gesture(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(gesture): Json<DragGesture>,
) -> Result<Json<SessionView>, ApiError> {
    let command = commands::ApplyGesture {
        correlation_id: Uuid::new_v4(),
        session_id,
        gesture,
    };

    let session = command_handlers::handle_apply_gesture(&command, &*state.sessions).await?;
    Ok(view(&session))
}

/// POST /{session_id}/reset-order
#[instrument(skip(state))]
async fn reset_order(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let command = commands::ResetOrder {
        correlation_id: Uuid::new_v4(),
        session_id,
    };

    let session = command_handlers::handle_reset_order(&command, &*state.sessions).await?;
    Ok(view(&session))
}

/// POST /{session_id}/submit
#[instrument(skip(state))]
async fn submit_turn(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let command = commands::SubmitTurn {
        correlation_id: Uuid::new_v4(),
        session_id,
    };

    info!(correlation_id = %command.correlation_id, "handling submit_turn command");

    let session = command_handlers::handle_submit_turn(
        &command,
        state.oracle.clone(),
        state.clock.clone(),
        state.sessions.clone(),
    )
    .await?;
    Ok(view(&session))
}

/// POST /{session_id}/reset
#[instrument(skip(state))]
async fn reset_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let command = commands::ResetSession {
        correlation_id: Uuid::new_v4(),
        session_id,
    };

    info!(correlation_id = %command.correlation_id, "handling reset_session command");

    let session = command_handlers::handle_reset_session(&command, &*state.sessions).await?;
    Ok(view(&session))
}

/// Returns the router for sessions.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/{session_id}", get(get_session))
        .route("/{session_id}/history", get(get_history))
        .route("/{session_id}/start", post(start_game))
        .route("/{session_id}/moves", post(move_fragment))
        .route("/{session_id}/gesture", post(apply_gesture))
        .route("/{session_id}/reset-order", post(reset_order))
        .route("/{session_id}/submit", post(submit_turn))
        .route("/{session_id}/reset", post(reset_session))
}
