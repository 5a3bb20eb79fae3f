//! HTTP routes.
//!
//! `GET /chess/:opponent/` returns the board snapshot as JSON and
//! `POST /chess/:opponent/command` runs a chat command given as plain text.
//! Session calls block on the store and the engine, so they run on the
//! blocking pool.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chess_session::{dispatch, BoardSnapshot, Reply, SessionEngine, SessionError};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SessionEngine>,
    /// Link template answered to `board`
    pub board_url: Arc<str>,
}

impl AppState {
    pub fn new(engine: SessionEngine, board_url: &str) -> Self {
        Self {
            engine: Arc::new(engine),
            board_url: Arc::from(board_url),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/chess/:opponent", get(board))
        .route("/chess/:opponent/", get(board))
        .route("/chess/:opponent/command", post(command))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

enum ApiError {
    NotFound(String),
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            ),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

async fn board(
    State(state): State<AppState>,
    Path(opponent): Path<String>,
) -> Result<Json<BoardSnapshot>, ApiError> {
    let engine = Arc::clone(&state.engine);
    let lookup = opponent.clone();
    let result = tokio::task::spawn_blocking(move || engine.board(&lookup))
        .await
        .map_err(|e| {
            error!(%opponent, error = %e, "board task failed");
            ApiError::Internal
        })?;

    match result {
        Ok(session) => Ok(Json(BoardSnapshot::from_session(&session))),
        Err(e @ (SessionError::NoActiveGame(_) | SessionError::InvalidOpponent(_))) => {
            Err(ApiError::NotFound(e.to_string()))
        }
        Err(e) => {
            error!(%opponent, op = "board", error = %e, "board lookup failed");
            Err(ApiError::Internal)
        }
    }
}

async fn command(
    State(state): State<AppState>,
    Path(opponent): Path<String>,
    body: String,
) -> Result<Json<Reply>, ApiError> {
    let engine = Arc::clone(&state.engine);
    let board_url = Arc::clone(&state.board_url);
    let reply = tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = body.split_whitespace().collect();
        dispatch(&engine, &opponent, &args, &board_url)
    })
    .await
    .map_err(|e| {
        error!(error = %e, "command task failed");
        ApiError::Internal
    })?;
    Ok(Json(reply))
}
