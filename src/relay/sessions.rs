//! Session inspection endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::RelayState;

/// `GET /api/sessions`
pub async fn list_sessions(State(state): State<RelayState>) -> Response {
    let summaries = state.coordinator.sessions().list().await;
    Json(summaries).into_response()
}

/// `GET /api/sessions/:id`
pub async fn get_session(
    State(state): State<RelayState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.coordinator.sessions().load(&session_id).await {
        Some(session) => Json(session).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Session not found: {}", session_id) })),
        )
            .into_response(),
    }
}

/// `DELETE /api/sessions/:id`
pub async fn delete_session(
    State(state): State<RelayState>,
    Path(session_id): Path<String>,
) -> Response {
    if state.coordinator.sessions().delete(&session_id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Session not found: {}", session_id) })),
        )
            .into_response()
    }
}
