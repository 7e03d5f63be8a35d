//! Streaming chat relay: one NDJSON line per progress event, terminated by
//! a single `complete` event
//!
//! No resumption semantics: a dropped connection loses any events that have
//! not reached the client, and the in-flight turn still runs to completion
//! server-side.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::RelayState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Opaque session key; a fresh one is minted when absent
    #[serde(rename = "sessionId", alias = "session_id", default)]
    pub session_id: String,
}

/// `POST /api/chat`
pub async fn chat(State(state): State<RelayState>, Json(request): Json<ChatRequest>) -> Response {
    if request.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "message must not be empty" })),
        )
            .into_response();
    }

    let session_id = if request.session_id.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        request.session_id
    };

    let events = state
        .coordinator
        .handle_message(session_id, request.message);

    let body = Body::from_stream(events.map(|event| {
        serde_json::to_string(&event).map(|mut line| {
            line.push('\n');
            Bytes::from(line)
        })
    }));

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        body,
    )
        .into_response()
}
