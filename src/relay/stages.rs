//! Internal stage endpoints: plain REST access to scoping, research, and
//! geocoding, used by tooling and the frontend's map panel

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::RelayState;
use crate::domain::Requirements;

#[derive(Debug, Deserialize)]
pub struct ScopeRequest {
    pub message: String,
    #[serde(rename = "sessionId", alias = "session_id")]
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct ScopeResponse {
    pub reply: String,
    pub requirements: Requirements,
    /// True when the requirements record is complete
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_question: Option<String>,
}

/// `POST /chat` - run one scoping turn without triggering research
pub async fn scope(
    State(state): State<RelayState>,
    Json(request): Json<ScopeRequest>,
) -> Response {
    if request.message.trim().is_empty() || request.session_id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "message and sessionId are required" })),
        )
            .into_response();
    }

    let outcome = state
        .coordinator
        .scope_turn(&request.session_id, &request.message)
        .await;

    Json(ScopeResponse {
        reply: outcome.reply,
        requirements: outcome.requirements,
        ready: outcome.ready,
        general_question: outcome.general_question,
    })
    .into_response()
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub requirements: Requirements,
}

/// `POST /search` - run the research stage on a completed requirements record
pub async fn search(
    State(state): State<RelayState>,
    Json(request): Json<SearchRequest>,
) -> Response {
    if !request.requirements.is_complete() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "requirements are incomplete: budget, bedrooms, and location are required"
            })),
        )
            .into_response();
    }

    let result = state.coordinator.research_direct(&request.requirements).await;
    Json(result).into_response()
}

#[derive(Debug, Deserialize)]
pub struct VisualizeRequest {
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct VisualizeResponse {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// `POST /visualize` - forward-geocode an address for the map panel
pub async fn visualize(
    State(state): State<RelayState>,
    Json(request): Json<VisualizeRequest>,
) -> Response {
    let Some(geocoder) = &state.geocoder else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "geocoding is not configured" })),
        )
            .into_response();
    };

    match geocoder.geocode(&request.address).await {
        Ok(geocoded) => Json(VisualizeResponse {
            address: geocoded.full_address,
            latitude: geocoded.latitude,
            longitude: geocoded.longitude,
        })
        .into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}
