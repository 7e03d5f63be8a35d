//! # Hestia - Conversational Real-Estate Search Service
//!
//! Hestia relays chat turns between a browser client and two classes of
//! remote APIs: an OpenAI-compatible chat-completions endpoint and a web
//! search endpoint. Each session walks a fixed state machine (gather
//! requirements, trigger search, return results) and progress streams back
//! to the client as newline-delimited JSON.
//!
//! ## Architecture
//!
//! - **Domain**: requirements, listings, progress events
//! - **Agents**: LLM/search/geo/scrape clients and the scoping, general,
//!   and research stages, sequenced by the coordinator
//! - **Session**: in-memory per-session state with FIFO turn serialization
//! - **Relay**: axum handlers exposing the coordinator over HTTP

pub mod agents;
pub mod cli;
pub mod config;
pub mod domain;
pub mod relay;
pub mod session;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use crate::relay::health::HealthHandler;
use crate::relay::RelayState;

/// Creates the axum application router with all endpoints configured.
///
/// # Arguments
///
/// * `state` - coordinator plus the optional geocoder
/// * `health_handler` - health check handler
///
/// # Returns
///
/// Configured axum Router
pub fn create_app(state: RelayState, health_handler: Arc<HealthHandler>) -> Router {
    let health_router = Router::new()
        .route(
            "/health",
            get({
                let handler = health_handler.clone();
                move || {
                    let h = handler.clone();
                    async move { h.health().await }
                }
            }),
        )
        .route(
            "/health/ready",
            get({
                let handler = health_handler.clone();
                move || {
                    let h = handler.clone();
                    async move { h.ready().await }
                }
            }),
        )
        .route(
            "/health/live",
            get({
                let handler = health_handler.clone();
                move || {
                    let h = handler.clone();
                    async move { h.live().await }
                }
            }),
        );

    let api_router = Router::new()
        // Streaming chat relay
        .route("/api/chat", post(relay::chat::chat))
        // Session inspection
        .route("/api/sessions", get(relay::sessions::list_sessions))
        .route(
            "/api/sessions/:id",
            get(relay::sessions::get_session).delete(relay::sessions::delete_session),
        )
        // Internal stage endpoints
        .route("/chat", post(relay::stages::scope))
        .route("/search", post(relay::stages::search))
        .route("/visualize", post(relay::stages::visualize))
        .with_state(state);

    health_router.merge(api_router).layer(
        tower_http::cors::CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
    )
}
