//! Tests for the internal stage endpoints, session inspection, and health

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use common::{app, oakland_hit};

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("GET")
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn scope_endpoint_returns_requirements_and_readiness() {
    let app = app(
        vec![json!({
            "reply": "What's your budget?",
            "general_question": null,
            "requirements": {"bedrooms": 2, "location": "Berkeley"},
        })
        .to_string()],
        Vec::new(),
        false,
    );

    let response = app
        .oneshot(post(
            "/chat",
            json!({"message": "2 bedrooms in Berkeley", "sessionId": "s1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["reply"], "What's your budget?");
    assert_eq!(body["ready"], false);
    assert_eq!(body["requirements"]["bedrooms"], 2);
}

#[tokio::test]
async fn search_endpoint_rejects_incomplete_requirements() {
    let app = app(Vec::new(), Vec::new(), false);

    let response = app
        .oneshot(post(
            "/search",
            json!({"requirements": {"location": "Oakland"}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn search_endpoint_runs_research_on_complete_requirements() {
    let app = app(
        vec![json!({
            "summary": "One craftsman matches.",
            "listings": [
                {"address": "500 29th St", "city": "Oakland", "price": 765000},
            ],
        })
        .to_string()],
        vec![oakland_hit()],
        false,
    );

    let response = app
        .oneshot(post(
            "/search",
            json!({"requirements": {
                "bedrooms": 3, "location": "Oakland", "budget_max": 800000
            }}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["search_summary"], "One craftsman matches.");
    assert_eq!(body["properties"][0]["price"], 765_000);
}

#[tokio::test]
async fn visualize_without_geocoder_is_unavailable() {
    let app = app(Vec::new(), Vec::new(), false);

    let response = app
        .oneshot(post("/visualize", json!({"address": "500 29th St, Oakland"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn visualize_geocodes_an_address() {
    let app = app(Vec::new(), Vec::new(), true);

    let response = app
        .oneshot(post("/visualize", json!({"address": "500 29th St, Oakland"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["latitude"], 37.8044);
    assert_eq!(body["longitude"], -122.2712);
    assert_eq!(body["address"], "500 29th St, Oakland");
}

#[tokio::test]
async fn sessions_are_listed_fetched_and_deleted() {
    let app = app(
        vec![json!({
            "reply": "Tell me more.",
            "general_question": null,
            "requirements": {},
        })
        .to_string()],
        Vec::new(),
        false,
    );

    // Create a session through the scoping endpoint.
    let response = app
        .clone()
        .oneshot(post(
            "/chat",
            json!({"message": "looking for a home", "sessionId": "s-visible"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get("/api/sessions")).await.unwrap();
    let body = body_json(response).await;
    let sessions = body.as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["session_id"], "s-visible");
    assert_eq!(sessions[0]["turn_count"], 2);

    let response = app
        .clone()
        .oneshot(get("/api/sessions/s-visible"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["turns"][0]["role"], "user");
    assert_eq!(body["turns"][0]["content"], "looking for a home");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/sessions/s-visible")
                .method("DELETE")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(get("/api/sessions/s-visible")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_endpoints_respond() {
    let app = app(Vec::new(), Vec::new(), false);

    for uri in ["/health", "/health/ready", "/health/live"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{} not OK", uri);
    }

    let response = app.oneshot(get("/health")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}
