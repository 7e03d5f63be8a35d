//! End-to-end tests for the streaming chat relay

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use common::{app, oakland_hit};

fn scoping_payload(reply: &str, requirements: Value) -> String {
    json!({
        "reply": reply,
        "general_question": null,
        "requirements": requirements,
    })
    .to_string()
}

fn digest_payload() -> String {
    json!({
        "summary": "A great craftsman on 29th Street fits your search.",
        "listings": [
            {"address": "500 29th St", "city": "Oakland", "price": 765000,
             "bedrooms": 3, "bathrooms": 2, "sqft": 1500,
             "description": "Craftsman near the park",
             "url": "https://www.redfin.com/CA/Oakland/500-29th-St-94609"},
        ],
    })
    .to_string()
}

fn chat_request(message: &str, session_id: &str) -> Request<Body> {
    Request::builder()
        .uri("/api/chat")
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(
            json!({ "message": message, "sessionId": session_id }).to_string(),
        ))
        .unwrap()
}

/// Read an NDJSON body into parsed event values
async fn read_events(response: axum::response::Response) -> Vec<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    text.lines()
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_str(line).expect("each line is one JSON value"))
        .collect()
}

#[tokio::test]
async fn streams_progress_then_single_complete() {
    let app = app(
        vec![
            scoping_payload(
                "On it.",
                json!({"bedrooms": 3, "bathrooms": 2, "location": "Oakland", "budget_max": 800000}),
            ),
            digest_payload(),
        ],
        vec![oakland_hit()],
        false,
    );

    let response = app
        .oneshot(chat_request("3 bed 2 bath in Oakland under $800k", "s1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/x-ndjson"
    );

    let events = read_events(response).await;
    assert!(events.len() >= 2);

    let complete_count = events
        .iter()
        .filter(|e| e["type"] == "complete")
        .count();
    assert_eq!(complete_count, 1);
    assert_eq!(events.last().unwrap()["type"], "complete");

    for event in &events[..events.len() - 1] {
        assert!(
            event["type"] == "progress" || event["type"] == "error",
            "unexpected event before terminal: {}",
            event
        );
        assert!(event["agent"].is_string());
        assert!(event["message"].is_string());
    }

    let result = &events.last().unwrap()["result"];
    assert_eq!(result["properties"][0]["address"], "500 29th St");
    assert_eq!(result["total_found"], 1);
}

#[tokio::test]
async fn oakland_example_accumulates_across_turns() {
    let app = app(
        vec![
            scoping_payload(
                "On it.",
                json!({"bedrooms": 3, "location": "Oakland", "budget_max": 800000}),
            ),
            digest_payload(),
            scoping_payload(
                "Noted, refining the search.",
                json!({"bathrooms": 2, "additional_info": "good schools"}),
            ),
            digest_payload(),
        ],
        vec![oakland_hit()],
        false,
    );

    // Turn 1: budget, bedrooms, and location are enough to research.
    let response = app
        .clone()
        .oneshot(chat_request("3 bedrooms in Oakland, budget $800k", "s1"))
        .await
        .unwrap();
    let events = read_events(response).await;
    let result = &events.last().unwrap()["result"];
    assert_eq!(result["requirements"]["bedrooms"], 3);
    assert_eq!(result["requirements"]["location"], "Oakland");
    assert!(result["requirements"].get("bathrooms").is_none());

    // Turn 2: bathrooms arrive; fields from turn 1 survive untouched.
    let response = app
        .oneshot(chat_request("2 bathrooms, good schools", "s1"))
        .await
        .unwrap();
    let events = read_events(response).await;
    let result = &events.last().unwrap()["result"];
    let requirements = &result["requirements"];
    assert_eq!(requirements["bedrooms"], 3);
    assert_eq!(requirements["bathrooms"], 2);
    assert_eq!(requirements["location"], "Oakland");
    assert_eq!(requirements["budget_max"], 800_000);
    assert_eq!(requirements["additional_info"], "good schools");
    assert!(!result["properties"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn empty_search_still_completes_with_placeholders() {
    let app = app(
        vec![scoping_payload(
            "Searching now.",
            json!({"bedrooms": 2, "location": "Alameda", "budget_max": 900000}),
        )],
        Vec::new(),
        false,
    );

    let response = app
        .oneshot(chat_request("2 beds in Alameda under 900k", "s1"))
        .await
        .unwrap();
    let events = read_events(response).await;
    let result = &events.last().unwrap()["result"];

    let summary = result["search_summary"].as_str().unwrap();
    assert!(!summary.is_empty());
    let properties = result["properties"].as_array().unwrap();
    assert!(!properties.is_empty());
    assert_eq!(properties[0]["city"], "Alameda");
}

#[tokio::test]
async fn enrichment_adds_coordinates_when_geocoder_configured() {
    let app = app(
        vec![
            scoping_payload(
                "On it.",
                json!({"bedrooms": 3, "location": "Oakland", "budget_max": 800000}),
            ),
            digest_payload(),
        ],
        vec![oakland_hit()],
        true,
    );

    let response = app
        .oneshot(chat_request("3 beds Oakland 800k", "s1"))
        .await
        .unwrap();
    let events = read_events(response).await;
    let result = &events.last().unwrap()["result"];

    let listing = &result["properties"][0];
    assert_eq!(listing["latitude"], 37.8044);
    assert!(!listing["pois"].as_array().unwrap().is_empty());
    assert_eq!(result["top_result_coordinates"]["latitude"], 37.8044);
}

#[tokio::test]
async fn rejects_empty_message() {
    let app = app(Vec::new(), Vec::new(), false);

    let response = app
        .oneshot(chat_request("   ", "s1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn llm_outage_yields_recoverable_reply() {
    // Script exhausted immediately: every LLM call fails.
    let app = app(Vec::new(), vec![oakland_hit()], false);

    let response = app
        .oneshot(chat_request("3 beds in Oakland", "s1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let events = read_events(response).await;
    let result = &events.last().unwrap()["result"];
    let summary = result["search_summary"].as_str().unwrap();
    assert!(summary.contains("try again"), "got: {}", summary);
}
