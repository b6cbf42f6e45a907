// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests over the HTTP surface.
//!
//! Each test builds an isolated TestHarness with a temp SQLite database and an
//! in-memory quota store. Tests are independent and order-insensitive.

use herald_config::OnEmptyPolicy;
use herald_core::ExecutionMode;
use herald_test_utils::TestHarness;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::{Value, json};

fn encode(input: &Value) -> String {
    utf8_percent_encode(&input.to_string(), NON_ALPHANUMERIC).to_string()
}

// ---- Welcome message lifecycle ----

#[tokio::test]
async fn add_list_and_welcome_round_trip() {
    let harness = TestHarness::builder().build().await.unwrap();

    let empty = harness.get("/api/trpc/getWelcomeMessage", None).await.unwrap();
    assert_eq!(empty.status, 404);
    assert_eq!(empty.body["error"]["data"]["code"], "NOT_FOUND");
    assert_eq!(empty.body["error"]["message"], "no messages found");

    for text in ["Hello, world!", "Second"] {
        let added = harness
            .post_json("/api/trpc/addMessage", &json!({ "text": text }), None)
            .await
            .unwrap();
        assert_eq!(added.status, 200);
        assert_eq!(
            added.body,
            json!({ "result": { "data": { "success": true, "message": format!("Added: {text}") } } })
        );
    }

    let welcome = harness.get("/api/trpc/getWelcomeMessage", None).await.unwrap();
    assert_eq!(welcome.body, json!({ "result": { "data": { "text": "Second" } } }));

    let list = harness.get("/api/trpc/listMessages", None).await.unwrap();
    assert_eq!(
        list.body["result"]["data"],
        json!([{ "id": 2, "text": "Second" }, { "id": 1, "text": "Hello, world!" }])
    );
}

#[tokio::test]
async fn empty_list_is_success() {
    let harness = TestHarness::builder().build().await.unwrap();
    let list = harness.get("/api/trpc/listMessages", None).await.unwrap();
    assert_eq!(list.status, 200);
    assert_eq!(list.body, json!({ "result": { "data": [] } }));
}

#[tokio::test]
async fn fallback_policy_serves_configured_text() {
    let harness = TestHarness::builder()
        .with_on_empty(OnEmptyPolicy::Fallback("Nothing yet".to_string()))
        .build()
        .await
        .unwrap();
    let welcome = harness.get("/api/message", None).await.unwrap();
    assert_eq!(welcome.status, 200);
    assert_eq!(welcome.body, json!({ "text": "Nothing yet" }));
}

// ---- Validation ----

#[tokio::test]
async fn empty_text_is_bad_request_and_not_stored() {
    let harness = TestHarness::builder().build().await.unwrap();
    let response = harness
        .post_json("/api/trpc/addMessage", &json!({ "text": "" }), None)
        .await
        .unwrap();
    assert_eq!(response.status, 400);
    assert_eq!(response.body["error"]["data"]["code"], "BAD_REQUEST");
    assert_eq!(response.body["error"]["code"], -32600);
    assert!(harness.stored_messages().await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_json_body_is_bad_request() {
    let harness = TestHarness::builder().build().await.unwrap();
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/trpc/addMessage")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = harness.send(request).await.unwrap();
    assert_eq!(response.status, 400);
}

// ---- Rate limiting ----

#[tokio::test]
async fn eleventh_mutation_in_window_is_rejected() {
    let harness = TestHarness::builder().with_rate_limit(10, 60).build().await.unwrap();
    let client = Some("203.0.113.50");

    for i in 0..10 {
        let ok = harness
            .post_json("/api/trpc/addMessage", &json!({ "text": format!("m{i}") }), client)
            .await
            .unwrap();
        assert_eq!(ok.status, 200, "call {i}: {:?}", ok.body);
    }

    let limited = harness
        .post_json("/api/trpc/addMessage", &json!({ "text": "too many" }), client)
        .await
        .unwrap();
    assert_eq!(limited.status, 429);
    assert_eq!(limited.body["error"]["data"]["code"], "TOO_MANY_REQUESTS");
    let retry: u64 = limited.header("retry-after").unwrap().parse().unwrap();
    assert!(retry <= 60);
    assert_eq!(limited.body["error"]["data"]["retryAfterSeconds"], retry);
    assert!(
        limited.body["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Rate limit exceeded. Try again in ")
    );
    assert_eq!(harness.stored_messages().await.unwrap().len(), 10);

    // Another client is unaffected.
    let other = harness
        .post_json("/api/trpc/addMessage", &json!({ "text": "hi" }), Some("203.0.113.51"))
        .await
        .unwrap();
    assert_eq!(other.status, 200);

    // Queries are never limited.
    let welcome = harness.get("/api/trpc/getWelcomeMessage", client).await.unwrap();
    assert_eq!(welcome.status, 200);
}

// ---- Batching and routing ----

#[tokio::test]
async fn batched_queries_share_one_response() {
    let harness = TestHarness::builder().with_messages(["Hi"]).build().await.unwrap();
    let input = encode(&json!({ "0": { "name": "Ada" } }));
    let response = harness
        .get(
            &format!("/api/trpc/greeting,getWelcomeMessage?batch=1&input={input}"),
            None,
        )
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(
        response.body,
        json!([
            { "result": { "data": { "text": "Hello Ada from the server!" } } },
            { "result": { "data": { "text": "Hi" } } },
        ])
    );
}

#[tokio::test]
async fn mixed_batch_reports_multi_status() {
    let harness = TestHarness::builder().build().await.unwrap();
    let response = harness
        .get("/api/trpc/greeting,getWelcomeMessage?batch=1", None)
        .await
        .unwrap();
    assert_eq!(response.status, 207);
    assert_eq!(response.body[1]["error"]["data"]["httpStatus"], 404);
    assert_eq!(response.body[1]["error"]["data"]["path"], "getWelcomeMessage");
}

#[tokio::test]
async fn batched_mutation_reads_inputs_from_body() {
    let harness = TestHarness::builder().build().await.unwrap();
    let response = harness
        .post_json(
            "/api/trpc/addMessage,addMessage?batch=1",
            &json!({ "0": { "text": "a" }, "1": { "text": "b" } }),
            None,
        )
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body.as_array().unwrap().len(), 2);
    assert_eq!(harness.stored_messages().await.unwrap().len(), 2);
}

#[tokio::test]
async fn wrong_method_and_unknown_procedure() {
    let harness = TestHarness::builder().build().await.unwrap();

    let wrong = harness.get("/api/trpc/addMessage", None).await.unwrap();
    assert_eq!(wrong.status, 405);
    assert_eq!(wrong.body["error"]["data"]["code"], "METHOD_NOT_SUPPORTED");

    let unknown = harness.get("/api/trpc/deleteEverything", None).await.unwrap();
    assert_eq!(unknown.status, 404);
    assert_eq!(unknown.body["error"]["data"]["code"], "NOT_FOUND");
}

// ---- Build mode ----

#[tokio::test]
async fn build_mode_serves_fallbacks_without_storage() {
    let harness = TestHarness::builder()
        .with_mode(ExecutionMode::Build)
        .with_rate_limit(1, 60)
        .build()
        .await
        .unwrap();

    let welcome = harness.get("/api/trpc/getWelcomeMessage", None).await.unwrap();
    assert_eq!(welcome.body["result"]["data"]["text"], "Hello, world!");

    let list = harness.get("/api/trpc/listMessages", None).await.unwrap();
    assert_eq!(list.body["result"]["data"], json!([]));

    let add = harness
        .post_json("/api/trpc/addMessage", &json!({ "text": "x" }), None)
        .await
        .unwrap();
    assert_eq!(add.status, 500);
    assert_eq!(add.body["error"]["message"], "server configuration error");

    let health = harness.get("/health", None).await.unwrap();
    assert_eq!(health.body["mode"], "build");
}

// ---- Ambient routes ----

#[tokio::test]
async fn legacy_route_and_health() {
    let harness = TestHarness::builder().with_messages(["Hello, world!"]).build().await.unwrap();

    let message = harness.get("/api/message", None).await.unwrap();
    assert_eq!(message.status, 200);
    assert_eq!(message.body, json!({ "text": "Hello, world!" }));

    let health = harness.get("/health", None).await.unwrap();
    assert_eq!(health.status, 200);
    assert_eq!(health.body["status"], "ok");
    assert_eq!(health.body["mode"], "serving");
}

#[tokio::test]
async fn legacy_route_reports_missing_message() {
    let harness = TestHarness::builder().build().await.unwrap();
    let message = harness.get("/api/message", None).await.unwrap();
    assert_eq!(message.status, 404);
    assert_eq!(message.body, json!({ "error": "no messages found" }));
}

#[tokio::test]
async fn every_response_carries_a_correlation_id() {
    let harness = TestHarness::builder().build().await.unwrap();
    let response = harness.get("/health", None).await.unwrap();
    let id = response.header("x-correlation-id").unwrap();
    assert_eq!(id.len(), 36);

    let supplied = "0b7e3c5a-2f4d-4e8b-9a61-3c2d1e0f9a8b";
    let request = axum::http::Request::builder()
        .uri("/health")
        .header("x-correlation-id", supplied)
        .body(axum::body::Body::empty())
        .unwrap();
    let echoed = harness.send(request).await.unwrap();
    assert_eq!(echoed.header("x-correlation-id"), Some(supplied));
}
