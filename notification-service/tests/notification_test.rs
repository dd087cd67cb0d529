mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::{DateTime, Utc};
use common::{failing_router, get, pending_router, post_json, send, TestApp};

fn created_at(value: &serde_json::Value) -> DateTime<Utc> {
    value["createdAt"]
        .as_str()
        .expect("createdAt is a string")
        .parse()
        .expect("createdAt is RFC 3339")
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn create_returns_stored_notification() {
    let app = TestApp::ready();
    let before = Utc::now();

    let (status, body) = app
        .post_notification(r#"{"event":"order.created","message":"Order #1"}"#)
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["event"], "order.created");
    assert_eq!(body["message"], "Order #1");
    let id = body["id"].as_str().expect("id is a string");
    assert_eq!(id.len(), 24);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    assert!(created_at(&body) >= before);
    assert_eq!(app.store.len(), 1);
}

#[tokio::test]
async fn created_notification_is_first_in_list() {
    let app = TestApp::ready();
    app.post_notification(r#"{"event":"user.signup","message":"Welcome"}"#)
        .await;

    let (_, created) = app
        .post_notification(r#"{"event":"order.created","message":"Order #1"}"#)
        .await;
    let (status, list) = app.list_notifications().await;

    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().expect("array body");
    assert_eq!(list.len(), 2);
    assert_eq!(list[0], created);
}

#[tokio::test]
async fn extra_fields_are_ignored() {
    let app = TestApp::ready();

    let (status, body) = app
        .post_notification(
            r#"{"event":"e","message":"m","createdAt":"1999-01-01T00:00:00Z","id":"x"}"#,
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(body["id"], "x");
    assert!(created_at(&body).timestamp() > 946_684_800);
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn empty_object_is_rejected() {
    let app = TestApp::ready();

    let (status, body) = app.post_notification("{}").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        serde_json::json!({ "error": "Event and message are required" })
    );
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn missing_or_empty_fields_are_rejected() {
    let app = TestApp::ready();
    let bodies = [
        r#"{"message":"Order #1"}"#,
        r#"{"event":"order.created"}"#,
        r#"{"event":"","message":"Order #1"}"#,
        r#"{"event":"order.created","message":""}"#,
        r#"{"event":null,"message":"Order #1"}"#,
    ];

    for body in bodies {
        let (status, response) = app.post_notification(body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
        assert_eq!(response["error"], "Event and message are required");
    }
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn unparseable_bodies_are_rejected_as_missing_fields() {
    let app = TestApp::ready();

    let (status, body) = app.post_notification("not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Event and message are required");

    let (status, _) = app.post_notification(r#"{"event":1,"message":"m"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let no_content_type = Request::builder()
        .method(Method::POST)
        .uri("/notifications")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app.router, no_content_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Event and message are required");

    assert!(app.store.is_empty());
}

#[tokio::test]
async fn oversized_body_is_payload_too_large() {
    let app = TestApp::ready();
    let body = format!(
        r#"{{"event":"bulk.upload","message":"{}"}}"#,
        "x".repeat(3 * 1024 * 1024)
    );

    let (status, response) = app.post_notification(&body).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_ne!(response["error"], "Event and message are required");
    assert!(app.store.is_empty());
}

// =============================================================================
// List
// =============================================================================

#[tokio::test]
async fn list_is_empty_initially() {
    let app = TestApp::ready();

    let (status, body) = app.list_notifications().await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn list_returns_twenty_most_recent_newest_first() {
    let app = TestApp::ready();
    for i in 1..=25 {
        let (status, _) = app
            .post_notification(&format!(
                r#"{{"event":"order.created","message":"Order #{}"}}"#,
                i
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app.list_notifications().await;

    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().expect("array body");
    assert_eq!(list.len(), 20);

    let messages: Vec<&str> = list.iter().map(|n| n["message"].as_str().unwrap()).collect();
    let expected: Vec<String> = (6..=25).rev().map(|i| format!("Order #{}", i)).collect();
    assert_eq!(messages, expected);

    let timestamps: Vec<DateTime<Utc>> = list.iter().map(created_at).collect();
    assert!(timestamps.windows(2).all(|w| w[0] >= w[1]));
}

// =============================================================================
// Readiness
// =============================================================================

#[tokio::test]
async fn requests_before_connect_are_not_ready() {
    let router = pending_router();
    let not_ready = serde_json::json!({ "error": "Service not ready, DB not connected" });

    let (status, body) = send(&router, get("/notifications")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, not_ready);

    // Readiness wins over validation.
    for payload in [r#"{"event":"e","message":"m"}"#, "{}", "garbage"] {
        let (status, body) = send(&router, post_json("/notifications", payload)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, not_ready);
    }
}

// =============================================================================
// Storage failures
// =============================================================================

#[tokio::test]
async fn write_failure_is_internal_error() {
    let router = failing_router();

    let (status, body) = send(
        &router,
        post_json("/notifications", r#"{"event":"e","message":"m"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        serde_json::json!({ "error": "Could not save notification" })
    );
}

#[tokio::test]
async fn read_failure_is_internal_error() {
    let router = failing_router();

    let (status, body) = send(&router, get("/notifications")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        serde_json::json!({ "error": "Could not retrieve notifications" })
    );
}

#[tokio::test]
async fn validation_runs_before_storage() {
    let router = failing_router();

    let (status, body) = send(&router, post_json("/notifications", "{}")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Event and message are required");
}

// =============================================================================
// Routing
// =============================================================================

#[tokio::test]
async fn unknown_routes_fall_through() {
    let app = TestApp::ready();

    let (status, _) = send(&app.router, get("/notifications/123")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let delete = Request::builder()
        .method(Method::DELETE)
        .uri("/notifications")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app.router, delete).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn responses_carry_request_id() {
    use tower::util::ServiceExt;

    let app = TestApp::ready();
    let request = Request::builder()
        .uri("/notifications")
        .header("x-request-id", "req-42")
        .header(header::ACCEPT, "application/json")
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "req-42");
}
