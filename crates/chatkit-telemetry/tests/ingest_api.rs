// Copyright 2026 Dropbox

//! HTTP-level tests for the telemetry ingest boundary.
//!
//! These exercise the full handler path against a mock delivery sink:
//! validation ordering, the disabled short-circuit, enrichment, and
//! failure surfacing. No broker is involved.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chatkit_telemetry::config::BrokerConfig;
use chatkit_telemetry::errors::{Error, Result};
use chatkit_telemetry::event::OutboundMessage;
use chatkit_telemetry::producer::TelemetrySink;
use chatkit_telemetry::server::{router, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Test double recording every delivered batch; can be toggled to fail.
#[derive(Default)]
struct MockSink {
    calls: Mutex<Vec<(String, Vec<OutboundMessage>)>>,
    fail: AtomicBool,
}

impl MockSink {
    fn calls(&self) -> Vec<(String, Vec<OutboundMessage>)> {
        self.calls.lock().unwrap().clone()
    }

    fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl TelemetrySink for MockSink {
    async fn send_to_topic(&self, topic: &str, messages: Vec<OutboundMessage>) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Kafka("sink offline".to_string()));
        }
        self.calls
            .lock()
            .unwrap()
            .push((topic.to_string(), messages));
        Ok(())
    }
}

fn configured_config() -> BrokerConfig {
    BrokerConfig {
        brokers: Some("seed-0.example.com:9092".to_string()),
        sasl_username: Some("telemetry".to_string()),
        sasl_password: Some("secret".to_string()),
        topic: "test_telemetry".to_string(),
        ..Default::default()
    }
}

fn configured_app(sink: Arc<MockSink>) -> Router {
    router(AppState::new(&configured_config(), sink))
}

fn disabled_app(sink: Arc<MockSink>) -> Router {
    let config = BrokerConfig {
        topic: "test_telemetry".to_string(),
        ..Default::default()
    };
    router(AppState::new(&config, sink))
}

fn post_telemetry(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/telemetry")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_telemetry_with_cookie(body: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/telemetry")
        .header("content-type", "application/json")
        .header("cookie", cookie)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    (status, value)
}

#[tokio::test]
async fn test_ok_path_delivers_one_message_to_configured_topic() {
    let sink = Arc::new(MockSink::default());
    let app = configured_app(Arc::clone(&sink));

    let response = app
        .oneshot(post_telemetry(r#"{"type":"page_view","data":{"page":"/projects"}}"#))
        .await
        .unwrap();
    let (status, body) = response_json(response).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let calls = sink.calls();
    assert_eq!(calls.len(), 1);
    let (topic, messages) = &calls[0];
    assert_eq!(topic, "test_telemetry");
    assert_eq!(messages.len(), 1);
}

#[tokio::test]
async fn test_delivered_value_carries_resolved_ts_and_user() {
    let sink = Arc::new(MockSink::default());
    let app = configured_app(Arc::clone(&sink));

    // Neither ts nor userId in the event: both must be resolved.
    let response = app
        .oneshot(post_telemetry_with_cookie(
            r#"{"type":"tool_used","toolName":"calendar"}"#,
            "a=1; chatkit_session_id=session-42; b=2",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let calls = sink.calls();
    let message = &calls[0].1[0];

    // Key is the resolved user identity from the session cookie.
    assert_eq!(message.key.as_deref(), Some("session-42"));

    // The serialized body is self-describing: its ts/userId are the
    // resolved values, matching the transport metadata.
    let decoded: Value = serde_json::from_str(&message.value).unwrap();
    assert_eq!(decoded["type"], "tool_used");
    assert_eq!(decoded["toolName"], "calendar");
    assert_eq!(decoded["userId"], "session-42");
    assert_eq!(decoded["ts"].as_i64().unwrap(), message.timestamp_ms);
    assert!(message.timestamp_ms > 0);
}

#[tokio::test]
async fn test_explicit_user_id_wins_over_cookie() {
    let sink = Arc::new(MockSink::default());
    let app = configured_app(Arc::clone(&sink));

    let response = app
        .oneshot(post_telemetry_with_cookie(
            r#"{"type":"t","userId":"explicit-user"}"#,
            "chatkit_session_id=cookie-user",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let message = &sink.calls()[0].1[0];
    assert_eq!(message.key.as_deref(), Some("explicit-user"));
    let decoded: Value = serde_json::from_str(&message.value).unwrap();
    assert_eq!(decoded["userId"], "explicit-user");
}

#[tokio::test]
async fn test_event_supplied_ts_preserved() {
    let sink = Arc::new(MockSink::default());
    let app = configured_app(Arc::clone(&sink));

    let response = app
        .oneshot(post_telemetry(r#"{"type":"t","ts":1700000000000}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let message = &sink.calls()[0].1[0];
    assert_eq!(message.timestamp_ms, 1_700_000_000_000);
}

#[tokio::test]
async fn test_unconfigured_broker_is_disabled_noop() {
    let sink = Arc::new(MockSink::default());
    let app = disabled_app(Arc::clone(&sink));

    let response = app
        .oneshot(post_telemetry(r#"{"type":"page_view"}"#))
        .await
        .unwrap();
    let (status, body) = response_json(response).await;

    // "Off" is distinguishable from "broken": success with a disabled
    // status and zero network calls.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "disabled"}));
    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn test_missing_body_is_400() {
    let sink = Arc::new(MockSink::default());
    let app = configured_app(Arc::clone(&sink));

    let response = app.oneshot(post_telemetry("")).await.unwrap();
    let (status, body) = response_json(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing body"}));
    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let sink = Arc::new(MockSink::default());
    let app = configured_app(Arc::clone(&sink));

    let response = app.oneshot(post_telemetry("{")).await.unwrap();
    let (status, body) = response_json(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid JSON"}));
    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn test_missing_event_type_is_400() {
    let sink = Arc::new(MockSink::default());
    let app = configured_app(Arc::clone(&sink));

    let response = app
        .oneshot(post_telemetry(r#"{"notype":"x"}"#))
        .await
        .unwrap();
    let (status, body) = response_json(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing event type"}));
    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn test_validation_runs_before_feature_gate() {
    // Even with the broker disabled, a bad event is still a 400, not
    // a "disabled" success.
    let sink = Arc::new(MockSink::default());
    let app = disabled_app(Arc::clone(&sink));

    let response = app
        .oneshot(post_telemetry(r#"{"notype":"x"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_post_verb_is_rejected_with_no_side_effects() {
    let sink = Arc::new(MockSink::default());
    let app = configured_app(Arc::clone(&sink));

    let request = Request::builder()
        .method("GET")
        .uri("/telemetry")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let (status, body) = response_json(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Method Not Allowed"}));
    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn test_delivery_failure_is_500_and_does_not_poison() {
    let sink = Arc::new(MockSink::default());
    let app = configured_app(Arc::clone(&sink));

    sink.set_failing(true);
    let response = app
        .clone()
        .oneshot(post_telemetry(r#"{"type":"t"}"#))
        .await
        .unwrap();
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Produce failed"}));

    // One failure must not wedge the shared path: the next request
    // against a healthy sink succeeds.
    sink.set_failing(false);
    let response = app
        .oneshot(post_telemetry(r#"{"type":"t"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(sink.calls().len(), 1);
}

#[tokio::test]
async fn test_health_reports_configured_state() {
    let health = |app: Router| async move {
        let request = Request::builder()
            .method("GET")
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        response_json(app.oneshot(request).await.unwrap()).await
    };

    let (status, body) = health(configured_app(Arc::new(MockSink::default()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "configured": true}));

    let (status, body) = health(disabled_app(Arc::new(MockSink::default()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "configured": false}));
}
