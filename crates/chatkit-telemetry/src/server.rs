// Copyright 2026 Dropbox

//! HTTP boundary: router and the telemetry ingest handler.
//!
//! One endpoint, `POST /telemetry`, accepting a single
//! [`TelemetryEvent`](crate::event::TelemetryEvent) per request.
//! Validation failures return 400 before any network action; a missing
//! broker configuration returns 200 `{"status":"disabled"}` so that a
//! disabled telemetry backend never breaks the calling application;
//! delivery failures return a generic 500 with broker detail kept
//! server-side. A `GET /health` endpoint is exposed for probes.

use crate::cookie::cookie_value;
use crate::event::TelemetryEvent;
use crate::producer::TelemetrySink;
use crate::{BrokerConfig, SESSION_COOKIE_NAME};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;

/// Shared state for the ingest handler.
///
/// `configured` is evaluated once from the pure configuration
/// predicate; the sink is the delivery seam (the broker producer in
/// production, a double in tests).
#[derive(Clone)]
pub struct AppState {
    /// Target topic for telemetry events.
    pub topic: String,
    /// Feature gate: whether the broker is administratively configured.
    pub configured: bool,
    /// Delivery sink.
    pub sink: Arc<dyn TelemetrySink>,
}

impl AppState {
    /// Build handler state from broker configuration and a sink.
    #[must_use]
    pub fn new(config: &BrokerConfig, sink: Arc<dyn TelemetrySink>) -> Self {
        Self {
            topic: config.topic.clone(),
            configured: config.is_configured(),
            sink,
        }
    }
}

/// Build the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/telemetry", post(ingest).fallback(method_not_allowed))
        .route("/health", get(health))
        .with_state(state)
}

/// `POST /telemetry` — validate, enrich, and deliver one event.
async fn ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // Step 1: parse. Caller errors are logged at debug only; they are
    // not operational failures.
    if body.is_empty() {
        tracing::debug!("Telemetry request rejected: missing body");
        return bad_request("Missing body");
    }
    let mut event: TelemetryEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(error = %e, "Telemetry request rejected: malformed JSON");
            return bad_request("Invalid JSON");
        }
    };

    // Step 2: validate before any network action.
    if event.validate().is_err() {
        tracing::debug!("Telemetry request rejected: missing event type");
        return bad_request("Missing event type");
    }

    // Step 3: feature gate. "Disabled" is a successful no-op outcome,
    // distinguishable from "broken" in the response body.
    if !state.configured {
        return ok_status("disabled");
    }

    // Step 4: enrich with the resolved timestamp and user identity.
    let cookie_header = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let session_user = cookie_value(cookie_header, SESSION_COOKIE_NAME);
    event.resolve(chrono::Utc::now().timestamp_millis(), session_user);

    // Step 5: deliver exactly one message.
    let message = match event.to_outbound() {
        Ok(message) => message,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build outbound telemetry message");
            return produce_failed();
        }
    };
    match state.sink.send_to_topic(&state.topic, vec![message]).await {
        Ok(()) => ok_status("ok"),
        Err(e) => {
            tracing::error!(error = %e, topic = %state.topic, "Telemetry produce error");
            produce_failed()
        }
    }
}

/// Any non-POST verb on the telemetry route. Fixed response, no side
/// effects.
async fn method_not_allowed() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "Method Not Allowed"})),
    )
        .into_response()
}

/// `GET /health` — liveness plus the configured/disabled distinction
/// for observability tooling. No broker I/O.
async fn health(State(state): State<AppState>) -> Response {
    (
        StatusCode::OK,
        Json(json!({"status": "ok", "configured": state.configured})),
    )
        .into_response()
}

fn ok_status(status: &str) -> Response {
    (StatusCode::OK, Json(json!({"status": status}))).into_response()
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({"error": message}))).into_response()
}

/// Delivery failure response. Internal broker detail is never leaked
/// into the HTTP body.
fn produce_failed() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "Produce failed"})),
    )
        .into_response()
}
