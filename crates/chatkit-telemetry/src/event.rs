// Copyright 2026 Dropbox

//! Telemetry event wire types and enrichment.
//!
//! [`TelemetryEvent`] is the boundary input: an open-vocabulary event
//! category plus optional correlation identifiers and a free-form
//! payload. New event types must not require a deploy of this layer,
//! so `type` is never checked against a closed set — only for
//! presence.
//!
//! The serialized outbound value is self-describing: after
//! [`TelemetryEvent::resolve`], `ts` and `userId` carry the resolved
//! values, and unknown top-level fields from the request are preserved,
//! so a consumer can reconstruct the logical event from the message
//! body alone without looking at transport metadata.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A telemetry event as submitted by the client application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    /// Event category. Open vocabulary; required and non-empty after
    /// trimming, enforced by [`TelemetryEvent::validate`].
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,

    /// Correlation identifier for a client-side workflow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,

    /// Explicit user identity; wins over the session cookie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Tool name for tool-usage events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    /// Free-form payload, opaque to this layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,

    /// Client-supplied epoch-millisecond timestamp; assigned at receipt
    /// time when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,

    /// Unknown top-level fields, preserved verbatim so the outbound
    /// value stays a faithful superset of the inbound event.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TelemetryEvent {
    /// Reject events without a usable `type`.
    pub fn validate(&self) -> Result<()> {
        match self.event_type.as_deref() {
            Some(t) if !t.trim().is_empty() => Ok(()),
            _ => Err(Error::InvalidRequest("Missing event type".to_string())),
        }
    }

    /// Fill in the resolved `ts` and `userId`.
    ///
    /// `ts` falls back to the receipt-time timestamp; `userId` falls
    /// back to the session-cookie identity. An explicit event value
    /// always wins.
    pub fn resolve(&mut self, received_at_ms: i64, session_user_id: Option<String>) {
        if self.ts.is_none() {
            self.ts = Some(received_at_ms);
        }
        if self.user_id.as_deref().map_or(true, str::is_empty) {
            self.user_id = session_user_id;
        }
    }

    /// Build the broker message for a resolved event.
    ///
    /// Call [`TelemetryEvent::resolve`] first; the message timestamp is
    /// the resolved `ts` and the key is the resolved user identity.
    pub fn to_outbound(&self) -> Result<OutboundMessage> {
        let timestamp_ms = self.ts.ok_or_else(|| {
            Error::Io(std::io::Error::other("event timestamp not resolved"))
        })?;
        let value = serde_json::to_string(self)
            .map_err(|e| Error::Io(std::io::Error::other(format!("Failed to serialize event: {e}"))))?;
        Ok(OutboundMessage {
            key: self.user_id.clone(),
            value,
            timestamp_ms,
        })
    }
}

/// One message bound for the broker.
///
/// `value` is the canonical wire payload: the full enriched event as a
/// single JSON object. `key` influences partition placement and is the
/// resolved user identity, when one exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Partition key: resolved user identity, or none.
    pub key: Option<String>,
    /// JSON-encoded enriched event.
    pub value: String,
    /// Resolved event timestamp (epoch milliseconds), carried as the
    /// Kafka message timestamp.
    pub timestamp_ms: i64,
}
