// Copyright 2026 Dropbox

//! # ChatKit Telemetry Gateway
//!
//! Best-effort ingestion path for small structured telemetry events:
//! an HTTP boundary handler validates and normalizes inbound events and
//! forwards them to a Kafka-protocol broker (e.g. Redpanda) topic for
//! downstream analytics.
//!
//! ## Components
//!
//! - [`server`]: the `POST /telemetry` boundary handler (validation,
//!   enrichment, response shaping)
//! - [`producer`]: the lazily-initialized, process-wide broker producer
//!   with SASL/TLS setup and connection lifecycle
//! - [`config`]: environment-driven broker configuration, including the
//!   "fail open" configured/disabled contract
//!
//! ## Delivery contract
//!
//! One JSON-encoded message per accepted event, keyed by the resolved
//! user identity (explicit `userId` field, else session cookie, else no
//! key). Delivery is best-effort: no internal retry, no ordering
//! promises across requests, and a missing broker configuration is a
//! successful no-op rather than an error.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chatkit_telemetry::config::BrokerConfig;
//! use chatkit_telemetry::producer::BrokerProducer;
//! use chatkit_telemetry::server::{router, AppState};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BrokerConfig::from_env();
//! let producer = Arc::new(BrokerProducer::new(config.clone()));
//! let app = router(AppState::new(&config, producer));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8086").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

/// Default Kafka topic for telemetry events.
pub const DEFAULT_TELEMETRY_TOPIC: &str = "chatkit_telemetry";

/// Default Kafka `client.id` for the gateway producer.
pub const DEFAULT_CLIENT_ID: &str = "chatkit-app";

/// Name of the session cookie carrying the fallback user identity.
pub const SESSION_COOKIE_NAME: &str = "chatkit_session_id";

/// Default bound (seconds) for broker connect and send operations.
pub const DEFAULT_SEND_TIMEOUT_SECS: u64 = 10;

/// Broker configuration loaded from the environment.
pub mod config;
/// Session-cookie extraction for the fallback user identity.
pub mod cookie;
/// Centralized environment variable names and typed accessors.
pub mod env_vars;
/// Gateway error types and conversions.
pub mod errors;
/// Telemetry event wire types and enrichment.
pub mod event;
/// Kafka producer lifecycle and the delivery-sink seam.
pub mod producer;
/// HTTP boundary: router and ingest handler.
pub mod server;

pub use config::{BrokerConfig, SaslMechanism};
pub use errors::{Error, Result};
pub use event::{OutboundMessage, TelemetryEvent};
pub use producer::{BrokerProducer, TelemetrySink};
