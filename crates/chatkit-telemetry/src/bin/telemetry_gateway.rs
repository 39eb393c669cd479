// Copyright 2026 Dropbox

//! Telemetry Gateway - HTTP ingestion for ChatKit telemetry events
//!
//! Accepts events on `POST /telemetry` and produces them to a
//! Kafka/Redpanda topic. When the broker is not configured the gateway
//! still runs and acknowledges events with `{"status":"disabled"}`.
//!
//! # Usage
//!
//! ```bash
//! # Set environment variables
//! export REDPANDA_BROKERS="seed-0.example.com:9092"
//! export REDPANDA_SASL_USERNAME="telemetry"
//! export REDPANDA_SASL_PASSWORD="secret"
//! export REDPANDA_SASL_MECHANISM="scram-sha-256"  # Optional
//! export REDPANDA_TELEMETRY_TOPIC="chatkit_telemetry"  # Optional
//! export TELEMETRY_HTTP_PORT="8086"  # Optional, defaults to 8086
//!
//! # Run gateway
//! cargo run --bin telemetry_gateway
//! ```
//!
//! # Health Endpoint
//!
//! ```bash
//! curl http://localhost:8086/health
//! ```

use anyhow::Context;
use chatkit_telemetry::config::BrokerConfig;
use chatkit_telemetry::env_vars;
use chatkit_telemetry::producer::{BrokerProducer, TelemetrySink};
use chatkit_telemetry::server::{router, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Default HTTP listen port.
const DEFAULT_HTTP_PORT: u16 = 8086;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = BrokerConfig::from_env();
    if config.is_configured() {
        info!(topic = %config.topic, "Telemetry delivery enabled");
    } else {
        warn!("Broker not configured; events will be acknowledged as disabled");
    }

    let producer = Arc::new(BrokerProducer::new(config.clone()));
    let state = AppState::new(&config, Arc::clone(&producer) as Arc<dyn TelemetrySink>);
    let app = router(state);

    let port = env_vars::env_u16_or_default(env_vars::TELEMETRY_HTTP_PORT, DEFAULT_HTTP_PORT);
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;
    info!(addr = %listener.local_addr()?, "Telemetry gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Orderly shutdown is the one place the shared producer is torn
    // down; a later request cycle would rebuild it from scratch.
    producer.disconnect().await;
    info!("Telemetry gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if signal::ctrl_c().await.is_ok() {
        info!("Ctrl+C received, shutting down");
    }
}
