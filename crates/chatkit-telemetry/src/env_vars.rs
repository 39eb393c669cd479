// Copyright 2026 Dropbox

//! Centralized environment variable names and typed accessors.
//!
//! Every environment variable the gateway reads is named here once, so
//! the configuration surface is auditable in one place.
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `REDPANDA_BROKERS` | Comma-separated broker address list | None (feature disabled) |
//! | `REDPANDA_SASL_USERNAME` | SASL username | None (feature disabled) |
//! | `REDPANDA_SASL_PASSWORD` | SASL password | None (feature disabled) |
//! | `REDPANDA_SASL_MECHANISM` | `scram-sha-256` or `scram-sha-512` | `scram-sha-256` |
//! | `REDPANDA_CA_CERT` | Literal PEM trust anchor | None |
//! | `REDPANDA_CA_CERT_BASE64` | Base64-encoded PEM trust anchor | None |
//! | `REDPANDA_CLIENT_ID` | Kafka `client.id` | `chatkit-app` |
//! | `REDPANDA_TELEMETRY_TOPIC` | Target topic | `chatkit_telemetry` |
//! | `REDPANDA_SEND_TIMEOUT_SECS` | Connect/send timeout bound | `10` |
//! | `TELEMETRY_HTTP_PORT` | Gateway listen port | `8086` |

use std::env;

/// Comma-separated broker address list.
pub const REDPANDA_BROKERS: &str = "REDPANDA_BROKERS";

/// SASL username for SCRAM authentication.
pub const REDPANDA_SASL_USERNAME: &str = "REDPANDA_SASL_USERNAME";

/// SASL password for SCRAM authentication.
pub const REDPANDA_SASL_PASSWORD: &str = "REDPANDA_SASL_PASSWORD";

/// SASL mechanism selector (`scram-sha-256` or `scram-sha-512`).
pub const REDPANDA_SASL_MECHANISM: &str = "REDPANDA_SASL_MECHANISM";

/// Literal PEM CA certificate. Takes precedence over the base64 form.
pub const REDPANDA_CA_CERT: &str = "REDPANDA_CA_CERT";

/// Base64-encoded PEM CA certificate fallback.
pub const REDPANDA_CA_CERT_BASE64: &str = "REDPANDA_CA_CERT_BASE64";

/// Kafka `client.id` for the gateway producer.
pub const REDPANDA_CLIENT_ID: &str = "REDPANDA_CLIENT_ID";

/// Target topic for telemetry events.
pub const REDPANDA_TELEMETRY_TOPIC: &str = "REDPANDA_TELEMETRY_TOPIC";

/// Upper bound in seconds for broker connect and send operations.
pub const REDPANDA_SEND_TIMEOUT_SECS: &str = "REDPANDA_SEND_TIMEOUT_SECS";

/// HTTP listen port for the gateway binary.
pub const TELEMETRY_HTTP_PORT: &str = "TELEMETRY_HTTP_PORT";

/// Read an environment variable as a non-empty trimmed string.
///
/// Returns `None` when unset, empty, or whitespace-only, so callers
/// can treat "set to nothing" the same as "not set".
#[must_use]
pub fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Err(_) => None,
    }
}

/// Read an environment variable with a default for the unset/empty case.
#[must_use]
pub fn env_string_or_default(name: &str, default: &str) -> String {
    env_string(name).unwrap_or_else(|| default.to_string())
}

/// Read a `u64` environment variable, falling back to the default on
/// unset or unparseable values (a malformed value is logged, not fatal).
#[must_use]
pub fn env_u64_or_default(name: &str, default: u64) -> u64 {
    match env_string(name) {
        Some(value) => value.parse().unwrap_or_else(|_| {
            tracing::warn!(var = name, value = %value, default, "Unparseable u64 env var, using default");
            default
        }),
        None => default,
    }
}

/// Read a `u16` environment variable (ports), same fallback policy as
/// [`env_u64_or_default`].
#[must_use]
pub fn env_u16_or_default(name: &str, default: u16) -> u16 {
    match env_string(name) {
        Some(value) => value.parse().unwrap_or_else(|_| {
            tracing::warn!(var = name, value = %value, default, "Unparseable u16 env var, using default");
            default
        }),
        None => default,
    }
}
