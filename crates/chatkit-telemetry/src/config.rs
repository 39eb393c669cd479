// Copyright 2026 Dropbox

//! Broker configuration for the telemetry producer.
//!
//! Configuration is environment-driven (see [`crate::env_vars`]) and
//! deliberately "fail open": when any of the three required settings
//! (brokers, SASL username, SASL password) is absent the feature is
//! inert and the ingest handler short-circuits without touching the
//! network. This keeps a disabled or misconfigured telemetry backend
//! from ever breaking the calling application.

use crate::env_vars;
use crate::errors::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use rdkafka::config::ClientConfig;
use std::time::Duration;

/// SASL mechanism for the producer connection.
///
/// A closed two-variant set: the broker deployments this gateway talks
/// to offer SCRAM at two hash strengths. Unknown or absent values fall
/// back to SCRAM-SHA-256 — an explicit policy choice (the weaker
/// mechanism is the most widely enabled), not an accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaslMechanism {
    /// SCRAM-SHA-256 (default).
    #[default]
    ScramSha256,
    /// SCRAM-SHA-512.
    ScramSha512,
}

impl SaslMechanism {
    /// The librdkafka `sasl.mechanism` value.
    #[must_use]
    pub fn as_rdkafka_str(self) -> &'static str {
        match self {
            SaslMechanism::ScramSha256 => "SCRAM-SHA-256",
            SaslMechanism::ScramSha512 => "SCRAM-SHA-512",
        }
    }

    /// Parse a configuration value, defaulting to SCRAM-SHA-256.
    ///
    /// Only `scram-sha-512` (case-insensitive) selects the stronger
    /// mechanism; anything else, including an unset value, selects the
    /// default. An unrecognized non-empty value is logged.
    #[must_use]
    pub fn from_config_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("scram-sha-512") => SaslMechanism::ScramSha512,
            Some(v) if v.eq_ignore_ascii_case("scram-sha-256") => SaslMechanism::ScramSha256,
            Some(v) => {
                tracing::warn!(
                    value = %v,
                    "Unrecognized SASL mechanism, falling back to SCRAM-SHA-256"
                );
                SaslMechanism::ScramSha256
            }
            None => SaslMechanism::ScramSha256,
        }
    }
}

/// Broker configuration for the telemetry producer.
///
/// Load with [`BrokerConfig::from_env`] at the composition root and
/// pass by reference into the components that need it. Presence of the
/// three required fields gates the whole feature (see
/// [`BrokerConfig::is_configured`]).
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Comma-separated broker address list. `None` disables telemetry.
    pub brokers: Option<String>,

    /// SASL username. `None` disables telemetry.
    pub sasl_username: Option<String>,

    /// SASL password. `None` disables telemetry.
    pub sasl_password: Option<String>,

    /// SASL mechanism (SCRAM hash strength).
    pub sasl_mechanism: SaslMechanism,

    /// Literal PEM CA certificate. Takes precedence over the base64 form.
    pub ca_cert_pem: Option<String>,

    /// Base64-encoded PEM CA certificate fallback.
    pub ca_cert_base64: Option<String>,

    /// Kafka `client.id`.
    pub client_id: String,

    /// Target topic for telemetry events.
    pub topic: String,

    /// Upper bound for broker connect and send operations.
    pub timeout: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            brokers: None,
            sasl_username: None,
            sasl_password: None,
            sasl_mechanism: SaslMechanism::default(),
            ca_cert_pem: None,
            ca_cert_base64: None,
            client_id: crate::DEFAULT_CLIENT_ID.to_string(),
            topic: crate::DEFAULT_TELEMETRY_TOPIC.to_string(),
            timeout: Duration::from_secs(crate::DEFAULT_SEND_TIMEOUT_SECS),
        }
    }
}

impl BrokerConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            brokers: env_vars::env_string(env_vars::REDPANDA_BROKERS),
            sasl_username: env_vars::env_string(env_vars::REDPANDA_SASL_USERNAME),
            sasl_password: env_vars::env_string(env_vars::REDPANDA_SASL_PASSWORD),
            sasl_mechanism: SaslMechanism::from_config_value(
                env_vars::env_string(env_vars::REDPANDA_SASL_MECHANISM).as_deref(),
            ),
            ca_cert_pem: env_vars::env_string(env_vars::REDPANDA_CA_CERT),
            ca_cert_base64: env_vars::env_string(env_vars::REDPANDA_CA_CERT_BASE64),
            client_id: env_vars::env_string_or_default(
                env_vars::REDPANDA_CLIENT_ID,
                crate::DEFAULT_CLIENT_ID,
            ),
            topic: env_vars::env_string_or_default(
                env_vars::REDPANDA_TELEMETRY_TOPIC,
                crate::DEFAULT_TELEMETRY_TOPIC,
            ),
            timeout: Duration::from_secs(env_vars::env_u64_or_default(
                env_vars::REDPANDA_SEND_TIMEOUT_SECS,
                crate::DEFAULT_SEND_TIMEOUT_SECS,
            )),
        }
    }

    /// Whether the telemetry feature is administratively enabled.
    ///
    /// Pure function of configuration presence: broker list, SASL
    /// username, and SASL password must all be non-empty. Safe to call
    /// before any connection exists; performs no I/O.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        let non_empty = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        non_empty(&self.brokers) && non_empty(&self.sasl_username) && non_empty(&self.sasl_password)
    }

    /// Parse the comma-separated broker list: trim entries, drop
    /// empties, fail if nothing usable remains.
    pub fn broker_list(&self) -> Result<Vec<String>> {
        let raw = self.brokers.as_deref().unwrap_or("");
        let brokers: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if brokers.is_empty() {
            return Err(Error::Config(format!(
                "{} must contain at least one broker address",
                env_vars::REDPANDA_BROKERS
            )));
        }
        Ok(brokers)
    }

    /// Resolve the TLS trust anchor from its two interchangeable
    /// sources: the literal PEM value wins; otherwise the base64 form
    /// is decoded. A decode or UTF-8 failure falls back to "no custom
    /// trust anchor" (system roots) rather than failing the connection
    /// attempt.
    #[must_use]
    pub fn resolve_ca_cert(&self) -> Option<String> {
        if let Some(pem) = self.ca_cert_pem.as_deref() {
            let pem = pem.trim();
            if !pem.is_empty() {
                return Some(pem.to_string());
            }
        }

        let b64 = self.ca_cert_base64.as_deref()?.trim();
        if b64.is_empty() {
            return None;
        }
        match BASE64_STANDARD.decode(b64) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(decoded) if !decoded.trim().is_empty() => Some(decoded),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "CA cert base64 decoded to non-UTF-8, ignoring");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "CA cert base64 decode failed, ignoring");
                None
            }
        }
    }

    /// Build the rdkafka `ClientConfig` for the producer.
    ///
    /// Auto-topic-creation is disabled: delivery to a non-existent
    /// topic must fail loudly rather than silently create topics.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let brokers = self.broker_list()?;
        let (username, password) = match (
            self.sasl_username.as_deref(),
            self.sasl_password.as_deref(),
        ) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
            _ => {
                return Err(Error::Config(
                    "SASL username and password must both be set".to_string(),
                ));
            }
        };

        let bootstrap_servers = brokers.join(",");
        let timeout_ms = self.timeout.as_millis().min(i32::MAX as u128).to_string();

        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &bootstrap_servers)
            .set("client.id", &self.client_id)
            .set("security.protocol", "sasl_ssl")
            .set("sasl.mechanism", self.sasl_mechanism.as_rdkafka_str())
            .set("sasl.username", username)
            .set("sasl.password", password)
            .set("message.timeout.ms", &timeout_ms)
            .set("allow.auto.create.topics", "false")
            .set(
                "broker.address.family",
                broker_address_family(&bootstrap_servers),
            );

        if let Some(ca_pem) = self.resolve_ca_cert() {
            client_config.set("ssl.ca.pem", &ca_pem);
        }

        Ok(client_config)
    }
}

/// Pick the `broker.address.family` for a bootstrap list.
///
/// Localhost-like addresses default to `v4` to avoid IPv6 resolution
/// issues with Docker-advertised brokers; everything else allows both.
#[must_use]
pub fn broker_address_family(bootstrap_servers: &str) -> &'static str {
    let is_localhost = bootstrap_servers.split(',').any(|server| {
        let host = server.trim().split(':').next().unwrap_or("");
        host.eq_ignore_ascii_case("localhost") || host == "::1" || host.starts_with("127.")
    });

    if is_localhost {
        "v4"
    } else {
        "any"
    }
}
