// Copyright 2026 Dropbox

//! Kafka producer lifecycle and the delivery-sink seam.
//!
//! [`BrokerProducer`] owns the one piece of shared mutable state in the
//! gateway: a process-wide rdkafka `FutureProducer`, created lazily on
//! the first delivery attempt and alive for the life of the process.
//! Initialization is single-flight: concurrent first callers converge
//! on one underlying client, and a failed initialization caches
//! nothing, so the next call retries from scratch.
//!
//! The ingest handler consumes the [`TelemetrySink`] trait rather than
//! the concrete producer, which keeps delivery mockable in tests.

use crate::config::BrokerConfig;
use crate::errors::{Error, Result};
use crate::event::OutboundMessage;
use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;

/// A lazily-initialized shared handle with single-flight initialization.
///
/// The mutex is held across the init future, so concurrent first
/// callers either run the one in-flight initialization or wait for it;
/// a failed init leaves the slot empty for a clean retry. Late callers
/// after success get a clone of the cached handle.
pub struct SharedHandle<T> {
    slot: Mutex<Option<T>>,
}

impl<T: Clone> SharedHandle<T> {
    /// Create an empty handle.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Return the cached value, or run `init` to produce it.
    ///
    /// At most one `init` future runs at a time; its result is cached
    /// only on success.
    pub async fn get_or_init<F, Fut>(&self, init: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(existing) = slot.as_ref() {
            return Ok(existing.clone());
        }
        let created = init().await?;
        *slot = Some(created.clone());
        Ok(created)
    }

    /// Clear and return the cached value, if any.
    pub async fn take(&self) -> Option<T> {
        self.slot.lock().await.take()
    }

    /// Non-blocking peek for synchronous contexts (`Drop`). Returns
    /// `None` when empty or when the lock is contended.
    pub fn try_get(&self) -> Option<T> {
        self.slot.try_lock().ok().and_then(|slot| slot.clone())
    }

    /// Whether a value is currently cached.
    pub async fn is_initialized(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}

impl<T: Clone> Default for SharedHandle<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Delivery seam consumed by the ingest handler.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    /// Deliver a batch of messages to `topic`.
    ///
    /// Initializes the underlying connection on demand. Errors are
    /// propagated without internal retry; retry policy belongs to the
    /// caller.
    async fn send_to_topic(&self, topic: &str, messages: Vec<OutboundMessage>) -> Result<()>;
}

/// The process-wide broker connection manager.
///
/// Owns the shared producer handle exclusively. Callers re-request the
/// handle per use and never cache it, so a future forced-reconnect is
/// transparent to them.
pub struct BrokerProducer {
    config: BrokerConfig,
    shared: SharedHandle<FutureProducer>,
}

impl BrokerProducer {
    /// Create a manager; no connection is attempted until first use.
    #[must_use]
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            config,
            shared: SharedHandle::new(),
        }
    }

    /// Whether the telemetry feature is administratively enabled.
    /// Pure configuration check; see [`BrokerConfig::is_configured`].
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Obtain the shared producer, initializing it on first call.
    ///
    /// The first success is cached for the process lifetime; no
    /// re-validation or reconnect check on later calls. Any parse,
    /// resolve, or connect failure caches nothing and the next call
    /// retries from scratch.
    pub async fn get_producer(&self) -> Result<FutureProducer> {
        self.shared.get_or_init(|| connect(&self.config)).await
    }

    /// Best-effort teardown of the shared producer.
    ///
    /// Safe when no connection was ever established (no-op) and safe
    /// concurrently with an in-flight [`Self::get_producer`] (the
    /// single-flight lock serializes the two). Flush errors are
    /// swallowed: disconnection is cleanup, not a correctness path.
    pub async fn disconnect(&self) {
        let Some(producer) = self.shared.take().await else {
            return;
        };
        let timeout = self.config.timeout;
        let flushed = tokio::task::spawn_blocking(move || {
            producer.flush(Timeout::After(timeout))
        })
        .await;
        match flushed {
            Ok(Ok(())) => tracing::debug!("Telemetry producer disconnected"),
            Ok(Err(e)) => tracing::debug!(error = %e, "Ignoring flush error on disconnect"),
            Err(e) => tracing::debug!(error = %e, "Ignoring join error on disconnect"),
        }
    }
}

/// Build, configure, and connect a producer from configuration.
///
/// rdkafka connects lazily, so auth/TLS problems would otherwise only
/// surface on the first send; a bounded metadata fetch up front makes
/// this behave as an explicit connect step.
async fn connect(config: &BrokerConfig) -> Result<FutureProducer> {
    let client_config = config.client_config()?;
    let producer: FutureProducer = client_config
        .create()
        .map_err(|e| Error::Kafka(format!("Failed to create producer: {e}")))?;

    let probe = producer.clone();
    let topic = config.topic.clone();
    let timeout = config.timeout;
    tokio::task::spawn_blocking(move || {
        probe
            .client()
            .fetch_metadata(Some(&topic), Timeout::After(timeout))
    })
    .await
    .map_err(|e| Error::Io(std::io::Error::other(format!("Failed to join connect task: {e}"))))?
    .map_err(|e| Error::Kafka(format!("Broker connect failed: {e}")))?;

    tracing::info!(
        client_id = %config.client_id,
        mechanism = config.sasl_mechanism.as_rdkafka_str(),
        "Telemetry producer connected"
    );
    Ok(producer)
}

#[async_trait]
impl TelemetrySink for BrokerProducer {
    async fn send_to_topic(&self, topic: &str, messages: Vec<OutboundMessage>) -> Result<()> {
        let producer = self.get_producer().await?;
        for message in &messages {
            let mut record: FutureRecord<'_, String, String> = FutureRecord::to(topic)
                .payload(&message.value)
                .timestamp(message.timestamp_ms);
            if let Some(ref key) = message.key {
                record = record.key(key);
            }
            producer
                .send(record, Timeout::After(self.config.timeout))
                .await
                .map_err(|(err, _)| Error::Kafka(format!("Failed to deliver message: {err}")))?;
        }
        Ok(())
    }
}

impl Drop for BrokerProducer {
    /// Best-effort non-blocking flush on drop. `Drop` cannot be async;
    /// call [`BrokerProducer::disconnect`] on graceful shutdown when
    /// delivery matters.
    fn drop(&mut self) {
        if let Some(producer) = self.shared.try_get() {
            let _ = producer.flush(Timeout::After(Duration::ZERO));
        }
    }
}
