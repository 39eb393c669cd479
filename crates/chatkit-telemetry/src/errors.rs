// Copyright 2026 Dropbox

//! Gateway error types.
//!
//! The taxonomy mirrors who is at fault:
//!
//! - [`Error::InvalidRequest`]: caller error, surfaced as HTTP 400 and
//!   never logged as an operational failure.
//! - [`Error::Config`]: deployment error detected at connect time;
//!   fails the current request but never the process, and nothing is
//!   cached so a later request retries from scratch.
//! - [`Error::Kafka`]: runtime/transient broker failure (connect, auth,
//!   send, timeout); logged with detail server-side, surfaced to the
//!   caller as a generic 500.

use thiserror::Error;

/// Error type for telemetry gateway operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// The inbound request was malformed (missing body, bad JSON,
    /// missing event type).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The broker configuration is unusable (e.g. empty broker list
    /// after parsing).
    #[error("Invalid broker configuration: {0}")]
    Config(String),

    /// A Kafka client or delivery operation failed.
    #[error("Kafka operation failed: {0}")]
    Kafka(String),

    /// I/O error (socket binding, blocking-task join).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for telemetry gateway operations.
pub type Result<T> = std::result::Result<T, Error>;
