// SPDX-FileCopyrightText: 2026 Vitrine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Vitrine display client.

use thiserror::Error;

/// The primary error type used across all Vitrine crates.
///
/// The variants mirror the failure taxonomy of the data-sync core:
/// connection-level failures are retryable (host fallback, reconnect,
/// poll fallback), HTTP errors are definitive answers, and storage
/// failures degrade to "no cache" rather than propagating.
#[derive(Debug, Error)]
pub enum VitrineError {
    /// Configuration errors (invalid TOML, missing required fields, bad URLs).
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection-level network failures (refused, DNS, timeout). Retryable.
    #[error("network error: {message}")]
    Network {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Non-2xx HTTP response. Definitive -- never retried against other hosts.
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },

    /// Malformed JSON from the gateway or push channel.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Rejected values at a boundary (unknown profile id, malformed cache row).
    #[error("validation error: {0}")]
    Validation(String),

    /// Storage backend errors (database open, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Push channel errors (connect failure, send while disconnected).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VitrineError {
    /// Whether the failure is connection-level and worth retrying against
    /// a fallback host or via reconnect.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VitrineError::Network { .. } | VitrineError::Timeout { .. }
        )
    }
}
