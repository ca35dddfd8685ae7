//! Error types for wire encoding and HTTP dispatch.
//!
//! Delivery failures carry the status code or underlying cause and are
//! always propagated to the caller; the dispatcher never retries and
//! never swallows. A disabled sink is not an error.

use thiserror::Error;

use ormcast_core::CoreError;

/// Result type alias for dispatch operations.
pub type Result<T> = std::result::Result<T, DeliveryError>;

/// Errors raised while encoding or delivering an envelope.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Transport-level connectivity failure (refused, DNS, reset).
    #[error("network connection failed: {message}")]
    Network {
        /// Error message describing the transport failure.
        message: String,
    },

    /// Request exceeded the configured timeout.
    #[error("request timeout after {timeout_seconds}s")]
    Timeout {
        /// Number of seconds before the request timed out.
        timeout_seconds: u64,
    },

    /// Sink responded with a 4xx status.
    #[error("client error: HTTP {status_code}")]
    ClientError {
        /// HTTP status code.
        status_code: u16,
        /// Response body content, truncated.
        body: String,
    },

    /// Sink responded with a 5xx status.
    #[error("server error: HTTP {status_code}")]
    ServerError {
        /// HTTP status code.
        status_code: u16,
        /// Response body content, truncated.
        body: String,
    },

    /// Dispatch client or sink configuration is unusable.
    #[error("invalid dispatch configuration: {message}")]
    Configuration {
        /// Configuration error message.
        message: String,
    },

    /// Envelope could not be encoded or decoded for the wire.
    #[error("malformed wire envelope: {message}")]
    Codec {
        /// What failed to encode or decode.
        message: String,
    },
}

impl DeliveryError {
    /// Creates a network error from a message.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    /// Creates a timeout error.
    pub fn timeout(timeout_seconds: u64) -> Self {
        Self::Timeout { timeout_seconds }
    }

    /// Creates a client error from an HTTP response.
    pub fn client_error(status_code: u16, body: impl Into<String>) -> Self {
        Self::ClientError { status_code, body: body.into() }
    }

    /// Creates a server error from an HTTP response.
    pub fn server_error(status_code: u16, body: impl Into<String>) -> Self {
        Self::ServerError { status_code, body: body.into() }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec { message: message.into() }
    }

    /// Returns the HTTP status code for status-bearing errors.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ClientError { status_code, .. } | Self::ServerError { status_code, .. } => {
                Some(*status_code)
            },
            _ => None,
        }
    }
}

/// Errors surfaced at the emitter boundary: either the envelope could
/// not be built, or it could not be delivered.
#[derive(Debug, Error)]
pub enum EmitError {
    /// Envelope construction failed.
    #[error("envelope construction failed: {0}")]
    Build(#[from] CoreError),

    /// Delivery to the sink failed.
    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}
