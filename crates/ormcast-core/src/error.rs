//! Error types for envelope construction.
//!
//! Build failures are configuration problems: an event-type string that
//! maps to no known lifecycle notification, or a sender descriptor that
//! is missing required metadata. They are fatal to the single build call
//! and never corrupt shared state.

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while constructing an event envelope.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// Event-type string does not name any known lifecycle notification.
    #[error("unknown signal name: {name}")]
    UnknownSignal {
        /// The unrecognized event-type string.
        name: String,
    },

    /// Sender descriptor is missing required metadata.
    #[error("invalid sender descriptor: {message}")]
    InvalidDescriptor {
        /// What was missing or malformed.
        message: String,
    },
}

impl CoreError {
    /// Creates an unknown-signal error from the offending name.
    pub fn unknown_signal(name: impl Into<String>) -> Self {
        Self::UnknownSignal { name: name.into() }
    }

    /// Creates an invalid-descriptor error from a message.
    pub fn invalid_descriptor(message: impl Into<String>) -> Self {
        Self::InvalidDescriptor { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_format() {
        let err = CoreError::unknown_signal("django.orm.post.truncate");
        assert_eq!(err.to_string(), "unknown signal name: django.orm.post.truncate");

        let err = CoreError::invalid_descriptor("empty app label");
        assert_eq!(err.to_string(), "invalid sender descriptor: empty app label");
    }
}
