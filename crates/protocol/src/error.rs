//! Protocol error types
//!
//! Errors that can occur when framing or parsing requests.

use thiserror::Error;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors that can occur during protocol operations
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The length prefix is malformed
    #[error("bad frame: {reason}")]
    BadFrame {
        /// What was wrong with the prefix
        reason: &'static str,
    },

    /// Frame exceeds the configured maximum
    #[error("frame size {size} exceeds limit {max}")]
    FrameTooLarge { size: usize, max: usize },

    /// Payload is not valid JSON
    #[error("invalid json: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Logger id fails the charset rules
    #[error("invalid logger id '{0}'")]
    InvalidLoggerId(String),

    /// Request type not valid on this endpoint
    #[error("unexpected request: {0}")]
    UnexpectedRequest(&'static str),
}

impl ProtocolError {
    /// Create a bad frame error
    #[inline]
    pub fn bad_frame(reason: &'static str) -> Self {
        Self::BadFrame { reason }
    }

    /// Create a frame too large error
    #[inline]
    pub fn frame_too_large(size: usize, max: usize) -> Self {
        Self::FrameTooLarge { size, max }
    }

    /// Whether the session must be closed rather than retried
    ///
    /// Framing failures mean the byte stream is unusable; payload-level
    /// failures only drop the request.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Self::BadFrame { .. } | Self::FrameTooLarge { .. })
    }
}
