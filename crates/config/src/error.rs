//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error - duplicate endpoint port
    #[error("port {port} is used by multiple endpoints: {endpoints}")]
    DuplicatePort {
        /// The conflicting port
        port: u16,
        /// Endpoints using this port
        endpoints: String,
    },

    /// Validation error - invalid value
    #[error("{section} has invalid {field}: {message}")]
    InvalidValue {
        /// Config section (e.g. "server", "loggers")
        section: &'static str,
        /// Field name
        field: &'static str,
        /// Error message
        message: String,
    },

    /// A logger id appears in both known_loggers and the blacklist
    #[error("logger '{logger}' is both known and blacklisted")]
    BlacklistedKnownLogger {
        /// The conflicting logger id
        logger: String,
    },
}

impl ConfigError {
    /// Create a DuplicatePort error
    pub fn duplicate_port(port: u16, endpoints: impl Into<String>) -> Self {
        Self::DuplicatePort {
            port,
            endpoints: endpoints.into(),
        }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(
        section: &'static str,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            section,
            field,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_port_error() {
        let err = ConfigError::duplicate_port(8777, "connect, token");
        assert!(err.to_string().contains("8777"));
        assert!(err.to_string().contains("connect, token"));
    }

    #[test]
    fn test_invalid_value_error() {
        let err = ConfigError::invalid_value("server", "frame_delimiter", "must be one byte");
        assert!(err.to_string().contains("frame_delimiter"));
        assert!(err.to_string().contains("one byte"));
    }
}
