//! Residue configuration
//!
//! TOML-based configuration loading with sensible defaults. A minimal
//! config only needs the server key paths; everything else has a
//! working default.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use residue_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("allow_bulk_log_request = true").unwrap();
//! assert!(config.allow_bulk_log_request);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! allow_bulk_log_request = true
//! allow_unknown_loggers = false
//! max_items_in_bulk = 5
//!
//! [server]
//! connect_port = 8777
//! logging_port = 8779
//!
//! [server.key]
//! private_key = "keys/server.pem"
//! public_key = "keys/server.pub.pem"
//!
//! [loggers.app]
//! token_life = 300
//!
//! [sink]
//! path = "/var/log/residue"
//! ```

mod error;
mod loggers;
mod logging;
mod server;
mod sink;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub use error::{ConfigError, Result};
pub use loggers::{AccessConfig, ClientConfig, LoggerConfig};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use server::{RsaPadding, ServerConfig, ServerKeyConfig};
pub use sink::{DEFAULT_FORMAT, SinkConfig};

use serde::Deserialize;

/// Main configuration structure
///
/// Feature flags live at the top level under their stable names; the
/// transport, access and sink sections are nested.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Accept unencrypted JSON log frames
    pub allow_plain_log_request: bool,

    /// Accept arrays of records in one payload
    pub allow_bulk_log_request: bool,

    /// Accept loggers that are not declared in configuration
    pub allow_unknown_loggers: bool,

    /// Accept CONNECT from clients that are not declared in configuration
    pub allow_unknown_clients: bool,

    /// Permit issuing tokens with `token_life = 0` (non-expiring)
    pub allow_non_expiring_tokens: bool,

    /// Expect payloads to be zlib-compressed before encryption
    pub compression: bool,

    /// Cap on records processed per bulk payload
    /// Default: 5
    pub max_items_in_bulk: usize,

    /// Per-item sleep in the dispatch loop (backpressure knob)
    /// Default: 0
    #[serde(with = "humantime_serde")]
    pub dispatch_delay: Duration,

    /// Client lease in seconds; 0 means clients never expire
    /// Default: 259200 (72h)
    pub client_age: u64,

    /// Default token lifetime in seconds when the logger does not
    /// override it
    /// Default: 3600
    pub token_age: u64,

    /// How often the integrity task sweeps expired clients and tokens
    /// Default: 300s
    #[serde(with = "humantime_serde")]
    pub client_integrity_interval: Duration,

    /// Endpoint and transport settings
    pub server: ServerConfig,

    /// Known loggers, known clients and the blacklist
    #[serde(flatten)]
    pub access: AccessConfig,

    /// File sink settings
    pub sink: SinkConfig,

    /// Internal logging configuration
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allow_plain_log_request: false,
            allow_bulk_log_request: true,
            allow_unknown_loggers: false,
            allow_unknown_clients: true,
            allow_non_expiring_tokens: false,
            compression: false,
            max_items_in_bulk: 5,
            dispatch_delay: Duration::ZERO,
            client_age: 259_200,
            token_age: 3600,
            client_integrity_interval: Duration::from_secs(300),
            server: ServerConfig::default(),
            access: AccessConfig::default(),
            sink: SinkConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or contains invalid TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Checks for port conflicts, delimiter sanity and
    /// blacklist/known-logger contradictions.
    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags() {
        let config = Config::default();
        assert!(!config.allow_plain_log_request);
        assert!(config.allow_bulk_log_request);
        assert!(!config.allow_unknown_loggers);
        assert_eq!(config.max_items_in_bulk, 5);
        assert_eq!(config.dispatch_delay, Duration::ZERO);
    }

    #[test]
    fn test_parse_full() {
        let config = Config::from_str(
            r#"
            allow_unknown_loggers = true
            compression = true
            max_items_in_bulk = 50
            dispatch_delay = "1ms"
            client_integrity_interval = "2m"
            blacklist = ["noisy"]

            [server]
            logging_port = 9000

            [loggers.app]
            token_life = 300
        "#,
        )
        .unwrap();

        assert!(config.allow_unknown_loggers);
        assert!(config.compression);
        assert_eq!(config.max_items_in_bulk, 50);
        assert_eq!(config.dispatch_delay, Duration::from_millis(1));
        assert_eq!(config.client_integrity_interval, Duration::from_secs(120));
        assert_eq!(config.server.logging_port, 9000);
        assert!(config.access.is_known_logger("app"));
        assert!(config.access.is_blacklisted("noisy"));
    }

    #[test]
    fn test_port_conflict_rejected() {
        let err = Config::from_str(
            r#"
            [server]
            connect_port = 8777
            token_port = 8777
        "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePort { port: 8777, .. }));
    }

    #[test]
    fn test_blacklisted_known_logger_rejected() {
        let err = Config::from_str(
            r#"
            blacklist = ["app"]

            [loggers.app]
        "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::BlacklistedKnownLogger { logger } if logger == "app"
        ));
    }
}
