//! Known logger and client declarations
//!
//! A *known* logger is declared in configuration and may carry its own
//! policy overrides. Unknown loggers are only accepted when the global
//! `allow_unknown_loggers` flag is set.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use serde::Deserialize;

/// Per-logger policy
///
/// # Example
///
/// ```toml
/// [loggers.app]
/// require_token = true
/// token_life = "1h"
///
/// [loggers.metrics]
/// require_token = false
/// allow_plain_log_request = true
/// user = "metrics-agent"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Whether log requests for this logger must carry a valid token
    /// Default: true
    pub require_token: bool,

    /// Token lifetime in seconds issued for this logger; 0 means
    /// non-expiring (only honored when `allow_non_expiring_tokens` is
    /// set)
    /// Default: unset (fall back to the global `token_age`)
    pub token_life: Option<u64>,

    /// Per-logger override of the global plain-request flag
    /// Default: false
    pub allow_plain_log_request: bool,

    /// User identity the logger's files are attributed to
    pub user: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            require_token: true,
            token_life: None,
            allow_plain_log_request: false,
            user: None,
        }
    }
}

/// A client declared in configuration, keyed by client id
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Path to the client's RSA public key (PEM)
    pub public_key: PathBuf,

    /// User identity attached to unknown loggers this client creates
    #[serde(default)]
    pub user: Option<String>,
}

/// Logger and client declarations plus the logger blacklist
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Known loggers, keyed by logger id
    pub loggers: HashMap<String, LoggerConfig>,

    /// Known clients, keyed by client id
    pub clients: HashMap<String, ClientConfig>,

    /// Logger ids that are never writable, known or not
    pub blacklist: HashSet<String>,
}

impl AccessConfig {
    /// Whether a logger id is declared in configuration
    #[inline]
    pub fn is_known_logger(&self, logger_id: &str) -> bool {
        self.loggers.contains_key(logger_id)
    }

    /// Whether a logger id is blacklisted
    #[inline]
    pub fn is_blacklisted(&self, logger_id: &str) -> bool {
        self.blacklist.contains(logger_id)
    }

    /// Whether a client id is declared in configuration
    #[inline]
    pub fn is_known_client(&self, client_id: &str) -> bool {
        self.clients.contains_key(client_id)
    }

    /// Per-logger policy, if the logger is known
    #[inline]
    pub fn logger(&self, logger_id: &str) -> Option<&LoggerConfig> {
        self.loggers.get(logger_id)
    }

    /// Whether the logger accepts plain requests via its own override
    #[inline]
    pub fn logger_allows_plain(&self, logger_id: &str) -> bool {
        self.loggers
            .get(logger_id)
            .is_some_and(|l| l.allow_plain_log_request)
    }

    /// Whether requests for this logger must carry a valid token
    ///
    /// Unknown loggers always require one.
    #[inline]
    pub fn logger_requires_token(&self, logger_id: &str) -> bool {
        self.loggers.get(logger_id).is_none_or(|l| l.require_token)
    }
}
