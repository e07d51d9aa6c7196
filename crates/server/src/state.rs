//! Shared server state
//!
//! One [`ServerState`] is built at startup and shared by every
//! endpoint, the dispatch worker and the integrity task.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use residue_auth::{ClientRegistry, TokenStore};
use residue_config::Config;
use residue_crypto::{RsaPadding, RsaPublicKey, ServerKeyPair};
use residue_protocol::FrameCodec;

use crate::integrity::IntegrityClock;

/// Everything the handlers share
pub struct ServerState {
    /// Parsed configuration
    pub config: Arc<Config>,

    /// Live client sessions
    pub registry: ClientRegistry,

    /// Issued access tokens
    pub tokens: TokenStore,

    /// The server RSA key pair
    pub keys: ServerKeyPair,

    /// Last-execution clock of the integrity task
    pub integrity: IntegrityClock,

    /// Public keys of clients declared in configuration, loaded at
    /// startup
    known_client_keys: HashMap<String, RsaPublicKey>,

    /// User identities opportunistically attached to unknown loggers
    unknown_logger_users: RwLock<HashMap<String, String>>,
}

impl ServerState {
    /// Assemble the state from loaded pieces
    pub fn new(
        config: Arc<Config>,
        keys: ServerKeyPair,
        known_client_keys: HashMap<String, RsaPublicKey>,
    ) -> Self {
        Self {
            config,
            registry: ClientRegistry::new(),
            tokens: TokenStore::new(),
            keys,
            integrity: IntegrityClock::default(),
            known_client_keys,
            unknown_logger_users: RwLock::new(HashMap::new()),
        }
    }

    /// The frame codec for this deployment
    pub fn frame_codec(&self) -> FrameCodec {
        FrameCodec::new(
            self.config.server.frame_delimiter,
            self.config.server.max_frame_size,
        )
    }

    /// The configured handshake padding scheme
    pub fn rsa_padding(&self) -> RsaPadding {
        match self.config.server.rsa_padding {
            residue_config::RsaPadding::Oaep => RsaPadding::Oaep,
            residue_config::RsaPadding::Pkcs1v15 => RsaPadding::Pkcs1v15,
        }
    }

    /// The configured public key for a known client, if any
    pub fn known_client_key(&self, client_id: &str) -> Option<&RsaPublicKey> {
        self.known_client_keys.get(client_id)
    }

    /// Feature flags enabled on this server, for the CONNECT response
    pub fn server_flags(&self) -> Vec<String> {
        let mut flags = Vec::new();
        let c = &self.config;
        if c.allow_plain_log_request {
            flags.push("ALLOW_PLAIN_LOG_REQUEST".to_string());
        }
        if c.allow_bulk_log_request {
            flags.push("ALLOW_BULK_LOG_REQUEST".to_string());
        }
        if c.allow_unknown_loggers {
            flags.push("ALLOW_UNKNOWN_LOGGERS".to_string());
        }
        if c.compression {
            flags.push("COMPRESSION".to_string());
        }
        flags
    }

    /// Record the user identity behind an unknown logger
    ///
    /// Only known clients can vouch for an unknown logger, and only
    /// while `allow_unknown_loggers` is set; the caller checks both.
    pub fn attach_unknown_logger_user(&self, logger_id: &str, user: &str) {
        self.unknown_logger_users
            .write()
            .insert(logger_id.to_string(), user.to_string());
    }

    /// The user identity attached to an unknown logger, if any
    pub fn unknown_logger_user(&self, logger_id: &str) -> Option<String> {
        self.unknown_logger_users.read().get(logger_id).cloned()
    }
}
