//! Token endpoint handler
//!
//! Issues per-logger access codes to live sessions. The token lifetime
//! comes from the logger's configuration when declared, falling back to
//! the global `token_age`; a declared lifetime of 0 means non-expiring
//! and is only honored when `allow_non_expiring_tokens` is set.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use residue_crypto::encrypt_for_client;
use residue_protocol::{StatusCode, TokenRequest, TokenResponse, valid_logger_id};
use tracing::{debug, warn};

use crate::handlers::{FrameHandler, FrameOutcome};
use crate::state::ServerState;

/// Handler for the token endpoint
pub struct TokenHandler {
    state: Arc<ServerState>,
}

impl TokenHandler {
    /// Create the handler
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }

    /// Lifetime for a token on the given logger
    fn token_life(&self, logger_id: &str) -> u64 {
        let config = &self.state.config;
        match config.access.logger(logger_id).and_then(|l| l.token_life) {
            Some(0) if config.allow_non_expiring_tokens => 0,
            Some(0) => config.token_age,
            Some(life) => life,
            None => config.token_age,
        }
    }

    fn handle(&self, payload: &[u8], date_received: u64) -> Result<Vec<u8>, (String, bool)> {
        let (client, plaintext) = crate::codec::decode_symmetric(&self.state, payload)
            .map_err(|e| (e.to_string(), e.is_session_fatal()))?;

        let request: TokenRequest = serde_json::from_slice(&plaintext)
            .map_err(|e| (format!("invalid token request: {e}"), false))?;

        if !client.is_alive(date_received) {
            return Err(("client is dead".to_string(), false));
        }
        if !valid_logger_id(&request.logger_id) {
            return Err((format!("invalid logger id '{}'", request.logger_id), false));
        }

        let life = self.token_life(&request.logger_id);
        let token = self
            .state
            .tokens
            .issue(client.id(), &request.logger_id, life, date_received);

        debug!(
            client_id = %client.id(),
            logger = %request.logger_id,
            life,
            "token issued"
        );

        let response = TokenResponse {
            status: StatusCode::Ok.as_u8(),
            token: token.value().to_string(),
            life,
        };
        let body = serde_json::to_vec(&response).map_err(|e| (e.to_string(), false))?;
        Ok(encrypt_for_client(client.id(), client.symmetric_key(), &body).into_bytes())
    }
}

#[async_trait]
impl FrameHandler for TokenHandler {
    fn name(&self) -> &'static str {
        "token"
    }

    async fn on_frame(&self, payload: Bytes, peer_ip: &str, date_received: u64) -> FrameOutcome {
        match self.handle(&payload, date_received) {
            Ok(body) => FrameOutcome::respond(body),
            Err((text, close)) => {
                warn!(peer = %peer_ip, error = %text, "token request rejected");
                FrameOutcome::reject(text, close)
            }
        }
    }
}
