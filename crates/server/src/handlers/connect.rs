//! Connect endpoint handler
//!
//! Accepts two request kinds:
//!
//! - **CONNECT** (RSA-enveloped): registers a session. The server
//!   generates the session key, wraps it under the client's RSA public
//!   key and returns it with the lease terms.
//! - **TOUCH** (symmetric envelope): restarts a live session's lease.
//!
//! Handshake failures close the session with BAD_REQUEST; a TOUCH for a
//! dead session keeps it open so the client can re-CONNECT on the same
//! connection.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use residue_auth::{Client, generate_client_id};
use residue_crypto::{
    SymmetricFrame, encrypt_for_client, generate_sym_key, parse_public_key_pem, wrap_sym_key,
};
use residue_protocol::{ConnectResponse, ConnectionRequest, StatusCode, TouchResponse};
use tracing::{info, warn};

use crate::handlers::{FrameHandler, FrameOutcome};
use crate::state::ServerState;

/// A rejection with its session disposition
struct Reject {
    text: String,
    close: bool,
}

impl Reject {
    fn keep_open(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            close: false,
        }
    }

    fn close(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            close: true,
        }
    }
}

/// Handler for the connect endpoint
pub struct ConnectHandler {
    state: Arc<ServerState>,
}

impl ConnectHandler {
    /// Create the handler
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }

    fn handle(&self, payload: &[u8], date_received: u64) -> Result<Vec<u8>, Reject> {
        // A symmetric frame means an established session: TOUCH
        if let Ok(frame) = SymmetricFrame::parse(payload) {
            return self.handle_symmetric(&frame, date_received);
        }

        // Otherwise this must be an RSA-enveloped handshake
        let plaintext = crate::codec::decode_handshake(&self.state, payload)
            .map_err(|e| Reject::close(e.to_string()))?;
        let request: ConnectionRequest = serde_json::from_slice(&plaintext)
            .map_err(|e| Reject::close(format!("invalid handshake body: {e}")))?;

        match request {
            ConnectionRequest::Connect {
                rsa_public_key,
                client_id,
                ..
            } => self.handle_connect(&rsa_public_key, client_id, date_received),
            ConnectionRequest::Touch { .. } => {
                Err(Reject::close("TOUCH must use the symmetric envelope"))
            }
        }
    }

    fn handle_symmetric(
        &self,
        frame: &SymmetricFrame,
        date_received: u64,
    ) -> Result<Vec<u8>, Reject> {
        let client = self
            .state
            .registry
            .find(&frame.client_id)
            .ok_or_else(|| Reject::keep_open(format!("no client found [{}]", frame.client_id)))?;

        let plaintext = frame.decrypt(client.symmetric_key()).map_err(|e| Reject {
            text: e.to_string(),
            close: e.is_session_fatal(),
        })?;
        let request: ConnectionRequest = serde_json::from_slice(&plaintext)
            .map_err(|e| Reject::keep_open(format!("invalid request body: {e}")))?;

        match request {
            ConnectionRequest::Touch { client_id, .. } => {
                if client_id != frame.client_id {
                    return Err(Reject::keep_open("client id mismatch in TOUCH"));
                }
                self.handle_touch(&client, date_received)
            }
            ConnectionRequest::Connect { .. } => Err(Reject::keep_open(
                "CONNECT must be RSA-enveloped, not symmetric",
            )),
        }
    }

    fn handle_connect(
        &self,
        rsa_public_key: &str,
        client_id: Option<String>,
        date_received: u64,
    ) -> Result<Vec<u8>, Reject> {
        let public_key = parse_public_key_pem(rsa_public_key)
            .map_err(|e| Reject::close(e.to_string()))?;

        let (id, is_known, user) = match client_id {
            Some(id) => match self.state.known_client_key(&id) {
                Some(configured) => {
                    if configured != &public_key {
                        return Err(Reject::close(format!(
                            "public key does not match the configured key for client [{id}]"
                        )));
                    }
                    let user = self
                        .state
                        .config
                        .access
                        .clients
                        .get(&id)
                        .and_then(|c| c.user.clone());
                    (id, true, user)
                }
                None => {
                    return Err(Reject::close(format!(
                        "client [{id}] is not declared in configuration"
                    )));
                }
            },
            None => {
                if !self.state.config.allow_unknown_clients {
                    return Err(Reject::close("unknown clients are not allowed"));
                }
                (generate_client_id(), false, None)
            }
        };

        let symmetric_key = generate_sym_key();
        let age = self.state.config.client_age;

        let client = Client::new(
            id.clone(),
            public_key.clone(),
            symmetric_key,
            date_received,
            age,
            is_known,
        )
        .with_user(user);
        self.state.registry.add(client);

        let wrapped = wrap_sym_key(&public_key, self.state.rsa_padding(), &symmetric_key)
            .map_err(|e| Reject::close(e.to_string()))?;

        info!(client_id = %id, known = is_known, age, "client connected");

        let response = ConnectResponse {
            status: StatusCode::Ok.as_u8(),
            client_id: id,
            key: BASE64.encode(wrapped),
            age,
            date_created: date_received,
            server_flags: self.state.server_flags(),
        };
        serde_json::to_vec(&response).map_err(|e| Reject::close(e.to_string()))
    }

    fn handle_touch(&self, client: &Client, date_received: u64) -> Result<Vec<u8>, Reject> {
        if !client.is_alive(date_received) {
            return Err(Reject::keep_open("client is dead, reconnect"));
        }

        let refreshed = self
            .state
            .registry
            .touch(client.id(), date_received)
            .ok_or_else(|| Reject::keep_open("client evicted during touch, reconnect"))?;

        info!(client_id = %refreshed.id(), "client touched");

        let response = TouchResponse {
            status: StatusCode::Ok.as_u8(),
            client_id: refreshed.id().to_string(),
            age: refreshed.age(),
            date_created: refreshed.date_created(),
        };
        let body = serde_json::to_vec(&response)
            .map_err(|e| Reject::keep_open(e.to_string()))?;
        Ok(encrypt_for_client(refreshed.id(), refreshed.symmetric_key(), &body).into_bytes())
    }
}

#[async_trait]
impl FrameHandler for ConnectHandler {
    fn name(&self) -> &'static str {
        "connect"
    }

    async fn on_frame(&self, payload: Bytes, peer_ip: &str, date_received: u64) -> FrameOutcome {
        match self.handle(&payload, date_received) {
            Ok(body) => FrameOutcome::respond(body),
            Err(reject) => {
                warn!(peer = %peer_ip, error = %reject.text, "connect request rejected");
                FrameOutcome::reject(reject.text, reject.close)
            }
        }
    }
}
