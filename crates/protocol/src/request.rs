//! Handshake, touch and token payloads
//!
//! These are the non-log request and response bodies. Requests carry a
//! client timestamp under `_t`; the server records its own receive time
//! and never trusts the client clock for validity decisions.

use serde::{Deserialize, Serialize};

use crate::status::StatusCode;

/// Requests accepted on the connect endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ConnectionRequest {
    /// Initial handshake: register and receive a session key
    #[serde(rename = "CONNECT")]
    Connect {
        /// Client clock at send time
        #[serde(rename = "_t", default)]
        timestamp: u64,

        /// Client's RSA public key (PEM) the session key is wrapped under
        rsa_public_key: String,

        /// Declared id; required for clients listed in configuration
        #[serde(default)]
        client_id: Option<String>,
    },

    /// Lease extension for a live client
    #[serde(rename = "TOUCH")]
    Touch {
        #[serde(rename = "_t", default)]
        timestamp: u64,

        /// The session to extend
        client_id: String,
    },
}

/// Request accepted on the token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRequest {
    #[serde(rename = "_t", default)]
    pub timestamp: u64,

    /// Logger the token authorizes
    pub logger_id: String,
}

/// CONNECT response
///
/// Sent as plain JSON: the session key inside is already wrapped under
/// the client's RSA public key, nothing else in the body is secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectResponse {
    pub status: u8,

    /// Server-assigned session id
    pub client_id: String,

    /// Base64 of the RSA-wrapped session key
    pub key: String,

    /// Lease length in seconds; 0 means the client never expires
    pub age: u64,

    /// Epoch seconds the lease started
    pub date_created: u64,

    /// Feature flags enabled on this server
    pub server_flags: Vec<String>,
}

/// TOUCH response, delivered inside the symmetric envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TouchResponse {
    pub status: u8,
    pub client_id: String,
    pub age: u64,
    pub date_created: u64,
}

/// TOKEN response, delivered inside the symmetric envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub status: u8,

    /// Opaque access code for the requested logger
    pub token: String,

    /// Lifetime in seconds; 0 means non-expiring
    pub life: u64,
}

/// Error body for failed non-log requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u8,
    pub error_text: String,
}

impl ErrorResponse {
    /// Build an error body with the BAD_REQUEST status
    pub fn new(error_text: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BadRequest.as_u8(),
            error_text: error_text.into(),
        }
    }
}
