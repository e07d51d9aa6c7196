//! Endpoint request handlers
//!
//! One handler per endpoint: [`connect::ConnectHandler`] (CONNECT,
//! TOUCH), [`token::TokenHandler`] (token issuance) and
//! [`log::LogRequestHandler`] (record ingestion). The session layer
//! hands each framed payload to its endpoint's handler and writes the
//! resulting status line and body back to the socket.

pub mod connect;
pub mod log;
pub mod token;

use async_trait::async_trait;
use bytes::Bytes;
use residue_protocol::{ErrorResponse, StatusCode};

/// What the session writes back after one frame
#[derive(Debug)]
pub struct FrameOutcome {
    /// Status line
    pub status: StatusCode,

    /// Optional response body, written after the status line
    pub body: Option<Vec<u8>>,

    /// Whether the session must close after responding
    pub close: bool,
}

impl FrameOutcome {
    /// Plain STATUS_OK acknowledgement (log requests)
    pub fn ok() -> Self {
        Self {
            status: StatusCode::Ok,
            body: None,
            close: false,
        }
    }

    /// CONTINUE with a response body (non-log requests)
    pub fn respond(body: Vec<u8>) -> Self {
        Self {
            status: StatusCode::Continue,
            body: Some(body),
            close: false,
        }
    }

    /// BAD_REQUEST with an error body
    pub fn reject(error_text: impl Into<String>, close: bool) -> Self {
        let body = serde_json::to_vec(&ErrorResponse::new(error_text))
            .expect("error body serializes");
        Self {
            status: StatusCode::BadRequest,
            body: Some(body),
            close,
        }
    }
}

/// Per-endpoint frame handler
#[async_trait]
pub trait FrameHandler: Send + Sync {
    /// Endpoint name for diagnostics
    fn name(&self) -> &'static str;

    /// Handle one framed payload
    ///
    /// `peer_ip` and `date_received` are the envelope metadata stamped
    /// by the session at read time.
    async fn on_frame(&self, payload: Bytes, peer_ip: &str, date_received: u64) -> FrameOutcome;
}
