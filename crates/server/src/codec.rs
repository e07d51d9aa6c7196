//! Payload classification and decode
//!
//! A framed payload is one of three shapes, told apart by inspection:
//!
//! - a **symmetric** frame (`<client_id>:<iv_hex>:<base64>`), keyed by
//!   the named client's session key;
//! - **plain** JSON (starts with `{` or `[`), only accepted on the
//!   logging endpoint when `allow_plain_log_request` is set;
//! - **RSA** ciphertext (Base64 over the wire), only accepted on the
//!   connect endpoint.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use residue_auth::Client;
use residue_crypto::{CryptoError, SymmetricFrame, decompress};

use crate::state::ServerState;

/// Decode a payload arriving on the logging endpoint
///
/// Returns the session named by the envelope (None for plain requests)
/// and the plaintext.
pub fn decode_log_payload(
    state: &ServerState,
    payload: &[u8],
) -> Result<(Option<Arc<Client>>, Vec<u8>), CryptoError> {
    match SymmetricFrame::parse(payload) {
        Ok(frame) => {
            let (client, plaintext) = decrypt_frame(state, &frame)?;
            Ok((Some(client), plaintext))
        }
        Err(_) if looks_like_json(payload) => {
            if state.config.allow_plain_log_request {
                Ok((None, payload.to_vec()))
            } else {
                Err(CryptoError::decrypt_failed(
                    "plain log requests are not allowed",
                ))
            }
        }
        Err(e) => Err(e),
    }
}

/// Decode a symmetric control payload (TOKEN, TOUCH)
pub fn decode_symmetric(
    state: &ServerState,
    payload: &[u8],
) -> Result<(Arc<Client>, Vec<u8>), CryptoError> {
    let frame = SymmetricFrame::parse(payload)?;
    decrypt_frame(state, &frame)
}

/// Decode an RSA handshake payload (Base64 over the wire)
pub fn decode_handshake(state: &ServerState, payload: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let text = std::str::from_utf8(payload)
        .map_err(|_| CryptoError::bad_frame("handshake payload is not UTF-8"))?;
    let ciphertext = BASE64
        .decode(text.trim())
        .map_err(|_| CryptoError::bad_frame("handshake payload is not Base64"))?;
    state.keys.decrypt(&ciphertext)
}

fn decrypt_frame(
    state: &ServerState,
    frame: &SymmetricFrame,
) -> Result<(Arc<Client>, Vec<u8>), CryptoError> {
    let client = state
        .registry
        .find(&frame.client_id)
        .ok_or_else(|| CryptoError::UnknownClient(frame.client_id.clone()))?;

    let mut plaintext = frame.decrypt(client.symmetric_key())?;
    if state.config.compression {
        plaintext = decompress(&plaintext)?;
    }
    Ok((client, plaintext))
}

fn looks_like_json(payload: &[u8]) -> bool {
    payload
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| matches!(b, b'{' | b'['))
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod tests;
