//! Symmetric frame cipher
//!
//! Every post-handshake request travels as an AES-256-CBC frame:
//!
//! ```text
//! <client_id>:<iv_hex>:<base64 ciphertext>
//! ```
//!
//! The client id is plaintext so the server can look up the session key
//! before deciphering; the IV is fresh per frame.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::{CryptoError, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Symmetric session key length (AES-256)
pub const SYM_KEY_LEN: usize = 32;

/// CBC initialization vector length
pub const IV_LEN: usize = 16;

/// AES block size
const BLOCK_LEN: usize = 16;

/// A client's symmetric session key
pub type SymmetricKey = [u8; SYM_KEY_LEN];

/// Generate a fresh session key
pub fn generate_sym_key() -> SymmetricKey {
    let mut key = [0u8; SYM_KEY_LEN];
    OsRng.fill_bytes(&mut key);
    key
}

/// A parsed symmetric frame, not yet deciphered
#[derive(Debug, Clone)]
pub struct SymmetricFrame {
    /// Session id named by the frame
    pub client_id: String,
    /// Per-frame initialization vector
    pub iv: [u8; IV_LEN],
    /// Raw ciphertext
    pub ciphertext: Vec<u8>,
}

impl SymmetricFrame {
    /// Parse a `<client_id>:<iv_hex>:<base64>` frame
    ///
    /// # Errors
    ///
    /// Returns `BadFrame` if the payload does not split into three
    /// non-empty parts, the IV is not 32 hex characters, or the
    /// ciphertext is not valid Base64.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| CryptoError::bad_frame("frame is not UTF-8"))?;

        let mut parts = text.splitn(3, ':');
        let client_id = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| CryptoError::bad_frame("missing client id"))?;
        let iv_hex = parts
            .next()
            .ok_or_else(|| CryptoError::bad_frame("missing IV"))?;
        let ct_b64 = parts
            .next()
            .ok_or_else(|| CryptoError::bad_frame("missing ciphertext"))?;

        let iv_bytes = hex::decode(iv_hex.trim())
            .map_err(|_| CryptoError::bad_frame("IV is not hex"))?;
        let iv: [u8; IV_LEN] = iv_bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::bad_frame("IV must be 16 bytes"))?;

        let ciphertext = BASE64
            .decode(ct_b64.trim())
            .map_err(|_| CryptoError::bad_frame("ciphertext is not Base64"))?;

        Ok(Self {
            client_id: client_id.to_string(),
            iv,
            ciphertext,
        })
    }

    /// Decipher the frame with the session key
    ///
    /// # Errors
    ///
    /// Returns `BadPadding` when the ciphertext is not block-aligned or
    /// PKCS#7 unpadding fails.
    pub fn decrypt(&self, key: &SymmetricKey) -> Result<Vec<u8>> {
        if self.ciphertext.is_empty() || self.ciphertext.len() % BLOCK_LEN != 0 {
            return Err(CryptoError::BadPadding);
        }

        Aes256CbcDec::new(key.into(), (&self.iv).into())
            .decrypt_padded_vec_mut::<Pkcs7>(&self.ciphertext)
            .map_err(|_| CryptoError::BadPadding)
    }
}

/// Encrypt a plaintext for a client, producing the full wire frame
///
/// A fresh IV is generated per call.
pub fn encrypt_for_client(client_id: &str, key: &SymmetricKey, plaintext: &[u8]) -> String {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    encrypt_with_iv(client_id, key, &iv, plaintext)
}

/// Encrypt with a caller-supplied IV
pub fn encrypt_with_iv(
    client_id: &str,
    key: &SymmetricKey,
    iv: &[u8; IV_LEN],
    plaintext: &[u8],
) -> String {
    let ciphertext =
        Aes256CbcEnc::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    format!(
        "{}:{}:{}",
        client_id,
        hex::encode(iv),
        BASE64.encode(ciphertext)
    )
}

#[cfg(test)]
#[path = "cipher_test.rs"]
mod tests;
