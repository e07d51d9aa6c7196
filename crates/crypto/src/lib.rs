//! Residue cryptographic envelope
//!
//! Every request reaching the server is framed by this crate:
//!
//! - **Handshake** payloads are RSA ciphertext under the server key
//!   (OAEP by default, PKCS#1 v1.5 for legacy clients), chunked when
//!   the plaintext exceeds one RSA block.
//! - **Post-handshake** payloads are AES-256-CBC frames of the form
//!   `<client_id>:<iv_hex>:<base64 ciphertext>`, keyed by the session
//!   key negotiated at CONNECT.
//! - Optionally, plaintexts are zlib-compressed before encryption.
//!
//! Failure kinds are deliberately coarse: a `BadFrame` or `BadPadding`
//! closes the session, a `DecryptFailed` only drops the request.

mod cipher;
mod compress;
mod error;
mod keys;

pub use cipher::{
    IV_LEN, SYM_KEY_LEN, SymmetricFrame, SymmetricKey, encrypt_for_client, encrypt_with_iv,
    generate_sym_key,
};
pub use compress::{compress, decompress};
pub use error::{CryptoError, Result};
pub use keys::{
    RsaPadding, ServerKeyPair, encrypt_for, parse_public_key_pem, verify_signature, wrap_sym_key,
};

// Client public keys travel through the handshake as PEM; re-export the
// parsed type so downstream crates don't need a direct rsa dependency.
pub use rsa::RsaPublicKey;
