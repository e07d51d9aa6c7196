//! Crypto envelope error types

use std::io;
use thiserror::Error;

/// Result type for envelope operations
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors that can occur while framing, wrapping or unwrapping payloads
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The frame does not have the `<client_id>:<iv_hex>:<base64>` shape
    #[error("bad frame: {0}")]
    BadFrame(String),

    /// The frame names a client the registry does not hold
    #[error("unknown client '{0}'")]
    UnknownClient(String),

    /// Decryption produced garbage (wrong key, truncated input, bad zlib)
    #[error("decrypt failed: {0}")]
    DecryptFailed(String),

    /// Ciphertext failed PKCS#7 unpadding or is not block-aligned
    #[error("bad padding")]
    BadPadding,

    /// Signature did not verify or could not be decoded
    #[error("bad signature")]
    BadSignature,

    /// Key material could not be parsed or used
    #[error("key error: {0}")]
    Key(String),

    /// Key file could not be read
    #[error("failed to read key file '{path}': {source}")]
    KeyIo {
        /// Path to the key file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },
}

impl CryptoError {
    /// Create a BadFrame error
    #[inline]
    pub fn bad_frame(reason: impl Into<String>) -> Self {
        Self::BadFrame(reason.into())
    }

    /// Create a DecryptFailed error
    #[inline]
    pub fn decrypt_failed(reason: impl Into<String>) -> Self {
        Self::DecryptFailed(reason.into())
    }

    /// Create a Key error
    #[inline]
    pub fn key(reason: impl Into<String>) -> Self {
        Self::Key(reason.into())
    }

    /// Whether the session must be closed rather than retried
    ///
    /// A malformed frame or padding failure means the peer is not
    /// speaking the protocol; a decrypt failure may just be a stale key,
    /// so the session stays open and the client is expected to
    /// reconnect.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Self::BadFrame(_) | Self::BadPadding)
    }
}
