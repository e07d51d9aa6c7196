//! Server error types

use residue_crypto::CryptoError;
use residue_protocol::ProtocolError;
use residue_sinks::SinkError;
use thiserror::Error;

/// Result type for server operations
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors that can occur while running the server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind an endpoint
    #[error("failed to bind {name} endpoint to {addr}: {source}")]
    Bind {
        /// Endpoint name (connect, token, logging)
        name: &'static str,
        /// The address that failed
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error on a session
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Envelope failure
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Protocol failure
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Sink failure
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// The configured key files do not form a pair
    #[error("server RSA key pair mismatch: public key does not match private key")]
    KeyPairMismatch,
}
