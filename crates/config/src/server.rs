//! Server endpoint and transport configuration
//!
//! Residue listens on three TCP ports: connect (handshake/touch),
//! token (access code issuance) and logging (record ingestion).

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// RSA padding scheme used for the handshake envelope
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RsaPadding {
    /// RSAES-OAEP with SHA-256 (default)
    #[default]
    Oaep,
    /// RSAES-PKCS1-v1_5 (legacy clients)
    Pkcs1v15,
}

/// Server key pair on disk
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerKeyConfig {
    /// Path to the server RSA private key (PEM, PKCS#8 or PKCS#1)
    pub private_key: PathBuf,

    /// Path to the server RSA public key (PEM)
    pub public_key: PathBuf,
}

/// Endpoint and transport settings
///
/// # Example
///
/// ```toml
/// [server]
/// address = "0.0.0.0"
/// connect_port = 8777
/// token_port = 8778
/// logging_port = 8779
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address for all endpoints
    /// Default: "0.0.0.0"
    pub address: String,

    /// Handshake endpoint port (CONNECT, TOUCH)
    /// Default: 8777
    pub connect_port: u16,

    /// Token endpoint port
    /// Default: 8778
    pub token_port: u16,

    /// Log ingestion endpoint port
    /// Default: 8779
    pub logging_port: u16,

    /// Byte terminating the ASCII length prefix of every frame
    /// Default: ':'
    pub frame_delimiter: char,

    /// Maximum accepted frame payload size in bytes
    /// Default: 8 MiB
    pub max_frame_size: usize,

    /// Read buffer size per connection
    /// Default: 64 KiB
    pub buffer_size: usize,

    /// Enable TCP_NODELAY
    /// Default: true
    pub no_delay: bool,

    /// Enable TCP keepalive
    /// Default: true
    pub keepalive: bool,

    /// RSA key pair used for the handshake envelope
    pub key: ServerKeyConfig,

    /// RSA padding scheme for handshake decryption and key wrapping
    /// Default: oaep
    pub rsa_padding: RsaPadding,

    /// Dispatcher poll interval between drain rounds
    /// Default: 100ms
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".into(),
            connect_port: 8777,
            token_port: 8778,
            logging_port: 8779,
            frame_delimiter: ':',
            max_frame_size: 8 * 1024 * 1024,
            buffer_size: 64 * 1024,
            no_delay: true,
            keepalive: true,
            key: ServerKeyConfig::default(),
            rsa_padding: RsaPadding::Oaep,
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl ServerConfig {
    /// Socket address for the connect endpoint
    pub fn connect_addr(&self) -> String {
        format!("{}:{}", self.address, self.connect_port)
    }

    /// Socket address for the token endpoint
    pub fn token_addr(&self) -> String {
        format!("{}:{}", self.address, self.token_port)
    }

    /// Socket address for the logging endpoint
    pub fn logging_addr(&self) -> String {
        format!("{}:{}", self.address, self.logging_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ports() {
        let config = ServerConfig::default();
        assert_eq!(config.connect_port, 8777);
        assert_eq!(config.token_port, 8778);
        assert_eq!(config.logging_port, 8779);
        assert_eq!(config.frame_delimiter, ':');
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ServerConfig = toml::from_str("logging_port = 9000").unwrap();
        assert_eq!(config.logging_port, 9000);
        assert_eq!(config.connect_port, 8777);
        assert_eq!(config.poll_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_rsa_padding_names() {
        let config: ServerConfig = toml::from_str("rsa_padding = \"pkcs1v15\"").unwrap();
        assert_eq!(config.rsa_padding, RsaPadding::Pkcs1v15);
    }

    #[test]
    fn test_addresses() {
        let config = ServerConfig {
            address: "127.0.0.1".into(),
            ..Default::default()
        };
        assert_eq!(config.connect_addr(), "127.0.0.1:8777");
        assert_eq!(config.logging_addr(), "127.0.0.1:8779");
    }
}
