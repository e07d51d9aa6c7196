//! Residue server - ingestion pipeline and TCP endpoints
//!
//! Wires the envelope, protocol, auth and sink crates into the running
//! server:
//!
//! - three TCP endpoints (connect, token, logging), each a small accept
//!   loop spawning one task per session;
//! - a dual-buffer queue between the logging sessions and **one**
//!   dispatch worker;
//! - the policy evaluator guarding the sink;
//! - the integrity task sweeping expired clients and tokens.
//!
//! Sessions never block on processing: a log frame is acknowledged as
//! soon as it is framed, and everything after that is server-side.

pub mod codec;
pub mod endpoint;
pub mod error;
pub mod handlers;
pub mod integrity;
pub mod policy;
pub mod queue;
pub mod state;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;

use std::collections::HashMap;
use std::sync::Arc;

use residue_config::Config;
use residue_crypto::{RsaPublicKey, ServerKeyPair, parse_public_key_pem};
use residue_sinks::LogSink;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::endpoint::{Endpoint, EndpointConfig};
use crate::error::{Result, ServerError};
use crate::handlers::connect::ConnectHandler;
use crate::handlers::log::LogRequestHandler;
use crate::handlers::token::TokenHandler;
use crate::state::ServerState;

/// The assembled server, ready to run
pub struct Server {
    state: Arc<ServerState>,
    log_handler: Arc<LogRequestHandler>,
}

impl Server {
    /// Load keys, build the shared state and the handlers
    ///
    /// With no private key path configured an ephemeral pair is
    /// generated: handy for development, useless across restarts.
    pub fn new(config: Config, sink: Arc<dyn LogSink>) -> Result<Self> {
        let config = Arc::new(config);

        let key_config = &config.server.key;
        let keys = if key_config.private_key.as_os_str().is_empty() {
            warn!("no server key configured, generating an ephemeral RSA key pair");
            ServerKeyPair::generate(2048, padding_of(&config))?
        } else {
            ServerKeyPair::load(
                &key_config.private_key,
                &key_config.public_key,
                padding_of(&config),
            )?
        };
        if !keys.verify_key_pair() {
            return Err(ServerError::KeyPairMismatch);
        }

        let known_client_keys = load_known_client_keys(&config);
        let state = Arc::new(ServerState::new(config, keys, known_client_keys));
        let log_handler = Arc::new(LogRequestHandler::new(Arc::clone(&state), sink));

        Ok(Self { state, log_handler })
    }

    /// Shared state (registries, clocks, configuration)
    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    /// The logging handler, including its dispatch metrics
    pub fn log_handler(&self) -> &Arc<LogRequestHandler> {
        &self.log_handler
    }

    /// Run until the token is cancelled
    ///
    /// Shutdown order: stop accepting, stop the dispatcher after its
    /// current round, discard whatever is still queued. At-least-once
    /// delivery is the client's concern.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let codec = self.state.frame_codec();
        let server_config = &self.state.config.server;

        let connect_endpoint = Endpoint::bind(
            endpoint_config("connect", server_config.connect_addr(), server_config),
            codec,
            Arc::new(ConnectHandler::new(Arc::clone(&self.state))),
        )
        .await?;
        let token_endpoint = Endpoint::bind(
            endpoint_config("token", server_config.token_addr(), server_config),
            codec,
            Arc::new(TokenHandler::new(Arc::clone(&self.state))),
        )
        .await?;
        let logging_endpoint = Endpoint::bind(
            endpoint_config("logging", server_config.logging_addr(), server_config),
            codec,
            Arc::clone(&self.log_handler) as Arc<dyn handlers::FrameHandler>,
        )
        .await?;

        info!(
            connect = %connect_endpoint.local_addr()?,
            token = %token_endpoint.local_addr()?,
            logging = %logging_endpoint.local_addr()?,
            "residue server starting"
        );

        let integrity_task = integrity::spawn(Arc::clone(&self.state), cancel.clone());
        let dispatcher = self.log_handler.spawn_dispatcher(cancel.clone());

        let connect_task = tokio::spawn(connect_endpoint.run(cancel.clone()));
        let token_task = tokio::spawn(token_endpoint.run(cancel.clone()));
        let logging_task = tokio::spawn(logging_endpoint.run(cancel.clone()));

        cancel.cancelled().await;

        self.log_handler.stop();
        let _ = dispatcher.await;
        let _ = integrity_task.await;
        for task in [connect_task, token_task, logging_task] {
            match task.await {
                Ok(result) => result?,
                Err(e) => warn!(error = %e, "endpoint task panicked"),
            }
        }

        let dropped = self.log_handler.queued();
        if dropped > 0 {
            warn!(dropped, "discarding queued log requests at shutdown");
        }

        info!("residue server stopped");
        Ok(())
    }
}

fn endpoint_config(
    name: &'static str,
    bind_addr: String,
    server: &residue_config::ServerConfig,
) -> EndpointConfig {
    EndpointConfig {
        name,
        bind_addr,
        buffer_size: server.buffer_size,
        no_delay: server.no_delay,
        keepalive: server.keepalive,
    }
}

fn padding_of(config: &Config) -> residue_crypto::RsaPadding {
    match config.server.rsa_padding {
        residue_config::RsaPadding::Oaep => residue_crypto::RsaPadding::Oaep,
        residue_config::RsaPadding::Pkcs1v15 => residue_crypto::RsaPadding::Pkcs1v15,
    }
}

/// Load the public keys of configured clients; a bad key file disables
/// that client rather than aborting startup
fn load_known_client_keys(config: &Config) -> HashMap<String, RsaPublicKey> {
    let mut keys = HashMap::new();
    for (client_id, client) in &config.access.clients {
        match std::fs::read_to_string(&client.public_key) {
            Ok(pem) => match parse_public_key_pem(&pem) {
                Ok(key) => {
                    keys.insert(client_id.clone(), key);
                }
                Err(e) => warn!(
                    client_id = %client_id,
                    error = %e,
                    "invalid public key for configured client, ignoring it"
                ),
            },
            Err(e) => warn!(
                client_id = %client_id,
                path = %client.public_key.display(),
                error = %e,
                "cannot read public key for configured client, ignoring it"
            ),
        }
    }
    keys
}
