//! Serve command - run the Residue server

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use residue_config::Config;
use residue_server::Server;
use residue_sinks::{DiskSink, DiskSinkConfig, LogSink};

/// Serve command arguments
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file (defaults to configs/residue.toml if
    /// not specified)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let config_path = args
        .config
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(default)".to_string());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        config = %config_path,
        "Residue starting"
    );

    let config = match args.config {
        Some(path) => {
            // User explicitly provided config path - must exist
            if !path.exists() {
                return Err(anyhow::anyhow!(
                    "config file not found: {}",
                    path.display()
                ));
            }
            Config::from_file(&path).context("failed to load configuration")?
        }
        None => {
            // No config provided - try default paths, fall back to defaults
            let default_paths = [
                PathBuf::from("configs/residue.toml"),
                PathBuf::from("residue.toml"),
            ];

            let mut loaded = None;
            for path in &default_paths {
                if path.exists() {
                    info!(config = %path.display(), "using config file");
                    loaded =
                        Some(Config::from_file(path).context("failed to load configuration")?);
                    break;
                }
            }

            loaded.unwrap_or_else(|| {
                info!("no config file found, using defaults");
                Config::default()
            })
        }
    };

    if let Err(e) = run_server(config).await {
        error!(error = %e, "server error");
        return Err(e);
    }

    info!("Residue shutdown complete");
    Ok(())
}

/// Build the sink and run the server until ctrl-c
async fn run_server(config: Config) -> Result<()> {
    let sink_config = DiskSinkConfig::default()
        .with_path(config.sink.path.clone())
        .with_format(config.sink.format.clone())
        .with_max_file_size(config.sink.max_file_size);
    let sink = Arc::new(DiskSink::new(sink_config).context("failed to create sink")?);

    info!(path = %config.sink.path.display(), "file sink ready");

    let server = Server::new(config, sink as Arc<dyn LogSink>)
        .context("failed to initialize server")?;

    let cancel = CancellationToken::new();
    let shutdown_cancel = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            shutdown_cancel.cancel();
        }
    });

    server.run(cancel).await.context("server failed")
}
