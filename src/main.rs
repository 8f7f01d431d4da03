//! Game session service binary.
//!
//! Loads configuration, opens the store, and serves the HTTP API until
//! shutdown.

use clap::Parser;
use stakehouse::{
    api::{ApiConfig, ApiServer},
    config::ConfigLoader,
    engine::GameEngine,
    store::GameStore,
};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "stakehouse", about = "Casino game session service", version)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<String>,

    /// Override the listen host.
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the storage directory.
    #[arg(long)]
    data_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stakehouse=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_path(path);
    }
    let mut config = loader.load()?;

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }

    info!(data_dir = %config.storage.data_dir, "opening game store");
    let store = Arc::new(GameStore::open(&config.storage.data_dir)?);
    let engine = GameEngine::new(store);

    let api_config = ApiConfig {
        host: config.server.host,
        port: config.server.port,
        allowed_origins: config.server.allowed_origins,
        request_timeout_secs: config.server.request_timeout_secs,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    ApiServer::new(api_config, engine).run().await
}
