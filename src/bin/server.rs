use log::{error, info, warn};
use std::sync::Arc;

use overlay_relay::config::ServerConfig;
use overlay_relay::core::RelayServer;
use overlay_relay::listener;

#[tokio::main]
async fn main() {
    // Initialize env
    let env_loaded = dotenvy::dotenv();

    // Initialize logging
    env_logger::init();

    match env_loaded {
        Ok(path) => info!("Environment variables loaded from {}", path.display()),
        Err(e) => warn!("Failed to load .env file: {}", e),
    };

    // Load config from .env
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Configuration: host={}, port={}, wire_format={}",
        config.host, config.port, config.wire_format
    );

    let server = Arc::new(RelayServer::new(config));

    let handle = match listener::serve(server).await {
        Ok(handle) => handle,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Overlays can subscribe at ws://{}/ws?type=<chat|notification|emotewall>",
        handle.local_addr()
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }

    let closed = handle.stop().await;
    info!("Shut down with {} overlay connections closed", closed);
}
