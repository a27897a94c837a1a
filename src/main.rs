use std::sync::Arc;

use tracing::{error, info};

use pairhub::{Config, Hub, RelayServer};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = pairhub::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        pairhub::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    info!("pairhub - two-party signaling relay");
    info!(
        "Server configured on {}:{}{}",
        config.server.host, config.server.port, config.server.path
    );

    let server = RelayServer::new(&config, Arc::new(Hub::new()));
    if let Err(e) = server.run().await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
