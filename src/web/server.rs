//! Relay server.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::hub::Hub;
use crate::Result;

use super::router::create_router;
use super::ws::RelayState;

/// WebSocket relay server.
pub struct RelayServer {
    /// Host to bind.
    host: String,
    /// Port to bind.
    port: u16,
    /// Path that accepts WebSocket upgrades.
    ws_path: String,
    /// State handed to every connection.
    state: RelayState,
}

impl RelayServer {
    /// Create a new relay server around `hub`.
    pub fn new(config: &Config, hub: Arc<Hub>) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            ws_path: config.server.path.clone(),
            state: RelayState::new(hub, config.relay.outbound_queue_capacity),
        }
    }

    /// Get the configured bind address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the shared hub.
    pub fn hub(&self) -> Arc<Hub> {
        self.state.hub.clone()
    }

    async fn bind(&self) -> Result<(TcpListener, SocketAddr)> {
        let listener = TcpListener::bind((self.host.as_str(), self.port)).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Relay listening on ws://{}{}", local_addr, self.ws_path);
        Ok((listener, local_addr))
    }

    /// Run the server until Ctrl-C.
    pub async fn run(self) -> Result<()> {
        let (listener, _) = self.bind().await?;
        let router = create_router(self.state, &self.ws_path);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        tracing::info!("Relay stopped");
        Ok(())
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let (listener, local_addr) = self.bind().await?;
        let router = create_router(self.state, &self.ws_path);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!("Relay server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

/// Resolve when the process receives Ctrl-C.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> Config {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config
    }

    #[test]
    fn test_relay_server_new() {
        let server = RelayServer::new(&create_test_config(), Arc::new(Hub::new()));
        assert_eq!(server.addr(), "127.0.0.1:0");
        assert_eq!(server.ws_path, "/comm");
        assert_eq!(server.state.queue_capacity, 256);
    }

    #[tokio::test]
    async fn test_relay_server_run() {
        let server = RelayServer::new(&create_test_config(), Arc::new(Hub::new()));
        let addr = server.run_with_addr().await.unwrap();

        let resp = reqwest::get(format!("http://{}/health", addr)).await.unwrap();

        assert!(resp.status().is_success());
        assert_eq!(resp.text().await.unwrap(), "OK");
    }
}
