//! Test helpers for relay integration tests.
//!
//! Provides TestServer, TestClient, and helper functions for end-to-end tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use pairhub::{Config, Hub, RelayServer};

/// Default timeout for test operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to wait before deciding no message is coming.
pub const SILENCE: Duration = Duration::from_millis(200);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A relay running on a random local port.
pub struct TestServer {
    /// Bound address.
    pub addr: SocketAddr,
    /// The server's hub, for inspecting room state.
    pub hub: Arc<Hub>,
}

impl TestServer {
    /// Start a server with default settings.
    pub async fn start() -> Self {
        Self::start_with(Config::default()).await
    }

    /// Start a server with the given configuration, bound to 127.0.0.1:0.
    pub async fn start_with(mut config: Config) -> Self {
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;

        let hub = Arc::new(Hub::new());
        let server = RelayServer::new(&config, hub.clone());
        let addr = server
            .run_with_addr()
            .await
            .expect("Failed to start relay");

        Self { addr, hub }
    }

    /// WebSocket URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }

    /// Connect a client to the default relay path.
    pub async fn connect(&self) -> TestClient {
        TestClient::connect(&self.url("/comm")).await
    }

    /// Wait until `room` has `expected` members (None = room absent).
    pub async fn wait_for_members(&self, room: &str, expected: Option<usize>) {
        let waited = timeout(DEFAULT_TIMEOUT, async {
            while self.hub.member_count(room).await != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(
            waited.is_ok(),
            "room {room:?} did not reach {expected:?} members (now {:?})",
            self.hub.member_count(room).await
        );
    }
}

/// WebSocket client speaking the relay protocol.
pub struct TestClient {
    ws: WsStream,
}

impl TestClient {
    /// Connect to `url`.
    pub async fn connect(url: &str) -> Self {
        let (ws, _) = connect_async(url).await.expect("Failed to connect");
        Self { ws }
    }

    /// Send a raw text frame.
    pub async fn send_text(&mut self, text: &str) {
        self.ws
            .send(Message::text(text.to_string()))
            .await
            .expect("Failed to send");
    }

    /// Send a subscribe request.
    pub async fn subscribe(&mut self, room: &str) {
        let request = serde_json::json!({"action": "subscribe", "room": room});
        self.send_text(&request.to_string()).await;
    }

    /// Receive the next text frame.
    pub async fn recv_text(&mut self) -> String {
        loop {
            let msg = timeout(DEFAULT_TIMEOUT, self.ws.next())
                .await
                .expect("timeout waiting for message")
                .expect("stream closed")
                .expect("ws error");
            if let Message::Text(text) = msg {
                return text.to_string();
            }
        }
    }

    /// Receive the next text frame parsed as JSON.
    pub async fn recv_json(&mut self) -> Value {
        serde_json::from_str(&self.recv_text().await).expect("invalid JSON from relay")
    }

    /// Assert that nothing arrives for a short while.
    pub async fn assert_silent(&mut self) {
        if let Ok(Some(Ok(msg))) = timeout(SILENCE, self.ws.next()).await {
            panic!("Unexpected message: {msg:?}");
        }
    }

    /// Wait for the server to close the connection.
    pub async fn wait_closed(&mut self) {
        let closed = timeout(DEFAULT_TIMEOUT, async {
            loop {
                match self.ws.next().await {
                    None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                }
            }
        })
        .await;
        assert!(closed.is_ok(), "server did not close the connection");
    }

    /// Close the connection.
    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}
