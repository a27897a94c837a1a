//! WebSocket upgrade handler.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::Response,
};
use futures::StreamExt;

use crate::connection::run_session;
use crate::hub::Hub;

/// State shared by every WebSocket connection.
#[derive(Clone)]
pub struct RelayState {
    /// Room registry.
    pub hub: Arc<Hub>,
    /// Outbound queue capacity for each session.
    pub queue_capacity: usize,
}

impl RelayState {
    /// Create a new relay state.
    pub fn new(hub: Arc<Hub>, queue_capacity: usize) -> Self {
        Self {
            hub,
            queue_capacity,
        }
    }
}

/// WebSocket relay handler.
///
/// GET {server.path}
pub async fn relay_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<RelayState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Response {
    tracing::info!("WebSocket connection from {}", peer);
    ws.on_upgrade(move |socket| handle_socket(socket, state, peer))
}

async fn handle_socket(socket: WebSocket, state: RelayState, peer: SocketAddr) {
    let (sink, stream) = socket.split();
    run_session(sink, stream, state.hub, state.queue_capacity).await;
    tracing::debug!("WebSocket connection from {} closed", peer);
}
