//! HTTP front end for the relay.
//!
//! Accepts WebSocket upgrades on the configured path and hands each socket
//! to a connection session. Also serves a plain health check.

pub mod router;
pub mod server;
pub mod ws;

pub use router::{create_health_router, create_router};
pub use server::RelayServer;
pub use ws::{relay_ws_handler, RelayState};
