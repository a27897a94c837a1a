//! pairhub - two-party signaling relay
//!
//! Clients connect over WebSocket, join a named room, and have their messages
//! forwarded to the other occupant. Rooms hold at most two participants, which
//! fits exchanging session-negotiation messages between two peers.

pub mod config;
pub mod connection;
pub mod error;
pub mod hub;
pub mod logging;
pub mod protocol;
pub mod web;

pub use config::Config;
pub use connection::run_session;
pub use error::{PairhubError, Result};
pub use hub::{EnqueueOutcome, Hub, SessionHandle, SubscribeOutcome, ROOM_CAPACITY};
pub use protocol::{Action, ProtocolError, ServerMessage};
pub use web::RelayServer;
