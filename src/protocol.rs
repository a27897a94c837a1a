//! Wire protocol for the relay.
//!
//! Every frame is one JSON object. Clients name what they want in `action`;
//! anything that is not a room-membership command is relayed untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from decoding an inbound frame.
///
/// These never end a connection: the offending frame is dropped.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Payload is not a JSON object with a string `action`.
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary frame that is not valid UTF-8.
    #[error("binary frame is not UTF-8 text")]
    NotText,

    /// `subscribe` without a room name.
    #[error("subscribe requires a non-empty room")]
    MissingRoom,
}

/// The fields the relay reads from an inbound frame.
#[derive(Debug, Clone, Deserialize)]
struct Inbound {
    action: String,
    #[serde(default)]
    room: Option<String>,
}

/// What a client asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Join the named room.
    Subscribe(String),
    /// Leave the current room but keep the connection.
    Unsubscribe,
    /// Forward the frame to the other member of a room. `None` when the frame
    /// names no room, meaning the sender's own room.
    Relay(Option<String>),
}

impl Action {
    /// Decode an inbound text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let inbound: Inbound = serde_json::from_str(text)?;
        let room = inbound.room.filter(|room| !room.is_empty());

        match (inbound.action.as_str(), room) {
            ("subscribe", Some(room)) => Ok(Action::Subscribe(room)),
            ("subscribe", None) => Err(ProtocolError::MissingRoom),
            ("unsubscribe", _) => Ok(Action::Unsubscribe),
            (_, room) => Ok(Action::Relay(room)),
        }
    }
}

/// Messages generated by the relay itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ServerMessage {
    /// The requested room already has two members.
    SubRejected,
    /// Someone joined the room the recipient is in.
    NewSub {
        /// Room name.
        room: String,
    },
    /// The other member left the room.
    ImOffline {
        /// Room name.
        room: String,
    },
}

impl ServerMessage {
    /// Create a join notice.
    pub fn new_sub(room: impl Into<String>) -> Self {
        Self::NewSub { room: room.into() }
    }

    /// Create a departure notice.
    pub fn im_offline(room: impl Into<String>) -> Self {
        Self::ImOffline { room: room.into() }
    }

    /// Serialize to the JSON text sent on the wire.
    pub fn to_json(&self) -> String {
        // Only string fields: serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}
