//! Room registry.
//!
//! The hub is the only place rooms are created, joined, left and deleted.
//! Every operation takes the room-map lock first and a room's own lock second;
//! [`Room::lock`] cannot be called without the locked map, so the order holds
//! by construction.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use super::room::{Members, Room, RoomMap};
use super::session::{EnqueueOutcome, SessionHandle};
use crate::protocol::ServerMessage;

/// Result of a subscribe request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// The session joined the room.
    Joined {
        /// Number of existing members sent a `newSub` notice.
        notified: usize,
    },
    /// The session was already a member of this room. Nothing changed.
    AlreadyJoined,
    /// The room is full. The session was sent `subRejected`.
    Rejected,
}

/// Registry of rooms.
///
/// One instance is shared by every connection of a server. Independent
/// instances share nothing.
pub struct Hub {
    rooms: Mutex<RoomMap>,
}

impl Hub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(RoomMap::new()),
        }
    }

    /// Join `session` to `room_name`, creating the room if needed.
    ///
    /// A session already in another room leaves it first, unless the target
    /// room is full, in which case it stays where it is.
    pub async fn subscribe(&self, session: &SessionHandle, room_name: &str) -> SubscribeOutcome {
        let mut rooms = self.rooms.lock().await;

        let current = session.room();
        if current.as_deref() == Some(room_name) {
            debug!(session = %session.id(), room = %room_name, "Already subscribed");
            return SubscribeOutcome::AlreadyJoined;
        }

        if let Some(room) = rooms.get(room_name).cloned() {
            if room.lock(&rooms).await.is_full() {
                session.enqueue(ServerMessage::SubRejected.to_json());
                info!(session = %session.id(), room = %room_name, "Subscribe rejected: room full");
                return SubscribeOutcome::Rejected;
            }
        }

        if let Some(previous) = current {
            Self::leave_locked(&mut rooms, session, &previous).await;
        }

        let room = rooms
            .entry(room_name.to_string())
            .or_insert_with(|| Arc::new(Room::new(room_name)))
            .clone();
        let mut members = room.lock(&rooms).await;
        members.insert(session.clone());
        session.set_room(Some(room_name.to_string()));

        let notified = Self::notify(&members, session, &ServerMessage::new_sub(room.name()));
        info!(
            session = %session.id(),
            room = %room_name,
            members = members.len(),
            "Subscribed"
        );

        SubscribeOutcome::Joined { notified }
    }

    /// Remove `session` from its room.
    ///
    /// Returns false if the session was not in a room.
    pub async fn unsubscribe(&self, session: &SessionHandle) -> bool {
        let mut rooms = self.rooms.lock().await;
        match session.room() {
            Some(room_name) => Self::leave_locked(&mut rooms, session, &room_name).await,
            None => false,
        }
    }

    /// Forward `message` verbatim to every member of `room_name` except `sender`.
    ///
    /// Returns the number of members the message was queued for. Broadcasts to
    /// a room that does not exist are dropped.
    pub async fn broadcast(&self, room_name: &str, message: &str, sender: &SessionHandle) -> usize {
        let rooms = self.rooms.lock().await;
        let Some(room) = rooms.get(room_name) else {
            debug!(session = %sender.id(), room = %room_name, "Broadcast to unknown room dropped");
            return 0;
        };

        let members = room.lock(&rooms).await;
        members
            .others(sender)
            .filter(|member| member.enqueue(message.to_string()) == EnqueueOutcome::Queued)
            .count()
    }

    /// Number of rooms currently registered.
    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Number of members in `room_name`, or None if the room does not exist.
    pub async fn member_count(&self, room_name: &str) -> Option<usize> {
        let rooms = self.rooms.lock().await;
        let room = rooms.get(room_name)?;
        let count = room.lock(&rooms).await.len();
        Some(count)
    }

    /// Take `session` out of `room_name`, tell the rest, and drop the room once empty.
    async fn leave_locked(rooms: &mut RoomMap, session: &SessionHandle, room_name: &str) -> bool {
        session.set_room(None);
        let Some(room) = rooms.get(room_name).cloned() else {
            return false;
        };

        let mut members = room.lock(rooms).await;
        let removed = members.remove(session);
        if removed {
            Self::notify(&members, session, &ServerMessage::im_offline(room_name));
            info!(session = %session.id(), room = %room_name, "Unsubscribed");
        }

        if members.is_empty() {
            drop(members);
            rooms.remove(room_name);
            debug!(room = %room_name, "Room removed");
        }

        removed
    }

    /// Queue a relay-generated message for every member except `sender`.
    ///
    /// The caller holds the room lock.
    fn notify(members: &Members, sender: &SessionHandle, message: &ServerMessage) -> usize {
        let json = message.to_json();
        members
            .others(sender)
            .filter(|member| member.enqueue(json.clone()) == EnqueueOutcome::Queued)
            .count()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}
