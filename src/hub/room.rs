//! Room membership.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::session::SessionHandle;

/// Maximum number of members in a room.
pub const ROOM_CAPACITY: usize = 2;

/// Room name to room.
pub(super) type RoomMap = HashMap<String, Arc<Room>>;

/// Members of one room, keyed by session ID.
#[derive(Debug, Default)]
pub(super) struct Members {
    sessions: HashMap<Uuid, SessionHandle>,
}

impl Members {
    pub(super) fn len(&self) -> usize {
        self.sessions.len()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub(super) fn is_full(&self) -> bool {
        self.sessions.len() >= ROOM_CAPACITY
    }

    pub(super) fn insert(&mut self, session: SessionHandle) {
        self.sessions.insert(session.id(), session);
    }

    pub(super) fn remove(&mut self, session: &SessionHandle) -> bool {
        self.sessions.remove(&session.id()).is_some()
    }

    /// Every member except `sender`.
    pub(super) fn others<'a>(
        &'a self,
        sender: &'a SessionHandle,
    ) -> impl Iterator<Item = &'a SessionHandle> + 'a {
        self.sessions
            .values()
            .filter(move |member| member.id() != sender.id())
    }
}

/// A named room of at most [`ROOM_CAPACITY`] sessions.
///
/// Only reachable through the hub's room map.
#[derive(Debug)]
pub(super) struct Room {
    name: String,
    members: Mutex<Members>,
}

impl Room {
    pub(super) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Mutex::new(Members::default()),
        }
    }

    pub(super) fn name(&self) -> &str {
        &self.name
    }

    /// Lock the membership.
    ///
    /// `_held` is the contents of the locked room map. Requiring it means the
    /// room lock is always taken after the map lock.
    pub(super) async fn lock<'a>(&'a self, _held: &RoomMap) -> MutexGuard<'a, Members> {
        self.members.lock().await
    }
}
