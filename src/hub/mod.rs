//! Room registry and per-session handles.
//!
//! This module provides:
//! - [`Hub`], the registry that creates, joins, leaves and deletes rooms
//! - [`SessionHandle`], the outbound side of one connection as seen by the hub
//! - Rooms of at most [`ROOM_CAPACITY`] members

mod registry;
mod room;
mod session;

pub use registry::{Hub, SubscribeOutcome};
pub use room::ROOM_CAPACITY;
pub use session::{EnqueueOutcome, SessionHandle};
