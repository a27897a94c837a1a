//! Per-connection handle shared between a session and the hub.
//!
//! The handle owns the only sender of the session's outbound queue. Dropping
//! that sender is how the queue is closed, so enqueue and close go through the
//! same lock and can never interleave.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use uuid::Uuid;

/// Result of pushing a message onto a session's outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The message is waiting for the writer task.
    Queued,
    /// The queue was full. The session has been evicted and will disconnect.
    Evicted,
    /// The session is already shutting down; the message was dropped.
    Closed,
}

struct SessionInner {
    id: Uuid,
    outbound: Mutex<Option<mpsc::Sender<String>>>,
    room: Mutex<Option<String>>,
    evicted: watch::Sender<bool>,
}

/// Identity and outbound queue of one connected client.
///
/// Clones refer to the same session.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionInner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionHandle {
    /// Create a session with an outbound queue of `capacity` entries.
    ///
    /// Returns the handle and the receiving end for the writer task.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = Self {
            inner: Arc::new(SessionInner {
                id: Uuid::new_v4(),
                outbound: Mutex::new(Some(tx)),
                room: Mutex::new(None),
                evicted: watch::Sender::new(false),
            }),
        };
        (handle, rx)
    }

    /// Unique session ID.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Name of the room this session is in, if any.
    pub fn room(&self) -> Option<String> {
        lock(&self.inner.room).clone()
    }

    pub(super) fn set_room(&self, room: Option<String>) {
        *lock(&self.inner.room) = room;
    }

    /// Push a message onto the outbound queue without waiting.
    ///
    /// A full queue means the peer is not reading. The queue is closed and the
    /// session is flagged as evicted so its reader stops and the connection is
    /// dropped, even if the writer is stuck on a stalled socket.
    pub fn enqueue(&self, message: String) -> EnqueueOutcome {
        let mut outbound = lock(&self.inner.outbound);
        let Some(tx) = outbound.as_ref() else {
            return EnqueueOutcome::Closed;
        };

        match tx.try_send(message) {
            Ok(()) => EnqueueOutcome::Queued,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(session = %self.inner.id, "Outbound queue full, disconnecting slow peer");
                outbound.take();
                self.inner.evicted.send_replace(true);
                EnqueueOutcome::Evicted
            }
            Err(TrySendError::Closed(_)) => {
                outbound.take();
                EnqueueOutcome::Closed
            }
        }
    }

    /// Close the outbound queue. No further messages will be accepted.
    pub fn close(&self) {
        lock(&self.inner.outbound).take();
    }

    /// Check if the session was evicted for not keeping up.
    pub fn is_evicted(&self) -> bool {
        *self.inner.evicted.borrow()
    }

    /// Resolve once the session has been evicted.
    pub async fn evicted(&self) {
        let mut rx = self.inner.evicted.subscribe();
        let _ = rx.wait_for(|evicted| *evicted).await;
    }

    /// Check if the outbound queue has been closed.
    pub fn is_closed(&self) -> bool {
        lock(&self.inner.outbound).is_none()
    }
}

impl PartialEq for SessionHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for SessionHandle {}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.inner.id)
            .field("room", &self.room())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[test]
    fn test_new_session_is_unjoined() {
        let (session, _rx) = SessionHandle::new(4);
        assert!(session.room().is_none());
        assert!(!session.is_closed());
    }

    #[test]
    fn test_ids_are_unique() {
        let (a, _ra) = SessionHandle::new(1);
        let (b, _rb) = SessionHandle::new(1);
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[tokio::test]
    async fn test_enqueue_preserves_order() {
        let (session, mut rx) = SessionHandle::new(4);
        assert_eq!(session.enqueue("one".to_string()), EnqueueOutcome::Queued);
        assert_eq!(session.enqueue("two".to_string()), EnqueueOutcome::Queued);

        assert_eq!(rx.recv().await.as_deref(), Some("one"));
        assert_eq!(rx.recv().await.as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_full_queue_evicts() {
        let (session, mut rx) = SessionHandle::new(2);
        assert_eq!(session.enqueue("a".to_string()), EnqueueOutcome::Queued);
        assert_eq!(session.enqueue("b".to_string()), EnqueueOutcome::Queued);
        assert_eq!(session.enqueue("c".to_string()), EnqueueOutcome::Evicted);
        assert!(session.is_closed());
        assert!(session.is_evicted());
        timeout(Duration::from_secs(1), session.evicted())
            .await
            .unwrap();

        // Already-queued messages are still drained, then the queue ends.
        assert_eq!(rx.recv().await.as_deref(), Some("a"));
        assert_eq!(rx.recv().await.as_deref(), Some("b"));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_enqueue_after_close() {
        let (session, mut rx) = SessionHandle::new(4);
        session.close();

        assert_eq!(session.enqueue("late".to_string()), EnqueueOutcome::Closed);
        assert_eq!(rx.recv().await, None);
        assert!(!session.is_evicted());
    }

    #[test]
    fn test_enqueue_after_receiver_dropped() {
        let (session, rx) = SessionHandle::new(4);
        drop(rx);

        assert_eq!(session.enqueue("lost".to_string()), EnqueueOutcome::Closed);
        assert!(session.is_closed());
    }

    #[test]
    fn test_close_from_clone() {
        let (session, _rx) = SessionHandle::new(4);
        let other = session.clone();
        other.close();
        assert!(session.is_closed());
    }
}
