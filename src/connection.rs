//! Connection session: one reader loop and one writer task per client.
//!
//! The reader decodes frames and calls into the hub. The writer is the only
//! code that sends on the transport; everything else reaches the client by
//! queueing on its [`SessionHandle`].

use std::fmt::Display;
use std::sync::Arc;

use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::hub::{Hub, SessionHandle};
use crate::protocol::{Action, ProtocolError};

/// Drive one client connection until it closes.
///
/// `sink` and `stream` are the two halves of the transport. Returns once the
/// session has left its room and the writer has closed the sink.
pub async fn run_session<S, R, E>(sink: S, mut stream: R, hub: Arc<Hub>, queue_capacity: usize)
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let (session, outbound) = SessionHandle::new(queue_capacity);
    let session_id = session.id();
    debug!(session = %session_id, "Session started");

    let mut writer = tokio::spawn(write_loop(sink, outbound, session_id));
    let mut writer_finished = false;

    loop {
        tokio::select! {
            frame = stream.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                        Ok(text) => text,
                        Err(_) => {
                            debug!(session = %session_id, error = %ProtocolError::NotText, "Discarding frame");
                            continue;
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(session = %session_id, "Connection closed by client");
                        break;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        debug!(session = %session_id, error = %e, "Read error");
                        break;
                    }
                };
                dispatch(&hub, &session, text).await;
            }
            _ = &mut writer => {
                writer_finished = true;
                break;
            }
            _ = session.evicted() => {
                debug!(session = %session_id, "Session evicted");
                break;
            }
        }
    }

    hub.unsubscribe(&session).await;
    session.close();
    if session.is_evicted() {
        // The writer may be blocked on a peer that stopped reading.
        writer.abort();
    } else if !writer_finished {
        let _ = writer.await;
    }

    info!(session = %session_id, "Session ended");
}

/// Act on one inbound text frame.
async fn dispatch(hub: &Hub, session: &SessionHandle, text: String) {
    match Action::parse(&text) {
        Ok(Action::Subscribe(room)) => {
            hub.subscribe(session, &room).await;
        }
        Ok(Action::Unsubscribe) => {
            hub.unsubscribe(session).await;
        }
        Ok(Action::Relay(room)) => match room.or_else(|| session.room()) {
            Some(room) => {
                hub.broadcast(&room, &text, session).await;
            }
            None => {
                debug!(session = %session.id(), "Dropping message: no room given and not subscribed");
            }
        },
        Err(e) => {
            debug!(session = %session.id(), error = %e, "Discarding malformed message");
        }
    }
}

/// Send queued messages in order until the queue closes or a send fails.
async fn write_loop<S>(mut sink: S, mut outbound: mpsc::Receiver<String>, session_id: Uuid)
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    while let Some(text) = outbound.recv().await {
        if let Err(e) = sink.send(Message::Text(text)).await {
            debug!(session = %session_id, error = %e, "Write error");
            break;
        }
    }
    let _ = sink.close().await;
}
