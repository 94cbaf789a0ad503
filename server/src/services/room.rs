//! Room service — join/leave bookkeeping and verbatim fan-out.
//!
//! DESIGN
//! ======
//! A room exists while at least one connection is bound to its topic. Joining
//! registers the connection's outbound sender and presence entry, then pushes
//! a fresh `presence_sync` to everyone in the room (the joiner included) so
//! each peer can recompute the oldest-member ordering locally. Leaving is the
//! mirror image: the room is torn down entirely when its last connection
//! goes, otherwise the survivors get an updated `presence_sync`.
//!
//! Fan-out is best effort. A full outbound queue costs that one consumer the
//! frame; a closed one means the socket task already died, so the connection
//! is reaped from the room.

use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use wire::model::PeerPresence;
use wire::payload::PresenceSyncPayload;
use wire::{Envelope, event};

use crate::state::{AppState, RoomState};

// =============================================================================
// JOIN / LEAVE
// =============================================================================

/// Bind a connection to a room topic, creating the room if needed.
///
/// Every member of the room, the joiner included, receives a `presence_sync`
/// carrying the new full presence list.
pub async fn join(
    state: &AppState,
    topic: &str,
    conn_id: Uuid,
    presence: PeerPresence,
    tx: mpsc::Sender<String>,
) {
    let mut rooms = state.rooms.write().await;
    let room = rooms.entry(topic.to_owned()).or_insert_with(RoomState::new);

    room.clients.insert(conn_id, tx);
    room.presence.insert(conn_id, presence);
    info!(%topic, %conn_id, peers = room.clients.len(), "connection joined room");

    push_presence(topic, room);
}

/// Unbind a connection from its room.
///
/// Tears the room down when this was the last connection; otherwise pushes an
/// updated `presence_sync` to the survivors.
pub async fn leave(state: &AppState, topic: &str, conn_id: Uuid) {
    let mut rooms = state.rooms.write().await;
    let Some(room) = rooms.get_mut(topic) else {
        return;
    };

    room.clients.remove(&conn_id);
    room.presence.remove(&conn_id);
    info!(%topic, %conn_id, remaining = room.clients.len(), "connection left room");

    if room.clients.is_empty() {
        rooms.remove(topic);
        info!(%topic, "room torn down");
    } else {
        push_presence(topic, room);
    }
}

// =============================================================================
// FAN-OUT
// =============================================================================

/// Relay a raw text frame to every connection in a room except the sender.
///
/// The frame is forwarded byte for byte; the relay never reserializes peer
/// traffic. Connections whose outbound channel has closed are removed from
/// the room afterwards.
pub async fn broadcast(state: &AppState, topic: &str, frame: &str, exclude: Uuid) {
    let mut dead = Vec::new();
    {
        let rooms = state.rooms.read().await;
        let Some(room) = rooms.get(topic) else {
            return;
        };

        for (conn_id, tx) in &room.clients {
            if *conn_id == exclude {
                continue;
            }
            match tx.try_send(frame.to_owned()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    // Best-effort: a slow consumer loses this frame rather
                    // than stalling the whole room.
                    warn!(%topic, %conn_id, "outbound queue full, dropping frame");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    dead.push(*conn_id);
                }
            }
        }
    }

    for conn_id in dead {
        warn!(%topic, %conn_id, "outbound channel closed, reaping connection");
        leave(state, topic, conn_id).await;
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Queue a `presence_sync` with the room's full presence list to every
/// member. Caller holds the room lock; delivery is best effort.
fn push_presence(topic: &str, room: &RoomState) {
    let payload = PresenceSyncPayload { peers: room.presence.values().cloned().collect() };
    let envelope = Envelope::new(event::PRESENCE_SYNC, &payload);
    let Ok(frame) = envelope.encode() else {
        return;
    };

    for (conn_id, tx) in &room.clients {
        if tx.try_send(frame.clone()).is_err() {
            warn!(%topic, %conn_id, "failed to queue presence_sync");
        }
    }
}

#[cfg(test)]
#[path = "room_test.rs"]
mod tests;
