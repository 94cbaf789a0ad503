//! WebSocket handler — bidirectional frame relay.
//!
//! DESIGN
//! ======
//! On upgrade, generates a connection ID and enters a `select!` loop:
//! - Inbound peer frames → `join` binds the connection to a room topic,
//!   everything else is fanned out verbatim to the room's other peers
//! - Relayed frames from room peers → forwarded to this socket
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → connection starts unbound
//! 2. First `join` → register in room, everyone gets `presence_sync`
//! 3. Subsequent frames → verbatim fan-out excluding sender
//! 4. Close → leave room → survivors get `presence_sync`, empty room torn down

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use wire::payload::JoinPayload;
use wire::{Envelope, event, room_topic};

use crate::services;
use crate::state::{AppState, OUTBOUND_CAPACITY};

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();

    // Per-connection channel for frames relayed from room peers.
    let (conn_tx, mut conn_rx) = mpsc::channel::<String>(OUTBOUND_CAPACITY);

    info!(%conn_id, "ws: connection opened");

    // Topic this connection has joined, if any.
    let mut joined: Option<String> = None;

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        process_inbound_text(&state, &mut joined, conn_id, &conn_tx, &text).await;
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = conn_rx.recv() => {
                if socket.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    if let Some(topic) = joined {
        services::room::leave(&state, &topic, conn_id).await;
    }
    info!(%conn_id, "ws: connection closed");
}

// =============================================================================
// FRAME HANDLING
// =============================================================================

/// Process one inbound text frame.
///
/// Split from the socket loop so tests can exercise join/relay behavior
/// without a live websocket.
pub(crate) async fn process_inbound_text(
    state: &AppState,
    joined: &mut Option<String>,
    conn_id: Uuid,
    conn_tx: &mpsc::Sender<String>,
    text: &str,
) {
    let envelope = match Envelope::decode(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(%conn_id, error = %e, "ws: dropping malformed frame");
            return;
        }
    };

    if envelope.event == event::JOIN {
        let join: JoinPayload = match envelope.payload_as() {
            Ok(join) => join,
            Err(e) => {
                warn!(%conn_id, error = %e, "ws: dropping malformed join");
                return;
            }
        };
        let topic = room_topic(&join.room_id);

        // A re-join to a different room moves the connection.
        if let Some(old_topic) = joined.take() {
            if old_topic == topic {
                *joined = Some(old_topic);
                return;
            }
            services::room::leave(state, &old_topic, conn_id).await;
        }

        services::room::join(state, &topic, conn_id, join.presence, conn_tx.clone()).await;
        *joined = Some(topic);
        return;
    }

    let Some(topic) = joined.as_deref() else {
        warn!(%conn_id, event = %envelope.event, "ws: dropping frame before join");
        return;
    };

    debug!(%conn_id, event = %envelope.event, "ws: relaying frame");
    services::room::broadcast(state, topic, text, conn_id).await;
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
