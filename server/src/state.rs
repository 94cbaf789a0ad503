//! Shared relay state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds one map of live rooms keyed by topic. Each room owns its connection
//! set and presence directory; rooms are fully independent, so the single
//! `RwLock` only serializes membership changes and fan-out within a room
//! against each other, never across rooms doing unrelated work.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use wire::model::PeerPresence;

/// Capacity of each connection's outbound queue. A consumer that falls this
/// far behind starts losing frames rather than stalling the room.
pub const OUTBOUND_CAPACITY: usize = 256;

/// Per-room live state, discarded when the last connection leaves.
#[derive(Debug, Default)]
pub struct RoomState {
    /// Connected peers: connection id -> sender for outgoing text frames.
    pub clients: HashMap<Uuid, mpsc::Sender<String>>,
    /// Presence directory: connection id -> announced presence entry.
    pub presence: HashMap<Uuid, PeerPresence>,
}

impl RoomState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Shared relay state, cloned into every handler.
#[derive(Clone, Default)]
pub struct AppState {
    /// Live rooms keyed by topic string.
    pub rooms: Arc<RwLock<HashMap<String, RoomState>>>,
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;

    /// A presence entry for tests.
    #[must_use]
    pub fn presence(user_id: &str, joined_at_ms: i64) -> PeerPresence {
        PeerPresence {
            user_id: user_id.into(),
            display_name: user_id.to_uppercase(),
            joined_at_ms,
        }
    }

    /// Seed a room with one connected client, returning its receiver.
    pub async fn seed_client(
        state: &AppState,
        topic: &str,
        conn_id: Uuid,
        user_id: &str,
    ) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let mut rooms = state.rooms.write().await;
        let room = rooms.entry(topic.to_owned()).or_insert_with(RoomState::new);
        room.clients.insert(conn_id, tx);
        room.presence.insert(conn_id, presence(user_id, 0));
        rx
    }
}
