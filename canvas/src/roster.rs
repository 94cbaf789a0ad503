//! Presence roster: each peer's view of who is in the room, and the
//! oldest-peer election that picks a single snapshot responder.
//!
//! The election is soft and non-byzantine: it assumes all peers hold the
//! same presence snapshot at decision time. When views transiently diverge,
//! zero or several peers may answer; correctness is carried entirely by the
//! requester's idempotent merge, so there is nothing to lock here.

#[cfg(test)]
#[path = "roster_test.rs"]
mod roster_test;

use wire::model::PeerPresence;

/// The membership snapshot last pushed by the relay.
#[derive(Debug, Default)]
pub struct Roster {
    peers: Vec<PeerPresence>,
}

impl Roster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the roster with a fresh membership snapshot.
    pub fn sync(&mut self, peers: Vec<PeerPresence>) {
        self.peers = peers;
    }

    /// The peer that answers `request_state`: smallest `joined_at_ms`, ties
    /// broken by lexicographically smaller `user_id`.
    ///
    /// The timestamp is an opaque ordering hint reported by each peer, not a
    /// synchronized clock; the tie-break keeps the election deterministic
    /// even when two peers report the same instant.
    #[must_use]
    pub fn oldest(&self) -> Option<&PeerPresence> {
        self.peers.iter().min_by(|a, b| {
            a.joined_at_ms
                .cmp(&b.joined_at_ms)
                .then_with(|| a.user_id.cmp(&b.user_id))
        })
    }

    /// Whether a peer with this id is currently present.
    #[must_use]
    pub fn contains(&self, user_id: &str) -> bool {
        self.peers.iter().any(|p| p.user_id == user_id)
    }

    /// Everyone currently in the room.
    #[must_use]
    pub fn peers(&self) -> &[PeerPresence] {
        &self.peers
    }

    /// Number of peers in the room.
    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// True when the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
