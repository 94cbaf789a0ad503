//! Synchronization state machine: the protocol layer each peer runs per room.
//!
//! DESIGN
//! ======
//! `SyncSession` is pure: every entry point returns [`Action`]s for the host
//! to execute against its transport. The host owns the socket, the batch
//! flush timer, and the delay on deferred sends; the session owns the
//! document, the edit buffer, the roster, and all protocol decisions. That
//! split keeps the whole protocol testable without a network and keeps the
//! connection handle an explicit dependency of the host rather than ambient
//! state the session reaches for.
//!
//! LIFECYCLE
//! =========
//! 1. Transport opens → [`SyncSession::connected`] emits the presence
//!    announce (`join`) and `request_state`; phase → `AwaitingSnapshot`.
//! 2. Inbound frames → [`SyncSession::handle`]; mutations from other authors
//!    apply immediately in any phase, so edits drawn during the join race are
//!    never lost.
//! 3. The addressed `existing_strokes` reply merges idempotently; the first
//!    merge moves the phase to `Synced`, redundant replies merge silently.
//! 4. Transport closes → [`SyncSession::disconnected`]; the phase is
//!    terminal. A reconnecting host builds a fresh session and rebuilds the
//!    document from zero, because the relay holds nothing to reconcile
//!    against.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use rand::Rng;
use rand::distr::Alphanumeric;

use wire::model::{PeerPresence, Point, Shape, Stroke, TextElement};
use wire::payload::{
    ClearPayload, DrawBatchPayload, DrawShapePayload, DrawTextPayload, JoinPayload,
    PresenceSyncPayload, RequestStatePayload, SnapshotPayload,
};
use wire::{Envelope, event};

use crate::buffer::EditBuffer;
use crate::document::Document;
use crate::roster::Roster;

/// Delay before an elected peer sends its snapshot reply, giving the relay
/// time to finish registering the requester.
pub const SNAPSHOT_REPLY_DELAY_MS: u64 = 500;

/// Length of author-random text element ids.
const TEXT_ID_LEN: usize = 7;

/// Outbound work returned from session entry points for the host to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Send this frame now.
    Send(Envelope),
    /// Send this frame after the given delay.
    SendAfter {
        /// Milliseconds to wait before sending.
        delay_ms: u64,
        /// The frame to send.
        envelope: Envelope,
    },
}

/// Where the session stands in the join/sync lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Transport not yet open.
    Connecting,
    /// Announced and requested state; waiting for a snapshot reply. Live
    /// edits from other peers still apply in this phase.
    AwaitingSnapshot,
    /// At least one snapshot has merged.
    Synced,
    /// Transport closed. Terminal.
    Disconnected,
}

/// Per-room synchronization state machine.
pub struct SyncSession {
    room_id: String,
    user_id: String,
    display_name: String,
    joined_at_ms: i64,
    color: String,
    tool: String,
    drawing: bool,
    doc: Document,
    buffer: EditBuffer,
    roster: Roster,
    phase: Phase,
}

impl SyncSession {
    /// Create a session for one room. `joined_at_ms` is this peer's
    /// self-reported join instant, used as its election key.
    #[must_use]
    pub fn new(room_id: &str, user_id: &str, display_name: &str, joined_at_ms: i64) -> Self {
        Self {
            room_id: room_id.to_owned(),
            user_id: user_id.to_owned(),
            display_name: display_name.to_owned(),
            joined_at_ms,
            color: "#3ecf8e".to_owned(),
            tool: "pencil".to_owned(),
            drawing: false,
            doc: Document::new(),
            buffer: EditBuffer::new(),
            roster: Roster::new(),
            phase: Phase::Connecting,
        }
    }

    // --- Lifecycle ---

    /// Transport opened: announce presence, then ask the room for the
    /// current document.
    #[must_use]
    pub fn connected(&mut self) -> Vec<Action> {
        self.phase = Phase::AwaitingSnapshot;
        vec![
            Action::Send(Envelope::new(
                event::JOIN,
                JoinPayload {
                    room_id: self.room_id.clone(),
                    presence: PeerPresence {
                        user_id: self.user_id.clone(),
                        display_name: self.display_name.clone(),
                        joined_at_ms: self.joined_at_ms,
                    },
                },
            )),
            Action::Send(Envelope::new(
                event::REQUEST_STATE,
                RequestStatePayload {
                    requester_id: self.user_id.clone(),
                    request_time_ms: self.joined_at_ms,
                },
            )),
        ]
    }

    /// Re-issue `request_state` if no snapshot has arrived yet.
    ///
    /// A transiently divergent roster can elect zero responders, which would
    /// otherwise leave this peer awaiting forever. The host calls this on a
    /// timeout of its choosing; once synced (or disconnected) it is a no-op.
    #[must_use]
    pub fn retry_request_state(&mut self) -> Vec<Action> {
        if self.phase != Phase::AwaitingSnapshot {
            return vec![];
        }
        vec![Action::Send(Envelope::new(
            event::REQUEST_STATE,
            RequestStatePayload {
                requester_id: self.user_id.clone(),
                request_time_ms: self.joined_at_ms,
            },
        ))]
    }

    /// Transport closed. Terminal; a reconnecting host must build a fresh
    /// session rather than reuse this one.
    pub fn disconnected(&mut self) {
        self.phase = Phase::Disconnected;
    }

    // --- Inbound frames ---

    /// Apply one inbound frame, returning any frames to send in response.
    ///
    /// Unknown events and payloads that fail to parse are ignored; a
    /// malformed frame from one peer must never take down another.
    #[must_use]
    pub fn handle(&mut self, envelope: &Envelope) -> Vec<Action> {
        match envelope.event.as_str() {
            event::DRAW_BATCH => {
                if let Ok(batch) = envelope.payload_as::<DrawBatchPayload>() {
                    self.apply_draw_batch(batch);
                }
                vec![]
            }
            event::DRAW_SHAPE => {
                if let Ok(payload) = envelope.payload_as::<DrawShapePayload>() {
                    if payload.author_id != self.user_id {
                        self.doc.push_shape(payload.shape);
                    }
                }
                vec![]
            }
            event::DRAW_TEXT => {
                if let Ok(payload) = envelope.payload_as::<DrawTextPayload>() {
                    if payload.author_id != self.user_id {
                        let mut element = payload.text_data;
                        // Selection is local UI state; never trust it from a peer.
                        element.selected = false;
                        self.doc.upsert_text(element);
                    }
                }
                vec![]
            }
            event::CLEAR => {
                // Last-writer-wins for the whole document, from any author.
                // The sender already cleared locally; wiping again is harmless.
                self.doc.clear();
                vec![]
            }
            event::REQUEST_STATE => {
                match envelope.payload_as::<RequestStatePayload>() {
                    Ok(request) if request.requester_id != self.user_id => {
                        self.answer_state_request(&request)
                    }
                    _ => vec![],
                }
            }
            event::EXISTING_STROKES => {
                if let Ok(snapshot) = envelope.payload_as::<SnapshotPayload>() {
                    if snapshot.for_requester_id == self.user_id {
                        self.doc.merge_snapshot(&snapshot);
                        if self.phase == Phase::AwaitingSnapshot {
                            self.phase = Phase::Synced;
                        }
                    }
                }
                vec![]
            }
            event::PRESENCE_SYNC => {
                if let Ok(payload) = envelope.payload_as::<PresenceSyncPayload>() {
                    self.roster.sync(payload.peers);
                }
                vec![]
            }
            _ => vec![],
        }
    }

    fn apply_draw_batch(&mut self, batch: DrawBatchPayload) {
        // The author applied this locally before broadcasting; echo-applying
        // would duplicate the stroke.
        if batch.author_id == self.user_id || batch.points.is_empty() {
            return;
        }
        self.doc.push_stroke(Stroke {
            points: batch.points,
            color: batch.color,
            tool: batch.tool,
            author_id: batch.author_id,
        });
    }

    /// Decide whether this peer answers a late-joiner's state request.
    ///
    /// Every existing peer runs this independently against its own roster;
    /// only the one whose id matches the elected oldest peer replies. A
    /// transiently divergent roster can elect zero or several responders,
    /// which the requester tolerates by merging idempotently.
    fn answer_state_request(&mut self, request: &RequestStatePayload) -> Vec<Action> {
        let elected = self
            .roster
            .oldest()
            .is_some_and(|oldest| oldest.user_id == self.user_id);
        if !elected {
            return vec![];
        }

        let text_elements = self
            .doc
            .text_elements()
            .iter()
            .cloned()
            .map(|mut t| {
                t.selected = false;
                t
            })
            .collect();

        vec![Action::SendAfter {
            delay_ms: SNAPSHOT_REPLY_DELAY_MS,
            envelope: Envelope::new(
                event::EXISTING_STROKES,
                SnapshotPayload {
                    author_id: self.user_id.clone(),
                    strokes: self.doc.strokes().to_vec(),
                    shapes: self.doc.shapes().to_vec(),
                    text_elements,
                    for_requester_id: request.requester_id.clone(),
                    request_time_ms: request.request_time_ms,
                },
            ),
        }]
    }

    // --- Local edits ---

    /// Pointer-down: open a new sub-path. The host starts its flush timer.
    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.drawing = true;
        self.buffer.add_point(Point::start(x, y));
    }

    /// Pointer-move: continue the current sub-path. Ignored when no stroke
    /// is in progress.
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if self.drawing {
            self.buffer.add_point(Point::movement(x, y));
        }
    }

    /// Pointer-up: stop the stroke and flush the final partial batch so its
    /// tail is never lost. The host stops its flush timer.
    #[must_use]
    pub fn pointer_up(&mut self) -> Vec<Action> {
        self.drawing = false;
        self.flush_batch()
    }

    /// Drain the edit buffer into one `draw_batch` frame, applying the
    /// stroke locally first. An empty buffer emits nothing.
    #[must_use]
    pub fn flush_batch(&mut self) -> Vec<Action> {
        let points = self.buffer.flush();
        if points.is_empty() {
            return vec![];
        }
        self.doc.push_stroke(Stroke {
            points: points.clone(),
            color: self.color.clone(),
            tool: self.tool.clone(),
            author_id: self.user_id.clone(),
        });
        vec![Action::Send(Envelope::new(
            event::DRAW_BATCH,
            DrawBatchPayload {
                author_id: self.user_id.clone(),
                points,
                color: self.color.clone(),
                tool: self.tool.clone(),
            },
        ))]
    }

    /// Place a completed rectangle and broadcast it.
    #[must_use]
    pub fn place_rectangle(&mut self, origin_x: f64, origin_y: f64, width: f64, height: f64) -> Vec<Action> {
        let shape = Shape { origin_x, origin_y, width, height, color: self.color.clone() };
        self.doc.push_shape(shape.clone());
        vec![Action::Send(Envelope::new(
            event::DRAW_SHAPE,
            DrawShapePayload { author_id: self.user_id.clone(), shape },
        ))]
    }

    /// Place a text element with a fresh author-random id and broadcast it.
    #[must_use]
    pub fn place_text(&mut self, x: f64, y: f64, text: &str, font_size: u32) -> Vec<Action> {
        let element = TextElement {
            id: random_token(),
            x,
            y,
            text: text.to_owned(),
            color: self.color.clone(),
            font_size,
            selected: false,
        };
        self.doc.upsert_text(element.clone());
        vec![Action::Send(Envelope::new(
            event::DRAW_TEXT,
            DrawTextPayload { author_id: self.user_id.clone(), text_data: element },
        ))]
    }

    /// Wipe the document locally and broadcast the clear.
    #[must_use]
    pub fn clear_all(&mut self) -> Vec<Action> {
        self.doc.clear();
        vec![Action::Send(Envelope::new(
            event::CLEAR,
            ClearPayload { author_id: self.user_id.clone() },
        ))]
    }

    // --- Accessors ---

    /// Change the active stroke color.
    pub fn set_color(&mut self, color: &str) {
        self.color = color.to_owned();
    }

    /// Change the active tool id stamped on outgoing batches.
    pub fn set_tool(&mut self, tool: &str) {
        self.tool = tool.to_owned();
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// This peer's id.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The replicated document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Mutable access to the document, for local-only edits such as text
    /// selection, drag, and delete.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// This peer's current view of room membership.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }
}

/// Author-random id token for new text elements. Collisions across
/// independent authors are treated as impossible by construction.
fn random_token() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(TEXT_ID_LEN)
        .map(char::from)
        .collect()
}
