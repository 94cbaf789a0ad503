//! Typed payload structs, one per wire event.
//!
//! The relay never inspects these; they exist for the peers at either end of
//! a frame. Field names serialize in camelCase to match the original browser
//! clients.

#[cfg(test)]
#[path = "payload_test.rs"]
mod payload_test;

use serde::{Deserialize, Serialize};

use crate::model::{PeerPresence, Point, Shape, Stroke, TextElement};

/// Payload of [`crate::event::JOIN`]: subscribe to a room and announce self.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    /// Opaque room identifier; the relay derives the topic from it.
    pub room_id: String,
    /// The joining peer's presence entry.
    pub presence: PeerPresence,
}

/// Payload of [`crate::event::DRAW_BATCH`]: an incremental stroke append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawBatchPayload {
    /// Peer that drew the points.
    pub author_id: String,
    /// Points flushed from the author's edit buffer, in draw order.
    pub points: Vec<Point>,
    /// CSS color string.
    pub color: String,
    /// Tool identifier.
    pub tool: String,
}

/// Payload of [`crate::event::DRAW_SHAPE`]: a completed shape append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawShapePayload {
    /// Peer that drew the shape.
    pub author_id: String,
    /// The completed shape.
    pub shape: Shape,
}

/// Payload of [`crate::event::DRAW_TEXT`]: a new text element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawTextPayload {
    /// Peer that placed the text.
    pub author_id: String,
    /// The new element. Receivers force `selected` to false.
    pub text_data: TextElement,
}

/// Payload of [`crate::event::CLEAR`]: wipe the entire document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearPayload {
    /// Peer that cleared the canvas.
    pub author_id: String,
}

/// Payload of [`crate::event::REQUEST_STATE`]: ask the room for a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStatePayload {
    /// The late-joining peer asking for the document.
    pub requester_id: String,
    /// Milliseconds since the Unix epoch when the request was sent.
    pub request_time_ms: i64,
}

/// Payload of [`crate::event::EXISTING_STROKES`]: a full-document reply.
///
/// Broadcast to the whole room but addressed to one requester; every other
/// peer ignores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPayload {
    /// The elected peer that answered.
    pub author_id: String,
    /// All strokes in the responder's document.
    pub strokes: Vec<Stroke>,
    /// All shapes in the responder's document.
    pub shapes: Vec<Shape>,
    /// All text elements, with selection state stripped.
    pub text_elements: Vec<TextElement>,
    /// The requester this reply is addressed to.
    pub for_requester_id: String,
    /// Echo of the request's timestamp.
    pub request_time_ms: i64,
}

/// Payload of [`crate::event::PRESENCE_SYNC`]: a full membership snapshot.
///
/// Pushed by the relay to every room member on any membership change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceSyncPayload {
    /// Everyone currently in the room, in no particular order.
    pub peers: Vec<PeerPresence>,
}
