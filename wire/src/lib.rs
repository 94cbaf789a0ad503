//! Shared wire vocabulary for the collaborative whiteboard protocol.
//!
//! This crate owns the message representation used by both `server` and the
//! peer-side `canvas` crate. Every message on the wire is one JSON text frame
//! shaped as an [`Envelope`]: an event name plus a free-form JSON payload.
//! Typed payload structs live in [`payload`] and the geometry/presence types
//! they carry live in [`model`]; the envelope itself stays untyped so the
//! relay can fan frames out verbatim without understanding their contents.

pub mod model;
pub mod payload;


use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Error returned when a frame or payload cannot be decoded or encoded.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The raw text could not be parsed as an [`Envelope`].
    #[error("malformed frame: {0}")]
    MalformedFrame(#[source] serde_json::Error),
    /// The envelope parsed but its payload does not match the expected shape.
    #[error("malformed `{event}` payload: {source}")]
    MalformedPayload {
        /// Event name of the offending envelope.
        event: String,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
    /// The envelope could not be serialized back to JSON text.
    #[error("failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Event names carried in [`Envelope::event`].
pub mod event {
    /// Peer announces itself and subscribes to a room.
    pub const JOIN: &str = "join";
    /// Batched incremental stroke points.
    pub const DRAW_BATCH: &str = "draw_batch";
    /// A completed rectangle shape.
    pub const DRAW_SHAPE: &str = "draw_shape";
    /// A new text element.
    pub const DRAW_TEXT: &str = "draw_text";
    /// Wipe the entire document.
    pub const CLEAR: &str = "clear";
    /// Ask the room for the full document.
    pub const REQUEST_STATE: &str = "request_state";
    /// Full-document reply, addressed to one requester.
    pub const EXISTING_STROKES: &str = "existing_strokes";
    /// Membership snapshot pushed by the relay.
    pub const PRESENCE_SYNC: &str = "presence_sync";
}

/// Fixed prefix for relay topics. Two clients supplying the same room id
/// always rendezvous on the same topic.
pub const TOPIC_PREFIX: &str = "whiteboard";

/// Derive the relay topic for a room identifier.
///
/// The room id namespace is a single flat, unauthenticated space; the prefix
/// only keeps whiteboard traffic distinguishable from anything else sharing
/// the relay.
#[must_use]
pub fn room_topic(room_id: &str) -> String {
    format!("{TOPIC_PREFIX}-{room_id}")
}

/// A single message on the whiteboard wire protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Event name; see [`event`] for the known set.
    pub event: String,
    /// Free-form JSON payload. Shape depends on `event`.
    pub payload: serde_json::Value,
}

impl Envelope {
    /// Build an envelope from a typed payload.
    ///
    /// Payload types in this crate serialize infallibly; a value that
    /// nevertheless fails to serialize becomes `null`.
    pub fn new(event: impl Into<String>, payload: impl Serialize) -> Self {
        Self {
            event: event.into(),
            payload: serde_json::to_value(payload).unwrap_or_default(),
        }
    }

    /// Parse one JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MalformedFrame`] if the text is not a valid
    /// envelope.
    pub fn decode(text: &str) -> Result<Self, CodecError> {
        serde_json::from_str(text).map_err(CodecError::MalformedFrame)
    }

    /// Serialize this envelope to a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] if serialization fails.
    pub fn encode(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(CodecError::Encode)
    }

    /// Deserialize the payload into a typed struct.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MalformedPayload`] if the payload does not match
    /// the expected shape for `T`.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        serde_json::from_value(self.payload.clone()).map_err(|source| CodecError::MalformedPayload {
            event: self.event.clone(),
            source,
        })
    }
}
