//! Geometry and presence types shared by the document model and the wire.
//!
//! Field names serialize in camelCase to match the browser clients that
//! originated this protocol.

#[cfg(test)]
#[path = "model_test.rs"]
mod model_test;

use serde::{Deserialize, Serialize};

/// Whether a point opens a new sub-path or continues the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    /// Opens a new sub-path.
    Start,
    /// Continues the current sub-path.
    Move,
}

/// One sampled pointer position within a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    /// Sub-path role of this point.
    #[serde(rename = "type")]
    pub kind: PointKind,
    /// X position in canvas coordinates.
    pub x: f64,
    /// Y position in canvas coordinates.
    pub y: f64,
}

impl Point {
    /// A point that opens a new sub-path.
    #[must_use]
    pub fn start(x: f64, y: f64) -> Self {
        Self { kind: PointKind::Start, x, y }
    }

    /// A point that continues the current sub-path.
    #[must_use]
    pub fn movement(x: f64, y: f64) -> Self {
        Self { kind: PointKind::Move, x, y }
    }
}

/// A freehand stroke: an ordered run of points with one author and one style.
///
/// Strokes are immutable once broadcast. `PartialEq` lets the document
/// deduplicate a stroke delivered twice via redundant snapshot replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    /// Ordered points; begins with exactly one `Start`.
    pub points: Vec<Point>,
    /// CSS color string.
    pub color: String,
    /// Tool identifier (e.g. `"pencil"`).
    pub tool: String,
    /// Peer that drew this stroke.
    pub author_id: String,
}

/// An axis-aligned rectangle.
///
/// Width and height keep the sign of the drag direction; rendering normalizes
/// the sign when painting, never when storing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    /// X of the drag origin.
    pub origin_x: f64,
    /// Y of the drag origin.
    pub origin_y: f64,
    /// Signed width.
    pub width: f64,
    /// Signed height.
    pub height: f64,
    /// CSS color string.
    pub color: String,
}

/// A positioned text element, keyed by an author-assigned random id.
///
/// `id` equality, not object identity, determines "same element" across
/// peers. `selected` is local-only UI state: it is never serialized, and any
/// copy arriving from the network must be forced to `false` before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    /// Globally unique author-random token.
    pub id: String,
    /// X position of the text baseline.
    pub x: f64,
    /// Y position of the text baseline.
    pub y: f64,
    /// Text content.
    pub text: String,
    /// CSS color string.
    pub color: String,
    /// Font size in pixels.
    pub font_size: u32,
    /// Local selection state. Never crosses the wire.
    #[serde(skip_serializing, default)]
    pub selected: bool,
}

/// One member of a room as tracked by the presence directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerPresence {
    /// Opaque peer identifier.
    pub user_id: String,
    /// Human-readable name for presence UI.
    pub display_name: String,
    /// Self-reported join time in milliseconds since the Unix epoch.
    ///
    /// An opaque ordering hint used to elect the snapshot responder, not
    /// wall-clock truth; peers' clocks are never assumed synchronized.
    pub joined_at_ms: i64,
}
