//! Document model: the replicated whiteboard state held by each peer.
//!
//! Strokes and shapes are append-only; only a whole-document clear removes
//! them. Text elements support point updates and deletion keyed by their
//! author-random id. Every mutation fires an optional change callback so the
//! host can repaint without this crate knowing anything about rendering.

#[cfg(test)]
#[path = "document_test.rs"]
mod document_test;

use wire::model::{Shape, Stroke, TextElement};
use wire::payload::SnapshotPayload;

/// Callback invoked after each applied mutation.
pub type ChangeCallback = Box<dyn FnMut() + Send>;

/// In-memory replica of a room's document.
#[derive(Default)]
pub struct Document {
    strokes: Vec<Stroke>,
    shapes: Vec<Shape>,
    text_elements: Vec<TextElement>,
    on_changed: Option<ChangeCallback>,
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback fired after every applied mutation.
    ///
    /// This is the seam between protocol logic and rendering: the host hangs
    /// its repaint here instead of the document knowing about any particular
    /// rendering technology.
    pub fn set_on_changed(&mut self, callback: ChangeCallback) {
        self.on_changed = Some(callback);
    }

    fn notify(&mut self) {
        if let Some(callback) = &mut self.on_changed {
            callback();
        }
    }

    // --- Append-only mutations ---

    /// Append a completed stroke.
    pub fn push_stroke(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
        self.notify();
    }

    /// Append a completed shape.
    pub fn push_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
        self.notify();
    }

    // --- Text element mutations, keyed by id ---

    /// Insert a text element, unless an element with the same id exists.
    ///
    /// Ids are author-random tokens, so an id collision means a duplicate
    /// delivery of the same element; the existing copy wins.
    pub fn upsert_text(&mut self, element: TextElement) {
        if self.text_elements.iter().any(|t| t.id == element.id) {
            return;
        }
        self.text_elements.push(element);
        self.notify();
    }

    /// Move a text element. Returns false if no element has that id.
    pub fn move_text(&mut self, id: &str, x: f64, y: f64) -> bool {
        let Some(element) = self.text_elements.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        element.x = x;
        element.y = y;
        self.notify();
        true
    }

    /// Change a text element's font size. Returns false if no element has that id.
    pub fn set_text_font_size(&mut self, id: &str, font_size: u32) -> bool {
        let Some(element) = self.text_elements.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        element.font_size = font_size;
        self.notify();
        true
    }

    /// Remove a text element by id, returning it if it was present.
    pub fn remove_text(&mut self, id: &str) -> Option<TextElement> {
        let index = self.text_elements.iter().position(|t| t.id == id)?;
        let removed = self.text_elements.remove(index);
        self.notify();
        Some(removed)
    }

    /// Mark exactly one text element as selected, deselecting all others.
    /// Passing `None` deselects everything. Selection is local-only state.
    pub fn select_text(&mut self, id: Option<&str>) {
        for element in &mut self.text_elements {
            element.selected = id == Some(element.id.as_str());
        }
        self.notify();
    }

    // --- Whole-document operations ---

    /// Discard all strokes, shapes, and text elements.
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.shapes.clear();
        self.text_elements.clear();
        self.notify();
    }

    /// Merge a full-document snapshot into this document.
    ///
    /// Strokes and shapes not already present are appended; text elements
    /// merge by id with the local copy winning. Applying the same snapshot
    /// twice yields the same document as applying it once, which is what
    /// makes redundant responders harmless.
    pub fn merge_snapshot(&mut self, snapshot: &SnapshotPayload) {
        let mut changed = false;

        for stroke in &snapshot.strokes {
            if !self.strokes.contains(stroke) {
                self.strokes.push(stroke.clone());
                changed = true;
            }
        }
        for shape in &snapshot.shapes {
            if !self.shapes.contains(shape) {
                self.shapes.push(shape.clone());
                changed = true;
            }
        }
        for element in &snapshot.text_elements {
            if self.text_elements.iter().any(|t| t.id == element.id) {
                continue;
            }
            let mut element = element.clone();
            element.selected = false;
            self.text_elements.push(element);
            changed = true;
        }

        if changed {
            self.notify();
        }
    }

    // --- Accessors ---

    /// All strokes in arrival order.
    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// All shapes in arrival order.
    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// All text elements in insertion order.
    #[must_use]
    pub fn text_elements(&self) -> &[TextElement] {
        &self.text_elements
    }

    /// True when the document holds nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty() && self.shapes.is_empty() && self.text_elements.is_empty()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("strokes", &self.strokes.len())
            .field("shapes", &self.shapes.len())
            .field("text_elements", &self.text_elements.len())
            .finish_non_exhaustive()
    }
}
