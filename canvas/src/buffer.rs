//! Local edit buffer: the pending-points queue between pointer input and the
//! wire.
//!
//! Fast mouse movement produces hundreds of points per second; sending one
//! frame per point would swamp the relay. The buffer accumulates points and
//! the session drains it on a host-driven cadence (tens of milliseconds) into
//! one `draw_batch` frame. The timer itself lives with the host: it starts on
//! pointer-down, stops on pointer-up, and the session performs a final
//! synchronous flush on stop so the tail of a stroke is never lost.

#[cfg(test)]
#[path = "buffer_test.rs"]
mod buffer_test;

use wire::model::Point;

/// Queue of points not yet broadcast.
#[derive(Debug, Default)]
pub struct EditBuffer {
    pending: Vec<Point>,
}

impl EditBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a point to the queue.
    pub fn add_point(&mut self, point: Point) {
        self.pending.push(point);
    }

    /// Drain the queue, returning its contents in insertion order and
    /// leaving it empty. An empty flush returns an empty vec; callers emit
    /// no frame for it.
    pub fn flush(&mut self) -> Vec<Point> {
        std::mem::take(&mut self.pending)
    }

    /// Number of pending points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
