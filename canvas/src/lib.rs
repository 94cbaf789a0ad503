//! Peer-side logic for the collaborative whiteboard.
//!
//! This crate owns everything a peer needs between raw pointer input and the
//! wire: the replicated document, the batching edit buffer, the presence
//! roster with its responder election, and the synchronization state machine
//! that ties them together. It performs no I/O; the host (a browser shell, a
//! headless CLI, or a test) feeds it envelopes and pointer events and
//! executes the [`session::Action`]s it returns.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`document`] | Replicated document store with change notification |
//! | [`buffer`] | Pending-points queue drained into `draw_batch` frames |
//! | [`roster`] | Presence snapshot and oldest-peer responder election |
//! | [`session`] | The per-room synchronization state machine |

pub mod buffer;
pub mod document;
pub mod roster;
pub mod session;
