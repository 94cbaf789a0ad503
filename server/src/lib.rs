//! Session relay for the collaborative whiteboard.
//!
//! ARCHITECTURE
//! ============
//! The relay multiplexes many independent rooms over one process. It holds no
//! durable storage and understands almost nothing about the frames it moves:
//! a peer's first frame must be a `join` binding the connection to a room
//! topic, after which every frame is fanned out verbatim to the room's other
//! connections. The only state the relay owns is the per-room connection set
//! and presence directory, both discarded the moment the last peer leaves.

pub mod routes;
pub mod services;
pub mod state;
