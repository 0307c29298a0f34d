//! Quill Server - real-time sync engine for collaborative notes
//!
//! This crate implements the live-editing side of Quill:
//! - Room membership and presence counting per note
//! - Content-change broadcast with last-write-wins overwrite
//! - Ephemeral cursor relay with client-side staleness eviction
//! - Request/response note operations over the same channel
//!
//! The server supports:
//! - Multiple concurrent connections, one task per connection
//! - Tagged JSON messages over WebSocket text frames
//! - Snapshot-then-overwrite versioning on every mutation
//!   (via `quill-store`'s mutation service)

pub mod client;
pub mod cursor;
mod handlers;
pub mod protocol;
pub mod rooms;
mod server;

pub use client::{ClientError, SyncClient};
pub use cursor::{CursorEntry, CursorTracker, CURSOR_STALE, SWEEP_INTERVAL};
pub use protocol::{ClientEvent, ServerEvent};
pub use rooms::{ConnId, RoomRegistry, SharedRooms};
pub use server::{SyncServer, SyncServerConfig};
