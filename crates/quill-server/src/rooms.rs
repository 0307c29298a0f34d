//! Room membership and presence counting.
//!
//! A room is the set of connections subscribed to live updates for one
//! note; its id is the note's id. Rooms are created implicitly on first
//! join and live for the life of the process - an empty room simply
//! rests at a count of zero.
//!
//! Membership is idempotent per connection: re-joining a room a
//! connection is already in does not inflate the participant count
//! (the count is the size of the subscriber set).

use crate::protocol::ServerEvent;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Identifies one WebSocket connection.
pub type ConnId = Uuid;

/// Registry state shared across connection tasks.
pub type SharedRooms = Arc<RwLock<RoomRegistry>>;

#[derive(Default)]
struct Room {
    subscribers: HashMap<ConnId, mpsc::UnboundedSender<ServerEvent>>,
}

/// Tracks which connections are subscribed to which note's room.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes a connection to a room and returns the new
    /// participant count.
    pub fn join(
        &mut self,
        room_id: &str,
        conn: ConnId,
        tx: mpsc::UnboundedSender<ServerEvent>,
    ) -> usize {
        let room = self.rooms.entry(room_id.to_string()).or_default();
        room.subscribers.insert(conn, tx);
        room.subscribers.len()
    }

    /// Removes a connection from every room it joined, as happens on
    /// disconnect. Returns each affected room with its new count.
    pub fn leave_all(&mut self, conn: ConnId) -> Vec<(String, usize)> {
        let mut affected = Vec::new();
        for (room_id, room) in self.rooms.iter_mut() {
            if room.subscribers.remove(&conn).is_some() {
                affected.push((room_id.clone(), room.subscribers.len()));
            }
        }
        affected
    }

    /// Current participant count for a room. Zero for unknown rooms.
    pub fn count(&self, room_id: &str) -> usize {
        self.rooms
            .get(room_id)
            .map(|r| r.subscribers.len())
            .unwrap_or(0)
    }

    /// Sends an event to every subscriber of a room, minus `except`.
    ///
    /// Never suspends (unbounded sends), so callers may broadcast
    /// while still holding the registry guard that changed a count.
    /// Delivery to a connection whose task already exited is a no-op,
    /// not an error: its receiver is simply gone.
    pub fn broadcast(&self, room_id: &str, event: &ServerEvent, except: Option<ConnId>) {
        let Some(room) = self.rooms.get(room_id) else {
            return;
        };
        for (conn, tx) in &room.subscribers {
            if Some(*conn) == except {
                continue;
            }
            let _ = tx.send(event.clone());
        }
    }
}
