//! Event handlers for the sync protocol.
//!
//! Live-path handlers (`join_note`, `note_update`, `cursor_position`)
//! never reply with errors: a live edit against a vanished note is
//! dropped with a debug log and the connection carries on. The
//! `note_*` request handlers surface failures as `error` events.

use crate::protocol::{ClientEvent, ServerEvent};
use crate::rooms::{ConnId, SharedRooms};
use quill_core::{versions_newest_first, NoteError};
use quill_store::{NoteService, NoteUpdate, StoreError};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// Routes one inbound event to its handler.
pub async fn dispatch(
    conn: ConnId,
    event: ClientEvent,
    rooms: &SharedRooms,
    service: &Arc<NoteService>,
    tx: &UnboundedSender<ServerEvent>,
) {
    match event {
        ClientEvent::JoinNote { note_id } => handle_join(conn, &note_id, rooms, tx).await,
        ClientEvent::NoteUpdate { note_id, content } => {
            handle_live_edit(conn, &note_id, content, rooms, service, tx).await
        }
        ClientEvent::CursorPosition { note_id, cursor } => {
            handle_cursor(conn, &note_id, cursor, rooms).await
        }

        ClientEvent::NoteCreate { title } => handle_create(title, service, tx),
        ClientEvent::NoteGet { note_id } => handle_get(&note_id, service, tx),
        ClientEvent::NoteList => handle_list(service, tx),
        ClientEvent::NoteEdit {
            note_id,
            content,
            title,
        } => handle_edit(&note_id, content, title, service, tx).await,
        ClientEvent::NoteVersions { note_id } => handle_versions(&note_id, service, tx),
        ClientEvent::NoteRestore { note_id, timestamp } => {
            handle_restore(&note_id, timestamp, service, tx).await
        }
    }
}

/// Room join: subscribe, then announce the new count to the whole room,
/// the joiner included.
async fn handle_join(
    conn: ConnId,
    note_id: &str,
    rooms: &SharedRooms,
    tx: &UnboundedSender<ServerEvent>,
) {
    if note_id.is_empty() {
        return;
    }

    // Count change and presence broadcast stay under one guard so two
    // concurrent joins cannot announce their counts out of order.
    let mut registry = rooms.write().await;
    let count = registry.join(note_id, conn, tx.clone());
    debug!(room = note_id, %conn, count, "joined room");
    registry.broadcast(note_id, &ServerEvent::ActiveUsers(count), None);
}

/// Content broadcast: persist (snapshot-then-overwrite), relay the raw
/// content to every other subscriber, ack the sender with the save
/// timestamp.
async fn handle_live_edit(
    conn: ConnId,
    note_id: &str,
    content: String,
    rooms: &SharedRooms,
    service: &Arc<NoteService>,
    tx: &UnboundedSender<ServerEvent>,
) {
    if note_id.is_empty() {
        return;
    }

    let update = NoteUpdate {
        content: Some(content.clone()),
        title: None,
    };

    match service.mutate(note_id, update).await {
        Ok(note) => {
            rooms
                .read()
                .await
                .broadcast(note_id, &ServerEvent::NoteUpdate(content), Some(conn));
            let _ = tx.send(ServerEvent::LastSaved(note.updated_at));
        }
        Err(StoreError::Note(NoteError::NotFound { .. })) => {
            // Live traffic for a vanished note is not worth failing
            // the connection over.
            debug!(room = note_id, "dropped live edit for missing note");
        }
        Err(e) => {
            // Edit lost for this round; the next one proceeds
            // independently.
            warn!(room = note_id, "live edit not persisted: {e}");
        }
    }
}

/// Cursor relay: fire-and-forget to everyone else in the room.
async fn handle_cursor(conn: ConnId, note_id: &str, cursor: u64, rooms: &SharedRooms) {
    rooms.read().await.broadcast(
        note_id,
        &ServerEvent::CursorPosition {
            user_id: conn,
            cursor,
        },
        Some(conn),
    );
}

fn handle_create(
    title: Option<String>,
    service: &Arc<NoteService>,
    tx: &UnboundedSender<ServerEvent>,
) {
    send_note_result(service.store().create(title.as_deref()), tx);
}

fn handle_get(note_id: &str, service: &Arc<NoteService>, tx: &UnboundedSender<ServerEvent>) {
    let result = service.store().get(note_id).and_then(|found| {
        found.ok_or_else(|| {
            StoreError::Note(NoteError::NotFound {
                id: note_id.to_string(),
            })
        })
    });
    send_note_result(result, tx);
}

fn handle_list(service: &Arc<NoteService>, tx: &UnboundedSender<ServerEvent>) {
    let event = match service.store().list() {
        Ok(notes) => ServerEvent::NoteList(notes),
        Err(e) => ServerEvent::Error {
            message: e.to_string(),
        },
    };
    let _ = tx.send(event);
}

/// Request-path update. Unlike the live path, a missing `content` here
/// means the empty string, mirroring the original REST behavior.
async fn handle_edit(
    note_id: &str,
    content: Option<String>,
    title: Option<String>,
    service: &Arc<NoteService>,
    tx: &UnboundedSender<ServerEvent>,
) {
    let update = NoteUpdate {
        content: Some(content.unwrap_or_default()),
        title,
    };
    send_note_result(service.mutate(note_id, update).await, tx);
}

fn handle_versions(note_id: &str, service: &Arc<NoteService>, tx: &UnboundedSender<ServerEvent>) {
    let event = match service.store().get(note_id) {
        Ok(Some(note)) => ServerEvent::Versions(versions_newest_first(&note)),
        Ok(None) => ServerEvent::Error {
            message: NoteError::NotFound {
                id: note_id.to_string(),
            }
            .to_string(),
        },
        Err(e) => ServerEvent::Error {
            message: e.to_string(),
        },
    };
    let _ = tx.send(event);
}

async fn handle_restore(
    note_id: &str,
    timestamp: chrono::DateTime<chrono::Utc>,
    service: &Arc<NoteService>,
    tx: &UnboundedSender<ServerEvent>,
) {
    send_note_result(service.restore(note_id, timestamp).await, tx);
}

fn send_note_result(
    result: Result<quill_core::Note, StoreError>,
    tx: &UnboundedSender<ServerEvent>,
) {
    let event = match result {
        Ok(note) => ServerEvent::Note(note),
        Err(e) => ServerEvent::Error {
            message: e.to_string(),
        },
    };
    let _ = tx.send(event);
}
