//! Wire protocol for the sync channel.
//!
//! Events travel as tagged JSON over WebSocket text frames:
//! `{"type": "join_note", "payload": {"noteId": "..."}}`.
//!
//! Live events (`join_note`, `note_update`, `cursor_position`) never get
//! an error reply; failures there are dropped server-side so an editing
//! session is not disrupted by a vanished note. The `note_*` request
//! methods carry the management surface over the same connection and do
//! surface failures as `error` events.

use chrono::{DateTime, Utc};
use quill_core::{Note, Version};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages a client sends to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Subscribe to a note's live-edit room.
    JoinNote { note_id: String },
    /// A live edit: the full replacement text for the note.
    NoteUpdate { note_id: String, content: String },
    /// Ephemeral cursor offset, fire-and-forget.
    CursorPosition { note_id: String, cursor: u64 },

    /// Create a new note.
    NoteCreate { title: Option<String> },
    /// Fetch one note.
    NoteGet { note_id: String },
    /// List all notes, most recently updated first.
    NoteList,
    /// Request-path update. A missing `content` is treated as the empty
    /// string, unlike the live path which always carries content.
    NoteEdit {
        note_id: String,
        content: Option<String>,
        title: Option<String>,
    },
    /// List a note's versions, newest first.
    NoteVersions { note_id: String },
    /// Restore the version recorded at `timestamp`.
    NoteRestore {
        note_id: String,
        timestamp: DateTime<Utc>,
    },
}

/// Messages the server sends to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// New participant count for a room, sent to every subscriber
    /// (including whoever triggered the change).
    ActiveUsers(usize),
    /// A peer's edit: the full replacement text. Receivers overwrite
    /// their local buffer with it (last-write-wins).
    NoteUpdate(String),
    /// Ack to the sender of an edit once the mutation is persisted.
    LastSaved(DateTime<Utc>),
    /// A peer's cursor moved.
    CursorPosition { user_id: Uuid, cursor: u64 },

    /// Result of `note_create`, `note_get`, `note_edit`, `note_restore`.
    Note(Note),
    /// Result of `note_list`.
    NoteList(Vec<Note>),
    /// Result of `note_versions`, newest first.
    Versions(Vec<Version>),
    /// Request-path failure.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_event_wire_shape() {
        let json = r#"{"type":"join_note","payload":{"noteId":"n1"}}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, ClientEvent::JoinNote { note_id } if note_id == "n1"));

        let json = r#"{"type":"note_update","payload":{"noteId":"n1","content":"hello"}}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, ClientEvent::NoteUpdate { content, .. } if content == "hello"));

        // unit variant: no payload at all
        let event: ClientEvent = serde_json::from_str(r#"{"type":"note_list"}"#).unwrap();
        assert!(matches!(event, ClientEvent::NoteList));
    }

    #[test]
    fn test_server_event_wire_shape() {
        let json = serde_json::to_string(&ServerEvent::ActiveUsers(3)).unwrap();
        assert_eq!(json, r#"{"type":"active_users","payload":3}"#);

        let json = serde_json::to_string(&ServerEvent::NoteUpdate("abc".into())).unwrap();
        assert_eq!(json, r#"{"type":"note_update","payload":"abc"}"#);

        let user = Uuid::new_v4();
        let json =
            serde_json::to_string(&ServerEvent::CursorPosition { user_id: user, cursor: 7 })
                .unwrap();
        assert!(json.contains("cursor_position"));
        assert!(json.contains("userId"));
        assert!(json.contains(&user.to_string()));
    }

    #[test]
    fn test_timestamp_roundtrip_is_lossless() {
        let now = Utc::now();
        let json = serde_json::to_string(&ServerEvent::LastSaved(now)).unwrap();
        let back: ServerEvent = serde_json::from_str(&json).unwrap();
        match back {
            ServerEvent::LastSaved(t) => assert_eq!(t, now),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_event_rejected() {
        assert!(serde_json::from_str::<ClientEvent>(r#"{"type":"emote"}"#).is_err());
        assert!(
            serde_json::from_str::<ClientEvent>(r#"{"type":"join_note","payload":{}}"#).is_err()
        );
    }
}
