//! The note record and its version entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title given to notes created without one.
pub const DEFAULT_TITLE: &str = "Untitled Note";

/// A collaborative text note.
///
/// `versions` is ordered oldest-first; each entry captures the state the
/// note held immediately before one mutation overwrote it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Opaque, globally unique identifier. Doubles as the room id for
    /// live editing.
    pub id: String,
    pub title: String,
    /// The current full text.
    pub content: String,
    /// Timestamp of the last mutation.
    pub updated_at: DateTime<Utc>,
    /// Bounded history of prior states, oldest first.
    pub versions: Vec<Version>,
}

/// An immutable snapshot of a note's content before a mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    /// The note's content before the mutation that recorded this entry.
    pub content: String,
    /// The `updated_at` the note held before that mutation.
    pub timestamp: DateTime<Utc>,
}

impl Note {
    /// Creates an empty note with the given id and title.
    ///
    /// An empty or whitespace-only title falls back to [`DEFAULT_TITLE`].
    pub fn new(id: impl Into<String>, title: Option<&str>) -> Self {
        let title = match title.map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => DEFAULT_TITLE.to_string(),
        };

        Self {
            id: id.into(),
            title,
            content: String::new(),
            updated_at: Utc::now(),
            versions: Vec::new(),
        }
    }
}
