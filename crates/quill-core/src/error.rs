//! Error taxonomy shared across Quill crates.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failures scoped to a single note operation.
///
/// None of these are fatal to the process; the request path surfaces
/// them to the caller and the live-edit path logs and drops them.
#[derive(Error, Debug)]
pub enum NoteError {
    #[error("Note not found: {id}")]
    NotFound { id: String },

    #[error("Version not found for note {id} at {timestamp}")]
    VersionNotFound {
        id: String,
        timestamp: DateTime<Utc>,
    },
}
