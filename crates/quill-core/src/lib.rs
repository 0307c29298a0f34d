//! Quill Core - note data model and version history
//!
//! This crate holds the types the rest of Quill works with:
//! the `Note` record, its bounded `Version` history, and the
//! error taxonomy shared by the store and the sync server.
//!
//! Everything here is pure data manipulation; persistence and
//! networking live in `quill-store` and `quill-server`.

mod error;
pub mod history;
mod note;

pub use error::NoteError;
pub use history::{push_version, versions_newest_first, MAX_VERSIONS};
pub use note::{Note, Version, DEFAULT_TITLE};
