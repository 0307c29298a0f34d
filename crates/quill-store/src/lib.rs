//! Quill Store - persistence and the document mutation service
//!
//! Two layers:
//! - [`NoteStore`]: sled-backed CRUD for `Note` records.
//! - [`NoteService`]: the mutation service every write path goes
//!   through. It enforces snapshot-then-overwrite (a version entry is
//!   recorded before any content/title change lands) and serializes
//!   mutations per note id so concurrent saves cannot lose updates.

mod service;
mod store;

pub use service::{NoteService, NoteUpdate};
pub use store::{NoteStore, StoreError};
