//! The document mutation service.
//!
//! Every write to a note - live edit, request-path update, or version
//! restore - goes through [`NoteService`], which applies the
//! snapshot-then-overwrite rule: the pre-mutation content and
//! `updated_at` are pushed into the version log before the new state
//! lands. Mutations for one note id are serialized through
//! [`NoteLocks`], so interleaved load-modify-save sequences from
//! concurrent connections cannot silently drop a save.

use crate::store::{NoteStore, StoreError};
use chrono::{DateTime, Utc};
use quill_core::{history, Note, NoteError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// A content and/or title change. `None` fields are left untouched;
/// callers that want "set to empty" must pass the empty string
/// explicitly.
#[derive(Debug, Clone, Default)]
pub struct NoteUpdate {
    pub content: Option<String>,
    pub title: Option<String>,
}

/// Per-note-id async locks.
///
/// The map itself is guarded by a std mutex held only long enough to
/// clone out the per-note lock; the per-note lock is held across the
/// whole load-modify-save sequence. Entries are never removed - one
/// small allocation per note ever touched, for the process lifetime,
/// matching the room registry's lifecycle.
struct NoteLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl NoteLocks {
    fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    async fn acquire(&self, id: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            map.entry(id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Applies mutations and restores with per-note ordering.
pub struct NoteService {
    store: NoteStore,
    locks: NoteLocks,
}

impl NoteService {
    pub fn new(store: NoteStore) -> Self {
        Self {
            store,
            locks: NoteLocks::new(),
        }
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    /// Applies a content/title change to a note.
    ///
    /// A version entry capturing the pre-mutation state is recorded
    /// unconditionally - even when only the title changes, or the new
    /// content is identical to the old. Fails with
    /// [`NoteError::NotFound`] when the note does not exist.
    pub async fn mutate(&self, id: &str, update: NoteUpdate) -> Result<Note, StoreError> {
        let _guard = self.locks.acquire(id).await;

        let mut note = self
            .store
            .get(id)?
            .ok_or_else(|| NoteError::NotFound { id: id.to_string() })?;

        if let Some(title) = update.title {
            note.title = title;
        }

        let prior_content = note.content.clone();
        let prior_at = note.updated_at;
        history::push_version(&mut note, prior_content, prior_at);

        if let Some(content) = update.content {
            note.content = content;
        }
        note.updated_at = Utc::now();

        self.store.save(&note)?;
        debug!(note = %note.id, versions = note.versions.len(), "note mutated");
        Ok(note)
    }

    /// Restores a note to the version recorded at `target`.
    ///
    /// Timestamps match at millisecond precision, which is lossless
    /// across the RFC3339 wire encoding. The matched version stays in
    /// history; the pre-restore state is appended on top, so a restore
    /// is itself undoable.
    pub async fn restore(&self, id: &str, target: DateTime<Utc>) -> Result<Note, StoreError> {
        let _guard = self.locks.acquire(id).await;

        let mut note = self
            .store
            .get(id)?
            .ok_or_else(|| NoteError::NotFound { id: id.to_string() })?;

        let restored = note
            .versions
            .iter()
            .find(|v| v.timestamp.timestamp_millis() == target.timestamp_millis())
            .map(|v| v.content.clone())
            .ok_or(NoteError::VersionNotFound {
                id: id.to_string(),
                timestamp: target,
            })?;

        let prior_content = note.content.clone();
        let prior_at = note.updated_at;
        history::push_version(&mut note, prior_content, prior_at);

        note.content = restored;
        note.updated_at = Utc::now();

        self.store.save(&note)?;
        debug!(note = %note.id, %target, "note restored");
        Ok(note)
    }
}
