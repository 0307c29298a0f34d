//! Sled-backed note storage.

use quill_core::{Note, NoteError};
use sled::Db;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Note(#[from] NoteError),
    #[error("Database error: {0}")]
    Db(#[from] sled::Error),
    #[error("Serialization error: {0}")]
    Encode(#[from] bincode::Error),
}

/// Persistent store for notes.
///
/// Each note is stored under its id, bincode-encoded. Writes flush
/// before returning so an acknowledged save survives the process.
pub struct NoteStore {
    db: Db,
}

impl NoteStore {
    /// Opens or creates a note store at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Creates a new empty note and persists it.
    pub fn create(&self, title: Option<&str>) -> Result<Note, StoreError> {
        let note = Note::new(Uuid::new_v4().to_string(), title);
        self.save(&note)?;
        Ok(note)
    }

    /// Loads a note by id. `Ok(None)` when absent.
    pub fn get(&self, id: &str) -> Result<Option<Note>, StoreError> {
        match self.db.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Persists a note, overwriting any prior record under its id.
    pub fn save(&self, note: &Note) -> Result<(), StoreError> {
        let bytes = bincode::serialize(note)?;
        self.db.insert(note.id.as_bytes(), bytes)?;
        self.db.flush()?;
        Ok(())
    }

    /// Lists all notes, most recently updated first.
    pub fn list(&self) -> Result<Vec<Note>, StoreError> {
        let mut notes = Vec::new();
        for entry in self.db.iter() {
            let (_, bytes) = entry?;
            notes.push(bincode::deserialize::<Note>(&bytes)?);
        }
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(notes)
    }
}
