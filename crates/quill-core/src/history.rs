//! Bounded version history.
//!
//! Every mutation snapshots the pre-mutation state into the note's
//! `versions` log before overwriting, then trims the log to the newest
//! [`MAX_VERSIONS`] entries. Append-then-trim is infallible and runs
//! exactly once per mutation, with no diffing against the prior value:
//! a title-only change still records a version, which keeps every
//! mutation individually undoable.

use crate::note::{Note, Version};
use chrono::{DateTime, Utc};

/// Maximum number of versions retained per note. Oldest evicted first.
pub const MAX_VERSIONS: usize = 50;

/// Appends a snapshot of the pre-mutation state, then trims from the
/// front so at most [`MAX_VERSIONS`] entries remain.
pub fn push_version(note: &mut Note, prior_content: String, prior_timestamp: DateTime<Utc>) {
    note.versions.push(Version {
        content: prior_content,
        timestamp: prior_timestamp,
    });

    if note.versions.len() > MAX_VERSIONS {
        let excess = note.versions.len() - MAX_VERSIONS;
        note.versions.drain(..excess);
    }
}

/// Returns the versions newest-first, for display. Does not mutate.
pub fn versions_newest_first(note: &Note) -> Vec<Version> {
    let mut versions = note.versions.clone();
    versions.reverse();
    versions
}
