//! Client-side cursor tracking.
//!
//! Cursor events are relayed fire-and-forget and never stored on the
//! server. Each receiving client keeps its own map of peer cursors and
//! evicts entries that have gone quiet. Eviction is batched: callers
//! drive [`CursorTracker::sweep`] on a fixed interval
//! ([`SWEEP_INTERVAL`]), so an entry may outlive the staleness window
//! by up to one sweep period.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// How long a peer cursor stays visible without a fresh event.
pub const CURSOR_STALE: Duration = Duration::from_secs(8);

/// How often clients re-evaluate staleness.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// A peer's last known cursor position.
#[derive(Debug, Clone, Copy)]
pub struct CursorEntry {
    pub offset: u64,
    pub received_at: Instant,
}

/// Local working set of peer cursors, keyed by connection id.
#[derive(Debug)]
pub struct CursorTracker {
    entries: HashMap<Uuid, CursorEntry>,
    stale_after: Duration,
}

impl Default for CursorTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorTracker {
    pub fn new() -> Self {
        Self::with_staleness(CURSOR_STALE)
    }

    pub fn with_staleness(stale_after: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stale_after,
        }
    }

    /// Records a cursor event received just now.
    pub fn record(&mut self, user: Uuid, offset: u64) {
        self.record_at(user, offset, Instant::now());
    }

    fn record_at(&mut self, user: Uuid, offset: u64, now: Instant) {
        self.entries.insert(
            user,
            CursorEntry {
                offset,
                received_at: now,
            },
        );
    }

    /// Drops a peer immediately, independent of staleness.
    pub fn forget(&mut self, user: &Uuid) {
        self.entries.remove(user);
    }

    /// Evicts entries older than the staleness window. Returns how many
    /// were removed.
    pub fn sweep(&mut self) -> usize {
        self.sweep_at(Instant::now())
    }

    fn sweep_at(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let stale_after = self.stale_after;
        self.entries
            .retain(|_, e| now.duration_since(e.received_at) < stale_after);
        before - self.entries.len()
    }

    /// Current (possibly stale by up to one sweep) peer cursors.
    pub fn positions(&self) -> impl Iterator<Item = (&Uuid, &CursorEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
