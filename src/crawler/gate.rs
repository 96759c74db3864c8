//! In-run deduplication gate
//!
//! Duplicate detection within one run checks two sets: the ledger snapshot
//! loaded at run start, and the identifiers already reserved earlier in the
//! same run (two fragments on one feed can resolve to the same item). The
//! check-and-reserve must be atomic: item extraction runs on a worker pool,
//! and two concurrent fragments sharing an identifier must not both produce
//! a record.

use std::collections::HashSet;
use std::sync::Mutex;

/// Serializes the "new this run?" decision across concurrent item tasks
pub struct DedupGate {
    /// Identifiers already in the ledger when the run started; never changes
    snapshot: HashSet<String>,

    /// Identifiers reserved during this run
    claimed: Mutex<HashSet<String>>,
}

impl DedupGate {
    /// Creates a gate over the start-of-run ledger snapshot
    pub fn new(snapshot: HashSet<String>) -> Self {
        Self {
            snapshot,
            claimed: Mutex::new(HashSet::new()),
        }
    }

    /// Atomically checks and reserves an identifier
    ///
    /// Returns `false` when the identifier is in the ledger snapshot or was
    /// already reserved earlier in this run; returns `true` exactly once
    /// per identifier per run.
    pub fn try_claim(&self, identifier: &str) -> bool {
        if self.snapshot.contains(identifier) {
            return false;
        }

        let mut claimed = self.claimed.lock().unwrap();
        claimed.insert(identifier.to_string())
    }

    /// Releases a reservation after extraction was abandoned for the item
    ///
    /// Used when price parsing fails: the item produced no record, so its
    /// identifier must not reach the ledger, and a later fragment for the
    /// same item may still claim it.
    pub fn release(&self, identifier: &str) {
        let mut claimed = self.claimed.lock().unwrap();
        claimed.remove(identifier);
    }

    /// Number of identifiers in the start-of-run snapshot
    pub fn snapshot_len(&self) -> usize {
        self.snapshot.len()
    }
}
