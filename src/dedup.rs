//! Run-wide record deduplication.
//!
//! Every extracted record is offered to a [`DedupSet`] before it counts;
//! acceptance is keyed on the record's semantic signature, so the same
//! credential found in two subfolders (with different source files and
//! timestamps) collapses to one. One set instance per kind is shared across
//! the parse workers.
use std::collections::HashSet;
use std::sync::Mutex;

use crate::record::Record;

/// Concurrent set of already-seen record signatures.
#[derive(Debug, Default)]
pub struct DedupSet {
    seen: Mutex<HashSet<String>>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `record` for this run. Returns true exactly once per
    /// signature; the caller keeps the record only on true.
    pub fn offer(&self, record: &Record) -> bool {
        self.insert_signature(record.signature())
    }

    fn insert_signature(&self, signature: String) -> bool {
        // A poisoned lock only means a worker panicked mid-insert; the set
        // itself is still usable.
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        seen.insert(signature)
    }

    /// Number of distinct signatures accepted so far.
    pub fn len(&self) -> usize {
        let seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
