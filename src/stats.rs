//! Run accounting: per-kind tallies, failure records, and the
//! top-locations breakdown shown in the report.
use std::cmp::Reverse;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::record::{CredentialRecord, LogKind};

/// Counters for one record kind across the whole run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KindStats {
    /// Files scheduled for this kind (a both-kinds file counts in each).
    pub files_scanned: usize,
    /// Records the parsers emitted, duplicates included.
    pub records_extracted: usize,
    /// Records that survived deduplication.
    pub records_unique: usize,
    /// Lines dropped as undecodable across this kind's files.
    pub undecodable_lines: usize,
    /// Files whose contribution was discarded after a read failure.
    pub files_failed: usize,
}

pub fn pct(n: usize, d: usize) -> String {
    if d == 0 {
        return "0.00%".to_string();
    }
    format!("{:.2}%", (n as f64) / (d as f64) * 100.0)
}

/// One discarded file and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub kind: LogKind,
    pub reason: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub passwords: KindStats,
    pub autofills: KindStats,
    pub failures: Vec<FileFailure>,
}

impl RunStats {
    pub fn kind(&self, kind: LogKind) -> &KindStats {
        match kind {
            LogKind::Password => &self.passwords,
            LogKind::Autofill => &self.autofills,
        }
    }

    pub fn kind_mut(&mut self, kind: LogKind) -> &mut KindStats {
        match kind {
            LogKind::Password => &mut self.passwords,
            LogKind::Autofill => &mut self.autofills,
        }
    }

    pub fn record_failure(&mut self, path: PathBuf, kind: LogKind, reason: String) {
        self.kind_mut(kind).files_failed += 1;
        self.failures.push(FileFailure { path, kind, reason });
    }

    pub fn total_unique(&self) -> usize {
        self.passwords.records_unique + self.autofills.records_unique
    }
}

/// The top-N most frequent locations among the unique credentials.
/// Sorted descending by count, then ascending by location to stabilize
/// ordering for tests.
pub fn top_locations(creds: &[CredentialRecord], top_n: usize) -> Vec<(String, usize)> {
    let mut freq: HashMap<String, usize> = HashMap::new();
    for c in creds {
        if c.location.is_empty() {
            continue;
        }
        *freq.entry(c.location.clone()).or_insert(0) += 1;
    }
    let mut items: Vec<(String, usize)> = freq.into_iter().collect();
    items.sort_by(|a, b| {
        // primary: count desc, secondary: location asc
        (Reverse(a.1), &a.0).cmp(&(Reverse(b.1), &b.0))
    });
    if items.len() > top_n {
        items.truncate(top_n);
    }
    items
}
