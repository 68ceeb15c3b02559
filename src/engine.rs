//! Engine: walks a dump root, fans parse work out over a worker pool, and
//! aggregates deduplicated records plus run statistics.
//!
//! Typical usage:
//!
//! ```no_run
//! use stealsift::engine::{Engine, ExtractOptions};
//! # fn main() -> anyhow::Result<()> {
//! let mut engine = Engine::new();
//! engine.load_from_root("/path/to/data", &ExtractOptions::default())?;
//! println!("{}", stealsift::report::render_run_report(&engine));
//! # Ok(())
//! # }
//! ```
use std::path::Path;

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use rayon::prelude::*;
use regex::Regex;

use crate::autofill::{AutofillParser, parse_autofill_contents};
use crate::classify::{LogFile, scan_root};
use crate::dedup::DedupSet;
use crate::io::{DEFAULT_MMAP_THRESHOLD_BYTES, LineDecoder};
use crate::password::{PasswordParser, parse_password_contents};
use crate::record::{AutofillRecord, CredentialRecord, LogKind, Record};
use crate::stats::RunStats;

/// Tuning knobs for one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Worker threads for the parse fan-out; 0 lets the pool size itself.
    pub workers: usize,
    /// File size at or above which inputs are memory-mapped.
    pub mmap_threshold: u64,
    /// Drop credential blocks that never saw a URL line.
    pub require_location: bool,
    /// Paths matching any pattern are skipped during the walk.
    pub excludes: Vec<Regex>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            workers: 0,
            mmap_threshold: DEFAULT_MMAP_THRESHOLD_BYTES,
            require_location: true,
            excludes: Vec::new(),
        }
    }
}

/// Everything one parse unit produced, folded into the engine afterwards.
#[derive(Debug)]
struct FileOutcome {
    file: LogFile,
    records: Vec<Record>,
    extracted: usize,
    undecodable: usize,
    failure: Option<String>,
}

impl FileOutcome {
    fn failed(file: LogFile, reason: String) -> Self {
        Self {
            file,
            records: Vec::new(),
            extracted: 0,
            undecodable: 0,
            failure: Some(reason),
        }
    }
}

/// Record provenance is the file name, not the full path; the same dump
/// re-packaged under a different folder still dedups to one record.
fn source_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Parse one classified file to completion. Signatures are claimed against
/// the shared sets only after the file decodes cleanly, so a file discarded
/// for a read failure cannot shadow the same record found elsewhere.
fn parse_file(
    file: &LogFile,
    opts: &ExtractOptions,
    credentials_seen: &DedupSet,
    autofills_seen: &DedupSet,
) -> FileOutcome {
    let source_file = source_label(&file.path);
    let mut decoder = match LineDecoder::open(&file.path, opts.mmap_threshold) {
        Ok(decoder) => decoder,
        Err(e) => return FileOutcome::failed(file.clone(), format!("{e:#}")),
    };

    let mut parsed: Vec<Record> = Vec::new();
    match file.kind {
        LogKind::Password => {
            let mut parser = PasswordParser::new(&source_file, opts.require_location);
            for line in decoder.by_ref() {
                if let Some(record) = parser.feed(&line) {
                    parsed.push(Record::Credential(record));
                }
            }
        }
        LogKind::Autofill => {
            let mut parser = AutofillParser::new(&source_file);
            for line in decoder.by_ref() {
                if let Some(record) = parser.feed(&line) {
                    parsed.push(Record::Autofill(record));
                }
            }
        }
    }

    let extracted = parsed.len();
    let undecodable = decoder.skipped();
    if let Some(err) = decoder.failure() {
        return FileOutcome {
            file: file.clone(),
            records: Vec::new(),
            extracted,
            undecodable,
            failure: Some(err.to_string()),
        };
    }

    let seen = match file.kind {
        LogKind::Password => credentials_seen,
        LogKind::Autofill => autofills_seen,
    };
    let records: Vec<Record> = parsed.into_iter().filter(|r| seen.offer(r)).collect();
    debug!(
        "{}: {} extracted, {} unique, {} undecodable ({})",
        file.path.display(),
        extracted,
        records.len(),
        undecodable,
        file.kind
    );
    FileOutcome {
        file: file.clone(),
        records,
        extracted,
        undecodable,
        failure: None,
    }
}

/// Aggregates extracted records and exposes loading helpers.
#[derive(Debug, Default)]
pub struct Engine {
    pub credentials: Vec<CredentialRecord>,
    pub autofills: Vec<AutofillRecord>,
    pub stats: RunStats,
}

impl Engine {
    /// Create an empty engine with no loaded records.
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk `root`, classify its files, and parse them in parallel.
    /// Individual file failures are tallied, not fatal; a missing or
    /// non-directory root is an error.
    pub fn load_from_root<P: AsRef<Path>>(&mut self, root: P, opts: &ExtractOptions) -> Result<()> {
        let root = root.as_ref();
        if !root.is_dir() {
            bail!("input root {} is not a directory", root.display());
        }
        let files = scan_root(root, &opts.excludes);
        info!(
            "classified {} parse units under {}",
            files.len(),
            root.display()
        );
        self.load_files(files, opts)
    }

    /// Parse an already-classified file list on a dedicated worker pool.
    /// Outcomes fold in file-list order. When several files carry the same
    /// record, which file's copy claims the signature is a worker race; the
    /// combined record set is the same either way.
    pub fn load_files(&mut self, files: Vec<LogFile>, opts: &ExtractOptions) -> Result<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(opts.workers)
            .build()
            .context("build worker pool")?;

        let credentials_seen = DedupSet::new();
        let autofills_seen = DedupSet::new();
        let outcomes: Vec<FileOutcome> = pool.install(|| {
            files
                .par_iter()
                .map(|file| parse_file(file, opts, &credentials_seen, &autofills_seen))
                .collect()
        });

        for outcome in outcomes {
            let FileOutcome {
                file,
                records,
                extracted,
                undecodable,
                failure,
            } = outcome;
            {
                let kind_stats = self.stats.kind_mut(file.kind);
                kind_stats.files_scanned += 1;
                kind_stats.records_extracted += extracted;
                kind_stats.undecodable_lines += undecodable;
            }
            if let Some(reason) = failure {
                warn!("discarding {}: {reason}", file.path.display());
                self.stats.record_failure(file.path, file.kind, reason);
                continue;
            }
            self.stats.kind_mut(file.kind).records_unique += records.len();
            for record in records {
                match record {
                    Record::Credential(c) => self.credentials.push(c),
                    Record::Autofill(a) => self.autofills.push(a),
                }
            }
        }
        info!(
            "extraction complete: {} unique credentials, {} unique autofill pairs",
            self.credentials.len(),
            self.autofills.len()
        );
        Ok(())
    }

    /// Parse dumps already in memory. Intended for tests and small
    /// programmatic integrations; stats are tallied as if each string were
    /// one file.
    pub fn load_from_strings(
        &mut self,
        passwords: &[&str],
        autofills: &[&str],
        require_location: bool,
    ) {
        let seen = DedupSet::new();
        for contents in passwords {
            let parsed = parse_password_contents(contents, "<memory>", require_location);
            self.stats.kind_mut(LogKind::Password).files_scanned += 1;
            self.stats.kind_mut(LogKind::Password).records_extracted += parsed.len();
            for record in parsed {
                if seen.offer(&Record::Credential(record.clone())) {
                    self.stats.kind_mut(LogKind::Password).records_unique += 1;
                    self.credentials.push(record);
                }
            }
        }
        let seen = DedupSet::new();
        for contents in autofills {
            let parsed = parse_autofill_contents(contents, "<memory>");
            self.stats.kind_mut(LogKind::Autofill).files_scanned += 1;
            self.stats.kind_mut(LogKind::Autofill).records_extracted += parsed.len();
            for record in parsed {
                if seen.offer(&Record::Autofill(record.clone())) {
                    self.stats.kind_mut(LogKind::Autofill).records_unique += 1;
                    self.autofills.push(record);
                }
            }
        }
    }

    /// Every unique record in output order, credentials first.
    pub fn records(&self) -> Vec<Record> {
        let mut all = Vec::with_capacity(self.credentials.len() + self.autofills.len());
        all.extend(self.credentials.iter().cloned().map(Record::Credential));
        all.extend(self.autofills.iter().cloned().map(Record::Autofill));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn write(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn dedups_across_subfolders() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let triplet = "URL: https://example.com/login\nUSER: a@x.com\nPASS: hunter2\n";
        write(&root.join("sub1/passwords.txt"), triplet);
        write(
            &root.join("sub2/passwords.txt"),
            &format!("{triplet}URL: https://other.com\nUSER: b@y.com\nPASS: secret\n"),
        );

        let mut engine = Engine::new();
        engine
            .load_from_root(root, &ExtractOptions::default())
            .unwrap();
        assert_eq!(engine.stats.passwords.files_scanned, 2);
        assert_eq!(engine.stats.passwords.records_extracted, 3);
        assert_eq!(engine.stats.passwords.records_unique, 2);
        // The combined set is canonical no matter which file's copy of the
        // shared triplet won the offer race.
        let mut identities: Vec<&str> =
            engine.credentials.iter().map(|c| c.identity.as_str()).collect();
        identities.sort_unstable();
        assert_eq!(identities, ["a@x.com", "b@y.com"]);
    }

    #[test]
    fn autofill_shapes_dedup_to_one() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("Autofills/chrome.txt"),
            "email\ta@x.com\nNAME: email\nVALUE: a@x.com\n",
        );

        let mut engine = Engine::new();
        engine
            .load_from_root(dir.path(), &ExtractOptions::default())
            .unwrap();
        assert_eq!(engine.stats.autofills.records_extracted, 2);
        assert_eq!(engine.stats.autofills.records_unique, 1);
        assert_eq!(engine.autofills.len(), 1);
    }

    #[test]
    fn ambiguous_file_is_parsed_once_per_kind() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("password_autofill.txt"),
            "URL: https://x.com\nUSER: a@x.com\nPASS: pw\ncity\tBerlin\n",
        );

        let mut engine = Engine::new();
        engine
            .load_from_root(dir.path(), &ExtractOptions::default())
            .unwrap();
        assert_eq!(engine.credentials.len(), 1);
        assert_eq!(engine.autofills.len(), 1);
        assert_eq!(engine.stats.passwords.files_scanned, 1);
        assert_eq!(engine.stats.autofills.files_scanned, 1);
    }

    #[test]
    fn undecodable_lines_are_counted_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("passwords.txt");
        fs::write(
            &path,
            b"URL: https://x.com\nUSER: a@x.com\n\xff\xfe garbage\nPASS: pw\n",
        )
        .unwrap();

        let mut engine = Engine::new();
        engine
            .load_from_root(dir.path(), &ExtractOptions::default())
            .unwrap();
        assert_eq!(engine.credentials.len(), 1);
        assert_eq!(engine.stats.passwords.undecodable_lines, 1);
        assert!(engine.stats.failures.is_empty());
    }

    #[test]
    fn undecodable_lines_are_counted_on_the_mmap_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("passwords.txt");
        fs::write(
            &path,
            b"URL: https://x.com\nUSER: a@x.com\nPASS: pw\n\xff\xfe garbage\n\
              URL: https://y.com\nUSER: b@y.com\nPASS: pw2\n",
        )
        .unwrap();

        let mut engine = Engine::new();
        let opts = ExtractOptions {
            // 1-byte threshold forces the mmap reader
            mmap_threshold: 1,
            ..ExtractOptions::default()
        };
        engine.load_from_root(dir.path(), &opts).unwrap();
        assert_eq!(engine.credentials.len(), 2);
        assert_eq!(engine.stats.passwords.undecodable_lines, 1);
        assert!(engine.stats.failures.is_empty());
    }

    #[test]
    fn unreadable_file_is_reported_not_fatal() {
        let files = vec![LogFile {
            path: "/nonexistent/passwords.txt".into(),
            kind: LogKind::Password,
        }];
        let mut engine = Engine::new();
        engine
            .load_files(files, &ExtractOptions::default())
            .unwrap();
        assert_eq!(engine.stats.passwords.files_failed, 1);
        assert_eq!(engine.stats.failures.len(), 1);
        assert!(engine.credentials.is_empty());
    }

    #[test]
    fn missing_root_is_an_error() {
        let mut engine = Engine::new();
        let err = engine
            .load_from_root("/nonexistent/dump-root", &ExtractOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn empty_root_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = Engine::new();
        engine
            .load_from_root(dir.path(), &ExtractOptions::default())
            .unwrap();
        assert!(engine.credentials.is_empty());
        assert!(engine.autofills.is_empty());
        assert_eq!(engine.stats.passwords.files_scanned, 0);
    }

    #[test]
    fn load_from_strings_tallies_like_files() {
        let mut engine = Engine::new();
        engine.load_from_strings(
            &["url: https://x.com\nuser: a@x.com\npass: pw\nurl: https://x.com\nuser: a@x.com\npass: pw\n"],
            &["k\tv\n"],
            true,
        );
        assert_eq!(engine.stats.passwords.records_extracted, 2);
        assert_eq!(engine.stats.passwords.records_unique, 1);
        assert_eq!(engine.credentials.len(), 1);
        assert_eq!(engine.autofills.len(), 1);
        assert_eq!(engine.records().len(), 2);
    }
}
