//! Autofill pair parser.
//!
//! Browser autofill dumps carry form field pairs in two shapes, often mixed
//! within one file: tab-separated on a single line, or split across a
//! tagged `NAME:`/`FORM:` line followed by a `VALUE:` line. The inline shape
//! is handled as a fast path that leaves the cross-line state untouched.
//! Only the most recent pending key is honored: a second `name:` before a
//! `value:` overwrites it, keys never stack.
use crate::record::AutofillRecord;

/// Case-insensitive prefix match for one of `prefixes`; returns the trimmed
/// remainder of the original line.
fn tag_value<'a>(line: &'a str, lower: &str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes
        .iter()
        .find(|p| lower.starts_with(*p))
        .map(|p| line[p.len()..].trim())
}

/// Stateful scanner for one file's decoded line sequence. A pending key
/// left at end-of-file is discarded with the parser.
#[derive(Debug)]
pub struct AutofillParser {
    pending_key: Option<String>,
    source_file: String,
}

impl AutofillParser {
    pub fn new(source_file: &str) -> Self {
        Self {
            pending_key: None,
            source_file: source_file.to_string(),
        }
    }

    /// Advance by one line, returning a record when a pairing completes.
    pub fn feed(&mut self, line: &str) -> Option<AutofillRecord> {
        let line = line.trim();
        // Inline fast path: split on the first tab, emit immediately.
        if let Some((key, value)) = line.split_once('\t') {
            return Some(AutofillRecord::new(key, value, &self.source_file));
        }
        let lower = line.to_ascii_lowercase();
        if let Some(key) = tag_value(line, &lower, &["name:", "form:"]) {
            self.pending_key = Some(key.to_string());
            return None;
        }
        if let Some(value) = tag_value(line, &lower, &["value:"]) {
            // A value with no pending key is ignored.
            if let Some(key) = self.pending_key.take() {
                return Some(AutofillRecord::new(&key, value, &self.source_file));
            }
        }
        None
    }
}

/// Parse an in-memory dump. Intended for tests and small programmatic
/// integrations; the engine feeds the parser line-by-line instead.
pub fn parse_autofill_contents(contents: &str, source_file: &str) -> Vec<AutofillRecord> {
    let mut parser = AutofillParser::new(source_file);
    contents.lines().filter_map(|l| parser.feed(l)).collect()
}
