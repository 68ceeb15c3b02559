//! Password block parser.
//!
//! Password dumps are loose runs of tagged lines:
//!
//! ```text
//! URL: https://example.com/login
//! USER: someone@example.com
//! PASS: hunter2
//! ```
//!
//! The parser walks a cyclic three-state machine over them: location, then
//! identity (`user:`/`username:`/`login:`), then secret (`pass:`/
//! `password:`). A recognized tag arriving in the wrong state is dropped,
//! never buffered; the parser does not backtrack. Completing the secret
//! state emits at most one [`CredentialRecord`] and always resets the
//! machine, whether or not emission happened.
use crate::record::CredentialRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expecting {
    Location,
    Identity,
    Secret,
}

#[derive(Debug, Clone, Copy)]
enum Tag {
    Url,
    Identity,
    Secret,
}

/// Case-insensitive prefix match of the tag before the first `:`. Returns
/// the tag and the trimmed remainder, which may be empty.
fn split_tagged(line: &str) -> Option<(Tag, &str)> {
    const TAGS: &[(&str, Tag)] = &[
        ("url:", Tag::Url),
        ("user:", Tag::Identity),
        ("username:", Tag::Identity),
        ("login:", Tag::Identity),
        ("pass:", Tag::Secret),
        ("password:", Tag::Secret),
    ];
    let lower = line.to_ascii_lowercase();
    for (prefix, tag) in TAGS {
        if lower.starts_with(prefix) {
            return Some((*tag, line[prefix.len()..].trim()));
        }
    }
    None
}

/// Stateful scanner for one file's decoded line sequence. State is local to
/// the file; build one parser per file and drop it at end-of-file, which
/// discards any trailing partial block.
#[derive(Debug)]
pub struct PasswordParser {
    expecting: Expecting,
    location: String,
    identity: String,
    source_file: String,
    require_location: bool,
}

impl PasswordParser {
    pub fn new(source_file: &str, require_location: bool) -> Self {
        Self {
            expecting: Expecting::Location,
            location: String::new(),
            identity: String::new(),
            source_file: source_file.to_string(),
            require_location,
        }
    }

    /// Advance the machine by one line, returning a record when the line
    /// completes a block. A tag value may be empty; it still advances the
    /// state and the emission check catches it at completion.
    pub fn feed(&mut self, line: &str) -> Option<CredentialRecord> {
        let line = line.trim();
        let (tag, value) = split_tagged(line)?;
        match (self.expecting, tag) {
            (Expecting::Location, Tag::Url) => {
                self.location = value.to_string();
                self.expecting = Expecting::Identity;
                None
            }
            (Expecting::Identity, Tag::Identity) => {
                self.identity = value.to_string();
                self.expecting = Expecting::Secret;
                None
            }
            (Expecting::Secret, Tag::Secret) => {
                let record = self.complete(value);
                self.reset();
                record
            }
            // Recognized tag in the wrong state: dropped, not buffered.
            _ => None,
        }
    }

    fn complete(&self, secret: &str) -> Option<CredentialRecord> {
        if self.identity.is_empty() || secret.is_empty() {
            return None;
        }
        if self.require_location && self.location.is_empty() {
            return None;
        }
        Some(CredentialRecord::new(
            &self.identity,
            secret,
            &self.location,
            &self.source_file,
        ))
    }

    fn reset(&mut self) {
        self.expecting = Expecting::Location;
        self.location.clear();
        self.identity.clear();
    }
}

/// Parse an in-memory dump. Intended for tests and small programmatic
/// integrations; the engine feeds the parser line-by-line instead.
pub fn parse_password_contents(
    contents: &str,
    source_file: &str,
    require_location: bool,
) -> Vec<CredentialRecord> {
    let mut parser = PasswordParser::new(source_file, require_location);
    contents.lines().filter_map(|l| parser.feed(l)).collect()
}
