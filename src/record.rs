//! Record data model for extracted stealer-log artifacts.
//!
//! Two record families exist: credentials (URL/user/password blocks) and
//! autofill pairs (form field name/value). Both carry their source file
//! basename and a UTC capture timestamp, and both serialize to the flat
//! document shape the indexing sink expects.
//!
//! Equality, hashing, and [`CredentialRecord::signature`] /
//! [`AutofillRecord::signature`] all use the semantic fields only;
//! provenance and timestamp never participate, so the same credential seen
//! in two different dumps collapses to one record.
use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// Separator for signature components. Values containing it would collide;
/// colliding signatures are treated as true duplicates.
const SIG_SEP: char = '\u{1f}';

/// Which family of stealer-log content a file or record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    Password,
    Autofill,
}

impl LogKind {
    /// Stable lowercase label used as the `type` column/field value.
    pub fn label(&self) -> &'static str {
        match self {
            LogKind::Password => "password",
            LogKind::Autofill => "autofill",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Current wall-clock time as RFC 3339 with microseconds, matching the
/// timestamps the original processor stamped on indexed documents.
fn capture_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// One extracted credential. `location` is the URL token that opened the
/// block; it anchors the dedup signature but is not a column of the
/// structured output.
#[derive(Debug, Clone, Serialize, Eq)]
pub struct CredentialRecord {
    #[serde(rename = "email")]
    pub identity: String,
    #[serde(rename = "password")]
    pub secret: String,
    #[serde(skip)]
    pub location: String,
    pub source_file: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl PartialEq for CredentialRecord {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
            && self.secret == other.secret
            && self.location == other.location
    }
}

impl std::hash::Hash for CredentialRecord {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.signature().hash(state);
    }
}

impl CredentialRecord {
    /// Build a record captured now from the given block fields.
    pub fn new(identity: &str, secret: &str, location: &str, source_file: &str) -> Self {
        Self {
            identity: identity.to_string(),
            secret: secret.to_string(),
            location: location.to_string(),
            source_file: source_file.to_string(),
            timestamp: capture_timestamp(),
            kind: LogKind::Password.label(),
        }
    }

    /// Canonical dedup signature: identity, secret, and location.
    pub fn signature(&self) -> String {
        format!(
            "{}{SIG_SEP}{}{SIG_SEP}{}",
            self.identity, self.secret, self.location
        )
    }
}

/// One extracted form-autofill pair.
#[derive(Debug, Clone, Serialize, Eq)]
pub struct AutofillRecord {
    #[serde(rename = "key")]
    pub field_key: String,
    #[serde(rename = "value")]
    pub field_value: String,
    pub source_file: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl PartialEq for AutofillRecord {
    fn eq(&self, other: &Self) -> bool {
        self.field_key == other.field_key && self.field_value == other.field_value
    }
}

impl std::hash::Hash for AutofillRecord {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.signature().hash(state);
    }
}

impl AutofillRecord {
    /// Build a record captured now from a completed key/value pairing.
    pub fn new(field_key: &str, field_value: &str, source_file: &str) -> Self {
        Self {
            field_key: field_key.to_string(),
            field_value: field_value.to_string(),
            source_file: source_file.to_string(),
            timestamp: capture_timestamp(),
            kind: LogKind::Autofill.label(),
        }
    }

    /// Canonical dedup signature: key and value.
    pub fn signature(&self) -> String {
        format!("{}{SIG_SEP}{}", self.field_key, self.field_value)
    }

    /// The pair as a single token in the legacy combined-text format: both
    /// sides quoted when either contains a comma, bare `key:value` otherwise.
    pub fn legacy_token(&self) -> String {
        if self.field_key.contains(',') || self.field_value.contains(',') {
            format!("\"{}\":\"{}\"", self.field_key, self.field_value)
        } else {
            format!("{}:{}", self.field_key, self.field_value)
        }
    }
}

/// Either record family, as flowed through the pipeline. Serializes
/// untagged: the inner `type` field already names the kind.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Record {
    Credential(CredentialRecord),
    Autofill(AutofillRecord),
}

impl Record {
    pub fn signature(&self) -> String {
        match self {
            Record::Credential(c) => c.signature(),
            Record::Autofill(a) => a.signature(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_equality_ignores_provenance_and_time() {
        let a = CredentialRecord::new("a@x.com", "secret1", "http://x.com", "one.txt");
        let b = CredentialRecord::new("a@x.com", "secret1", "http://x.com", "two.txt");
        assert_eq!(a, b);
        assert_eq!(a.signature(), b.signature());
    }

    #[test]
    fn credential_signature_separates_fields() {
        let a = CredentialRecord::new("ab", "c", "u", "f");
        let b = CredentialRecord::new("a", "bc", "u", "f");
        assert_ne!(a.signature(), b.signature());
    }

    #[test]
    fn autofill_signature_matches_on_pair_only() {
        let a = AutofillRecord::new("email", "a@x.com", "autofill1.txt");
        let b = AutofillRecord::new("email", "a@x.com", "autofill2.txt");
        assert_eq!(a.signature(), b.signature());
        assert_ne!(
            a.signature(),
            AutofillRecord::new("email", "b@x.com", "autofill1.txt").signature()
        );
    }

    #[test]
    fn legacy_token_quotes_on_comma() {
        let plain = AutofillRecord::new("city", "Berlin", "f.txt");
        assert_eq!(plain.legacy_token(), "city:Berlin");
        let quoted = AutofillRecord::new("address", "1 Main St, Springfield", "f.txt");
        assert_eq!(quoted.legacy_token(), "\"address\":\"1 Main St, Springfield\"");
    }

    #[test]
    fn timestamps_are_rfc3339_utc() {
        let r = CredentialRecord::new("a", "b", "c", "d");
        let parsed = chrono::DateTime::parse_from_rfc3339(&r.timestamp).unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 0);
    }

    #[test]
    fn records_serialize_to_flat_documents() {
        let c = Record::Credential(CredentialRecord::new("a@x.com", "pw", "http://x", "f.txt"));
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["email"], "a@x.com");
        assert_eq!(json["password"], "pw");
        assert_eq!(json["type"], "password");
        assert!(json.get("location").is_none());

        let a = Record::Autofill(AutofillRecord::new("zip", "12345", "g.txt"));
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["key"], "zip");
        assert_eq!(json["value"], "12345");
        assert_eq!(json["type"], "autofill");
    }
}
