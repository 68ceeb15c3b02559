//! Export: writes the combined per-kind artifacts.
//!
//! Two formats exist. `csv` (the default) writes structured tables with a
//! fixed header; the `csv` crate's minimal quoting lets values containing
//! delimiters, quotes, or newlines round-trip. `legacy` reproduces the
//! historical flat files: one comma-joined credential line per record, and
//! one `key:value` token per autofill pair.
//!
//! A kind with zero unique records writes no artifact at all, not even an
//! empty file.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use csv::Writer;

use crate::record::{AutofillRecord, CredentialRecord};

pub const CREDENTIALS_FILE_NAME: &str = "credentials.csv";
pub const AUTOFILLS_FILE_NAME: &str = "autofills.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Structured tables with a header row.
    #[default]
    Csv,
    /// The historical flat-file format.
    Legacy,
}

/// Header roles for the autofill table. The canonical schema names the pair
/// for what it is; the alternate keeps downstream consumers that expect the
/// credential column names working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AutofillSchema {
    #[default]
    KeyValue,
    EmailPassword,
}

impl AutofillSchema {
    fn header(self) -> [&'static str; 5] {
        match self {
            AutofillSchema::KeyValue => ["key", "value", "source_file", "timestamp", "type"],
            AutofillSchema::EmailPassword => {
                ["email", "password", "source_file", "timestamp", "type"]
            }
        }
    }
}

/// Write the combined credentials artifact. Returns the path written, or
/// `None` when there was nothing to write.
pub fn write_credentials(
    credentials: &[CredentialRecord],
    output_dir: &Path,
    format: OutputFormat,
) -> Result<Option<PathBuf>> {
    if credentials.is_empty() {
        return Ok(None);
    }
    let path = output_dir.join(CREDENTIALS_FILE_NAME);
    match format {
        OutputFormat::Csv => {
            let mut wtr =
                Writer::from_path(&path).with_context(|| format!("create {}", path.display()))?;
            wtr.write_record(["email", "password", "source_file", "timestamp", "type"])?;
            for c in credentials {
                wtr.write_record([
                    c.identity.as_str(),
                    c.secret.as_str(),
                    c.source_file.as_str(),
                    c.timestamp.as_str(),
                    c.kind,
                ])?;
            }
            wtr.flush()?;
        }
        OutputFormat::Legacy => {
            let file =
                File::create(&path).with_context(|| format!("create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            for c in credentials {
                writeln!(
                    out,
                    "{},{},{},{},{}",
                    c.identity, c.secret, c.source_file, c.timestamp, c.kind
                )?;
            }
            out.flush()?;
        }
    }
    Ok(Some(path))
}

/// Write the combined autofills artifact. Returns the path written, or
/// `None` when there was nothing to write.
pub fn write_autofills(
    autofills: &[AutofillRecord],
    output_dir: &Path,
    format: OutputFormat,
    schema: AutofillSchema,
) -> Result<Option<PathBuf>> {
    if autofills.is_empty() {
        return Ok(None);
    }
    let path = output_dir.join(AUTOFILLS_FILE_NAME);
    match format {
        OutputFormat::Csv => {
            let mut wtr =
                Writer::from_path(&path).with_context(|| format!("create {}", path.display()))?;
            wtr.write_record(schema.header())?;
            for a in autofills {
                wtr.write_record([
                    a.field_key.as_str(),
                    a.field_value.as_str(),
                    a.source_file.as_str(),
                    a.timestamp.as_str(),
                    a.kind,
                ])?;
            }
            wtr.flush()?;
        }
        OutputFormat::Legacy => {
            let file =
                File::create(&path).with_context(|| format!("create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            for a in autofills {
                writeln!(out, "{}", a.legacy_token())?;
            }
            out.flush()?;
        }
    }
    Ok(Some(path))
}
