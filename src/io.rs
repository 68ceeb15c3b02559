//! Line-oriented file input with undecodable-line tolerance.
//!
//! Stealer dumps mix encodings freely; one mojibake line must not sink the
//! whole file. [`LineDecoder`] yields the lines that decode as UTF-8, counts
//! the ones that do not, and holds back a terminal read failure so the
//! caller can fail the file on real I/O errors.
//!
//! Files at or above the mmap threshold are memory-mapped and scanned for
//! newline boundaries; smaller files go through a buffered reader.
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use memmap2::Mmap;

/// Threshold in bytes above which we attempt to use mmap for reading.
/// Callers can override via API; this is a reasonable default.
pub const DEFAULT_MMAP_THRESHOLD_BYTES: u64 = 16 * 1024 * 1024; // 16 MiB

type RawLines = Box<dyn Iterator<Item = io::Result<String>> + Send + 'static>;

/// Decide whether to use mmap based on file size and threshold.
pub fn should_use_mmap(file_size_bytes: u64, threshold_bytes: u64) -> bool {
    file_size_bytes >= threshold_bytes
}

/// Lazy UTF-8 line sequence over one file.
///
/// Iteration never yields errors: undecodable lines are skipped and tallied
/// in [`LineDecoder::skipped`], and any other read error ends the sequence
/// and is parked in [`LineDecoder::failure`].
pub struct LineDecoder {
    raw: RawLines,
    skipped: usize,
    failure: Option<io::Error>,
}

impl LineDecoder {
    /// Open `path`, choosing mmap or buffered reading by file size.
    pub fn open<P: AsRef<Path>>(path: P, mmap_threshold: u64) -> Result<Self> {
        let meta = std::fs::metadata(&path)
            .with_context(|| format!("stat {}", path.as_ref().display()))?;
        let raw = if meta.is_file() && should_use_mmap(meta.len(), mmap_threshold) {
            mmap_lines(&path)?
        } else {
            bufread_lines(&path)?
        };
        Ok(Self {
            raw,
            skipped: 0,
            failure: None,
        })
    }

    /// Number of lines dropped because they were not valid UTF-8.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// The read error that ended iteration early, if any. When this is set
    /// the file's contribution should be discarded, not trusted as partial.
    pub fn failure(&self) -> Option<&io::Error> {
        self.failure.as_ref()
    }
}

impl Iterator for LineDecoder {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.failure.is_some() {
            return None;
        }
        loop {
            match self.raw.next()? {
                Ok(line) => return Some(line),
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    self.skipped += 1;
                }
                Err(e) => {
                    self.failure = Some(e);
                    return None;
                }
            }
        }
    }
}

fn bufread_lines<P: AsRef<Path>>(path: P) -> Result<RawLines> {
    let file = File::open(&path).with_context(|| format!("open {}", path.as_ref().display()))?;
    Ok(Box::new(BufReader::new(file).lines()))
}

fn mmap_lines<P: AsRef<Path>>(path: P) -> Result<RawLines> {
    let file = File::open(&path).with_context(|| format!("open {}", path.as_ref().display()))?;
    let mmap =
        unsafe { Mmap::map(&file) }.with_context(|| format!("mmap {}", path.as_ref().display()))?;
    Ok(Box::new(MmapLines { mmap, pos: 0 }))
}

struct MmapLines {
    mmap: Mmap,
    pos: usize,
}

impl Iterator for MmapLines {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let data: &[u8] = &self.mmap;
        if self.pos >= data.len() {
            return None;
        }
        let start = self.pos;
        let end = match memchr::memchr(b'\n', &data[self.pos..]) {
            Some(off) => {
                self.pos = start + off + 1; // skip newline
                start + off
            }
            None => {
                // Last line without trailing newline
                self.pos = data.len();
                data.len()
            }
        };
        Some(line_from_bytes(&data[start..end]))
    }
}

/// Decode one raw line, trimming a trailing '\r' (Windows CRLF). Invalid
/// UTF-8 maps to `InvalidData`, the same kind the buffered path reports, so
/// the decoder skips it either way.
fn line_from_bytes(bytes: &[u8]) -> io::Result<String> {
    let slice = if bytes.ends_with(b"\r") {
        &bytes[..bytes.len() - 1]
    } else {
        bytes
    };
    match std::str::from_utf8(slice) {
        Ok(s) => Ok(s.to_string()),
        Err(_) => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "line is not valid UTF-8",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_bytes(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn reads_lines_and_trims_crlf() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_bytes(&dir, "plain.txt", b"one\r\ntwo\nthree");
        // Force the buffered path
        let mut dec = LineDecoder::open(&path, u64::MAX).unwrap();
        let lines: Vec<String> = (&mut dec).collect();
        assert_eq!(lines, vec!["one", "two", "three"]);
        assert_eq!(dec.skipped(), 0);
        assert!(dec.failure().is_none());
    }

    #[test]
    fn skips_undecodable_lines_bufread() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_bytes(&dir, "mixed.txt", b"good\n\xff\xfe\xfd\nalso good\n");
        let mut dec = LineDecoder::open(&path, u64::MAX).unwrap();
        let lines: Vec<String> = (&mut dec).collect();
        assert_eq!(lines, vec!["good", "also good"]);
        assert_eq!(dec.skipped(), 1);
        assert!(dec.failure().is_none());
    }

    #[test]
    fn skips_undecodable_lines_mmap() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_bytes(&dir, "mixed.txt", b"good\n\xff\xfe\xfd\nalso good");
        // Threshold of 1 byte forces the mmap path
        let mut dec = LineDecoder::open(&path, 1).unwrap();
        let lines: Vec<String> = (&mut dec).collect();
        assert_eq!(lines, vec!["good", "also good"]);
        assert_eq!(dec.skipped(), 1);
    }

    #[test]
    fn mmap_handles_trailing_newline_and_crlf() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_bytes(&dir, "crlf.txt", b"a\r\nb\r\n");
        let lines: Vec<String> = LineDecoder::open(&path, 1).unwrap().collect();
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn open_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(LineDecoder::open(dir.path().join("absent.txt"), u64::MAX).is_err());
    }

    #[test]
    fn threshold_selects_mmap() {
        assert!(should_use_mmap(100, 100));
        assert!(should_use_mmap(101, 100));
        assert!(!should_use_mmap(99, 100));
    }
}
