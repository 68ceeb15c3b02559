//! Input discovery: walk the dump root and classify log files by name.
//!
//! Stealer packages follow loose naming conventions rather than a schema.
//! Password dumps are recognized by file name alone; autofill dumps by file
//! name or by the name of their parent directory (many families drop
//! unlabeled files into an `Autofills/` folder). A file can satisfy both
//! conventions and is then scheduled once per kind.
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::warn;
use regex::Regex;
use walkdir::WalkDir;

use crate::record::LogKind;

/// Extensions considered parseable log text.
const LOG_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];

/// One unit of parse work: a file together with the kind it is parsed as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    pub path: PathBuf,
    pub kind: LogKind,
}

fn has_log_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| LOG_EXTENSIONS.iter().any(|known| e.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

fn is_excluded(path: &Path, excludes: &[Regex]) -> bool {
    if excludes.is_empty() {
        return false;
    }
    let text = path.to_string_lossy();
    excludes.iter().any(|re| re.is_match(&text))
}

/// The kinds a file name (and its parent directory name) advertise.
pub fn classify(path: &Path) -> Vec<LogKind> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let parent = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let mut kinds = Vec::new();
    if name.contains("password") {
        kinds.push(LogKind::Password);
    }
    if name.contains("autofill") || parent.contains("autofill") {
        kinds.push(LogKind::Autofill);
    }
    kinds
}

/// Walk `root` and collect every classified log file, sorted by path so
/// downstream scheduling is stable run to run.
///
/// Directory symlinks are followed, but a directory is never entered twice:
/// each one is canonicalized and checked against a visited set, so link
/// cycles and diamonds terminate. Unreadable entries are logged and skipped
/// rather than failing the scan.
pub fn scan_root(root: &Path, excludes: &[Regex]) -> Vec<LogFile> {
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut found = Vec::new();

    let mut walker = WalkDir::new(root).follow_links(true).into_iter();
    loop {
        let entry = match walker.next() {
            None => break,
            Some(Err(err)) => {
                warn!("skipping unreadable entry: {err}");
                continue;
            }
            Some(Ok(entry)) => entry,
        };
        let path = entry.path();

        if is_excluded(path, excludes) {
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            continue;
        }

        if entry.file_type().is_dir() {
            match path.canonicalize() {
                Ok(real) => {
                    if !visited.insert(real) {
                        walker.skip_current_dir();
                    }
                }
                Err(err) => {
                    warn!("cannot resolve {}: {err}", path.display());
                    walker.skip_current_dir();
                }
            }
            continue;
        }

        if !entry.file_type().is_file() || !has_log_extension(path) {
            continue;
        }
        for kind in classify(path) {
            found.push(LogFile {
                path: path.to_path_buf(),
                kind,
            });
        }
    }

    found.sort_by(|a, b| {
        a.path
            .cmp(&b.path)
            .then_with(|| a.kind.label().cmp(b.kind.label()))
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn classifies_by_file_and_parent_names() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("browser/passwords.txt"));
        touch(&root.join("browser/notes.txt"));
        touch(&root.join("Autofills/chrome.txt"));
        touch(&root.join("autofill_export.csv"));
        touch(&root.join("passwords.doc"));

        let files = scan_root(root, &[]);
        assert_eq!(files.len(), 3);
        assert!(files.iter().any(
            |f| f.kind == LogKind::Password && f.path.ends_with("browser/passwords.txt")
        ));
        assert!(files.iter().any(
            |f| f.kind == LogKind::Autofill && f.path.ends_with("Autofills/chrome.txt")
        ));
        assert!(files.iter().any(
            |f| f.kind == LogKind::Autofill && f.path.ends_with("autofill_export.csv")
        ));
    }

    #[test]
    fn ambiguous_name_is_scheduled_for_both_kinds() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("password_autofill.txt"));

        let files = scan_root(dir.path(), &[]);
        let kinds: Vec<LogKind> = files.iter().map(|f| f.kind).collect();
        assert_eq!(files.len(), 2);
        assert!(kinds.contains(&LogKind::Password));
        assert!(kinds.contains(&LogKind::Autofill));
    }

    #[test]
    fn name_and_extension_match_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("PASSWORDS.TXT"));

        let files = scan_root(dir.path(), &[]);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].kind, LogKind::Password);
    }

    #[test]
    fn exclude_patterns_prune_files_and_whole_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("keep/passwords.txt"));
        touch(&root.join("quarantine/passwords.txt"));
        touch(&root.join("passwords_old.txt"));

        let excludes = vec![
            Regex::new("quarantine").unwrap(),
            Regex::new("_old").unwrap(),
        ];
        let files = scan_root(root, &excludes);
        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("keep/passwords.txt"));
    }

    #[test]
    fn results_are_sorted_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("b/passwords.txt"));
        touch(&root.join("a/passwords.txt"));

        let files = scan_root(root, &[]);
        assert_eq!(files.len(), 2);
        assert!(files[0].path < files[1].path);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_visited_once() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("shared/passwords.txt"));
        std::os::unix::fs::symlink(root.join("shared"), root.join("alias_a")).unwrap();
        std::os::unix::fs::symlink(root.join("shared"), root.join("alias_b")).unwrap();

        let files = scan_root(root, &[]);
        assert_eq!(files.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_cycles_terminate() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("nested/passwords.txt"));
        std::os::unix::fs::symlink(root, root.join("nested/loop")).unwrap();

        let files = scan_root(root, &[]);
        assert_eq!(files.len(), 1);
    }
}
