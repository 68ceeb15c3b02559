//! Human-readable report rendering for terminal output.
//!
//! Produces a colored run summary: per-kind extraction counters, the files
//! that had to be discarded, and the most frequent credential locations.
use colored::*;

use crate::{
    engine::Engine,
    record::LogKind,
    stats::{KindStats, pct, top_locations},
};

fn visible_len(s: &str) -> usize {
    // Strip ANSI escape sequences (\x1b[ ... m) to compute printable width
    let mut len = 0;
    let mut iter = s.chars().peekable();
    while let Some(ch) = iter.next() {
        if ch == '\u{1b}' {
            if let Some('[') = iter.peek().cloned() {
                let _ = iter.next();
            }
            for c in iter.by_ref() {
                if c == 'm' {
                    break;
                }
            }
        } else {
            len += 1;
        }
    }
    len
}

fn section_header(title: &str) -> String {
    let len = visible_len(title);
    let mut s = String::new();
    s.push('\n');
    s.push_str(title);
    s.push('\n');
    s.push_str(&"─".repeat(len));
    s.push_str("\n\n");
    s
}

fn kind_lines(stats: &KindStats) -> Vec<String> {
    vec![
        format!("Files scanned: {}", stats.files_scanned),
        format!("Records extracted: {}", stats.records_extracted),
        format!(
            "Unique records: {} ({} of extracted)",
            stats.records_unique,
            pct(stats.records_unique, stats.records_extracted)
        ),
        format!("Undecodable lines: {}", stats.undecodable_lines),
        format!("Files failed: {}", stats.files_failed),
    ]
}

pub fn render_run_report(engine: &Engine) -> String {
    render_run_report_with_top(engine, 10)
}

pub fn render_run_report_with_top(engine: &Engine, top_n: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n",
        "StealSift: Stealer Log Extraction Results".bold().cyan()
    ));

    out.push_str(&section_header(
        &"Password Extraction".bold().yellow().to_string(),
    ));
    for line in kind_lines(engine.stats.kind(LogKind::Password)) {
        out.push_str(&line);
        out.push('\n');
    }

    out.push_str(&section_header(
        &"Autofill Extraction".bold().yellow().to_string(),
    ));
    for line in kind_lines(engine.stats.kind(LogKind::Autofill)) {
        out.push_str(&line);
        out.push('\n');
    }

    let mut failure_lines: Vec<String> = Vec::new();
    if engine.stats.failures.is_empty() {
        failure_lines.push("(No failed files)".to_string());
    } else {
        for failure in &engine.stats.failures {
            failure_lines.push(format!(
                "  {} [{}]: {}",
                failure.path.display(),
                failure.kind,
                failure.reason.as_str().dimmed()
            ));
        }
    }
    out.push_str(&section_header(&"Failed Files".bold().cyan().to_string()));
    for line in failure_lines {
        out.push_str(&line);
        out.push('\n');
    }

    let mut location_lines: Vec<String> = Vec::new();
    let top = top_locations(&engine.credentials, top_n);
    if top.is_empty() {
        location_lines.push("(No locations recorded)".to_string());
    } else {
        for (location, count) in top {
            location_lines.push(format!("  {location}: {count}"));
        }
    }
    out.push_str(&section_header(
        &"Top Locations".bold().magenta().to_string(),
    ));
    for line in location_lines {
        out.push_str(&line);
        out.push('\n');
    }

    out
}
