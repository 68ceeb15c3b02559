//! CLI entrypoint for `stealsift`.
//!
//! Parses command-line arguments, validates the dump root, runs the
//! extraction engine with optional worker-count and mmap threshold
//! selection, prints a terminal summary, and writes the combined artifacts
//! (plus an optional JSON Lines spool for downstream indexing).
//!
//! Exit codes: 0 run completed (per-file failures do not change this),
//! 2 invalid invocation, 3 extraction could not start, 4 output directory
//! could not be created, 5 artifact write failed.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use log::{LevelFilter, error, info, warn};
use regex::Regex;
use stealsift::{
    engine::{Engine, ExtractOptions},
    export::{AutofillSchema, OutputFormat, write_autofills, write_credentials},
    io::DEFAULT_MMAP_THRESHOLD_BYTES,
    report::render_run_report_with_top,
    sink::{JsonlSink, RecordSink},
};

#[derive(Parser, Debug)]
#[command(
    name = "stealsift",
    version,
    about = "Stealer-log credential and autofill extractor (Rust)"
)]
struct Args {
    /// Root folder containing the stealer log dumps
    #[arg(default_value = "./data")]
    root: PathBuf,

    /// Output folder for the combined artifacts
    #[arg(short = 'o', long = "output", default_value = "./output")]
    output: PathBuf,

    /// Output artifact format
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Write autofill rows under the email/password header instead of key/value
    #[arg(long = "map-autofill-roles")]
    map_autofill_roles: bool,

    /// Keep credential blocks whose URL line was missing or empty
    #[arg(long = "allow-empty-url")]
    allow_empty_url: bool,

    /// Worker threads for parsing; 0 sizes the pool automatically
    #[arg(short = 'w', long = "workers", default_value_t = 0)]
    workers: usize,

    /// Override mmap threshold in bytes. If zero, disable mmap.
    #[arg(long = "mmap-threshold", default_value_t = DEFAULT_MMAP_THRESHOLD_BYTES)]
    mmap_threshold: u64,

    /// Skip paths matching this regex (repeatable)
    #[arg(long = "exclude", value_name = "PATTERN", action = clap::ArgAction::Append)]
    exclude: Vec<String>,

    /// Also spool the unique records as JSON Lines to this file
    #[arg(long = "jsonl", value_name = "PATH")]
    jsonl: Option<PathBuf>,

    /// Limit number of entries in "Top Locations"
    #[arg(long = "top", default_value_t = 10)]
    top_limit: usize,

    /// Control color output (auto, always, never)
    #[arg(long = "color", value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress banner and summary output (artifacts are still written)
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

const ASCII_TITLE: &str = r#"
╔═╗┌┬┐┌─┐┌─┐┬  ╔═╗┬┌─┐┌┬┐
╚═╗ │ ├┤ ├─┤│  ╚═╗│├┤  │
╚═╝ ┴ └─┘┴ ┴┴─┘╚═╝┴└   ┴
"#;

fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init();
}

fn verify_inputs(args: &Args) -> Result<()> {
    if !args.root.exists() {
        bail!("root folder not found: {}", args.root.display());
    }
    if !args.root.is_dir() {
        bail!("root is not a directory: {}", args.root.display());
    }
    Ok(())
}

fn compile_excludes(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).map_err(|e| anyhow::anyhow!("invalid exclude pattern '{p}': {e}")))
        .collect()
}

fn spool_jsonl(engine: &Engine, path: &Path) {
    let mut sink = match JsonlSink::create(path) {
        Ok(sink) => sink,
        Err(e) => {
            warn!("sink unavailable, skipping spool {}: {}", path.display(), e);
            return;
        }
    };
    let records = engine.records();
    let wrote = sink.submit_batch(&records);
    if let Err(e) = wrote.and(sink.finish()) {
        warn!("sink write failed for {}: {}", path.display(), e);
        return;
    }
    info!(
        "spooled {} records to {}",
        sink.submitted(),
        sink.path().display()
    );
}

fn main() {
    let args = Args::parse();
    init_logger(args.verbose);
    // Configure color policy
    match args.color {
        ColorChoice::Always => {
            colored::control::set_override(true);
        }
        ColorChoice::Never => {
            colored::control::set_override(false);
        }
        ColorChoice::Auto => {}
    }

    if let Err(e) = verify_inputs(&args) {
        error!("{}", e);
        std::process::exit(2);
    }
    let excludes = match compile_excludes(&args.exclude) {
        Ok(excludes) => excludes,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };

    let threshold = if args.mmap_threshold == 0 {
        u64::MAX
    } else {
        args.mmap_threshold
    };
    let opts = ExtractOptions {
        workers: args.workers,
        mmap_threshold: threshold,
        require_location: !args.allow_empty_url,
        excludes,
    };

    let mut engine = Engine::new();
    if let Err(e) = engine.load_from_root(&args.root, &opts) {
        error!("extraction failed: {}", e);
        std::process::exit(3);
    }

    if !args.quiet {
        println!("{}", ASCII_TITLE.bold().green());
        println!("{}", render_run_report_with_top(&engine, args.top_limit));
    }

    if let Err(e) = fs::create_dir_all(&args.output) {
        error!(
            "failed to create output directory {}: {}",
            args.output.display(),
            e
        );
        std::process::exit(4);
    }

    if engine.stats.total_unique() == 0 {
        info!("no records extracted; no artifacts written");
    }
    match write_credentials(&engine.credentials, &args.output, args.format) {
        Ok(Some(path)) => info!(
            "wrote {} unique credentials to {}",
            engine.credentials.len(),
            path.display()
        ),
        Ok(None) => info!("no credentials found; skipping artifact"),
        Err(e) => {
            error!("failed to write credentials artifact: {}", e);
            std::process::exit(5);
        }
    }
    let schema = if args.map_autofill_roles {
        AutofillSchema::EmailPassword
    } else {
        AutofillSchema::KeyValue
    };
    match write_autofills(&engine.autofills, &args.output, args.format, schema) {
        Ok(Some(path)) => info!(
            "wrote {} unique autofill pairs to {}",
            engine.autofills.len(),
            path.display()
        ),
        Ok(None) => info!("no autofill pairs found; skipping artifact"),
        Err(e) => {
            error!("failed to write autofills artifact: {}", e);
            std::process::exit(5);
        }
    }

    if let Some(path) = &args.jsonl {
        spool_jsonl(&engine, path);
    }
}
