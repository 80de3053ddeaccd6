// crates/evsplit-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use evsplit_core::{
    config::{SplitConfig, TrailingPolicy, DEFAULT_PROGRESS_EVERY},
    driver::{count_file, split_file},
    format::{
        Markers, DEFAULT_CLOSE_MARKER, DEFAULT_END_MARKER, DEFAULT_EXTENSION, DEFAULT_OPEN_MARKER,
        DEFAULT_PREFIX,
    },
    generator::{write_event_file, GeneratorSpec},
    naming::ShardLayout,
    policy::PolicyKind,
    progress::LogProgress,
    summary::{write_summary_json, FileTally},
};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "evsplit",
    about = "Split large event files into standalone shards",
    long_about = "Split large event files into standalone shards.\n\nEach shard keeps the source header and footer and receives a subset of the event records, assigned round-robin or at random.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Split one event file into N shards.
    Split(SplitArgs),

    /// Count event records in one or more files.
    Count {
        /// Files to scan
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print a JSON report instead of one line per file
        #[arg(long, default_value_t = false)]
        json: bool,

        #[command(flatten)]
        markers: MarkerArgs,
    },

    /// Write a deterministic synthetic event file (for smoke runs).
    Generate {
        /// Output path
        #[arg(short = 'o', long)]
        out: PathBuf,

        /// Number of events
        #[arg(long, default_value_t = 1_000)]
        events: u64,

        /// Upper bound on particle lines per event (>= 2)
        #[arg(long, default_value_t = 6, value_parser = clap::value_parser!(u8).range(2..))]
        max_particles: u8,

        /// Generator seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

#[derive(Args, Debug)]
struct SplitArgs {
    /// Source event file
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Output directory (created if missing)
    #[arg(short = 'o', long)]
    output_dir: PathBuf,

    /// Number of files to split into (>0)
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u32).range(1..))]
    num_files: u32,

    /// Prefix for output file names
    #[arg(long, default_value = DEFAULT_PREFIX)]
    file_prefix: String,

    /// Number of the first output file
    #[arg(long, default_value_t = 0)]
    file_offset: u32,

    /// Extension for output file names (without the dot)
    #[arg(long, default_value = DEFAULT_EXTENSION)]
    ext: String,

    /// Nest outputs in sub-directories of 100 files (e.g. <dir>/000/event_file_00001.lhe)
    #[arg(long, default_value_t = false)]
    subdirs: bool,

    /// Fill files round-robin instead of at random
    #[arg(long, visible_alias = "seq", default_value_t = false)]
    sequential: bool,

    /// Seed for random assignment (default: drawn from the OS)
    #[arg(long, conflicts_with = "sequential")]
    seed: Option<u64>,

    /// Route an unterminated trailing event instead of dropping it
    #[arg(long, default_value_t = false)]
    keep_truncated: bool,

    /// Log progress every K events (0 = never)
    #[arg(long, default_value_t = DEFAULT_PROGRESS_EVERY)]
    progress_every: u64,

    /// Write a JSON run summary to this path
    #[arg(long)]
    summary: Option<PathBuf>,

    #[command(flatten)]
    markers: MarkerArgs,
}

#[derive(Args, Debug)]
struct MarkerArgs {
    /// Substring that opens an event record
    #[arg(long, default_value = DEFAULT_OPEN_MARKER)]
    open_marker: String,

    /// Substring that closes an event record
    #[arg(long, default_value = DEFAULT_CLOSE_MARKER)]
    close_marker: String,

    /// Substring that terminates the file (the footer line)
    #[arg(long, default_value = DEFAULT_END_MARKER)]
    end_marker: String,
}

impl From<MarkerArgs> for Markers {
    fn from(m: MarkerArgs) -> Self {
        Markers::new(m.open_marker, m.close_marker, m.end_marker)
    }
}

impl SplitArgs {
    fn into_config(self) -> (SplitConfig, Option<PathBuf>) {
        let cfg = SplitConfig {
            input: self.input,
            layout: ShardLayout {
                output_dir: self.output_dir,
                prefix: self.file_prefix,
                extension: self.ext,
                offset: self.file_offset,
                subdirs: self.subdirs,
                count: self.num_files,
            },
            markers: self.markers.into(),
            policy: if self.sequential {
                PolicyKind::Sequential
            } else {
                PolicyKind::Random
            },
            seed: self.seed,
            trailing: if self.keep_truncated {
                TrailingPolicy::Flush
            } else {
                TrailingPolicy::Discard
            },
            progress_every: self.progress_every,
        };
        (cfg, self.summary)
    }
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Split(args) => split(args),

        Cmd::Count {
            files,
            json,
            markers,
        } => {
            let markers: Markers = markers.into();
            count(&files, json, &markers)
        }

        Cmd::Generate {
            out,
            events,
            max_particles,
            seed,
        } => generate(
            &out,
            GeneratorSpec {
                events,
                max_particles,
                seed,
            },
        ),
    }
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Ensure the parent directory for a file exists.
fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating parent directory {}", dir.display()))?;
        }
    }
    Ok(())
}

fn split(args: SplitArgs) -> Result<()> {
    let (cfg, summary_path) = args.into_config();

    let mut progress = LogProgress::new(cfg.progress_every);
    let summary = split_file(&cfg, &mut progress).with_context(|| {
        format!(
            "splitting {} into {} files under {}",
            cfg.input.display(),
            cfg.layout.count,
            cfg.layout.output_dir.display()
        )
    })?;

    if let Some(path) = summary_path {
        write_summary_json(&path, &summary)
            .with_context(|| format!("writing run summary to {}", path.display()))?;
        info!(summary = %path.display(), "wrote run summary");
    }

    let (min, max) = summary.spread().unwrap_or((0, 0));
    println!(
        "Split {} events from {} into {} files ({}..={} per file) → {}",
        summary.events,
        cfg.input.display(),
        summary.shards.len(),
        min,
        max,
        cfg.layout.output_dir.display()
    );
    Ok(())
}

#[derive(Serialize)]
struct CountReport {
    files: Vec<FileTally>,
    total: u64,
}

fn count(files: &[PathBuf], json: bool, markers: &Markers) -> Result<()> {
    let mut tallies = Vec::with_capacity(files.len());
    for path in files {
        let tally = count_file(path, markers)
            .with_context(|| format!("counting events in {}", path.display()))?;
        tallies.push(tally);
    }
    let total: u64 = tallies.iter().map(|t| t.events).sum();

    if json {
        let report = CountReport {
            files: tallies,
            total,
        };
        let text = serde_json::to_string_pretty(&report).context("serialize count report")?;
        println!("{text}");
        return Ok(());
    }

    for t in &tallies {
        let note = match (t.terminated, t.truncated_bytes) {
            (true, 0) => String::new(),
            (false, 0) => " (no terminating marker)".to_owned(),
            (_, n) => format!(" (unclosed trailing event, {n} bytes)"),
        };
        println!("{:>10}  {}{}", t.events, t.path.display(), note);
    }
    if tallies.len() > 1 {
        println!("{total:>10}  total");
    }
    Ok(())
}

fn generate(out: &Path, spec: GeneratorSpec) -> Result<()> {
    info!(events = spec.events, seed = spec.seed, out = %out.display(), "generating synthetic event file");
    ensure_parent_dir(out)?;
    let f = File::create(out).with_context(|| format!("create {}", out.display()))?;
    let mut w = BufWriter::new(f);
    write_event_file(&mut w, &spec).with_context(|| format!("write {}", out.display()))?;
    w.flush()?;

    println!("Generated {} events → {}", spec.events, out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("evsplit").chain(args.iter().copied()))
    }

    fn split_args(args: &[&str]) -> SplitArgs {
        match parse(args).unwrap().cmd {
            Cmd::Split(a) => a,
            other => unreachable!("expected split, got {other:?}"),
        }
    }

    #[test]
    fn help_exits_successfully() {
        for flag in ["-h", "--help"] {
            let err = parse(&["split", flag]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
            assert_eq!(err.exit_code(), 0);
        }
    }

    #[test]
    fn missing_required_argument_fails() {
        let err = parse(&["split", "-i", "in.lhe", "-o", "out"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_ne!(err.exit_code(), 0);
    }

    #[test]
    fn zero_or_garbage_count_rejected() {
        for n in ["0", "-3", "many"] {
            assert!(parse(&["split", "-i", "a", "-o", "b", "-n", n]).is_err(), "{n}");
        }
    }

    #[test]
    fn defaults_match_documented_surface() {
        let (cfg, summary) = split_args(&["split", "-i", "in.lhe", "-o", "out", "-n", "4"]).into_config();
        assert_eq!(cfg.layout.prefix, "event_file_");
        assert_eq!(cfg.layout.extension, "lhe");
        assert_eq!(cfg.layout.offset, 0);
        assert!(!cfg.layout.subdirs);
        assert_eq!(cfg.policy, PolicyKind::Random);
        assert_eq!(cfg.trailing, TrailingPolicy::Discard);
        assert_eq!(cfg.markers, Markers::default());
        assert!(summary.is_none());
        cfg.validate().unwrap();
    }

    #[test]
    fn optional_flags_map_onto_config() {
        let (cfg, summary) = split_args(&[
            "split",
            "--input",
            "in.lhe",
            "--output-dir",
            "out",
            "--num-files",
            "300",
            "--file-prefix",
            "run7_",
            "--file-offset",
            "100",
            "--subdirs",
            "--seq",
            "--keep-truncated",
            "--summary",
            "s.json",
        ])
        .into_config();
        assert_eq!(cfg.layout.count, 300);
        assert_eq!(cfg.layout.path(0), PathBuf::from("out/001/run7_00100.lhe"));
        assert_eq!(cfg.policy, PolicyKind::Sequential);
        assert_eq!(cfg.trailing, TrailingPolicy::Flush);
        assert_eq!(summary, Some(PathBuf::from("s.json")));
    }

    #[test]
    fn seed_conflicts_with_sequential() {
        let err = parse(&["split", "-i", "a", "-o", "b", "-n", "2", "--sequential", "--seed", "1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn count_requires_files() {
        let err = parse(&["count"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }
}
