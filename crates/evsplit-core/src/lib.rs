//! evsplit-core — streaming split/distribute engine for event files.
//!
//! An *event file* is a text container made of a header, a long run of
//! self-delimited event records and a single terminating line (the Les Houches
//! `.lhe` layout is the default). This crate splits one such file into `N`
//! standalone shards of the same shape without ever holding more than one
//! record in memory:
//!
//! - `scanner`: line classifier / boundary detector (header, record, footer).
//! - `pool`: owns the `N` open shard sinks; all-or-nothing acquisition and
//!   guaranteed release.
//! - `policy`: record → shard assignment (round-robin or uniform random).
//! - `driver`: glues the three together over a `BufRead` source.
//!
//! ```no_run
//! use evsplit_core::{config::SplitConfig, driver::split_file, progress::LogProgress};
//! # fn demo(cfg: SplitConfig) -> evsplit_core::Result<()> {
//! let mut progress = LogProgress::new(cfg.progress_every);
//! let summary = split_file(&cfg, &mut progress)?;
//! println!("{} events over {} shards", summary.events, summary.shards.len());
//! # Ok(())
//! # }
//! ```
//!
//! We intentionally avoid broad re-exports beyond the error type so callers
//! use stable paths like `evsplit_core::driver::split_file`.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::module_name_repetitions, clippy::doc_markdown)]

/// Run configuration and its validation.
pub mod config;
/// Stream driver: source → scanner → policy → pool.
pub mod driver;
/// Crate error type.
pub mod error;
/// Marker set and defaults of the event-file layout.
pub mod format;
/// Deterministic synthetic event-file generator (for tests and smoke runs).
pub mod generator;
/// Shard naming scheme (`<dir>[/<sub>]/<prefix><index>.<ext>`).
pub mod naming;
/// Record → shard assignment policies.
pub mod policy;
/// Shard resource pool.
pub mod pool;
/// Progress observers.
pub mod progress;
/// Record boundary scanner.
pub mod scanner;
/// Run summaries and per-file tallies.
pub mod summary;

pub use error::{Result, SplitError};
