//! Run summaries.
//!
//! [`SplitSummary`] describes a finished split (per-shard record counts,
//! whether the input terminated cleanly, what was dropped). [`FileTally`] is
//! the result of counting records in an existing file. Both serialize to JSON.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SplitError};
use crate::policy::PolicyKind;

/// One shard in a [`SplitSummary`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShardSummary {
    /// Shard number (offset applied).
    pub number: u32,
    /// Backing file, if any.
    pub path: Option<PathBuf>,
    /// Records written to this shard.
    pub events: u64,
}

/// Outcome of one split run.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SplitSummary {
    /// Assignment policy used.
    pub policy: PolicyKind,
    /// Records routed (the final event count).
    pub events: u64,
    /// Source lines consumed, footer included.
    pub lines: u64,
    /// Whether the terminating marker was found.
    pub terminated: bool,
    /// Header size in bytes.
    pub header_bytes: u64,
    /// Footer size in bytes (0 when unterminated).
    pub footer_bytes: u64,
    /// Non-record lines between the last record and the footer, copied to every shard.
    pub interstitial_bytes: u64,
    /// Bytes of a truncated trailing record that were dropped.
    pub discarded_bytes: u64,
    /// Whether a truncated trailing record was routed as a record.
    pub flushed_truncated: bool,
    /// Per-shard counts, in slot order.
    pub shards: Vec<ShardSummary>,
}

impl SplitSummary {
    /// Sum of per-shard counts. Equals `events` for every finished run.
    #[must_use]
    pub fn shard_total(&self) -> u64 {
        self.shards.iter().map(|s| s.events).sum()
    }

    /// Smallest and largest per-shard count.
    #[must_use]
    pub fn spread(&self) -> Option<(u64, u64)> {
        let min = self.shards.iter().map(|s| s.events).min()?;
        let max = self.shards.iter().map(|s| s.events).max()?;
        Some((min, max))
    }
}

/// Record count of one existing event file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileTally {
    /// File that was scanned.
    pub path: PathBuf,
    /// Complete records found.
    pub events: u64,
    /// Whether the terminating marker was found.
    pub terminated: bool,
    /// Bytes of an unclosed trailing record (0 for a well-formed file).
    pub truncated_bytes: u64,
}

/// Write `summary` as pretty JSON, creating the parent directory if needed.
pub fn write_summary_json<P: AsRef<Path>>(path: P, summary: &SplitSummary) -> Result<()> {
    let path = path.as_ref();
    let io_err = |source| SplitError::Summary {
        path: path.to_owned(),
        source,
    };
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
    }
    let f = File::create(path).map_err(io_err)?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, summary)?;
    w.write_all(b"\n").map_err(io_err)?;
    w.flush().map_err(io_err)?;
    Ok(())
}

/// Read a summary previously written by [`write_summary_json`].
pub fn read_summary_json<P: AsRef<Path>>(path: P) -> Result<SplitSummary> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| SplitError::Summary {
        path: path.to_owned(),
        source,
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}
