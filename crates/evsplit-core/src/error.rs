//! Error type shared by every stage of a split run.
//!
//! Variants follow the failure classes of a run: bad arguments, failure to
//! acquire shard resources, failure to read the source, and failure to write
//! a shard or a summary. All of them are fatal; nothing is retried.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while configuring or executing a split.
#[derive(Debug, Error)]
pub enum SplitError {
    /// A configuration value is missing or out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The output directory (or a sub-collection directory) could not be created.
    #[error("cannot create output directory {}", .path.display())]
    CreateDir {
        /// Directory that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A shard file could not be opened for writing.
    #[error("cannot open shard {} for writing", .path.display())]
    OpenShard {
        /// Shard path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The source file could not be opened for reading.
    #[error("cannot open source file {}", .path.display())]
    OpenSource {
        /// Source path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Reading from the source failed mid-stream.
    #[error("read error in source after line {line}")]
    ReadSource {
        /// Number of lines successfully read before the failure.
        line: u64,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Writing or flushing a shard failed.
    #[error("write to shard {label} failed")]
    WriteShard {
        /// Shard path, or `shard #<slot>` for in-memory sinks.
        label: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The run summary could not be written.
    #[error("cannot write summary {}", .path.display())]
    Summary {
        /// Summary path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The run summary could not be serialized.
    #[error("cannot serialize summary")]
    SummaryJson(#[from] serde_json::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SplitError>;
