//! Shard resource pool.
//!
//! The pool owns every open shard sink of a run. It is created in one piece
//! ([`ShardPool::acquire`] opens all `N` files or none), written only through
//! [`ShardPool::broadcast`] and [`ShardPool::deliver`], and torn down by
//! [`ShardPool::release`], which consumes it. A pool dropped without
//! `release` (early return, panic unwinding) still flushes every sink in
//! `Drop`, so no handle outlives the run.
//!
//! The pool is generic over the sink so the driver can be exercised against
//! in-memory buffers.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::{Result, SplitError};
use crate::naming::ShardLayout;

/// Write buffer per shard file. Many shards are open at once, so keep it modest.
const SHARD_BUF_BYTES: usize = 64 << 10;

/// One open destination.
#[derive(Debug)]
pub struct Shard<W> {
    number: u32,
    path: Option<PathBuf>,
    events: u64,
    sink: W,
}

impl<W> Shard<W> {
    /// Shard number (offset applied).
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.number
    }

    /// Backing file, if the shard is file-backed.
    #[must_use]
    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    /// Records delivered so far.
    #[must_use]
    pub const fn events(&self) -> u64 {
        self.events
    }

    fn label(&self) -> String {
        match &self.path {
            Some(p) => p.display().to_string(),
            None => format!("shard #{}", self.number),
        }
    }
}

/// The `N` open destinations of a run.
#[derive(Debug)]
pub struct ShardPool<W: Write> {
    shards: Vec<Shard<W>>,
}

impl ShardPool<BufWriter<File>> {
    /// Create the output directories and open every shard file of `layout`.
    ///
    /// All-or-nothing: if any file cannot be opened, the files already opened
    /// by this call are closed and removed before the error is returned.
    pub fn acquire(layout: &ShardLayout) -> Result<Self> {
        fs::create_dir_all(&layout.output_dir).map_err(|source| SplitError::CreateDir {
            path: layout.output_dir.clone(),
            source,
        })?;

        let mut shards = Vec::with_capacity(layout.count as usize);
        for slot in 0..layout.count {
            match open_shard(layout, slot) {
                Ok(shard) => shards.push(shard),
                Err(e) => {
                    discard_partial(shards);
                    return Err(e);
                }
            }
        }
        debug!(shards = shards.len(), dir = %layout.output_dir.display(), "opened shard files");
        Ok(Self { shards })
    }
}

fn open_shard(layout: &ShardLayout, slot: u32) -> Result<Shard<BufWriter<File>>> {
    if let Some(dir) = layout.subdir(slot) {
        fs::create_dir_all(&dir).map_err(|source| SplitError::CreateDir { path: dir, source })?;
    }
    let path = layout.path(slot);
    let file = File::create(&path).map_err(|source| SplitError::OpenShard {
        path: path.clone(),
        source,
    })?;
    Ok(Shard {
        number: layout.number(slot),
        path: Some(path),
        events: 0,
        sink: BufWriter::with_capacity(SHARD_BUF_BYTES, file),
    })
}

/// Close and remove the shards opened by a failed acquisition.
fn discard_partial(shards: Vec<Shard<BufWriter<File>>>) {
    for shard in shards {
        let Shard { path, sink, .. } = shard;
        drop(sink);
        if let Some(path) = path {
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "could not remove partially acquired shard");
            }
        }
    }
}

impl<W: Write> ShardPool<W> {
    /// Wrap already-open sinks; slot `i` gets shard number `i`.
    #[must_use]
    pub fn from_sinks(sinks: Vec<W>) -> Self {
        let shards = sinks
            .into_iter()
            .zip(0u32..)
            .map(|(sink, number)| Shard {
                number,
                path: None,
                events: 0,
                sink,
            })
            .collect();
        Self { shards }
    }

    /// Number of shards `N`.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.shards.len()
    }

    /// Whether the pool holds no shards.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    /// Read-only view of the shards, in slot order.
    #[must_use]
    pub fn shards(&self) -> &[Shard<W>] {
        &self.shards
    }

    /// Write identical `bytes` to every shard (header, footer).
    pub fn broadcast(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        for shard in &mut self.shards {
            shard.sink.write_all(bytes).map_err(|source| SplitError::WriteShard {
                label: shard.label(),
                source,
            })?;
        }
        Ok(())
    }

    /// Write one record to slot `slot` and count it.
    ///
    /// # Panics
    /// Panics if `slot >= self.len()`.
    pub fn deliver(&mut self, slot: usize, record: &[u8]) -> Result<()> {
        let shard = &mut self.shards[slot];
        shard.sink.write_all(record).map_err(|source| SplitError::WriteShard {
            label: shard.label(),
            source,
        })?;
        shard.events += 1;
        Ok(())
    }

    /// Flush every shard and hand the sinks back, in slot order.
    ///
    /// Every sink is flushed even if an earlier one fails; the first failure
    /// is returned.
    pub fn release(mut self) -> Result<Vec<W>> {
        let shards = std::mem::take(&mut self.shards);
        let mut first_err = None;
        let mut sinks = Vec::with_capacity(shards.len());
        for mut shard in shards {
            if let Err(source) = shard.sink.flush() {
                warn!(shard = %shard.label(), error = %source, "flush failed on release");
                if first_err.is_none() {
                    first_err = Some(SplitError::WriteShard {
                        label: shard.label(),
                        source,
                    });
                }
            }
            sinks.push(shard.sink);
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(sinks),
        }
    }
}

impl<W: Write> Drop for ShardPool<W> {
    fn drop(&mut self) {
        if self.shards.is_empty() {
            return;
        }
        debug!(shards = self.shards.len(), "shard pool dropped without release; flushing");
        for shard in &mut self.shards {
            if let Err(e) = shard.sink.flush() {
                warn!(shard = %shard.label(), error = %e, "flush failed while dropping shard pool");
            }
        }
    }
}
