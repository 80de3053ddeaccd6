//! Stream driver.
//!
//! Reads a source line by line, feeds the [`RecordScanner`], and turns its
//! boundaries into writes on a [`ShardPool`]:
//!
//! - header closed → broadcast to every shard (once),
//! - record complete → `policy.select(count, N)` → deliver to that one shard,
//! - input over → trailing content handled per [`TrailingPolicy`], footer
//!   broadcast to every shard.
//!
//! Driver states: `Init → ReadingHeader → ReadingEvents → Terminated →
//! Teardown`. Teardown (footer + release) runs whether reading ended on the
//! terminating marker or on plain end of input. [`split_file`] opens the
//! source before any shard exists and always releases the pool, also when the
//! run fails.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::{SplitConfig, TrailingPolicy};
use crate::error::{Result, SplitError};
use crate::format::Markers;
use crate::policy::PartitionPolicy;
use crate::pool::ShardPool;
use crate::progress::ProgressObserver;
use crate::scanner::{BoundarySink, RecordScanner, ScanState, Trailing};
use crate::summary::{FileTally, ShardSummary, SplitSummary};

/// Read buffer for the source.
const SOURCE_BUF_BYTES: usize = 1 << 20;

/// Split one source into the shards of `pool`.
#[derive(Clone, Debug)]
pub struct StreamDriver {
    markers: Markers,
    trailing: TrailingPolicy,
}

impl StreamDriver {
    /// Driver over `markers` with the given trailing-record policy.
    #[must_use]
    pub const fn new(markers: Markers, trailing: TrailingPolicy) -> Self {
        Self { markers, trailing }
    }

    /// Drive `source` to completion, writing into `pool`.
    ///
    /// The pool is left open; the caller releases it. On error the shards
    /// hold a partial run and should be discarded.
    pub fn run<R, W>(
        &self,
        source: R,
        pool: &mut ShardPool<W>,
        policy: &mut PartitionPolicy,
        observer: &mut dyn ProgressObserver,
    ) -> Result<SplitSummary>
    where
        R: BufRead,
        W: Write,
    {
        if pool.is_empty() {
            return Err(SplitError::InvalidArgument(
                "cannot split into zero shards".into(),
            ));
        }

        let mut scanner = RecordScanner::new(&self.markers);
        let mut router = Router {
            pool,
            policy,
            observer,
            trailing_policy: self.trailing,
            events: 0,
            header_bytes: 0,
            footer_bytes: 0,
            interstitial_bytes: 0,
            discarded_bytes: 0,
            flushed_truncated: false,
            terminated: false,
        };

        for_each_line(source, |line| {
            Ok(scanner.feed(line, &mut router)? != ScanState::Terminated)
        })?;
        scanner.finish(&mut router)?;

        let summary = router.summary(scanner.lines());
        router.observer.on_finish(&summary);
        Ok(summary)
    }
}

/// Open `cfg.input`, acquire the shards of `cfg.layout`, split, release.
///
/// The source is opened first, so an unreadable source never creates shard
/// files. A source that is itself one of the shard paths is rejected before
/// anything is truncated.
pub fn split_file(cfg: &SplitConfig, observer: &mut dyn ProgressObserver) -> Result<SplitSummary> {
    cfg.validate()?;

    let source = File::open(&cfg.input).map_err(|source| SplitError::OpenSource {
        path: cfg.input.clone(),
        source,
    })?;
    ensure_source_is_not_a_shard(cfg)?;
    let reader = BufReader::with_capacity(SOURCE_BUF_BYTES, source);
    split_source(cfg, reader, observer)
}

/// Acquire the shards of `cfg.layout`, split `source` into them, release.
///
/// `cfg.input` is only used for logging. The pool is released on every path,
/// so shards of a failed run hold whatever was written before the failure; a
/// run error takes precedence over a release error.
pub fn split_source<R: BufRead>(
    cfg: &SplitConfig,
    source: R,
    observer: &mut dyn ProgressObserver,
) -> Result<SplitSummary> {
    cfg.validate()?;

    info!(shards = cfg.layout.count, dir = %cfg.layout.output_dir.display(), "opening output files");
    let mut pool = ShardPool::acquire(&cfg.layout)?;
    let mut policy = PartitionPolicy::new(cfg.policy, cfg.seed);
    info!(input = %cfg.input.display(), policy = ?cfg.policy, "reading source file and processing events");

    let driver = StreamDriver::new(cfg.markers.clone(), cfg.trailing);
    let outcome = driver.run(source, &mut pool, &mut policy, observer);
    let released = pool.release();

    let summary = outcome?;
    released?;
    Ok(summary)
}

/// `File::create` on a shard path would empty the source if they coincide.
fn ensure_source_is_not_a_shard(cfg: &SplitConfig) -> Result<()> {
    let source = fs::canonicalize(&cfg.input).map_err(|source| SplitError::OpenSource {
        path: cfg.input.clone(),
        source,
    })?;
    for shard in cfg.layout.paths() {
        if fs::canonicalize(&shard).is_ok_and(|p| p == source) {
            return Err(SplitError::InvalidArgument(format!(
                "source {} is also output shard {}",
                cfg.input.display(),
                shard.display()
            )));
        }
    }
    Ok(())
}

/// Record count of a source, as seen by the scanner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecordCount {
    /// Complete records.
    pub events: u64,
    /// Whether the terminating marker was found.
    pub terminated: bool,
    /// Bytes of an unclosed trailing record.
    pub truncated_bytes: u64,
}

/// Count complete records in `source` without writing anything.
pub fn count_records<R: BufRead>(source: R, markers: &Markers) -> Result<RecordCount> {
    let mut scanner = RecordScanner::new(markers);
    let mut count = RecordCount::default();
    for_each_line(source, |line| {
        Ok(scanner.feed(line, &mut count)? != ScanState::Terminated)
    })?;
    scanner.finish(&mut count)?;
    Ok(count)
}

/// [`count_records`] over a file.
pub fn count_file<P: AsRef<Path>>(path: P, markers: &Markers) -> Result<FileTally> {
    let path = path.as_ref();
    let f = File::open(path).map_err(|source| SplitError::OpenSource {
        path: path.to_owned(),
        source,
    })?;
    let count = count_records(BufReader::with_capacity(SOURCE_BUF_BYTES, f), markers)?;
    Ok(FileTally {
        path: path.to_owned(),
        events: count.events,
        terminated: count.terminated,
        truncated_bytes: count.truncated_bytes,
    })
}

/// Call `f` on every line of `source` (newline included) until `f` returns
/// `false` or the input ends. One reusable line buffer.
fn for_each_line<R, F>(mut source: R, mut f: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(&[u8]) -> Result<bool>,
{
    let mut line = Vec::with_capacity(4 << 10);
    let mut read: u64 = 0;
    loop {
        line.clear();
        let n = source
            .read_until(b'\n', &mut line)
            .map_err(|source| SplitError::ReadSource { line: read, source })?;
        if n == 0 {
            return Ok(());
        }
        read += 1;
        if !f(&line)? {
            return Ok(());
        }
    }
}

/// Scanner sink that writes boundaries into the pool.
struct Router<'a, W: Write> {
    pool: &'a mut ShardPool<W>,
    policy: &'a mut PartitionPolicy,
    observer: &'a mut dyn ProgressObserver,
    trailing_policy: TrailingPolicy,
    events: u64,
    header_bytes: u64,
    footer_bytes: u64,
    interstitial_bytes: u64,
    discarded_bytes: u64,
    flushed_truncated: bool,
    terminated: bool,
}

impl<W: Write> Router<'_, W> {
    fn route(&mut self, record: &[u8]) -> Result<()> {
        let slot = self.policy.select(self.events, self.pool.len());
        self.pool.deliver(slot, record)?;
        self.events += 1;
        self.observer.on_event(self.events, slot);
        Ok(())
    }

    fn summary(&self, lines: u64) -> SplitSummary {
        SplitSummary {
            policy: self.policy.kind(),
            events: self.events,
            lines,
            terminated: self.terminated,
            header_bytes: self.header_bytes,
            footer_bytes: self.footer_bytes,
            interstitial_bytes: self.interstitial_bytes,
            discarded_bytes: self.discarded_bytes,
            flushed_truncated: self.flushed_truncated,
            shards: self
                .pool
                .shards()
                .iter()
                .map(|s| ShardSummary {
                    number: s.number(),
                    path: s.path().cloned(),
                    events: s.events(),
                })
                .collect(),
        }
    }
}

impl<W: Write> BoundarySink for Router<'_, W> {
    fn header(&mut self, header: &[u8]) -> Result<()> {
        self.pool.broadcast(header)?;
        self.header_bytes = header.len() as u64;
        self.observer.on_header(header.len());
        Ok(())
    }

    fn record(&mut self, record: &[u8]) -> Result<()> {
        self.route(record)
    }

    fn finish(&mut self, trailing: Trailing<'_>, footer: Option<&[u8]>) -> Result<()> {
        match trailing {
            Trailing::None => {}
            Trailing::Interstitial(bytes) => {
                debug!(bytes = bytes.len(), "copying trailing non-record lines to every shard");
                self.pool.broadcast(bytes)?;
                self.interstitial_bytes = bytes.len() as u64;
            }
            Trailing::Truncated(bytes) => match self.trailing_policy {
                TrailingPolicy::Discard => {
                    warn!(
                        bytes = bytes.len(),
                        after_events = self.events,
                        "input ended inside a record; discarding the partial record"
                    );
                    self.discarded_bytes = bytes.len() as u64;
                }
                TrailingPolicy::Flush => {
                    warn!(
                        bytes = bytes.len(),
                        after_events = self.events,
                        "input ended inside a record; routing the partial record as-is"
                    );
                    self.route(bytes)?;
                    self.flushed_truncated = true;
                }
            },
        }

        match footer {
            Some(line) => {
                info!(events = self.events, "writing footers and closing files");
                self.pool.broadcast(line)?;
                self.footer_bytes = line.len() as u64;
                self.terminated = true;
            }
            None => warn!(
                events = self.events,
                "terminating marker not found; shards have no footer"
            ),
        }
        Ok(())
    }
}

impl BoundarySink for RecordCount {
    fn header(&mut self, _header: &[u8]) -> Result<()> {
        Ok(())
    }

    fn record(&mut self, _record: &[u8]) -> Result<()> {
        self.events += 1;
        Ok(())
    }

    fn finish(&mut self, trailing: Trailing<'_>, footer: Option<&[u8]>) -> Result<()> {
        if let Trailing::Truncated(bytes) = trailing {
            self.truncated_bytes = bytes.len() as u64;
        }
        self.terminated = footer.is_some();
        Ok(())
    }
}
