//! Progress observers.
//!
//! The driver reports milestones through [`ProgressObserver`]; reporting has
//! no effect on what gets written.

use tracing::info;

use crate::summary::SplitSummary;

/// Hooks called by the driver. All methods default to no-ops.
pub trait ProgressObserver {
    /// The header was broadcast to every shard.
    fn on_header(&mut self, _header_bytes: usize) {}

    /// A record was written; `events` is the running total including it.
    fn on_event(&mut self, _events: u64, _slot: usize) {}

    /// The run finished and every shard received its footer.
    fn on_finish(&mut self, _summary: &SplitSummary) {}
}

/// Observer that reports nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}

/// Observer that logs a notice every `every` records (0 disables notices).
#[derive(Clone, Copy, Debug)]
pub struct LogProgress {
    every: u64,
}

impl LogProgress {
    /// Log every `every` records.
    #[must_use]
    pub const fn new(every: u64) -> Self {
        Self { every }
    }
}

impl ProgressObserver for LogProgress {
    fn on_header(&mut self, header_bytes: usize) {
        info!(header_bytes, "header found, written to all shards");
    }

    fn on_event(&mut self, events: u64, _slot: usize) {
        if self.every != 0 && events % self.every == 0 {
            info!(events, "processed events");
        }
    }

    fn on_finish(&mut self, summary: &SplitSummary) {
        let (min, max) = summary.spread().unwrap_or((0, 0));
        info!(
            events = summary.events,
            shards = summary.shards.len(),
            min,
            max,
            "footers written, shards closed"
        );
    }
}
