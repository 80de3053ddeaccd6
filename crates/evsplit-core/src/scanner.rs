//! Record boundary scanner.
//!
//! A push-based state machine fed one line at a time. It owns two growable
//! byte buffers (the header, and the record under construction) and reports
//! boundaries to a [`BoundarySink`]; it never writes to a shard itself.
//!
//! States: `Header` → `InEvent` on the first line containing the opening
//! marker (that line belongs to the record, not the header). Each line that
//! contains the closing marker completes the buffered record. A line containing
//! the terminating marker moves to `Terminated` from any state and is reported
//! as the footer.
//!
//! Lines seen after a record closes and before the next opening marker are
//! kept in the record buffer and travel with the next record. If such lines
//! are still pending when the input terminates they are reported as
//! [`Trailing::Interstitial`]; a record that was opened but never closed is
//! reported as [`Trailing::Truncated`].

use tracing::warn;

use crate::error::Result;
use crate::format::Markers;

/// Initial capacity of the record buffer.
const RECORD_BUF_BYTES: usize = 16 << 10;

/// Header size past which the scanner warns that the opening marker may
/// never match.
pub const HEADER_WARN_BYTES: usize = 64 << 20;

/// Scanner state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanState {
    /// Accumulating header lines.
    Header,
    /// Header closed; accumulating records.
    InEvent,
    /// Terminating marker seen (or input finished); further lines are ignored.
    Terminated,
}

/// Buffered content still pending when the input terminates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trailing<'a> {
    /// Nothing pending.
    None,
    /// Lines after the last closed record with no opening marker among them.
    Interstitial(&'a [u8]),
    /// A record whose closing marker never arrived.
    Truncated(&'a [u8]),
}

impl Trailing<'_> {
    /// Pending byte count.
    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Interstitial(b) | Self::Truncated(b) => b.len(),
        }
    }

    /// Whether nothing is pending.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Receiver of scanner boundaries.
///
/// Call order for one input: `header` exactly once, then `record` zero or
/// more times, then `finish` exactly once.
pub trait BoundarySink {
    /// The header is closed.
    fn header(&mut self, header: &[u8]) -> Result<()>;

    /// A complete record, closing line included.
    fn record(&mut self, record: &[u8]) -> Result<()>;

    /// The input is over. `footer` is the terminating line, or `None` when the
    /// input ended without one.
    fn finish(&mut self, trailing: Trailing<'_>, footer: Option<&[u8]>) -> Result<()>;
}

/// Line-fed boundary scanner over a fixed marker set.
#[derive(Debug)]
pub struct RecordScanner<'m> {
    markers: &'m Markers,
    state: ScanState,
    header: Vec<u8>,
    record: Vec<u8>,
    record_open: bool,
    lines: u64,
    header_warn_bytes: usize,
    header_warned: bool,
}

impl<'m> RecordScanner<'m> {
    /// Fresh scanner in the `Header` state.
    #[must_use]
    pub fn new(markers: &'m Markers) -> Self {
        Self {
            markers,
            state: ScanState::Header,
            header: Vec::new(),
            record: Vec::with_capacity(RECORD_BUF_BYTES),
            record_open: false,
            lines: 0,
            header_warn_bytes: HEADER_WARN_BYTES,
            header_warned: false,
        }
    }

    /// Warn once the header exceeds `bytes` instead of [`HEADER_WARN_BYTES`].
    #[must_use]
    pub const fn with_header_warn_bytes(mut self, bytes: usize) -> Self {
        self.header_warn_bytes = bytes;
        self
    }

    /// Whether the oversized-header warning has fired.
    #[inline]
    #[must_use]
    pub const fn header_warned(&self) -> bool {
        self.header_warned
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> ScanState {
        self.state
    }

    /// Lines consumed so far (lines after termination are not counted).
    #[inline]
    #[must_use]
    pub const fn lines(&self) -> u64 {
        self.lines
    }

    /// Feed one line, trailing `\n` included if present.
    pub fn feed<S: BoundarySink + ?Sized>(&mut self, line: &[u8], sink: &mut S) -> Result<ScanState> {
        if self.state == ScanState::Terminated {
            return Ok(self.state);
        }
        self.lines += 1;

        if self.markers.ends(line) {
            self.close_header(sink)?;
            self.state = ScanState::Terminated;
            sink.finish(self.trailing(), Some(line))?;
            self.reset_record();
            return Ok(self.state);
        }

        match self.state {
            ScanState::Header => {
                if self.markers.opens(line) {
                    self.close_header(sink)?;
                    self.state = ScanState::InEvent;
                    self.push_record_line(line, sink)?;
                } else {
                    self.header.extend_from_slice(line);
                    self.check_header_size();
                }
            }
            ScanState::InEvent => self.push_record_line(line, sink)?,
            ScanState::Terminated => {}
        }
        Ok(self.state)
    }

    /// Signal end of input. Closes the header if it is still open and reports
    /// the pending content with no footer. No-op once terminated.
    pub fn finish<S: BoundarySink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        if self.state == ScanState::Terminated {
            return Ok(());
        }
        self.close_header(sink)?;
        self.state = ScanState::Terminated;
        sink.finish(self.trailing(), None)?;
        self.reset_record();
        Ok(())
    }

    fn close_header<S: BoundarySink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        if self.state == ScanState::Header {
            sink.header(&self.header)?;
            // Frozen and broadcast; the scanner has no further use for it.
            self.header = Vec::new();
        }
        Ok(())
    }

    fn check_header_size(&mut self) {
        if !self.header_warned && self.header.len() > self.header_warn_bytes {
            self.header_warned = true;
            warn!(
                bytes = self.header.len(),
                lines = self.lines,
                open_marker = %self.markers.open,
                "header is still open; check that the opening marker matches the records"
            );
        }
    }

    fn push_record_line<S: BoundarySink + ?Sized>(&mut self, line: &[u8], sink: &mut S) -> Result<()> {
        self.record.extend_from_slice(line);
        if self.markers.opens(line) {
            self.record_open = true;
        }
        if self.markers.closes(line) {
            sink.record(&self.record)?;
            self.reset_record();
        }
        Ok(())
    }

    fn trailing(&self) -> Trailing<'_> {
        if self.record.is_empty() {
            Trailing::None
        } else if self.record_open {
            Trailing::Truncated(&self.record)
        } else {
            Trailing::Interstitial(&self.record)
        }
    }

    fn reset_record(&mut self) {
        self.record.clear();
        self.record_open = false;
    }
}
