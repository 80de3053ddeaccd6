//! Textual markers that delimit an event file.
//!
//! Layout:
//!
//! ```text
//! <header lines ...>
//! <event>            <- opening marker, first line of a record
//!   ...
//! </event>           <- closing marker, last line of a record
//! ...
//! </LesHouchesEvents> <- terminating marker, the footer line
//! ```
//!
//! Matching is a plain byte-substring test on each line: indentation or
//! trailing content around a marker is tolerated, and lines need not be valid
//! UTF-8. A tag carrying attributes (`<event npLO=" -1 ">`) does not contain
//! `<event>`; pass a shorter opening marker for such files.

use serde::{Deserialize, Serialize};

/// Default opening marker of an event record.
pub const DEFAULT_OPEN_MARKER: &str = "<event>";
/// Default closing marker of an event record.
pub const DEFAULT_CLOSE_MARKER: &str = "</event>";
/// Default terminating marker (the footer line).
pub const DEFAULT_END_MARKER: &str = "</LesHouchesEvents>";
/// Default shard file prefix.
pub const DEFAULT_PREFIX: &str = "event_file_";
/// Default shard file extension (without the dot).
pub const DEFAULT_EXTENSION: &str = "lhe";

/// The three markers that structure an event file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Markers {
    /// Substring that starts a record.
    pub open: String,
    /// Substring that ends a record.
    pub close: String,
    /// Substring that ends the whole file.
    pub end: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            open: DEFAULT_OPEN_MARKER.to_owned(),
            close: DEFAULT_CLOSE_MARKER.to_owned(),
            end: DEFAULT_END_MARKER.to_owned(),
        }
    }
}

impl Markers {
    /// Build a marker set from explicit strings.
    #[must_use]
    pub fn new(open: impl Into<String>, close: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
            end: end.into(),
        }
    }

    /// Whether `line` contains the opening marker.
    #[inline]
    #[must_use]
    pub fn opens(&self, line: &[u8]) -> bool {
        contains(line, self.open.as_bytes())
    }

    /// Whether `line` contains the closing marker.
    #[inline]
    #[must_use]
    pub fn closes(&self, line: &[u8]) -> bool {
        contains(line, self.close.as_bytes())
    }

    /// Whether `line` contains the terminating marker.
    #[inline]
    #[must_use]
    pub fn ends(&self, line: &[u8]) -> bool {
        contains(line, self.end.as_bytes())
    }

    /// Name of the first empty marker, if any.
    #[must_use]
    pub fn first_empty(&self) -> Option<&'static str> {
        if self.open.is_empty() {
            Some("open")
        } else if self.close.is_empty() {
            Some("close")
        } else if self.end.is_empty() {
            Some("end")
        } else {
            None
        }
    }
}

/// Byte-substring search. An empty needle never matches.
#[inline]
fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_markers_classify_lhe_lines() {
        let m = Markers::default();
        assert!(m.opens(b"<event>\n"));
        assert!(m.opens(b"  <event>  \n"));
        assert!(!m.opens(b"<event npLO=\" -1 \">\n"));
        assert!(m.closes(b"</event>\n"));
        assert!(!m.opens(b"</event>\n"));
        assert!(m.ends(b"</LesHouchesEvents>\n"));
        assert!(!m.ends(b"<LesHouchesEvents version=\"3.0\">\n"));
    }

    #[test]
    fn empty_needle_never_matches() {
        assert!(!contains(b"anything", b""));
        assert!(!contains(b"", b"x"));
        assert!(contains(b"x", b"x"));
    }

    #[test]
    fn reports_empty_marker() {
        let m = Markers::new("<e>", "", "</f>");
        assert_eq!(m.first_empty(), Some("close"));
        assert_eq!(Markers::default().first_empty(), None);
    }
}
