//! Run configuration.
//!
//! `SplitConfig` carries everything a single split needs. The CLI fills it from
//! flags; library callers may build it directly or deserialize it.
//! [`SplitConfig::validate`] runs before any filesystem access.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SplitError};
use crate::format::Markers;
use crate::naming::ShardLayout;
use crate::policy::PolicyKind;

/// Default number of records between two progress notices.
pub const DEFAULT_PROGRESS_EVERY: u64 = 50_000;

/// What to do with a record that was opened but never closed when the input
/// ends (terminating marker reached mid-record, or end of input).
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrailingPolicy {
    /// Drop the partial record (logged).
    #[default]
    Discard,
    /// Route the partial record like a complete one (logged).
    Flush,
}

/// Full description of one split run.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SplitConfig {
    /// Source event file.
    pub input: PathBuf,
    /// Shard naming and count.
    pub layout: ShardLayout,
    /// Record / file markers.
    #[serde(default)]
    pub markers: Markers,
    /// Assignment policy.
    #[serde(default)]
    pub policy: PolicyKind,
    /// Seed for the random policy; `None` draws one from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Handling of a truncated trailing record.
    #[serde(default)]
    pub trailing: TrailingPolicy,
    /// Records between progress notices (0 disables them).
    #[serde(default = "default_progress_every")]
    pub progress_every: u64,
}

const fn default_progress_every() -> u64 {
    DEFAULT_PROGRESS_EVERY
}

impl SplitConfig {
    /// Config with defaults for everything but the three required inputs.
    #[must_use]
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>, count: u32) -> Self {
        Self {
            input: input.into(),
            layout: ShardLayout::new(output_dir, count),
            markers: Markers::default(),
            policy: PolicyKind::default(),
            seed: None,
            trailing: TrailingPolicy::default(),
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }

    /// Reject configurations that cannot produce a valid run.
    pub fn validate(&self) -> Result<()> {
        if self.layout.count == 0 {
            return Err(SplitError::InvalidArgument(
                "shard count must be a positive integer".into(),
            ));
        }
        if self.layout.offset.checked_add(self.layout.count - 1).is_none() {
            return Err(SplitError::InvalidArgument(format!(
                "file offset {} + shard count {} overflows shard numbering",
                self.layout.offset, self.layout.count
            )));
        }
        if self.layout.extension.is_empty() {
            return Err(SplitError::InvalidArgument(
                "file extension must not be empty".into(),
            ));
        }
        if self.layout.prefix.contains(std::path::is_separator) {
            return Err(SplitError::InvalidArgument(format!(
                "file prefix {:?} must not contain a path separator",
                self.layout.prefix
            )));
        }
        if let Some(which) = self.markers.first_empty() {
            return Err(SplitError::InvalidArgument(format!(
                "{which} marker must not be empty"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = SplitConfig::new("in.lhe", "out", 4);
        cfg.validate().unwrap();
        assert_eq!(cfg.policy, PolicyKind::Random);
        assert_eq!(cfg.trailing, TrailingPolicy::Discard);
        assert_eq!(cfg.progress_every, DEFAULT_PROGRESS_EVERY);
    }

    #[test]
    fn zero_shards_rejected() {
        let cfg = SplitConfig::new("in.lhe", "out", 0);
        assert!(matches!(cfg.validate(), Err(SplitError::InvalidArgument(_))));
    }

    #[test]
    fn empty_marker_rejected() {
        let mut cfg = SplitConfig::new("in.lhe", "out", 2);
        cfg.markers.end.clear();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("end marker"));
    }

    #[test]
    fn prefix_with_separator_rejected() {
        let mut cfg = SplitConfig::new("in.lhe", "out", 2);
        cfg.layout.prefix = "a/b_".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let cfg: SplitConfig = serde_json::from_str(
            r#"{
                "input": "big.lhe",
                "layout": {
                    "output_dir": "shards",
                    "prefix": "p_",
                    "extension": "lhe",
                    "offset": 0,
                    "subdirs": true,
                    "count": 8
                },
                "policy": "sequential"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.policy, PolicyKind::Sequential);
        assert_eq!(cfg.markers, Markers::default());
        assert_eq!(cfg.progress_every, DEFAULT_PROGRESS_EVERY);
        cfg.validate().unwrap();
    }
}
