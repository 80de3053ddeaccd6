//! Shard naming scheme.
//!
//! Slot `i` of a run with offset `o` is shard number `o + i` and lives at
//!
//! ```text
//! <output_dir>[/<number / 100 :03>]/<prefix><number :05>.<ext>
//! ```
//!
//! The sub-collection directory is only present when nesting is enabled; it
//! bounds each directory to 100 shard files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::format::{DEFAULT_EXTENSION, DEFAULT_PREFIX};

/// Shards per sub-collection directory.
pub const SHARDS_PER_SUBDIR: u32 = 100;

/// Where and how the `count` shards of a run are named.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShardLayout {
    /// Root output directory.
    pub output_dir: PathBuf,
    /// File name prefix.
    pub prefix: String,
    /// File extension without the dot.
    pub extension: String,
    /// Number of the first shard.
    pub offset: u32,
    /// Nest shards under `<number / 100>` sub-directories.
    pub subdirs: bool,
    /// Number of shards `N`.
    pub count: u32,
}

impl ShardLayout {
    /// Layout with default prefix/extension, no offset and no nesting.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, count: u32) -> Self {
        Self {
            output_dir: output_dir.into(),
            prefix: DEFAULT_PREFIX.to_owned(),
            extension: DEFAULT_EXTENSION.to_owned(),
            offset: 0,
            subdirs: false,
            count,
        }
    }

    /// Shard number of slot `slot` (offset applied).
    #[inline]
    #[must_use]
    pub fn number(&self, slot: u32) -> u32 {
        self.offset.saturating_add(slot)
    }

    /// Sub-collection directory of slot `slot`, if nesting is enabled.
    #[must_use]
    pub fn subdir(&self, slot: u32) -> Option<PathBuf> {
        self.subdirs.then(|| {
            self.output_dir
                .join(format!("{:03}", self.number(slot) / SHARDS_PER_SUBDIR))
        })
    }

    /// File name (no directory) of slot `slot`.
    #[must_use]
    pub fn file_name(&self, slot: u32) -> String {
        format!("{}{:05}.{}", self.prefix, self.number(slot), self.extension)
    }

    /// Full path of slot `slot`.
    #[must_use]
    pub fn path(&self, slot: u32) -> PathBuf {
        let dir = self.subdir(slot);
        let dir: &Path = dir.as_deref().unwrap_or(&self.output_dir);
        dir.join(self.file_name(slot))
    }

    /// Paths of every slot, in slot order.
    pub fn paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        (0..self.count).map(move |slot| self.path(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_paths_are_zero_padded() {
        let layout = ShardLayout::new("/out", 3);
        let got: Vec<_> = layout.paths().collect();
        assert_eq!(
            got,
            vec![
                PathBuf::from("/out/event_file_00000.lhe"),
                PathBuf::from("/out/event_file_00001.lhe"),
                PathBuf::from("/out/event_file_00002.lhe"),
            ]
        );
    }

    #[test]
    fn nested_paths_use_offset_number() {
        let layout = ShardLayout {
            prefix: "run_".into(),
            extension: "txt".into(),
            offset: 199,
            subdirs: true,
            ..ShardLayout::new("out", 2)
        };
        assert_eq!(layout.path(0), PathBuf::from("out/001/run_00199.txt"));
        assert_eq!(layout.path(1), PathBuf::from("out/002/run_00200.txt"));
        assert_eq!(layout.subdir(1), Some(PathBuf::from("out/002")));
    }

    #[test]
    fn no_subdir_when_flat() {
        let layout = ShardLayout::new("out", 1);
        assert_eq!(layout.subdir(0), None);
    }
}
