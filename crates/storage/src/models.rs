//! File metadata returned by storage backends: the raw material every
//! [`MediaRecord`](../../batch) is built from, and the comparison basis for
//! watcher bookkeeping.

use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// Metadata for one regular file in the managed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    /// Relative path from the backend root
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub modified: OffsetDateTime,
}

impl FileMeta {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: OffsetDateTime) -> Self {
        Self { path: path.into(), size, modified }
    }

    /// The final path component as UTF-8, or the empty string for paths that
    /// end in `..` (which [`validate`](crate::validate_path) rejects anyway).
    pub fn file_name(&self) -> &str {
        self.path.file_name().and_then(|name| name.to_str()).unwrap_or_default()
    }

    /// Hidden files (dotfiles) are excluded from directory scans.
    pub fn is_hidden(&self) -> bool {
        is_hidden(&self.path)
    }
}

/// Whether a path's final component starts with a dot.
pub(crate) fn is_hidden(path: &Path) -> bool {
    path.file_name().and_then(|name| name.to_str()).is_some_and(|name| name.starts_with('.'))
}
