//! Events handed in from an external file-system watcher.

use remo_storage::FileMeta;
use std::path::PathBuf;

/// One observed change in the watched directory, already resolved to the
/// metadata level by whoever runs the watcher.
///
/// Fed into [`MediaCollection::apply_fs_event`](crate::MediaCollection::apply_fs_event),
/// which does bookkeeping only; a watcher event never triggers a rename or
/// a decode. `Deleted` carries just the path because the file is gone; there
/// is nothing left to stat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsEvent {
    Created(FileMeta),
    Modified(FileMeta),
    Deleted(PathBuf),
}
