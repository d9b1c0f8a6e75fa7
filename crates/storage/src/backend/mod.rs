//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, which provides a unified
//! interface for the handful of filesystem operations the virtual rename
//! batch needs: enumerate one directory, rename files in place, soft-delete
//! into a trash subdirectory, and write back modification timestamps.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::error::Result;
use crate::models::FileMeta;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;
use time::OffsetDateTime;

type FileMetaStream<'a> = Pin<Box<dyn Stream<Item = Result<FileMeta>> + Send + 'a>>;

/// Unified interface for storage backends.
///
/// All paths are relative to the backend root (the managed media directory)
/// and must survive [`validate_path`](crate::validate_path) — implementations
/// enforce this validation themselves. Single-file `rename` is assumed to be
/// atomic on the underlying filesystem; nothing here offers multi-file
/// transactions, which is exactly why the rename engine runs two passes.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use remo_storage::{StorageBackend, error::Result};
///
/// async fn size_of(backend: &dyn StorageBackend, name: &str) -> Result<u64> {
///     let path = Path::new(name);
///     if backend.exists(path).await? {
///         Ok(backend.stat(path).await?.size)
///     } else {
///         Ok(0)
///     }
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend. Used for logging only.
    fn name(&self) -> &str;

    /// List the regular, non-hidden files of one directory, non-recursively.
    ///
    /// `dir` is the subdirectory to enumerate, or `None` for the backend
    /// root. Subdirectories (including the trash directory) and dotfiles are
    /// never yielded.
    ///
    /// Default implementation collects [`list_stream()`](Self::list_stream)
    /// into a [`Vec`] before returning.
    async fn list(&self, dir: Option<&Path>) -> Result<Vec<FileMeta>> {
        self.list_stream(dir).try_collect().await
    }

    /// Stream file metadata for one directory, non-recursively.
    ///
    /// Yields results incrementally and immediately; see
    /// [`list()`](Self::list) for the filtering rules.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::TryStreamExt;
    /// # use remo_storage::{StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// let mut stream = backend.list_stream(None);
    /// while let Some(meta) = stream.try_next().await? {
    ///     println!("{}: {} bytes", meta.path.display(), meta.size);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    fn list_stream<'a>(&'a self, dir: Option<&'a Path>) -> FileMetaStream<'a>;

    /// Check if a file exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write file contents, creating parent directories as needed.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Delete a file permanently.
    ///
    /// The rename engine only calls this for files that have already been
    /// moved into the trash; the normal "delete" a user sees is a
    /// [`rename`](Self::rename) into the trash subdirectory.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn delete(&self, path: &Path) -> Result<()>;

    /// Rename/move a file within the backend.
    ///
    /// # Notes
    /// - Implementations should create parent directories as needed (the
    ///   trash subdirectory is created lazily via this path).
    /// - If the destination already exists, it will be overwritten; callers
    ///   check [`exists`](Self::exists) first and pick a unique name.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the source
    /// file does not exist.
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Write a file's modification timestamp.
    ///
    /// This is the commit channel for edited timestamp fields; failures here
    /// are reported separately from rename failures.
    async fn set_modified(&self, path: &Path, modified: OffsetDateTime) -> Result<()>;

    /// Create a directory (and any missing parents).
    ///
    /// Succeeds if the directory already exists.
    async fn create_dir(&self, path: &Path) -> Result<()>;

    /// Get file metadata without reading contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::path::Path;
    /// # use remo_storage::{StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// let meta = backend.stat(Path::new("IMG_0001.jpg")).await?;
    /// println!("Size: {} bytes, Modified: {}", meta.size, meta.modified);
    /// # Ok(())
    /// # }
    /// ```
    async fn stat(&self, path: &Path) -> Result<FileMeta>;
}
