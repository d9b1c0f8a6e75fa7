//! Local filesystem storage backend.
//!
//! Files live in one configured media directory and are accessed with
//! standard filesystem operations via `tokio::fs` for async I/O. Timestamp
//! writes go through `spawn_blocking` because `File::set_modified` is a
//! sync-only API.

use crate::backend::FileMetaStream;
use crate::error::ErrorKind;
use crate::models::is_hidden;
use crate::{FileMeta, StorageBackend, error::Result, path::validate as validate_path};
use async_stream::stream;
use async_trait::async_trait;
use std::fs::{Metadata, create_dir_all as sync_create_dir};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::fs;

/// Local filesystem storage backend.
///
/// Stores files in one directory on the local filesystem. All paths are
/// relative to the configured root directory.
///
/// # Examples
///
/// ```no_run
/// use remo_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("local", "/path/to/photos")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    name: String,
    /// Root: the managed media directory
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend.
    ///
    /// # Arguments
    /// * `root` - Absolute path to the media directory
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }

        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            // Use non-async here; it'll only happen once on directory open
            // and it's not worth the hassle of making the constructor async.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root))?;
        }

        Ok(Self { name: name.into(), root })
    }

    /// Get the absolute path for a relative storage path.
    ///
    /// Validates the path and joins it with the root directory.
    fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    /// Re-use the same data collection from file metadata for both list and
    /// stat functions.
    fn metadata(path: &Path, metadata: Metadata) -> Result<FileMeta> {
        let modified = metadata.modified().map_err(ErrorKind::Io)?.into();
        Ok(FileMeta::new(PathBuf::from(path), metadata.len(), modified))
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, dir: Option<&'a Path>) -> FileMetaStream<'a> {
        let listed = match dir.map(validate_path).transpose() {
            Ok(validated) => validated,
            Err(e) => return Box::pin(futures::stream::once(async { Result::Err(e) })),
        };
        let directory = listed.as_ref().map(|sub| self.root.join(sub)).unwrap_or_else(|| self.root.clone());
        let relative_base = listed.unwrap_or_default();

        Box::pin(stream! {
            let mut entries = match fs::read_dir(&directory).await {
                Ok(entries) => entries,
                // Asking for the contents of a directory that doesn't exist
                // results in an empty list, not an error: a freshly-created
                // trash directory has nothing in it yet.
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => return,
                Err(err) => {
                    yield Err(exn::Exn::from(Self::map_io_error(err, &directory)));
                    return;
                },
            };

            'entries: loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break 'entries,
                    Err(e) => { yield Err(exn::Exn::from(Self::map_io_error(e, &directory))); continue 'entries; },
                };
                let path = entry.path();
                let metadata = match entry.metadata().await {
                    Ok(metadata) => metadata,
                    Err(e) => { yield Err(exn::Exn::from(Self::map_io_error(e, &path))); continue 'entries; },
                };
                // Non-recursive: subdirectories (the trash included) are
                // someone else's problem. Dotfiles and anything that isn't a
                // regular file (broken symlinks, sockets) are dropped too.
                if !metadata.is_file() || is_hidden(&path) {
                    continue 'entries;
                }
                let Some(file_name) = path.file_name() else { continue 'entries };
                let relative = relative_base.join(file_name);
                yield Self::metadata(&relative, metadata);
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::try_exists(&abs_path).await.map_err(ErrorKind::Io)?)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::read(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        if let Some(parent) = abs_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, path))?;
        }
        Ok(fs::write(&abs_path, data).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::remove_file(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let from_path = self.absolute_path(from)?;
        let to_path = self.absolute_path(to)?;
        // Create parent directories for destination if needed; this is how
        // the trash subdirectory comes into existence on first soft-delete.
        if let Some(parent) = to_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, to))?;
        }
        Ok(fs::rename(&from_path, &to_path).await.map_err(|e| Self::map_io_error(e, to))?)
    }

    async fn set_modified(&self, path: &Path, modified: OffsetDateTime) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        let relative = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let file = std::fs::File::options()
                .write(true)
                .open(&abs_path)
                .map_err(|e| Self::map_io_error(e, &relative))?;
            file.set_modified(modified.into()).map_err(|e| Self::map_io_error(e, &relative))?;
            Ok(())
        })
        .await
        .map_err(|e| ErrorKind::BackendError(format!("timestamp task panicked: {e}")))?
    }

    async fn create_dir(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::create_dir_all(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn stat(&self, path: &Path) -> Result<FileMeta> {
        let abs_path = self.absolute_path(path)?;
        let metadata = fs::metadata(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?;
        Self::metadata(path, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use time::macros::datetime;

    #[test]
    fn test_new_requires_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalBackend::new("name", temp_dir.path()).is_ok());
        assert!(LocalBackend::new("name", "relative/path").is_err());
        assert!(LocalBackend::new("name", "./relative").is_err());
    }

    #[test]
    fn test_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        let expected = temp_dir.path().join("IMG_0001.jpg");
        assert_eq!(backend.absolute_path(Path::new("IMG_0001.jpg")).unwrap(), expected);
        // Path traversal is prevented
        assert!(backend.absolute_path(Path::new("../etc/passwd")).is_err());
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        let data = b"not a real JPEG";
        backend.write(Path::new("photo.jpg"), data).await.unwrap();
        let read_data = backend.read(Path::new("photo.jpg")).await.unwrap();
        assert_eq!(read_data, data);
    }

    #[tokio::test]
    async fn test_exists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        assert!(!backend.exists(Path::new("nonexistent.jpg")).await.unwrap());
        backend.write(Path::new("exists.jpg"), b"data").await.unwrap();
        assert!(backend.exists(Path::new("exists.jpg")).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        backend.write(Path::new("photo.jpg"), b"data").await.unwrap();
        backend.delete(Path::new("photo.jpg")).await.unwrap();
        assert!(!backend.exists(Path::new("photo.jpg")).await.unwrap());
        // Deleting a nonexistent file returns an error
        let err = backend.delete(Path::new("nonexistent.jpg")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rename() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        backend.write(Path::new("old.jpg"), b"data").await.unwrap();
        backend.rename(Path::new("old.jpg"), Path::new("new.jpg")).await.unwrap();
        assert!(!backend.exists(Path::new("old.jpg")).await.unwrap());
        assert!(backend.exists(Path::new("new.jpg")).await.unwrap());
        let data = backend.read(Path::new("new.jpg")).await.unwrap();
        assert_eq!(data, b"data");
    }

    #[tokio::test]
    async fn test_rename_into_trash_creates_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        backend.write(Path::new("photo.jpg"), b"data").await.unwrap();
        backend.rename(Path::new("photo.jpg"), Path::new("deleted/photo.jpg")).await.unwrap();
        assert!(backend.exists(Path::new("deleted/photo.jpg")).await.unwrap());
    }

    #[tokio::test]
    async fn test_set_modified() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        backend.write(Path::new("photo.jpg"), b"data").await.unwrap();
        let stamp = datetime!(2017-06-01 12:30:00 UTC);
        backend.set_modified(Path::new("photo.jpg"), stamp).await.unwrap();
        let meta = backend.stat(Path::new("photo.jpg")).await.unwrap();
        assert_eq!(meta.modified, stamp);
    }

    #[tokio::test]
    async fn test_set_modified_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        let err = backend.set_modified(Path::new("gone.jpg"), OffsetDateTime::UNIX_EPOCH).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_stat() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        let data = b"four";
        backend.write(Path::new("photo.jpg"), data).await.unwrap();
        let meta = backend.stat(Path::new("photo.jpg")).await.unwrap();
        assert_eq!(meta.path, PathBuf::from("photo.jpg"));
        assert_eq!(meta.size, data.len() as u64);
    }

    #[tokio::test]
    async fn test_list_empty_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        let files = backend.list(None).await.unwrap();
        assert_eq!(files.len(), 0);
    }

    #[tokio::test]
    async fn test_list_is_not_recursive() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        backend.write(Path::new("a.jpg"), b"data").await.unwrap();
        backend.write(Path::new("b.mp4"), b"data").await.unwrap();
        backend.write(Path::new("deleted/trashed.jpg"), b"data").await.unwrap();
        let files = backend.list(None).await.unwrap();
        let mut names: Vec<_> = files.iter().map(FileMeta::file_name).collect();
        names.sort_unstable();
        assert_eq!(names, ["a.jpg", "b.mp4"]);
    }

    #[tokio::test]
    async fn test_list_skips_hidden_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        backend.write(Path::new("visible.jpg"), b"data").await.unwrap();
        std::fs::write(temp_dir.path().join(".DS_Store"), b"junk").unwrap();
        let files = backend.list(None).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name(), "visible.jpg");
    }

    #[tokio::test]
    async fn test_list_subdirectory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        backend.write(Path::new("deleted/one.jpg"), b"data").await.unwrap();
        backend.write(Path::new("deleted/two.jpg"), b"data").await.unwrap();
        backend.write(Path::new("top.jpg"), b"data").await.unwrap();
        let mut files = backend.list(Some(Path::new("deleted"))).await.unwrap();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        let paths: Vec<_> = files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(paths, [PathBuf::from("deleted/one.jpg"), PathBuf::from("deleted/two.jpg")]);
    }

    #[tokio::test]
    async fn test_list_nonexistent_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        let files = backend.list(Some(Path::new("nonexistent"))).await.unwrap();
        assert_eq!(files.len(), 0);
    }

    #[tokio::test]
    async fn test_path_security() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        // Attempts to escape the root should fail
        assert!(backend.read(Path::new("../etc/passwd")).await.is_err());
        assert!(backend.read(Path::new("etc/../../passwd")).await.is_err());
        assert!(backend.write(Path::new("../etc/passwd"), b"data").await.is_err());
        assert!(backend.delete(Path::new("../../file")).await.is_err());
    }
}
