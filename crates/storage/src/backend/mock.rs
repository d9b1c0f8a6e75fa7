//! In-memory storage backend for testing.

use super::FileMetaStream;
use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::models::{FileMeta, is_hidden};
use crate::path::validate as validate_path;
use async_stream::stream;
use async_trait::async_trait;
use exn::OptionExt;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::sync::RwLock;

/// In-memory storage backend for testing.
///
/// Files are stored in a `HashMap` behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation. Ideal for unit
/// tests that need a [`StorageBackend`] without filesystem dependencies —
/// the rename engine's two-phase tests run entirely against this.
///
/// # Examples
///
/// ```
/// use remo_storage::backend::MockBackend;
/// use remo_storage::StorageBackend;
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([
///     ("IMG_0001.jpg", b"jpeg bytes"),
/// ]);
/// assert!(backend.exists(Path::new("IMG_0001.jpg")).await?);
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    storage: RwLock<HashMap<PathBuf, (OffsetDateTime, Vec<u8>)>>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics if any path fails validation (e.g. path traversal). If test
    /// setup is wrong, then the test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = HashMap::new();
        let now = OffsetDateTime::now_utc();
        for (path, data) in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                // The panic here is DELIBERATE. MockBackend is intended to be
                // used in tests; panics are expected. There is no error result.
                panic!("MockBackend::with_files: invalid path {}", path.display());
            };
            map.insert(validated, (now, data.into()));
        }
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(map),
        }
    }

    /// Change the name of the mock backend.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// All stored paths, sorted. Handy for asserting the final on-disk state
    /// after a save.
    pub async fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.storage.read().await.keys().cloned().collect();
        paths.sort_unstable();
        paths
    }

    fn file_meta(&self, path: &Path, size: u64, modified: OffsetDateTime) -> FileMeta {
        FileMeta::new(path, size, modified)
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, dir: Option<&'a Path>) -> FileMetaStream<'a> {
        let listed = match dir.map(validate_path).transpose() {
            Ok(validated) => validated,
            Err(e) => return Box::pin(futures::stream::once(async { Err(e) })),
        };

        Box::pin(stream! {
            // Snapshot matching entries under the read lock, then drop it
            // before yielding to avoid holding the lock across yield points.
            let entries: Vec<(PathBuf, (OffsetDateTime, u64))> = {
                let guard = self.storage.read().await;
                guard
                    .iter()
                    // Non-recursive: the entry's parent must be exactly the
                    // listed directory (the root when no directory given).
                    .filter(|(path, _)| {
                        let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
                        parent == listed.as_deref() && !is_hidden(path)
                    })
                    .map(|(path, (modified, data))| (path.clone(), (*modified, data.len() as u64)))
                    .collect()
            };
            for (path, (modified, size)) in entries {
                yield Ok(self.file_meta(&path, size, modified));
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = validate_path(path)?;
        Ok(self.storage.read().await.contains_key(&path))
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        let (_modified, data) =
            self.storage.read().await.get(&path).cloned().ok_or_raise(|| ErrorKind::NotFound(path))?;
        Ok(data)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        self.storage.write().await.insert(path, (OffsetDateTime::now_utc(), data.to_vec()));
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        self.storage.write().await.remove(&path).map(|_| ()).ok_or_raise(|| ErrorKind::NotFound(path))
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let from = validate_path(from)?;
        let to = validate_path(to)?;
        let mut guard = self.storage.write().await;
        let data = guard.remove(&from).ok_or_raise(|| ErrorKind::NotFound(from))?;
        guard.insert(to, data);
        Ok(())
    }

    async fn set_modified(&self, path: &Path, modified: OffsetDateTime) -> Result<()> {
        let path = validate_path(path)?;
        let mut guard = self.storage.write().await;
        let entry = guard.get_mut(&path).ok_or_raise(|| ErrorKind::NotFound(path))?;
        entry.0 = modified;
        Ok(())
    }

    async fn create_dir(&self, path: &Path) -> Result<()> {
        // Directories are implicit in a HashMap-backed store.
        validate_path(path).map(|_| ())
    }

    async fn stat(&self, path: &Path) -> Result<FileMeta> {
        let path = validate_path(path)?;
        let guard = self.storage.read().await;
        let (modified, data) = guard.get(&path).ok_or_raise(|| ErrorKind::NotFound(path.clone()))?;
        Ok(self.file_meta(&path, data.len() as u64, *modified))
    }
}
