//! In-memory storage backend for testing.

use super::FileInfoStream;
use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::file::FileInfo;
use crate::path::validate as validate_path;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct Entry {
    modified: OffsetDateTime,
    data: Vec<u8>,
}

/// In-memory storage backend for testing.
///
/// Files live in a `HashMap` behind a [`RwLock`]; tests change them with
/// [`insert`](Self::insert) and [`remove`](Self::remove) while the code
/// under test only sees the read-only [`StorageBackend`] side.
///
/// # Examples
///
/// ```
/// use deken_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([("tof-v0.2.0-objects.txt", "crossfade~ fade\n")]);
/// assert!(backend.exists(Path::new("tof-v0.2.0-objects.txt")).await?);
///
/// backend.remove("tof-v0.2.0-objects.txt").await;
/// assert!(!backend.exists(Path::new("tof-v0.2.0-objects.txt")).await?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MockBackend {
    name: String,
    storage: RwLock<HashMap<PathBuf, Entry>>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics on paths that fail validation: broken test setup should not
    /// quietly pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let modified = OffsetDateTime::now_utc();
        let storage = files
            .into_iter()
            .map(|(path, data)| {
                let path = path.into();
                let Ok(validated) = validate_path(&path) else {
                    panic!("MockBackend::with_files: invalid path {}", path.display());
                };
                (validated, Entry { modified, data: data.into() })
            })
            .collect();
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(storage),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Creates or replaces a file.
    ///
    /// A replaced file always gets a later modification time than before,
    /// however quickly it is replaced.
    pub async fn insert(&self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>) {
        let Ok(path) = validate_path(path.as_ref()) else {
            panic!("MockBackend::insert: invalid path {}", path.as_ref().display());
        };
        let mut guard = self.storage.write().await;
        let mut modified = OffsetDateTime::now_utc();
        if let Some(previous) = guard.get(&path)
            && modified <= previous.modified
        {
            modified = previous.modified + Duration::nanoseconds(1);
        }
        guard.insert(path, Entry { modified, data: data.into() });
    }

    /// Removes a file, returning whether it existed.
    pub async fn remove(&self, path: impl AsRef<Path>) -> bool {
        match validate_path(path.as_ref()) {
            Ok(path) => self.storage.write().await.remove(&path).is_some(),
            Err(_) => false,
        }
    }

    async fn entry(&self, path: &Path) -> Result<(PathBuf, Entry)> {
        let path = validate_path(path)?;
        let entry = self.storage.read().await.get(&path).cloned();
        match entry {
            Some(entry) => Ok((path, entry)),
            None => exn::bail!(ErrorKind::NotFound(path)),
        }
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

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        let validated_prefix = match prefix.map(validate_path).transpose() {
            Ok(pfx) => pfx,
            Err(e) => return Box::pin(futures::stream::once(async { Err(e) })),
        };

        Box::pin(stream! {
            // Snapshot under the read lock; never hold it across a yield.
            let files: Vec<FileInfo> = {
                let guard = self.storage.read().await;
                guard
                    .iter()
                    .filter(|(path, _)| validated_prefix.as_ref().is_none_or(|pfx| path.starts_with(pfx)))
                    .map(|(path, entry)| FileInfo::new(path.clone(), entry.data.len() as u64, entry.modified))
                    .collect()
            };
            for file in files {
                yield Ok(file);
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = validate_path(path)?;
        Ok(self.storage.read().await.contains_key(&path))
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let (_, entry) = self.entry(path).await?;
        Ok(entry.data)
    }

    async fn stat(&self, path: &Path) -> Result<FileInfo> {
        let (path, entry) = self.entry(path).await?;
        Ok(FileInfo::new(path, entry.data.len() as u64, entry.modified))
    }
}
