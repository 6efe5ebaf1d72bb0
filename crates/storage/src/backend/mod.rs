//! Storage backend trait and implementations.
//!
//! Index sources are only ever read: a backend lists, stats and reads files
//! below its root, nothing more.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::error::Result;
use crate::file::FileInfo;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;

pub(crate) type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;

/// Read-only interface to wherever source files live.
///
/// # Path Handling
/// All paths are relative to the backend root and validated with
/// [`validate_path`](crate::validate_path) before use.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use deken_storage::{backend::StorageBackend, error::Result};
///
/// async fn library_list(backend: &dyn StorageBackend) -> Result<Option<String>> {
///     let path = Path::new("libraries.tsv");
///     if !backend.exists(path).await? {
///         return Ok(None);
///     }
///     let bytes = backend.read(path).await?;
///     Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the backend. Prefixes the identity of every file it
    /// contributes to an index, so it should be unique per process.
    fn name(&self) -> &str;

    /// List all files below an optional prefix.
    ///
    /// Collects [`list_stream()`](Self::list_stream) into a [`Vec`].
    async fn list(&self, prefix: Option<&Path>) -> Result<Vec<FileInfo>> {
        self.list_stream(prefix).try_collect().await
    }

    /// Stream file metadata below an optional prefix.
    ///
    /// Prefix matching is per path component: `objects` matches
    /// `objects/a.txt` but not `objects-old/a.txt`. A prefix that doesn't
    /// exist yields nothing rather than an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::TryStreamExt;
    /// # use deken_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// let mut stream = backend.list_stream(None);
    /// while let Some(info) = stream.try_next().await? {
    ///     println!("{}: {} bytes", info.path.display(), info.size);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a>;

    /// Check if a file exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Get file metadata without reading contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn stat(&self, path: &Path) -> Result<FileInfo>;
}
