use crate::error::{ErrorKind, Result};
use crate::{Fingerprint, Stamp};
use deken_index::{LibraryIndex, LibraryRefresh};
use deken_storage::BackendHandle;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Outcome of [`LibrarySource::refresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibrarySync {
    /// The list is the one already applied; the index was left alone.
    Unchanged,
    /// The index was rebuilt from a new version of the list.
    Refreshed(LibraryRefresh),
}

/// The library list: a single tab-separated file in a backend.
pub struct LibrarySource {
    backend: BackendHandle,
    path: PathBuf,
    applied: Option<Fingerprint>,
}
impl LibrarySource {
    pub fn new(backend: BackendHandle, path: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            path: path.into(),
            applied: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rebuilds `index` if the list changed since the last applied refresh.
    ///
    /// A list whose size and modification time are unchanged is not read
    /// at all; one that was touched but has identical content is read but
    /// not re-indexed. Any failure leaves `index` as it was.
    #[instrument(skip_all, fields(backend = self.backend.name(), path = %self.path.display()))]
    pub async fn refresh(&mut self, index: &LibraryIndex) -> Result<LibrarySync> {
        let unavailable = || ErrorKind::SourceUnavailable(self.path.clone());
        let info = self.backend.stat(&self.path).await.or_raise(unavailable)?;
        let stamp = Stamp::from(&info);
        if self.applied.is_some_and(|applied| applied.stamp == stamp) {
            tracing::debug!("Library list unchanged; not read");
            return Ok(LibrarySync::Unchanged);
        }
        let bytes = self.backend.read(&self.path).await.or_raise(unavailable)?;
        let hash = blake3::hash(&bytes);
        if let Some(applied) = self.applied.as_mut()
            && applied.hash == hash
        {
            applied.stamp = stamp;
            tracing::debug!("Library list touched but content unchanged");
            return Ok(LibrarySync::Unchanged);
        }
        let summary = index.refresh(&String::from_utf8_lossy(&bytes));
        self.applied = Some(Fingerprint { stamp, hash });
        tracing::info!(
            generation = summary.generation,
            records = summary.records,
            skipped = summary.skipped,
            packages = summary.packages,
            "Library index rebuilt"
        );
        Ok(LibrarySync::Refreshed(summary))
    }
}
