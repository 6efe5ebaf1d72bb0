use crate::error::{ErrorKind, Result};
use crate::{Fingerprint, MAX_READ_CONCURRENCY, Stamp};
use deken_index::{OBJECTS_SUFFIX, ObjectIndex, ObjectRefresh};
use deken_storage::{BackendHandle, FileInfo};
use exn::ResultExt;
use futures::{StreamExt, stream};
use std::collections::{HashMap, HashSet};
use std::ops::AddAssign;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Counts from one [`ObjectSource::sync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectSync {
    /// Files (re)applied to the index.
    pub updated: usize,
    /// Files that have not changed since they were last applied.
    pub unchanged: usize,
    /// Files that disappeared, taking their objects with them.
    pub retracted: usize,
    /// Files that could not be read this time.
    pub failed: usize,
}
impl AddAssign for ObjectSync {
    fn add_assign(&mut self, other: Self) {
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.retracted += other.retracted;
        self.failed += other.failed;
    }
}

/// Every object listing file in one backend.
///
/// Listing files are recognised by name (`<name>-v<version>-objects.<ext>`)
/// anywhere below the backend root. In the index each file is known as
/// `<backend name>/<relative path>`, so several backends can provide
/// listings for the same package without retracting each other's.
pub struct ObjectSource {
    backend: BackendHandle,
    applied: HashMap<PathBuf, Fingerprint>,
}
impl ObjectSource {
    pub fn new(backend: BackendHandle) -> Self {
        Self {
            backend,
            applied: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.backend.name()
    }

    fn identity(&self, path: &Path) -> PathBuf {
        PathBuf::from(self.backend.name()).join(path)
    }

    /// Brings `index` in line with the listing files currently in the backend.
    ///
    /// Fails only when the backend can't be listed, in which case nothing
    /// is retracted. A file that can't be read is counted as failed and
    /// keeps whatever it contributed before.
    #[instrument(skip_all, fields(backend = self.backend.name()))]
    pub async fn sync(&mut self, index: &ObjectIndex) -> Result<ObjectSync> {
        let listed: Vec<FileInfo> = self
            .backend
            .list(None)
            .await
            .or_raise(|| ErrorKind::SourceUnavailable(PathBuf::from(self.backend.name())))?
            .into_iter()
            .filter(|info| info.file_name().contains(OBJECTS_SUFFIX))
            .collect();
        let mut counts = ObjectSync::default();

        let present: HashSet<PathBuf> = listed.iter().map(|info| info.path.clone()).collect();
        let vanished: Vec<PathBuf> = self.applied.keys().filter(|path| !present.contains(*path)).cloned().collect();
        for path in vanished {
            self.retract(index, &path, &mut counts);
        }

        let (unchanged, stale): (Vec<_>, Vec<_>) = listed
            .into_iter()
            .partition(|info| self.applied.get(&info.path).is_some_and(|applied| applied.stamp == Stamp::from(info)));
        counts.unchanged += unchanged.len();

        let backend = &self.backend;
        let mut reads = stream::iter(stale)
            .map(|info| async move {
                let read = backend.read(&info.path).await;
                (info, read)
            })
            .buffer_unordered(MAX_READ_CONCURRENCY)
            .collect::<Vec<_>>()
            .await;
        // Apply in a stable order.
        reads.sort_by(|(a, _), (b, _)| a.path.cmp(&b.path));

        for (info, read) in reads {
            match read {
                Ok(bytes) => {
                    let fingerprint = Fingerprint {
                        stamp: Stamp::from(&info),
                        hash: blake3::hash(&bytes),
                    };
                    let previous = self.applied.insert(info.path.clone(), fingerprint);
                    if previous.is_some_and(|previous| previous.hash == fingerprint.hash) {
                        counts.unchanged += 1;
                        continue;
                    }
                    let outcome = index.refresh(self.identity(&info.path), Some(&String::from_utf8_lossy(&bytes)));
                    tracing::debug!(path = %info.path.display(), ?outcome, "Object listing applied");
                    counts.updated += 1;
                },
                // Gone between listing and reading.
                Err(err) if err.is_not_found() => self.retract(index, &info.path, &mut counts),
                Err(err) => {
                    tracing::warn!(
                        path = %info.path.display(),
                        error = ?err,
                        "Object listing unreadable; keeping previous contents"
                    );
                    counts.failed += 1;
                },
            }
        }

        tracing::info!(
            updated = counts.updated,
            unchanged = counts.unchanged,
            retracted = counts.retracted,
            failed = counts.failed,
            "Object listings synced"
        );
        Ok(counts)
    }

    fn retract(&mut self, index: &ObjectIndex, path: &Path, counts: &mut ObjectSync) {
        self.applied.remove(path);
        if let ObjectRefresh::Retracted { objects } = index.refresh(self.identity(path), None) {
            tracing::debug!(path = %path.display(), objects, "Object listing retracted");
            counts.retracted += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deken_storage::backend::MockBackend;
    use std::sync::Arc;

    fn keys(index: &ObjectIndex, term: &str) -> Vec<String> {
        index.search(&[term]).into_iter().map(|key| key.to_string()).collect()
    }

    fn fixture() -> (Arc<MockBackend>, ObjectSource, ObjectIndex) {
        let backend = Arc::new(
            MockBackend::with_files([
                ("tof-v0.2.0-objects.txt", "crossfade~ fade\npath path stuff\n"),
                ("nested/Gem-v0.93.3-objects.txt", "pix_film films\n"),
                ("README.txt", "not a listing\n"),
            ])
            .with_name("mirror"),
        );
        let source = ObjectSource::new(backend.clone());
        (backend, source, ObjectIndex::new())
    }

    #[tokio::test]
    async fn test_initial_sync() {
        let (_backend, mut source, index) = fixture();
        let counts = source.sync(&index).await.unwrap();
        assert_eq!(counts, ObjectSync { updated: 2, ..Default::default() });
        assert_eq!(keys(&index, "fade"), ["tof/0.2.0"]);
        assert_eq!(keys(&index, "film"), ["Gem/0.93.3"]);
        assert_eq!(
            index.files(),
            [PathBuf::from("mirror/nested/Gem-v0.93.3-objects.txt"), PathBuf::from("mirror/tof-v0.2.0-objects.txt")]
        );
    }

    #[tokio::test]
    async fn test_unchanged_files_are_not_reapplied() {
        let (backend, mut source, index) = fixture();
        source.sync(&index).await.unwrap();
        let counts = source.sync(&index).await.unwrap();
        assert_eq!(counts, ObjectSync { unchanged: 2, ..Default::default() });
        // Touched, same content.
        backend.insert("tof-v0.2.0-objects.txt", "crossfade~ fade\npath path stuff\n").await;
        let counts = source.sync(&index).await.unwrap();
        assert_eq!(counts, ObjectSync { unchanged: 2, ..Default::default() });
        assert_eq!(index.generation(), 2);
    }

    #[tokio::test]
    async fn test_changed_file_replaces_contributions() {
        let (backend, mut source, index) = fixture();
        source.sync(&index).await.unwrap();
        backend.insert("tof-v0.2.0-objects.txt", "crossfade~ fade\n").await;
        let counts = source.sync(&index).await.unwrap();
        assert_eq!(counts, ObjectSync { updated: 1, unchanged: 1, ..Default::default() });
        assert!(keys(&index, "path").is_empty());
    }

    #[tokio::test]
    async fn test_removed_file_is_retracted() {
        let (backend, mut source, index) = fixture();
        source.sync(&index).await.unwrap();
        backend.remove("nested/Gem-v0.93.3-objects.txt").await;
        let counts = source.sync(&index).await.unwrap();
        assert_eq!(counts, ObjectSync { unchanged: 1, retracted: 1, ..Default::default() });
        assert!(keys(&index, "film").is_empty());
        assert_eq!(keys(&index, "fade"), ["tof/0.2.0"]);
    }

    #[tokio::test]
    async fn test_backends_do_not_retract_each_other() {
        let (_backend, mut source, index) = fixture();
        let other = Arc::new(MockBackend::with_files([("tof-v0.2.0-objects.txt", "crossfade~ fade\n")]).with_name("other"));
        let mut other_source = ObjectSource::new(other.clone());
        source.sync(&index).await.unwrap();
        other_source.sync(&index).await.unwrap();
        other.remove("tof-v0.2.0-objects.txt").await;
        other_source.sync(&index).await.unwrap();
        assert_eq!(keys(&index, "fade"), ["tof/0.2.0"]);
    }

    #[test]
    fn test_counts_add_up() {
        let mut total = ObjectSync { updated: 1, failed: 1, ..Default::default() };
        total += ObjectSync { updated: 2, retracted: 3, unchanged: 4, failed: 0 };
        assert_eq!(total, ObjectSync { updated: 3, unchanged: 4, retracted: 3, failed: 1 });
    }
}
