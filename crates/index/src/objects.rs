//! Object index: which packages provide an object.
//!
//! Fed one listing file at a time. The file's name carries the package key
//! (`tof-v0.2.0-objects.txt` is `tof/0.2.0`), its content one object per
//! line:
//!
//! ```text
//! crossfade~ cross fade between two signals
//! getdollarzero get $0 for parent patch
//! ```
//!
//! Every entry remembers which file contributed it, so a file can be
//! replaced or retracted without touching what other files provide.

use crate::name::{OBJECTS_SUFFIX, PackageKey};
use crate::split::Splitter;
use crate::{matches_any, read_lock, write_lock};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::instrument;

/// Outcome of [`ObjectIndex::refresh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectRefresh {
    /// The file's contributions were replaced: it now provides `objects`
    /// (distinct names) for `key`.
    Updated { key: PackageKey, objects: usize },
    /// The file is gone, and so are the `objects` it used to provide.
    Retracted { objects: usize },
    /// Retraction of a file that never contributed anything.
    Unknown,
}

#[derive(Debug)]
struct Contribution {
    key: PackageKey,
    objects: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct State {
    generation: u64,
    /// object name → providing key → files that say so
    objects: BTreeMap<String, BTreeMap<PackageKey, BTreeSet<PathBuf>>>,
    files: HashMap<PathBuf, Contribution>,
}
impl State {
    fn retract(&mut self, file: &Path) -> Option<Contribution> {
        let contribution = self.files.remove(file)?;
        for object in &contribution.objects {
            let Some(providers) = self.objects.get_mut(object) else {
                continue;
            };
            if let Some(files) = providers.get_mut(&contribution.key) {
                files.remove(file);
                if files.is_empty() {
                    providers.remove(&contribution.key);
                }
            }
            if providers.is_empty() {
                self.objects.remove(object);
            }
        }
        Some(contribution)
    }

    fn insert(&mut self, file: PathBuf, contribution: Contribution) {
        for object in &contribution.objects {
            self.objects
                .entry(object.clone())
                .or_default()
                .entry(contribution.key.clone())
                .or_default()
                .insert(file.clone());
        }
        self.files.insert(file, contribution);
    }
}

/// Extracts the object names from a listing file's content.
///
/// The name is everything up to the first unescaped space; the description
/// after it is ignored.
pub fn listed_objects(content: &str) -> BTreeSet<String> {
    let splitter = Splitter::new(' ').max_splits(Some(1));
    content
        .lines()
        .filter(|line| !line.is_empty())
        .filter_map(|line| splitter.split(line).into_iter().next())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Object name → packages providing it.
#[derive(Debug, Default)]
pub struct ObjectIndex {
    state: RwLock<State>,
}
impl ObjectIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the current state of one listing file.
    ///
    /// `Some(content)` replaces everything `file` contributed before with
    /// what it lists now; `None` means the file no longer exists and its
    /// contributions are retracted.
    #[instrument(skip_all, fields(file = %file.as_ref().display()))]
    pub fn refresh(&self, file: impl AsRef<Path>, content: Option<&str>) -> ObjectRefresh {
        let file = file.as_ref();
        let outcome = match content {
            Some(content) => {
                let key = PackageKey::from_path(file, OBJECTS_SUFFIX);
                let objects = listed_objects(content);
                let count = objects.len();
                let mut state = write_lock(&self.state);
                state.retract(file);
                state.insert(file.to_path_buf(), Contribution { key: key.clone(), objects });
                state.generation += 1;
                ObjectRefresh::Updated { key, objects: count }
            },
            None => {
                let mut state = write_lock(&self.state);
                match state.retract(file) {
                    Some(contribution) => {
                        state.generation += 1;
                        ObjectRefresh::Retracted { objects: contribution.objects.len() }
                    },
                    None => ObjectRefresh::Unknown,
                }
            },
        };
        tracing::debug!(?outcome, "Object index refreshed");
        outcome
    }

    /// Keys of all packages providing an object whose name contains any of
    /// `terms`; sorted, without duplicates. No terms, no results.
    pub fn search<T: AsRef<str>>(&self, terms: &[T]) -> Vec<PackageKey> {
        if terms.is_empty() {
            return Vec::new();
        }
        let state = read_lock(&self.state);
        let keys: BTreeSet<&PackageKey> = state
            .objects
            .iter()
            .filter(|(object, _)| matches_any(object, terms))
            .flat_map(|(_, providers)| providers.keys())
            .collect();
        keys.into_iter().cloned().collect()
    }

    /// Names of all objects `key` provides, sorted.
    pub fn objects_of(&self, key: &PackageKey) -> Vec<String> {
        let state = read_lock(&self.state);
        let objects: BTreeSet<&String> = state
            .files
            .values()
            .filter(|contribution| &contribution.key == key)
            .flat_map(|contribution| &contribution.objects)
            .collect();
        objects.into_iter().cloned().collect()
    }

    /// Listing files currently contributing to the index, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        let state = read_lock(&self.state);
        let mut files: Vec<PathBuf> = state.files.keys().cloned().collect();
        files.sort();
        files
    }

    /// Number of updates and retractions applied so far.
    pub fn generation(&self) -> u64 {
        read_lock(&self.state).generation
    }

    /// Number of distinct object names.
    pub fn len(&self) -> usize {
        read_lock(&self.state).objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
