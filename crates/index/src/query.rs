//! One entry point for searching either index.

use crate::library::{LibraryIndex, LibraryRecord};
use crate::name::PackageKey;
use crate::objects::ObjectIndex;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::sync::Arc;

/// Which index a query is answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// Match package names, answer with library records.
    Libraries,
    /// Match object names, answer with package keys.
    Objects,
}
impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Libraries => "libraries",
            Target::Objects => "objects",
        }
    }
}
impl FromStr for Target {
    type Err = UnknownTarget;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lib" | "library" | "libraries" => Ok(Self::Libraries),
            "obj" | "object" | "objects" => Ok(Self::Objects),
            _ => Err(UnknownTarget(s.to_string())),
        }
    }
}
impl Display for Target {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A query named an index that doesn't exist.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown search target: {_0:?}")]
pub struct UnknownTarget(#[error(not(source))] pub String);

/// Search results, in the shape of the index they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matches {
    Libraries(Vec<LibraryRecord>),
    Objects(Vec<PackageKey>),
}
impl Matches {
    pub fn len(&self) -> usize {
        match self {
            Matches::Libraries(records) => records.len(),
            Matches::Objects(keys) => keys.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One line per match, in result order.
    pub fn lines(&self) -> Vec<&str> {
        match self {
            Matches::Libraries(records) => records.iter().map(LibraryRecord::as_str).collect(),
            Matches::Objects(keys) => keys.iter().map(PackageKey::as_str).collect(),
        }
    }
}

/// Read-only view over both indexes.
///
/// Cheap to clone; clones share the indexes, which keep being refreshed by
/// whoever else holds them.
#[derive(Debug, Clone, Default)]
pub struct QueryEngine {
    libraries: Arc<LibraryIndex>,
    objects: Arc<ObjectIndex>,
}
impl QueryEngine {
    pub fn new(libraries: Arc<LibraryIndex>, objects: Arc<ObjectIndex>) -> Self {
        Self { libraries, objects }
    }

    pub fn libraries(&self) -> &Arc<LibraryIndex> {
        &self.libraries
    }

    pub fn objects(&self) -> &Arc<ObjectIndex> {
        &self.objects
    }

    /// Searches `target` for anything containing any of `terms`.
    pub fn search<T: AsRef<str>>(&self, target: Target, terms: &[T]) -> Matches {
        match target {
            Target::Libraries => Matches::Libraries(self.search_libraries(terms)),
            Target::Objects => Matches::Objects(self.search_objects(terms)),
        }
    }

    pub fn search_libraries<T: AsRef<str>>(&self, terms: &[T]) -> Vec<LibraryRecord> {
        self.libraries.search(terms)
    }

    pub fn search_objects<T: AsRef<str>>(&self, terms: &[T]) -> Vec<PackageKey> {
        self.objects.search(terms)
    }

    /// Downloadable records of every package release that provides an
    /// object matching `terms`.
    pub fn search_objects_as_libraries<T: AsRef<str>>(&self, terms: &[T]) -> Vec<LibraryRecord> {
        let keys = self.objects.search(terms);
        self.libraries.records_for(&keys)
    }
}
