//! Search indexes over the deken package repository.
//!
//! The [`LibraryIndex`] answers "which downloadable archives belong to a
//! package whose name matches?", the [`ObjectIndex`] answers "which package
//! releases provide an object whose name matches?". Both are plain in-memory
//! structures, refreshed from text handed to them and safe to query while
//! being refreshed. [`QueryEngine`] puts the two behind a single entry point.

mod library;
mod name;
mod objects;
mod query;
mod split;

pub use crate::library::{LibraryIndex, LibraryRecord, LibraryRefresh};
pub use crate::name::{EXTERNALS_SUFFIX, NameVersion, OBJECTS_SUFFIX, PackageKey, parse};
pub use crate::objects::{ObjectIndex, ObjectRefresh, listed_objects};
pub use crate::query::{Matches, QueryEngine, Target, UnknownTarget};
pub use crate::split::{ESCAPE, Splitter, split};

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Case-sensitive substring match against any term.
pub(crate) fn matches_any<T: AsRef<str>>(haystack: &str, terms: &[T]) -> bool {
    terms.iter().any(|term| haystack.contains(term.as_ref()))
}

// A panicking writer never leaves a half-applied refresh behind (new state is
// built before the lock is taken), so a poisoned lock is still consistent.
pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("crossfade~", &["fade"], true)]
    #[case("crossfade~", &["Fade"], false)]
    #[case("crossfade~", &["x", "~"], true)]
    #[case("crossfade~", &[], false)]
    #[case("anything", &[""], true)]
    fn test_matches_any(#[case] haystack: &str, #[case] terms: &[&str], #[case] expected: bool) {
        assert_eq!(matches_any(haystack, terms), expected);
    }
}
