//! Refreshing the in-memory indexes from files in storage backends.
//!
//! Sources remember a fingerprint of what they last applied, so a pass
//! over unchanged files costs one `stat` each and no reads.

pub mod error;
mod library;
mod objects;
mod service;

pub use crate::library::{LibrarySource, LibrarySync};
pub use crate::objects::{ObjectSource, ObjectSync};
pub use crate::service::{RefreshPass, RefreshService};
use deken_storage::FileInfo;
use time::OffsetDateTime;

/// Upper bound on concurrent reads from one backend.
pub(crate) const MAX_READ_CONCURRENCY: usize = 16;

/// Cheap change detection: size and modification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Stamp {
    size: u64,
    modified: OffsetDateTime,
}
impl From<&FileInfo> for Stamp {
    fn from(info: &FileInfo) -> Self {
        Self {
            size: info.size,
            modified: info.modified,
        }
    }
}

/// What was known about a source file when it was last applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Fingerprint {
    stamp: Stamp,
    hash: blake3::Hash,
}
