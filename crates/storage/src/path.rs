//! Path validation for backend-relative paths.

use crate::error::{ErrorKind, Result};
use std::path::{Component, Path, PathBuf};

/// Normalizes a backend-relative path, refusing anything that would leave
/// the backend root.
///
/// `.` components, leading and repeated separators disappear; `..` is
/// resolved as long as it stays inside the root. NUL bytes, Windows
/// prefixes and paths that normalize to nothing are rejected with
/// [`InvalidPath`](crate::error::ErrorKind::InvalidPath).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use deken_storage::validate_path;
///
/// assert!(validate_path("objects/tof-v0.2.0-objects.txt").is_ok());
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("a/../../b").is_err());
/// assert_eq!(
///     validate_path("old/../objects/./zexy-objects.txt").unwrap(),
///     Path::new("objects/zexy-objects.txt")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let invalid = || exn::Exn::from(ErrorKind::InvalidPath(path.to_path_buf()));
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            // Would be truncated by the OS.
            Component::Normal(segment) if segment.as_encoded_bytes().contains(&0) => return Err(invalid()),
            Component::Normal(segment) => components.push(segment),
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => return Err(invalid()),
            Component::ParentDir => {
                components.pop().ok_or_else(invalid)?;
            },
        }
    }
    match components.is_empty() {
        true => Err(invalid()),
        false => Ok(components.into_iter().collect()),
    }
}
