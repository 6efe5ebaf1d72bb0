use std::path::PathBuf;
use time::OffsetDateTime;

/// File metadata returned by storage backends.
///
/// Size and modification time together form the cheap "has this changed?"
/// stamp used before reading a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Relative path from storage root
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub modified: OffsetDateTime,
}
impl FileInfo {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: OffsetDateTime) -> Self {
        Self {
            path: path.into(),
            size,
            modified,
        }
    }

    /// Final path segment, lossily converted.
    pub fn file_name(&self) -> String {
        self.path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        let info = FileInfo::new("nested/dir/tof-v0.2.0-objects.txt", 12, OffsetDateTime::UNIX_EPOCH);
        assert_eq!(info.file_name(), "tof-v0.2.0-objects.txt");
        assert_eq!(FileInfo::new("", 0, OffsetDateTime::UNIX_EPOCH).file_name(), "");
    }
}
