//! Package names and versions from archive filenames.
//!
//! Deken archives follow the convention
//! `<name>[-v<version>][-(<platform>)...]-externals.<ext>`, and object
//! listings `<name>[-v<version>]-objects.<ext>`. This is a filename
//! convention, not a grammar: parsing never fails, it just returns less
//! useful results for filenames that ignore the convention.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Marks the end of the interesting part of an archive filename.
pub const EXTERNALS_SUFFIX: &str = "-externals";
/// Marks the end of the interesting part of an object listing filename.
pub const OBJECTS_SUFFIX: &str = "-objects";

const VERSION_MARKER: &str = "-v";
const PLATFORM_MARKER: char = '(';

/// A package name and (possibly empty) version, as encoded in a filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameVersion {
    pub name: String,
    /// Empty if the filename did not encode a version.
    pub version: String,
}
impl NameVersion {
    /// Converts into the canonical index key: `name`, or `name/version`.
    pub fn into_key(self) -> PackageKey {
        let name_len = self.name.len();
        let key = match self.version.is_empty() {
            true => self.name,
            false => format!("{}/{}", self.name, self.version),
        };
        PackageKey { key, name_len }
    }
}

fn trim(s: &str) -> &str {
    s.trim_matches(|c: char| c == '-' || c.is_whitespace())
}

/// Extracts the package name and version from an archive (or listing)
/// filename.
///
/// 1. Everything from the first `suffix` onwards is dropped,
/// 2. then everything from the first `(` (platform annotations),
/// 3. the remainder is split at the *last* `-v`: a name that contains `-v`
///    itself keeps it.
///
/// # Examples
///
/// ```
/// use deken_index::{EXTERNALS_SUFFIX, parse};
///
/// let parsed = parse("zexy-v2.2.5-2-(Linux-amd64-64)-externals.tgz", EXTERNALS_SUFFIX);
/// assert_eq!((parsed.name.as_str(), parsed.version.as_str()), ("zexy", "2.2.5-2"));
///
/// let parsed = parse("helloworld(Linux-amd64-64)-externals.zip", EXTERNALS_SUFFIX);
/// assert_eq!((parsed.name.as_str(), parsed.version.as_str()), ("helloworld", ""));
/// ```
pub fn parse(filename: &str, suffix: &str) -> NameVersion {
    // An empty marker would match at offset zero and swallow everything.
    let stem = match suffix.is_empty() {
        true => filename,
        false => filename.split_once(suffix).map_or(filename, |(head, _)| head),
    };
    let stem = stem.split_once(PLATFORM_MARKER).map_or(stem, |(head, _)| head);
    match stem.rsplit_once(VERSION_MARKER) {
        Some((name, version)) => NameVersion {
            name: trim(name).to_string(),
            version: trim(version).to_string(),
        },
        None => NameVersion {
            name: trim(stem).to_string(),
            version: String::new(),
        },
    }
}

/// Canonical identifier of a package (`name`) or package release
/// (`name/version`).
///
/// Only ever created by parsing a filename. Equality, ordering and hashing
/// use the string form alone, so two keys are the same iff they print the
/// same.
#[derive(Debug, Clone)]
pub struct PackageKey {
    key: String,
    name_len: usize,
}
impl PackageKey {
    /// Parses `filename` (a single path segment) into a key.
    pub fn from_filename(filename: &str, suffix: &str) -> Self {
        parse(filename, suffix).into_key()
    }

    /// Parses the final segment of `path` into a key.
    pub fn from_path(path: &Path, suffix: &str) -> Self {
        let segment = path.file_name().unwrap_or(path.as_os_str()).to_string_lossy();
        Self::from_filename(&segment, suffix)
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// The base package name, without version.
    pub fn name(&self) -> &str {
        &self.key[..self.name_len]
    }

    /// The version, if the filename encoded one.
    pub fn version(&self) -> Option<&str> {
        self.key.get(self.name_len + 1..).filter(|v| !v.is_empty())
    }
}
impl PartialEq for PackageKey {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
impl Eq for PackageKey {}
impl Ord for PackageKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}
impl PartialOrd for PackageKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Hash for PackageKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}
impl Borrow<str> for PackageKey {
    fn borrow(&self) -> &str {
        &self.key
    }
}
impl AsRef<str> for PackageKey {
    fn as_ref(&self) -> &str {
        &self.key
    }
}
impl Display for PackageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("zexy-v2.2.5-2-(Linux-amd64-64)-externals.tgz", "zexy", "2.2.5-2")]
    #[case("helloworld(Linux-amd64-64)-externals.zip", "helloworld", "")]
    #[case("Gem-v0.93.3-(Windows-i386-32)-externals.zip", "Gem", "0.93.3")]
    #[case("patch2svg-plugin-v0.1--externals.zip", "patch2svg-plugin", "0.1")]
    #[case("pd-vasp-v1.0-externals.tgz", "pd-vasp", "1.0")]
    #[case("iem-v-v3.1-(Linux-i386-32)-externals.tgz", "iem-v", "3.1")]
    #[case("zexy-externals.zip", "zexy", "")]
    #[case(" - spaced - -externals.zip", "spaced", "")]
    #[case("", "", "")]
    #[case("-v", "", "")]
    #[case("(((", "", "")]
    #[case("no-suffix-v1", "no-suffix", "1")]
    fn test_parse_externals(#[case] filename: &str, #[case] name: &str, #[case] version: &str) {
        let parsed = parse(filename, EXTERNALS_SUFFIX);
        assert_eq!(parsed.name, name);
        assert_eq!(parsed.version, version);
    }

    #[rstest]
    #[case("tof-v0.2.0-objects.txt", "tof", "0.2.0")]
    #[case("cyclone-objects.txt", "cyclone", "")]
    #[case("iemlib-v1.22-1-(Sources)-objects.txt", "iemlib", "1.22-1")]
    fn test_parse_objects(#[case] filename: &str, #[case] name: &str, #[case] version: &str) {
        let parsed = parse(filename, OBJECTS_SUFFIX);
        assert_eq!(parsed.name, name);
        assert_eq!(parsed.version, version);
    }

    #[test]
    fn test_parse_empty_suffix_keeps_filename() {
        let parsed = parse("foo-v1.0", "");
        assert_eq!(parsed.name, "foo");
        assert_eq!(parsed.version, "1.0");
    }

    #[test]
    fn test_parse_is_total() {
        let weird = ["\u{0}", "-v-v-v-v", "((-externals", "-externals-externals", "ü-vä", "\t-v\n", "/", "a/b-v1"];
        for filename in weird {
            let _ = parse(filename, EXTERNALS_SUFFIX);
            let _ = parse(filename, OBJECTS_SUFFIX);
        }
    }

    #[test]
    fn test_key_from_name_and_version() {
        let key = PackageKey::from_filename("zexy-v2.2.5-2-(Linux-amd64-64)-externals.tgz", EXTERNALS_SUFFIX);
        assert_eq!(key.as_str(), "zexy/2.2.5-2");
        assert_eq!(key.name(), "zexy");
        assert_eq!(key.version(), Some("2.2.5-2"));
    }

    #[test]
    fn test_key_without_version() {
        let key = PackageKey::from_filename("cyclone-objects.txt", OBJECTS_SUFFIX);
        assert_eq!(key.as_str(), "cyclone");
        assert_eq!(key.name(), "cyclone");
        assert_eq!(key.version(), None);
    }

    #[test]
    fn test_key_name_may_contain_slash() {
        let key = parse("odd/name-v1", EXTERNALS_SUFFIX).into_key();
        assert_eq!(key.name(), "odd/name");
        assert_eq!(key.version(), Some("1"));
    }

    #[test]
    fn test_key_from_path_uses_final_segment() {
        let key = PackageKey::from_path(Path::new("/srv/objects/tof-v0.2.0-objects.txt"), OBJECTS_SUFFIX);
        assert_eq!(key.as_str(), "tof/0.2.0");
    }

    #[test]
    fn test_key_equality_is_textual() {
        let a = PackageKey::from_filename("foo-v1.0-externals.zip", EXTERNALS_SUFFIX);
        let b = PackageKey::from_filename("foo-v1.0-(Linux-amd64-64)-externals.tgz", EXTERNALS_SUFFIX);
        let c = PackageKey::from_filename("foo-v1.00-externals.zip", EXTERNALS_SUFFIX);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a < c);
    }
}
