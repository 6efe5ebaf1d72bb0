//! Library index: which downloadable releases exist for each package.
//!
//! Built from a dump of the package repository, one record per line:
//!
//! ```text
//! <description>\t<url>\t<uploader>\t<timestamp>
//! ```
//!
//! The package key of each record comes from the last path segment of its
//! URL, e.g. `.../Gem-v0.93.3-(Windows-i386-32)-externals.zip` is `Gem/0.93.3`.

use crate::name::{EXTERNALS_SUFFIX, PackageKey};
use crate::{matches_any, read_lock, write_lock};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::ops::Range;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::instrument;

const FIELD_SEPARATOR: char = '\t';

/// One line of the library dump, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LibraryRecord {
    line: String,
    url: Range<usize>,
}
impl LibraryRecord {
    /// Parses a single record. Returns `None` if the line does not have at
    /// least the description, URL and uploader fields.
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line.splitn(3, FIELD_SEPARATOR);
        let description = fields.next()?;
        let url = fields.next()?;
        fields.next()?;
        let start = description.len() + FIELD_SEPARATOR.len_utf8();
        Some(Self {
            line: line.to_string(),
            url: start..start + url.len(),
        })
    }

    /// The package key this record belongs to.
    pub fn key(&self) -> PackageKey {
        let filename = self.url().rsplit('/').next().unwrap_or_default();
        PackageKey::from_filename(filename, EXTERNALS_SUFFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.line
    }

    pub fn description(&self) -> &str {
        &self.line[..self.url.start - FIELD_SEPARATOR.len_utf8()]
    }

    pub fn url(&self) -> &str {
        &self.line[self.url.clone()]
    }

    fn tail(&self) -> (&str, &str) {
        let rest = &self.line[self.url.end + FIELD_SEPARATOR.len_utf8()..];
        rest.split_once(FIELD_SEPARATOR).unwrap_or((rest, ""))
    }

    pub fn uploader(&self) -> &str {
        self.tail().0
    }

    /// Upload timestamp; empty if the record didn't carry one.
    pub fn timestamp(&self) -> &str {
        self.tail().1
    }
}
impl Display for LibraryRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.line)
    }
}

/// What a [`LibraryIndex::refresh`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LibraryRefresh {
    /// Generation of the snapshot that was published.
    pub generation: u64,
    /// Records indexed.
    pub records: usize,
    /// Non-empty lines that were not valid records.
    pub skipped: usize,
    /// Distinct package keys.
    pub packages: usize,
}

#[derive(Debug, Default)]
struct Tables {
    generation: u64,
    by_name: BTreeMap<String, BTreeSet<PackageKey>>,
    by_key: BTreeMap<PackageKey, Vec<LibraryRecord>>,
}
impl Tables {
    fn build(blob: &str) -> (Self, LibraryRefresh) {
        let mut tables = Self::default();
        let mut summary = LibraryRefresh::default();
        for (number, line) in blob.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let Some(record) = LibraryRecord::parse(line) else {
                tracing::debug!(line = number + 1, "Skipping malformed library record");
                summary.skipped += 1;
                continue;
            };
            let key = record.key();
            tables.by_name.entry(key.name().to_string()).or_default().insert(key.clone());
            tables.by_key.entry(key).or_default().push(record);
            summary.records += 1;
        }
        summary.packages = tables.by_key.len();
        (tables, summary)
    }
}

/// Package name → releases → records.
///
/// Readers see one consistent snapshot: a refresh builds the new tables on
/// the side and swaps them in, so concurrent searches observe either the old
/// or the new generation, never a mix. Refreshes are serialized, so the
/// snapshot in place is always the one from the latest call.
#[derive(Debug, Default)]
pub struct LibraryIndex {
    tables: RwLock<Arc<Tables>>,
    /// Held across build and publish so refreshes apply in call order.
    writer: Mutex<()>,
}
impl LibraryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for an index built from a single blob.
    pub fn from_blob(blob: &str) -> Self {
        let index = Self::new();
        index.refresh(blob);
        index
    }

    fn snapshot(&self) -> Arc<Tables> {
        Arc::clone(&read_lock(&self.tables))
    }

    /// Replaces the whole index with the records in `blob`.
    ///
    /// Malformed lines are skipped, they never abort the rebuild.
    #[instrument(skip_all, fields(bytes = blob.len()))]
    pub fn refresh(&self, blob: &str) -> LibraryRefresh {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut tables, mut summary) = Tables::build(blob);
        let mut guard = write_lock(&self.tables);
        tables.generation = guard.generation + 1;
        summary.generation = tables.generation;
        *guard = Arc::new(tables);
        drop(guard);
        tracing::debug!(
            generation = summary.generation,
            records = summary.records,
            skipped = summary.skipped,
            packages = summary.packages,
            "Library index refreshed"
        );
        summary
    }

    /// All records of every package whose *name* contains any of `terms`.
    ///
    /// Records are grouped by package key, keys in lexicographic order, each
    /// key's records in source order. No terms, no results.
    pub fn search<T: AsRef<str>>(&self, terms: &[T]) -> Vec<LibraryRecord> {
        if terms.is_empty() {
            return Vec::new();
        }
        let tables = self.snapshot();
        let keys: BTreeSet<&PackageKey> = tables
            .by_name
            .iter()
            .filter(|(name, _)| matches_any(name, terms))
            .flat_map(|(_, keys)| keys)
            .collect();
        Self::collect(&tables, keys)
    }

    /// Records for exactly these keys (in key order); unknown keys are
    /// ignored.
    pub fn records_for<'a>(&self, keys: impl IntoIterator<Item = &'a PackageKey>) -> Vec<LibraryRecord> {
        let tables = self.snapshot();
        let keys: BTreeSet<&PackageKey> = keys.into_iter().collect();
        Self::collect(&tables, keys)
    }

    fn collect<'k>(tables: &Tables, keys: impl IntoIterator<Item = &'k PackageKey>) -> Vec<LibraryRecord> {
        keys.into_iter()
            .filter_map(|key| tables.by_key.get(key))
            .flat_map(|records| records.iter().cloned())
            .collect()
    }

    /// Number of refreshes applied so far.
    pub fn generation(&self) -> u64 {
        read_lock(&self.tables).generation
    }

    /// Number of distinct package keys.
    pub fn len(&self) -> usize {
        read_lock(&self.tables).by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const GEM: &str = "Gem/0.93.3 (deken installable file for W32 32bit/i386))\thttp://puredata.info/downloads/gem/releases/0.93.3/Gem-v0.93.3-(Windows-i386-32)-externals.zip\tzmoelnig\t2016-05-20 22:10:28";
    const PATCH2SVG: &str = "patch2svg-plugin-v0.1--externals.zip\thttp://puredata.info/downloads/patch2svg-plugin/releases/0.1/patch2svg-plugin-v0.1--externals.zip\tzmoelnig\t2016-03-22 16:29:25";
    const ZEXY_LINUX: &str = "zexy/2.2.5-2\thttp://puredata.info/zexy-v2.2.5-2-(Linux-amd64-64)-externals.tgz\tiem\t2017-01-01 10:00:00";
    const ZEXY_WIN: &str = "zexy/2.2.5-2\thttp://puredata.info/zexy-v2.2.5-2-(Windows-i386-32)-externals.zip\tiem\t2017-01-01 10:05:00";
    const ZEXY_OLD: &str = "zexy/2.2.4\thttp://puredata.info/zexy-v2.2.4-(Linux-amd64-64)-externals.tgz\tiem\t2015-01-01 10:00:00";

    fn blob(lines: &[&str]) -> String {
        lines.join("\n")
    }

    fn lines(records: &[LibraryRecord]) -> Vec<&str> {
        records.iter().map(LibraryRecord::as_str).collect()
    }

    #[test]
    fn test_record_fields() {
        let record = LibraryRecord::parse(GEM).unwrap();
        assert_eq!(record.description(), "Gem/0.93.3 (deken installable file for W32 32bit/i386))");
        assert!(record.url().ends_with("/Gem-v0.93.3-(Windows-i386-32)-externals.zip"));
        assert_eq!(record.uploader(), "zmoelnig");
        assert_eq!(record.timestamp(), "2016-05-20 22:10:28");
        assert_eq!(record.key().as_str(), "Gem/0.93.3");
        assert_eq!(record.to_string(), GEM);
    }

    #[test]
    fn test_record_without_timestamp() {
        let record = LibraryRecord::parse("descr\thttp://x/foo-v1-externals.zip\tuploader").unwrap();
        assert_eq!(record.uploader(), "uploader");
        assert_eq!(record.timestamp(), "");
    }

    #[rstest]
    #[case("")]
    #[case("just a description")]
    #[case("descr\thttp://x/foo-v1-externals.zip")]
    fn test_record_rejects_missing_fields(#[case] line: &str) {
        assert!(LibraryRecord::parse(line).is_none());
    }

    #[test]
    fn test_end_to_end() {
        let index = LibraryIndex::from_blob(&blob(&[GEM, PATCH2SVG]));
        assert_eq!(lines(&index.search(&["Gem"])), [GEM]);
        assert_eq!(lines(&index.search(&["plugin"])), [PATCH2SVG]);
        assert!(index.search::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_search_matches_name_not_version() {
        let index = LibraryIndex::from_blob(&blob(&[GEM, ZEXY_OLD]));
        assert!(index.search(&["0.93"]).is_empty());
        assert!(index.search(&["Gem/"]).is_empty());
        // Case-sensitive
        assert!(index.search(&["gem"]).is_empty());
    }

    #[test]
    fn test_search_groups_by_sorted_key() {
        let index = LibraryIndex::from_blob(&blob(&[ZEXY_LINUX, GEM, ZEXY_OLD, ZEXY_WIN]));
        assert_eq!(lines(&index.search(&["zexy"])), [ZEXY_OLD, ZEXY_LINUX, ZEXY_WIN]);
        assert_eq!(lines(&index.search(&["e"])), [GEM, ZEXY_OLD, ZEXY_LINUX, ZEXY_WIN]);
    }

    #[test]
    fn test_search_is_union_of_terms() {
        let index = LibraryIndex::from_blob(&blob(&[GEM, PATCH2SVG, ZEXY_OLD]));
        let both = index.search(&["Gem", "zexy"]);
        assert_eq!(lines(&both), [GEM, ZEXY_OLD]);
        // Overlapping terms do not duplicate results
        assert_eq!(index.search(&["zexy", "exy", "z"]), index.search(&["zexy"]));
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let index = LibraryIndex::new();
        let summary = index.refresh(&blob(&[GEM, "garbage", "", "half\trecord", PATCH2SVG]));
        assert_eq!(summary.records, 2);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.packages, 2);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_duplicate_lines_are_kept() {
        let index = LibraryIndex::new();
        let summary = index.refresh(&blob(&[GEM, GEM]));
        assert_eq!(summary.records, 2);
        assert_eq!(summary.packages, 1);
        assert_eq!(lines(&index.search(&["Gem"])), [GEM, GEM]);
    }

    #[test]
    fn test_refresh_replaces_everything() {
        let index = LibraryIndex::from_blob(&blob(&[GEM, ZEXY_OLD]));
        index.refresh(PATCH2SVG);
        assert!(index.search(&["Gem"]).is_empty());
        assert!(index.search(&["zexy"]).is_empty());
        assert_eq!(index.len(), 1);
        assert_eq!(index.generation(), 2);
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let data = blob(&[ZEXY_LINUX, GEM, ZEXY_OLD, PATCH2SVG]);
        let once = LibraryIndex::from_blob(&data);
        let twice = LibraryIndex::from_blob(&data);
        twice.refresh(&data);
        for term in ["zexy", "Gem", "plugin", "-", ""] {
            assert_eq!(once.search(&[term]), twice.search(&[term]));
        }
    }

    #[test]
    fn test_crlf_line_endings() {
        let index = LibraryIndex::from_blob(&format!("{GEM}\r\n{PATCH2SVG}\r\n"));
        assert_eq!(lines(&index.search(&["Gem"])), [GEM]);
    }

    #[test]
    fn test_records_for_exact_keys() {
        let index = LibraryIndex::from_blob(&blob(&[ZEXY_LINUX, GEM, ZEXY_OLD]));
        let wanted = [
            PackageKey::from_filename("zexy-v2.2.4-externals.zip", EXTERNALS_SUFFIX),
            PackageKey::from_filename("unknown-v1-externals.zip", EXTERNALS_SUFFIX),
            PackageKey::from_filename("Gem-v0.93.3-externals.zip", EXTERNALS_SUFFIX),
        ];
        assert_eq!(lines(&index.records_for(&wanted)), [GEM, ZEXY_OLD]);
    }

    #[test]
    fn test_concurrent_readers_see_whole_generations() {
        let index = Arc::new(LibraryIndex::from_blob(&blob(&[GEM, PATCH2SVG])));
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let index = Arc::clone(&index);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let found = index.search(&["Gem", "plugin", "zexy"]);
                        // Either the first or the second blob, never a blend.
                        assert!(found.len() == 2 || found.len() == 3, "{found:?}");
                    }
                })
            })
            .collect();
        for round in 0..50 {
            match round % 2 {
                0 => index.refresh(&blob(&[ZEXY_LINUX, ZEXY_WIN, ZEXY_OLD])),
                _ => index.refresh(&blob(&[GEM, PATCH2SVG])),
            };
        }
        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[test]
    fn test_concurrent_writers_publish_in_generation_order() {
        let index = Arc::new(LibraryIndex::new());
        let writers: Vec<_> = (0..8)
            .map(|writer| {
                let index = Arc::clone(&index);
                std::thread::spawn(move || {
                    let mut last = (0, 0);
                    for round in 0..25 {
                        // Blobs of different sizes take different times to build.
                        let blob = vec![GEM; 1 + (writer + round) % 8].join("\n");
                        let summary = index.refresh(&blob);
                        last = last.max((summary.generation, summary.records));
                    }
                    last
                })
            })
            .collect();
        let newest = writers.into_iter().map(|writer| writer.join().unwrap()).max().unwrap();
        assert_eq!(index.generation(), 200);
        assert_eq!(newest.0, 200);
        // The snapshot in place is the one numbered last.
        assert_eq!(index.search(&["Gem"]).len(), newest.1);
    }
}
