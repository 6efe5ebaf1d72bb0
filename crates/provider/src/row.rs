use crate::catalog::Match;
use crate::package::FloatSize;
use crate::provenance::{DEFAULT_FALLBACK_ORIGIN, Provenance, resolve_provenance};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Tail of a deken archive filename.
const ARCHIVE_SUFFIX: &str = "-externals.deb";
/// System packages are only ever installed on Linux.
const PLATFORM: &str = "Linux";

/// One package version as a line of a library source:
///
/// ```text
/// <name>/<version> (<Already installed|Provided> by <origin> (<release>))[ - <summary>]\t<url>\t<origin>\t<release>
/// ```
///
/// The url is the package's download URI with a fragment that names it
/// like a deken archive, `#/<name>-v<version>-(Linux-<arch>-<bits>)-externals.deb`,
/// so the library index files the row under `<name>/<version>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub name: String,
    pub version: String,
    pub architecture: String,
    pub float_size: FloatSize,
    pub installed: bool,
    pub provenance: Provenance,
    pub uri: String,
    pub summary: String,
}
impl Row {
    pub fn new(
        found: Match<'_>,
        float_size: FloatSize,
        fallback_origin: &str,
        fallback_release: Option<&str>,
    ) -> Self {
        Self {
            name: found.package.name.clone(),
            version: found.version.version.clone(),
            architecture: found.package.architecture.clone(),
            float_size,
            installed: found.package.installed,
            provenance: resolve_provenance(&found.version.origins, fallback_origin, fallback_release),
            uri: found.version.uri.clone(),
            summary: found.version.summary.clone(),
        }
    }

    pub fn state(&self) -> &'static str {
        match self.installed {
            true => "Already installed",
            false => "Provided",
        }
    }

    /// Human-readable first field.
    pub fn description(&self) -> String {
        let description = format!("{}/{} ({} by {})", self.name, self.version, self.state(), self.provenance);
        match self.summary.trim() {
            "" => description,
            summary => format!("{description} - {summary}"),
        }
    }

    /// Download URI plus the archive-style fragment.
    pub fn url(&self) -> String {
        format!(
            "{}#/{}-v{}-({PLATFORM}-{}-{}){ARCHIVE_SUFFIX}",
            self.uri,
            self.name,
            self.version,
            self.architecture,
            self.float_size.bits()
        )
    }
}
impl From<Match<'_>> for Row {
    fn from(found: Match<'_>) -> Self {
        Self::new(found, FloatSize::default(), DEFAULT_FALLBACK_ORIGIN, None)
    }
}
impl Display for Row {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let description = self.description();
        let url = self.url();
        let label = self.provenance.label();
        let release = self.provenance.release.as_deref().unwrap_or_default();
        let fields: [&str; 4] = [&description, &url, &label, release];
        let fields: Vec<String> = fields.iter().map(|field| field.replace(['\t', '\n', '\r'], " ")).collect();
        f.write_str(&fields.join("\t"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{Origin, Package, PackageVersion};
    use deken_index::LibraryIndex;

    fn package(installed: bool, origins: Vec<Origin>) -> Package {
        Package {
            name: "pd-iemnet".to_string(),
            architecture: "amd64".to_string(),
            installed,
            versions: vec![PackageVersion {
                version: "0.3.0-1".to_string(),
                depends: vec![vec!["pd".to_string()]],
                provides: Vec::new(),
                origins,
                uri: "http://deb.debian.org/pool/main/p/pd-iemnet_0.3.0-1_amd64.deb".to_string(),
                summary: "networking\tfor Pd".to_string(),
            }],
        }
    }

    fn row(package: &Package) -> Row {
        Row::from(Match { package, version: &package.versions[0] })
    }

    #[test]
    fn test_provided_row() {
        let debian = Origin {
            trusted: true,
            label: Some("Debian".to_string()),
            codename: Some("bookworm".to_string()),
            component: Some("main".to_string()),
            ..Default::default()
        };
        let package = package(false, vec![debian]);
        assert_eq!(
            row(&package).to_string(),
            "pd-iemnet/0.3.0-1 (Provided by Debian (bookworm/main)) - networking for Pd\t\
             http://deb.debian.org/pool/main/p/pd-iemnet_0.3.0-1_amd64.deb\
             #/pd-iemnet-v0.3.0-1-(Linux-amd64-32)-externals.deb\tDebian\tbookworm/main"
        );
    }

    #[test]
    fn test_installed_row_without_origins() {
        let package = package(true, Vec::new());
        let row = row(&package);
        assert_eq!(row.summary, "networking\tfor Pd");
        let line = row.to_string();
        assert!(line.starts_with("pd-iemnet/0.3.0-1 (Already installed by apt?) - networking for Pd\t"));
        assert!(line.ends_with("\tapt?\t"));
        assert_eq!(line.split('\t').count(), 4);
    }

    #[test]
    fn test_tabs_in_fields_are_replaced() {
        let sneaky = Origin {
            trusted: true,
            label: Some("My\tRepo".to_string()),
            ..Default::default()
        };
        let package = package(false, vec![sneaky]);
        let line = row(&package).to_string();
        assert_eq!(line.split('\t').count(), 4);
        assert!(line.contains("\tMy Repo\t"));
    }

    #[test]
    fn test_row_without_summary_or_uri() {
        let mut package = package(false, Vec::new());
        package.versions[0].summary = " ".to_string();
        package.versions[0].uri = String::new();
        let found = Match { package: &package, version: &package.versions[0] };
        let row = Row::new(found, FloatSize::Double, "apt", Some("local"));
        assert_eq!(row.description(), "pd-iemnet/0.3.0-1 (Provided by apt? (local))");
        assert_eq!(row.url(), "#/pd-iemnet-v0.3.0-1-(Linux-amd64-64)-externals.deb");
    }

    #[test]
    fn test_rows_are_indexed_under_name_and_version() {
        let index = LibraryIndex::new();
        let mut zexy = package(true, Vec::new());
        zexy.name = "pd-zexy".to_string();
        zexy.versions[0].version = "2.4.2-1".to_string();
        zexy.versions[0].uri = "http://deb.debian.org/pool/main/p/pd-zexy_2.4.2-1_amd64.deb".to_string();
        let iemnet = package(false, Vec::new());
        let blob = [row(&zexy).to_string(), row(&iemnet).to_string()].join("\n");
        let summary = index.refresh(&blob);
        assert_eq!((summary.records, summary.skipped, summary.packages), (2, 0, 2));

        let found = index.search(&["zexy"]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key().as_str(), "pd-zexy/2.4.2-1");
        assert_eq!(found[0].key().name(), "pd-zexy");
        // Version and architecture are not part of the searchable name.
        assert!(index.search(&["amd64"]).is_empty());
        assert!(index.search(&["2.4"]).is_empty());
        assert_eq!(index.search(&["pd-"]).len(), 2);
    }
}
