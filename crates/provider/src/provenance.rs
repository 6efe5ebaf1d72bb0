use crate::package::Origin;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Origin label used when no origin names itself.
pub const DEFAULT_FALLBACK_ORIGIN: &str = "apt";
const UNKNOWN_CODENAME: &str = "???";
const UNTRUSTED_MARKER: char = '?';

/// Who provides a package version, and from which release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub origin: String,
    /// `codename/component`, or just a codename.
    pub release: Option<String>,
    pub trusted: bool,
}
impl Provenance {
    /// The origin label, marked when it isn't trusted.
    pub fn label(&self) -> String {
        match self.trusted {
            true => self.origin.clone(),
            false => format!("{}{UNTRUSTED_MARKER}", self.origin),
        }
    }
}
impl Display for Provenance {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.release {
            Some(release) => write!(f, "{} ({release})", self.label()),
            None => f.write_str(&self.label()),
        }
    }
}

/// Condenses a version's origins into one [`Provenance`].
///
/// Only trusted origins are considered if there are any. Each attribute is
/// taken from the first origin that has it: the label (falling back to the
/// origin name, then `fallback_origin`), the codename (falling back to the
/// archive) and the component. A component without any codename shows as
/// `???/<component>`; with neither, the release is `fallback_release`.
pub fn resolve_provenance(origins: &[Origin], fallback_origin: &str, fallback_release: Option<&str>) -> Provenance {
    let vouched: Vec<&Origin> = origins.iter().filter(|origin| origin.trusted).collect();
    let (candidates, trusted) = match vouched.is_empty() {
        true => (origins.iter().collect(), false),
        false => (vouched, true),
    };
    let origin = first(&candidates, |o| o.label.as_deref().or(o.origin.as_deref())).unwrap_or(fallback_origin);
    let codename = first(&candidates, |o| o.codename.as_deref().or(o.archive.as_deref()));
    let component = first(&candidates, |o| o.component.as_deref());
    let release = match (codename, component) {
        (Some(codename), Some(component)) => Some(format!("{codename}/{component}")),
        (None, Some(component)) => Some(format!("{UNKNOWN_CODENAME}/{component}")),
        (Some(codename), None) => Some(codename.to_string()),
        (None, None) => fallback_release.map(str::to_string),
    };
    Provenance {
        origin: origin.to_string(),
        release,
        trusted,
    }
}

fn first<'o>(origins: &[&'o Origin], attribute: impl Fn(&'o Origin) -> Option<&'o str>) -> Option<&'o str> {
    origins.iter().find_map(|&origin| attribute(origin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn origin(trusted: bool, label: &str, origin: &str, codename: &str, archive: &str, component: &str) -> Origin {
        let some = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Origin {
            trusted,
            label: some(label),
            origin: some(origin),
            codename: some(codename),
            archive: some(archive),
            component: some(component),
        }
    }

    #[test]
    fn test_prefers_trusted_origins() {
        let origins = [
            origin(false, "Sketchy", "", "sid", "", "contrib"),
            origin(true, "Debian", "Debian", "bookworm", "stable", "main"),
        ];
        let provenance = resolve_provenance(&origins, DEFAULT_FALLBACK_ORIGIN, None);
        assert_eq!(provenance.to_string(), "Debian (bookworm/main)");
        assert!(provenance.trusted);
    }

    #[test]
    fn test_untrusted_is_marked() {
        let origins = [origin(false, "Sketchy", "", "sid", "", "contrib")];
        let provenance = resolve_provenance(&origins, DEFAULT_FALLBACK_ORIGIN, None);
        assert_eq!(provenance.label(), "Sketchy?");
        assert_eq!(provenance.to_string(), "Sketchy? (sid/contrib)");
    }

    #[rstest]
    #[case(origin(true, "", "Ubuntu", "", "jammy", "universe"), "Ubuntu", Some("jammy/universe"))]
    #[case(origin(true, "", "", "", "", "main"), "apt", Some("???/main"))]
    #[case(origin(true, "Debian", "", "trixie", "", ""), "Debian", Some("trixie"))]
    #[case(origin(true, "", "", "", "", ""), "apt", Some("2024-01-01"))]
    fn test_fallback_chains(#[case] origin: Origin, #[case] label: &str, #[case] release: Option<&str>) {
        let provenance = resolve_provenance(&[origin], DEFAULT_FALLBACK_ORIGIN, Some("2024-01-01"));
        assert_eq!(provenance.origin, label);
        assert_eq!(provenance.release.as_deref(), release);
    }

    #[test]
    fn test_attributes_come_from_first_origin_that_has_them() {
        let origins = [
            origin(true, "", "", "bookworm", "", ""),
            origin(true, "Debian", "", "", "", "main"),
        ];
        let provenance = resolve_provenance(&origins, DEFAULT_FALLBACK_ORIGIN, None);
        assert_eq!(provenance.to_string(), "Debian (bookworm/main)");
    }

    #[test]
    fn test_no_origins() {
        let provenance = resolve_provenance(&[], "local", None);
        assert_eq!(provenance, Provenance { origin: "local".to_string(), release: None, trusted: false });
        assert_eq!(provenance.to_string(), "local?");
    }
}
