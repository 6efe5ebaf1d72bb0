//! The system package catalog, as handed to the provider.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub architecture: String,
    #[serde(default)]
    pub installed: bool,
    #[serde(default)]
    pub versions: Vec<PackageVersion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersion {
    pub version: String,
    /// Each inner list is one dependency, satisfied by any of its
    /// alternatives.
    #[serde(default)]
    pub depends: Vec<Vec<String>>,
    /// Virtual package names this version provides.
    #[serde(default)]
    pub provides: Vec<String>,
    #[serde(default)]
    pub origins: Vec<Origin>,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub summary: String,
}
impl PackageVersion {
    /// Whether any alternative of any dependency is one of `names`.
    pub fn depends_on_any(&self, names: &[&str]) -> bool {
        self.depends.iter().flatten().any(|dependency| names.contains(&dependency.as_str()))
    }
}

/// Where a package version can be installed from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    #[serde(default)]
    pub trusted: bool,
    pub label: Option<String>,
    pub origin: Option<String>,
    pub codename: Option<String>,
    pub archive: Option<String>,
    pub component: Option<String>,
}

/// Precision of the runtime's floating point numbers, which decides the
/// runtime packages an external has to depend on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FloatSize {
    #[default]
    Single,
    Double,
}
impl FloatSize {
    /// Package names of the runtime itself.
    pub fn core_packages(&self) -> &'static [&'static str] {
        match self {
            FloatSize::Single => &["puredata-core", "puredata", "puredata-gui", "pd"],
            FloatSize::Double => &["puredata64-core", "puredata64", "puredata-gui", "pd64"],
        }
    }

    pub fn bits(&self) -> u8 {
        match self {
            FloatSize::Single => 32,
            FloatSize::Double => 64,
        }
    }
}
impl FromStr for FloatSize {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "32" => Ok(Self::Single),
            "64" => Ok(Self::Double),
            other => Err(format!("unsupported float size {other:?} (expected 32 or 64)")),
        }
    }
}
impl Display for FloatSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.bits())
    }
}
