//! Which package versions are externals, and under which names.

use crate::error::{ErrorKind, Result};
use crate::package::{FloatSize, Package, PackageVersion};
use exn::ResultExt;
use glob::Pattern;
use std::collections::{BTreeMap, BTreeSet};

/// Name prefixes conventionally given to externals' system packages.
const NAME_PREFIXES: [&str; 2] = ["pd-", "pd64-"];
/// Packages of the runtime itself, never externals.
const RUNTIME_PREFIX: &str = "puredata";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    /// Only packages built for this architecture; `None` accepts all.
    pub architecture: Option<String>,
    pub float_size: FloatSize,
}

/// One installable version of one package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'a> {
    pub package: &'a Package,
    pub version: &'a PackageVersion,
}

/// Searchable names of every external in a package list.
#[derive(Debug)]
pub struct Catalog<'a> {
    packages: &'a [Package],
    /// searchable name → (package, version) indices
    names: BTreeMap<String, BTreeSet<(usize, usize)>>,
}
impl<'a> Catalog<'a> {
    /// Registers every version that depends on the runtime selected by
    /// `filter`, under the package name and everything the version
    /// provides, each with and without a `pd-`/`pd64-` prefix.
    pub fn build(packages: &'a [Package], filter: &Filter) -> Self {
        let core = filter.float_size.core_packages();
        let mut names: BTreeMap<String, BTreeSet<(usize, usize)>> = BTreeMap::new();
        for (p, package) in packages.iter().enumerate() {
            if package.name.starts_with(RUNTIME_PREFIX) {
                continue;
            }
            if let Some(architecture) = &filter.architecture
                && &package.architecture != architecture
            {
                continue;
            }
            for (v, version) in package.versions.iter().enumerate() {
                if !version.depends_on_any(core) {
                    continue;
                }
                let provided = std::iter::once(&package.name).chain(&version.provides);
                for name in provided {
                    for searchable in searchable_names(name) {
                        names.entry(searchable.to_string()).or_default().insert((p, v));
                    }
                }
            }
        }
        tracing::debug!(packages = packages.len(), names = names.len(), "Package catalog built");
        Self { packages, names }
    }

    /// All registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    /// Versions registered under any name matching any of the glob
    /// `patterns` (all of them when there are no patterns), sorted by
    /// package name then version.
    pub fn matching<T: AsRef<str>>(&self, patterns: &[T]) -> Result<Vec<Match<'a>>> {
        let patterns = match patterns.is_empty() {
            true => vec![Pattern::new("*").or_raise(|| ErrorKind::InvalidPattern("*".to_string()))?],
            false => patterns
                .iter()
                .map(|pattern| {
                    let pattern = pattern.as_ref();
                    Pattern::new(pattern).or_raise(|| ErrorKind::InvalidPattern(pattern.to_string()))
                })
                .collect::<Result<Vec<_>>>()?,
        };
        let found: BTreeSet<(usize, usize)> = self
            .names
            .iter()
            .filter(|(name, _)| patterns.iter().any(|pattern| pattern.matches(name)))
            .flat_map(|(_, versions)| versions.iter().copied())
            .collect();
        let mut matches: Vec<Match<'a>> = found
            .into_iter()
            .map(|(p, v)| {
                let package = &self.packages[p];
                Match { package, version: &package.versions[v] }
            })
            .collect();
        matches.sort_by(|a, b| {
            a.package.name.cmp(&b.package.name).then_with(|| a.version.version.cmp(&b.version.version))
        });
        Ok(matches)
    }
}

/// `name` itself plus `name` without each known prefix it carries.
fn searchable_names(name: &str) -> BTreeSet<&str> {
    let mut names = BTreeSet::from([name]);
    names.extend(
        NAME_PREFIXES
            .iter()
            .filter_map(|prefix| name.strip_prefix(prefix))
            .filter(|stripped| !stripped.is_empty()),
    );
    names
}
