//! Externals packaged by the operating system, as deken library sources.
//!
//! Given the system's package list, finds the packages that are externals
//! for the selected runtime flavour and renders each installable version as
//! a library-source row, so the library index can search them alongside
//! the regular deken uploads.

mod catalog;
pub mod error;
mod package;
mod provenance;
mod row;

pub use crate::catalog::{Catalog, Filter, Match};
pub use crate::package::{FloatSize, Origin, Package, PackageVersion};
pub use crate::provenance::{DEFAULT_FALLBACK_ORIGIN, Provenance, resolve_provenance};
pub use crate::row::Row;
