//! Turning configured locations into refresh sources.

use crate::error::{ErrorKind, Result};
use deken_config::Config;
use deken_index::QueryEngine;
use deken_storage::backend::LocalBackend;
use deken_sync::{LibrarySource, ObjectSource, RefreshService};
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const LIBRARY_BACKEND: &str = "libraries";

/// The library list is read through a backend rooted at its directory.
pub fn library_source(list: &Path) -> Result<LibrarySource> {
    let unusable = || ErrorKind::Source(list.to_path_buf());
    let list = std::path::absolute(list).or_raise(unusable)?;
    let (Some(dir), Some(file)) = (list.parent(), list.file_name()) else {
        exn::bail!(unusable());
    };
    let backend = LocalBackend::new(LIBRARY_BACKEND, dir).or_raise(unusable)?;
    Ok(LibrarySource::new(Arc::new(backend), file))
}

/// Each object directory is its own backend, named after its absolute
/// path, so index entries read as real file paths.
pub fn object_source(dir: &Path) -> Result<ObjectSource> {
    let unusable = || ErrorKind::Source(dir.to_path_buf());
    let dir = std::path::absolute(dir).or_raise(unusable)?;
    let backend = LocalBackend::new(dir.display().to_string(), &dir).or_raise(unusable)?;
    Ok(ObjectSource::new(Arc::new(backend)))
}

/// A refresh service over everything the configuration names.
pub fn service(config: &Config, engine: QueryEngine) -> Result<RefreshService> {
    let mut service = RefreshService::new(engine, config.refresh.duration());
    if let Some(list) = &config.libraries.location {
        service = service.with_library(library_source(list)?);
    }
    for dir in &config.objects.locations {
        service = service.with_objects(object_source(dir)?);
    }
    Ok(service)
}

/// Command-line locations replace the configured ones.
pub fn apply_overrides(config: &mut Config, library: Option<PathBuf>, object_dirs: Vec<PathBuf>) {
    if library.is_some() {
        config.libraries.location = library;
    }
    if !object_dirs.is_empty() {
        config.objects.locations = object_dirs;
    }
}
