//! Layered configuration: defaults, then a config file, then `DEKEN_*`
//! environment variables (`__` separates nested keys, so
//! `DEKEN_REFRESH__INTERVAL=60` sets `refresh.interval`).
//!
//! ```toml
//! [libraries]
//! location = "/srv/deken/libraries.tsv"
//!
//! [objects]
//! locations = ["/srv/deken/objects"]
//!
//! [refresh]
//! interval = 300
//!
//! [log]
//! level = "info"
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "DEKEN_";
const ENV_SEPARATOR: &str = "__";
const DEFAULT_FILE_NAME: &str = "deken.toml";
const DEFAULT_REFRESH_INTERVAL: u64 = 300;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub libraries: Libraries,
    pub objects: Objects,
    pub refresh: Refresh,
    pub log: Log,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Libraries {
    /// The tab-separated library list.
    pub location: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Objects {
    /// Directories searched (recursively) for object listing files.
    pub locations: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Refresh {
    /// Seconds between refresh passes.
    pub interval: u64,
}
impl Default for Refresh {
    fn default() -> Self {
        Self {
            interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}
impl Refresh {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Default `tracing` filter directive; `RUST_LOG` takes precedence.
    pub level: String,
}
impl Default for Log {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// `deken.toml` in the platform's configuration directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "deken").map(|dirs| dirs.config_dir().join(DEFAULT_FILE_NAME))
    }

    /// Layers the configuration sources without extracting them.
    ///
    /// An explicit `path` has to exist; the default path is skipped when it
    /// doesn't.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        let file = match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::Missing(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|path| path.is_file()),
        };
        if let Some(file) = file {
            tracing::debug!(path = %file.display(), "Loading configuration file");
            figment = merge_file(figment, &file)?;
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR)))
    }

    /// Loads and validates the configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(path)?.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh.interval == 0 {
            exn::bail!(ErrorKind::Invalid("refresh interval must be at least one second"));
        }
        if self.log.level.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("log level must not be empty"));
        }
        Ok(())
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default().to_ascii_lowercase();
    Ok(match extension.as_str() {
        "toml" => figment.merge(Toml::file_exact(path)),
        "yaml" | "yml" => figment.merge(Yaml::file_exact(path)),
        "json" => figment.merge(Json::file_exact(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(extension)),
    })
}
