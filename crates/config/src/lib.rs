//! Layered runtime configuration.
//!
//! Defaults, then an optional `remo.toml`, then `REMO_*` environment
//! variables, merged with figment. A missing file is fine (defaults apply);
//! a malformed one is an error the caller should surface before touching any
//! files.

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Everything the collection, engine and cache read at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fixed counter position (1-based). `None` means "run the per-directory
    /// vote on load".
    pub counter_position: Option<usize>,
    /// The characters accepted as a single separator between counter and
    /// description.
    pub separators: String,
    /// Whether resulting filenames are compared case-insensitively (matches
    /// the common desktop filesystems; turn off for case-sensitive mounts).
    pub case_insensitive: bool,
    /// Name of the trash subdirectory created next to the managed files.
    /// Localizable: this is a display name, not a protocol constant.
    pub trash_dir: String,
    pub cache: CacheConfig,
    /// External editor executables keyed by media-kind tag (`"image"`,
    /// `"video"`, `"audio"`, `"other"`). One map for all kinds, no
    /// per-kind statics.
    pub editors: BTreeMap<String, PathBuf>,
}

/// Content cache tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Safety margin subtracted from the available-memory budget before the
    /// cache admits new content.
    pub margin_bytes: u64,
    /// Fixed byte ceiling instead of live memory probing. `None` uses the
    /// system probe.
    pub fixed_budget: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            counter_position: None,
            separators: "_-. ".to_string(),
            case_insensitive: true,
            trash_dir: "deleted".to_string(),
            cache: CacheConfig::default(),
            editors: BTreeMap::new(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            // 64 MiB of headroom between the cache and the actual ceiling.
            margin_bytes: 64 * 1024 * 1024,
            fixed_budget: None,
        }
    }
}

impl Config {
    /// Loads configuration from the default location
    /// (`<config dir>/remo/remo.toml`) plus `REMO_*` environment variables.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path().as_deref())
    }

    /// Loads configuration from an explicit file path (or no file at all),
    /// plus `REMO_*` environment variables. Used directly by tests.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        let config: Config =
            figment.merge(Env::prefixed("REMO_").split("__")).extract().or_raise(|| ErrorKind::Extract)?;
        config.validate()?;
        tracing::debug!(trash_dir = %config.trash_dir, case_insensitive = config.case_insensitive, "configuration loaded");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.counter_position == Some(0) {
            exn::bail!(ErrorKind::Invalid("counter_position is 1-based and cannot be 0".to_string()));
        }
        if self.trash_dir.is_empty() || self.trash_dir.contains('/') {
            exn::bail!(ErrorKind::Invalid(format!("trash_dir must be a plain directory name: {:?}", self.trash_dir)));
        }
        Ok(())
    }

    /// The configured external editor for a media-kind tag, if any.
    pub fn editor_for(&self, kind_tag: &str) -> Option<&Path> {
        self.editors.get(kind_tag).map(PathBuf::as_path)
    }
}

fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "remo").map(|dirs| dirs.config_dir().join("remo.toml"))
}
