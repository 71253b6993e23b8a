//! Project configuration from `autoreload.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section    # [reload] and [watch]
//! ├── error      # ConfigError
//! ├── util       # config file lookup
//! └── mod.rs     # ReloadConfig (this file)
//! ```
//!
//! Every field is optional. Environment variables override the file:
//!
//! | Variable               | Effect                                |
//! |------------------------|---------------------------------------|
//! | `AUTORELOAD_VERBOSITY` | replaces `reload.verbosity`           |
//! | `AUTORELOAD_ROOT`      | appended to `reload.roots`            |

mod error;
mod section;
mod util;

pub use error::ConfigError;
pub use section::{MAX_VERBOSITY, ReloadSection, WatchSection};
pub use util::{find_config_file, find_config_file_from};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::filter::OwnedRoots;
use crate::log;
use crate::utils::path::normalize_path;

/// Default config file name, searched upward from the working directory.
pub const CONFIG_FILE: &str = "autoreload.toml";

pub const ENV_VERBOSITY: &str = "AUTORELOAD_VERBOSITY";
pub const ENV_ROOT: &str = "AUTORELOAD_ROOT";

/// Root configuration structure representing autoreload.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// Absolute path to the config file, if one was found
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub root: PathBuf,

    pub reload: ReloadSection,
    pub watch: WatchSection,
}

impl ReloadConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise `autoreload.toml` is searched
    /// upward from the cwd, falling back to defaults rooted at the cwd.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let config_path = match explicit {
            Some(path) => {
                let path = cwd.join(path);
                if !path.is_file() {
                    return Err(ConfigError::Io(
                        path,
                        std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
                    )
                    .into());
                }
                Some(path)
            }
            None => find_config_file(Path::new(CONFIG_FILE)),
        };

        let mut config = match &config_path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };

        let root = config_path
            .as_deref()
            .and_then(Path::parent)
            .map_or(cwd, Path::to_path_buf);
        config.config_path = config_path.map(|p| normalize_path(&p));
        config.set_root(&root);

        config.apply_env_from(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path, warning about unknown fields.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            let display_path = path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_else(|| path.to_string_lossy());
            log!("warning"; "unknown fields in {}: {}", display_path, ignored.join(", "));
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Set the directory relative paths resolve against.
    pub fn set_root(&mut self, path: &Path) {
        self.root = normalize_path(path);
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(raw) = lookup(ENV_VERBOSITY) {
            self.reload.verbosity = raw.trim().parse().map_err(|_| {
                ConfigError::Validation(format!("{ENV_VERBOSITY} must be an integer, got `{raw}`"))
            })?;
        }
        if let Some(root) = lookup(ENV_ROOT).filter(|r| !r.is_empty()) {
            self.reload.roots.push(PathBuf::from(root));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reload.verbosity > MAX_VERBOSITY {
            return Err(ConfigError::Validation(format!(
                "reload.verbosity must be between 0 and {MAX_VERBOSITY}, got {}",
                self.reload.verbosity
            )));
        }
        if self.watch.debounce_ms == 0 {
            return Err(ConfigError::Validation(
                "watch.debounce_ms must be greater than 0".into(),
            ));
        }
        if let Some(entry) = self.watch.entries.iter().find(|e| !is_module_name(e)) {
            return Err(ConfigError::Validation(format!(
                "watch.entries: `{entry}` is not a dotted module name"
            )));
        }
        Ok(())
    }

    /// Join a path with the root directory.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    /// Owned roots: configured roots plus non-excluded search-path entries,
    /// all resolved against the root directory.
    pub fn owned_roots(&self) -> OwnedRoots {
        let resolve = |paths: &[PathBuf]| -> Vec<PathBuf> {
            paths.iter().map(|p| self.root_join(p)).collect()
        };
        OwnedRoots::from_search_path(
            &resolve(&self.reload.roots),
            &resolve(&self.reload.search_path),
            &resolve(&self.reload.exclude),
        )
    }

    #[inline]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.watch.debounce_ms)
    }
}

fn is_module_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            part.chars().next().is_some_and(|c| c == '_' || c.is_alphabetic())
                && part.chars().all(|c| c == '_' || c.is_alphanumeric())
        })
}

/// Parse a config string in tests, failing on unknown fields.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ReloadConfig {
    let (parsed, ignored) = ReloadConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
