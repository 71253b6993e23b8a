//! `[reload]` and `[watch]` sections.
//!
//! # Example
//!
//! ```toml
//! [reload]
//! verbosity = 1                   # 0 = reloads only, 1 = traversal, 2 = discovery
//! roots = ["src"]                 # Owned roots, relative to this file
//! search_path = ["vendor"]        # Extra import-path entries
//! exclude = ["/usr/lib/python3"]  # Search-path prefixes that are never owned
//!
//! [watch]
//! debounce_ms = 300               # Quiet period before a reload cycle
//! entries = ["app.main"]          # Modules to autoreload; empty = all
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Highest meaningful verbosity level.
pub const MAX_VERBOSITY: u8 = 2;

/// Engine settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReloadSection {
    pub verbosity: u8,

    /// Directories whose modules may be reloaded.
    pub roots: Vec<PathBuf>,

    /// Additional import-path entries. Owned unless excluded.
    pub search_path: Vec<PathBuf>,

    /// Prefixes of `search_path` entries to leave alone (standard library).
    /// `site-packages` directories below them are still owned.
    pub exclude: Vec<PathBuf>,
}

/// Watch-mode settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSection {
    pub debounce_ms: u64,
    pub entries: Vec<String>,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            entries: Vec::new(),
        }
    }
}
