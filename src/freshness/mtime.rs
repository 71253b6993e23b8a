//! Mtime-based staleness for source files.
//!
//! Checking a file is an observation: the baseline is updated every time,
//! so a change is reported exactly once.
//!
//! ```text
//! observe(a.py)   first sighting   → false  (baseline recorded)
//! observe(a.py)   unchanged        → false
//! <edit a.py>
//! observe(a.py)   newer mtime      → true   (baseline moved)
//! observe(a.py)   unchanged        → false
//! ```

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use rustc_hash::FxHashMap;

/// Get the modification time of a file
///
/// Returns `None` if the file doesn't exist or mtime cannot be read
pub fn get_mtime(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}

/// Last-observed modification time per source path.
#[derive(Debug, Clone, Default)]
pub struct MtimeTable {
    seen: FxHashMap<PathBuf, SystemTime>,
}

impl MtimeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current mtime of `path` and report whether it moved forward.
    ///
    /// The first observation of a path is never stale. A path whose mtime
    /// cannot be read is left untouched and reported as not stale.
    pub fn observe(&mut self, path: &Path) -> bool {
        let Some(modified) = get_mtime(path) else {
            return false;
        };
        match self.seen.insert(path.to_path_buf(), modified) {
            Some(previous) => previous < modified,
            None => false,
        }
    }

    /// Move the baseline to the current mtime without reporting.
    pub fn refresh(&mut self, path: &Path) {
        if let Some(modified) = get_mtime(path) {
            self.seen.insert(path.to_path_buf(), modified);
        }
    }

    pub fn last_seen(&self, path: &Path) -> Option<SystemTime> {
        self.seen.get(path).copied()
    }

    pub fn forget(&mut self, path: &Path) {
        self.seen.remove(path);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Fold `other` in. Entries already present here win.
    pub fn merge(&mut self, other: MtimeTable) {
        for (path, modified) in other.seen {
            self.seen.entry(path).or_insert(modified);
        }
    }
}
