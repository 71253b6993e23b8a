//! Hand-off of engine memoization between engine instances.
//!
//! Reconfiguring (new owned roots, reloaded config) builds a fresh engine;
//! the old one's tables move over so staleness tracking does not restart
//! from zero.

use crate::deps::DependencyCache;
use crate::filter::OwnedRoots;
use crate::freshness::{MtimeTable, ReloadTimes};

/// Everything an engine remembers between calls.
#[derive(Debug, Default)]
pub struct EngineState {
    pub(super) roots: OwnedRoots,
    pub(super) deps: DependencyCache,
    pub(super) mtimes: MtimeTable,
    pub(super) times: ReloadTimes,
}

impl EngineState {
    pub fn roots(&self) -> &OwnedRoots {
        &self.roots
    }

    pub fn mtimes(&self) -> &MtimeTable {
        &self.mtimes
    }

    pub fn reload_times(&self) -> &ReloadTimes {
        &self.times
    }

    /// Number of cached dependency lists.
    pub fn cached_dependencies(&self) -> usize {
        self.deps.len()
    }
}
