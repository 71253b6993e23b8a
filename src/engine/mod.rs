//! The reload engine.
//!
//! Walks the discovered dependency graph depth first and reinitializes
//! modules whose source, or any dependency's source, changed:
//!
//! ```text
//! autoreload(app)
//! ├── autoreload(app.models)        ← source changed: reload
//! │   └── autoreload(app.db)        ← unchanged: skip
//! ├── autoreload(app.views)
//! │   └── autoreload(app.models)    ← already visited
//! └── app                           ← a dependency reloaded: reload
//! ```
//!
//! Each top-level call carries a visited set, so every module is processed
//! at most once per call even when discovery reports cycles.

mod state;

use thiserror::Error;

use rustc_hash::FxHashSet;

use crate::deps::{DependencyCache, discover_children};
use crate::filter::OwnedRoots;
use crate::freshness::{LogicalTime, MtimeTable, ReloadTimes};
use crate::module::{Module, ModuleRef, ModuleTable};
use crate::source::source_path;
use crate::{debug, log, trace};

pub use state::EngineState;

/// Reinitialization of a module failed.
///
/// The module stays registered in whatever state the failed attempt left it.
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("failed to reload `{module}`")]
    Reinitialize {
        module: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ReloadError {
    /// Name of the module that failed.
    pub fn module(&self) -> &str {
        match self {
            Self::Reinitialize { module, .. } => module,
        }
    }
}

/// Owns the dependency cache, the mtime baselines and the reload clock.
///
/// Not thread-safe by construction: every operation takes `&mut self`.
#[derive(Debug, Default)]
pub struct ReloadEngine {
    roots: OwnedRoots,
    deps: DependencyCache,
    mtimes: MtimeTable,
    times: ReloadTimes,
}

impl ReloadEngine {
    pub fn new(roots: OwnedRoots) -> Self {
        Self {
            roots,
            ..Self::default()
        }
    }

    #[inline]
    pub fn roots(&self) -> &OwnedRoots {
        &self.roots
    }

    /// Replace the owned roots. Cached dependency lists are dropped since
    /// they were filtered against the old roots.
    pub fn set_roots(&mut self, roots: OwnedRoots) {
        if roots != self.roots {
            self.roots = roots;
            self.deps.clear();
        }
    }

    /// Drop every cached dependency list, e.g. after modules were added to
    /// or removed from the table.
    pub fn forget_dependencies(&mut self) {
        self.deps.clear();
    }

    // =========================================================================
    // Graph
    // =========================================================================

    /// Direct dependencies of `module`, discovered once and cached until the
    /// module is reloaded.
    pub fn children_of(&mut self, modules: &dyn ModuleTable, module: &dyn Module) -> Vec<ModuleRef> {
        if let Some(children) = self.deps.get(module.name()) {
            return children.to_vec();
        }
        let children = discover_children(modules, module, &self.roots);
        self.deps.insert(module.name(), children.clone());
        children
    }

    // =========================================================================
    // Staleness
    // =========================================================================

    /// Has the module's source changed since it was last checked?
    ///
    /// This is an observation: the baseline moves to the current mtime, so
    /// a second call without an intervening change returns `false`. Modules
    /// without source are never stale by this check.
    pub fn is_stale(&mut self, module: &dyn Module) -> bool {
        source_path(module).is_some_and(|path| self.mtimes.observe(&path))
    }

    /// Is the module, or with `recursive` anything it depends on, stale?
    ///
    /// Dependencies are checked before the module itself and the walk stops
    /// at the first stale one. Reload times are left untouched.
    pub fn is_outdated(
        &mut self,
        modules: &dyn ModuleTable,
        module: &dyn Module,
        recursive: bool,
    ) -> bool {
        if !recursive {
            return self.is_stale(module);
        }
        let mut visited = FxHashSet::default();
        self.outdated_chain(modules, module, &mut visited)
    }

    fn outdated_chain(
        &mut self,
        modules: &dyn ModuleTable,
        module: &dyn Module,
        visited: &mut FxHashSet<String>,
    ) -> bool {
        if !visited.insert(module.name().to_string()) {
            return false;
        }
        for child in self.children_of(modules, module) {
            if self.outdated_chain(modules, child.as_ref(), visited) {
                return true;
            }
        }
        self.is_stale(module)
    }

    // =========================================================================
    // Reload
    // =========================================================================

    /// Reinitialize one module, running its hooks around the reload.
    ///
    /// Not recursive; dependents catch up on their next [`autoreload`](Self::autoreload).
    pub fn reload(&mut self, module: &dyn Module) -> Result<(), ReloadError> {
        let at = self.times.tick();
        self.reload_at(module, at)
    }

    fn reload_at(&mut self, module: &dyn Module, at: LogicalTime) -> Result<(), ReloadError> {
        let name = module.name();
        log!("reload"; "reloading {}", name);

        let state = module.before_reload();

        // Dropped first so a failed attempt still re-discovers on retry.
        self.deps.invalidate(name);

        module
            .reinitialize()
            .map_err(|source| ReloadError::Reinitialize {
                module: name.to_string(),
                source,
            })?;

        self.times.record(name, at);
        if let Some(path) = source_path(module) {
            self.mtimes.refresh(&path);
        }

        module.after_reload(state);
        Ok(())
    }

    /// Reload `module` if it or anything it depends on changed.
    ///
    /// Returns whether `module` was reloaded. With `force_self` the module is
    /// reloaded regardless; its dependencies are still only reloaded when
    /// needed. The first reinitialization error aborts the walk.
    pub fn autoreload(
        &mut self,
        modules: &dyn ModuleTable,
        module: &dyn Module,
        force_self: bool,
    ) -> Result<bool, ReloadError> {
        let at = self.times.tick();
        let mut visited = FxHashSet::default();
        debug!("autoreload"; "{}", module.name());
        self.autoreload_at(modules, module, force_self, &mut visited, 0, at)
    }

    fn autoreload_at(
        &mut self,
        modules: &dyn ModuleTable,
        module: &dyn Module,
        force_self: bool,
        visited: &mut FxHashSet<String>,
        depth: usize,
        at: LogicalTime,
    ) -> Result<bool, ReloadError> {
        let name = module.name();
        if !visited.insert(name.to_string()) {
            return Ok(false);
        }

        debug!("autoreload"; "-->{} {}", "  ".repeat(depth), name);

        let my_time = self.times.get(name);
        if let Some(time) = my_time {
            debug!("autoreload"; "{} last reloaded at {}", name, time);
        }

        let mut dependency_reloaded = false;
        for child in self.children_of(modules, module) {
            dependency_reloaded |=
                self.autoreload_at(modules, child.as_ref(), false, visited, depth + 1, at)?;

            // A dependency reloaded in an earlier call still counts.
            if !dependency_reloaded
                && let Some(child_time) = self.times.get(child.name())
                && my_time.is_none_or(|mine| child_time > mine)
            {
                trace!("autoreload"; "dependency {} of {} was previously reloaded", child.name(), name);
                dependency_reloaded = true;
            }
        }

        // Always observed, so the baseline stays current even when the
        // reload is forced or propagated.
        let stale = self.is_stale(module);

        if force_self || dependency_reloaded || stale {
            self.reload_at(module, at)?;
            return Ok(true);
        }
        Ok(false)
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Logical time of the module's last successful reload.
    pub fn last_reload(&self, name: &str) -> Option<LogicalTime> {
        self.times.get(name)
    }

    /// Latest time on the reload clock.
    pub fn clock(&self) -> Option<LogicalTime> {
        self.times.now()
    }

    /// Modules reloaded at or after `at`, sorted by name.
    pub fn reloaded_since(&self, at: LogicalTime) -> Vec<String> {
        self.times.since(at)
    }

    /// Modules reloaded after `mark`, typically a [`clock`](Self::clock)
    /// reading taken before a batch of calls.
    pub fn reloaded_after(&self, mark: Option<LogicalTime>) -> Vec<String> {
        self.times.after(mark)
    }

    // =========================================================================
    // State hand-off
    // =========================================================================

    /// Move all memoization out, leaving this engine empty (roots kept).
    pub fn take_state(&mut self) -> EngineState {
        EngineState {
            roots: self.roots.clone(),
            deps: std::mem::take(&mut self.deps),
            mtimes: std::mem::take(&mut self.mtimes),
            times: std::mem::take(&mut self.times),
        }
    }

    /// Merge a previous engine's memoization into this one.
    ///
    /// Entries this engine already has win. Dependency lists are only
    /// carried over when both engines own the same roots.
    pub fn restore(&mut self, state: EngineState) {
        self.mtimes.merge(state.mtimes);
        self.times.merge(state.times);
        if state.roots == self.roots {
            self.deps.merge(state.deps);
        }
    }
}
