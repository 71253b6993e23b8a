//! Dependency discovery and its per-module cache.
//!
//! The child list of a module is the set of loaded, owned modules its
//! top-level imports might refer to, plus whatever it declares through
//! [`Module::also_reload`]. It over-approximates the real dependencies and
//! may contain cycles.
//!
//! ```text
//! source ─► discover_file ─► resolve_relative_name ─► loaded? ─► owned? ─┐
//!                                                                        ├─► dedupe ─► children
//! also_reload ─────────────► (as given, then resolved) ──────────────────┘
//! ```

use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::discovery::{Discovery, DiscoveryMode, discover_file};
use crate::filter::OwnedRoots;
use crate::module::{Module, ModuleRef, ModuleTable};
use crate::resolve::resolve_relative_name;
use crate::source::{package_root, source_path};
use crate::{debug, trace};

// =============================================================================
// Cache
// =============================================================================

/// Memoized child lists keyed by module name.
///
/// An entry lives until its module is reloaded; entries of the modules that
/// depend on it are left alone.
#[derive(Default)]
pub struct DependencyCache {
    entries: FxHashMap<String, Vec<ModuleRef>>,
}

impl DependencyCache {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&[ModuleRef]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn insert(&mut self, name: &str, children: Vec<ModuleRef>) {
        self.entries.insert(name.to_string(), children);
    }

    /// Drop the entry for `name`. Returns whether there was one.
    pub fn invalidate(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fold `other` in. Entries already present here win.
    pub fn merge(&mut self, other: DependencyCache) {
        for (name, children) in other.entries {
            self.entries.entry(name).or_insert(children);
        }
    }
}

impl std::fmt::Debug for DependencyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (name, children) in &self.entries {
            let names: Vec<&str> = children.iter().map(|c| c.name()).collect();
            map.entry(name, &names);
        }
        map.finish()
    }
}

// =============================================================================
// Discovery
// =============================================================================

/// Compute the child list of `module` without consulting any cache.
pub fn discover_children(
    modules: &dyn ModuleTable,
    module: &dyn Module,
    roots: &OwnedRoots,
) -> Vec<ModuleRef> {
    let name = module.name();
    let package = module.package().unwrap_or("");
    let mut candidates = Vec::new();

    if let Some(path) = source_path(module) {
        let discovered = top_level_imports(&path, package, name);
        let extra_root = package_root(&path);

        for candidate in discovered {
            let Some(found) = modules.get(&candidate) else {
                continue;
            };
            let Some(found_path) = source_path(found.as_ref()) else {
                continue;
            };
            if roots.contains_with(&found_path, Some(&extra_root)) {
                candidates.push(candidate);
            }
        }
    }

    // Declared names are tried verbatim and resolved against this module.
    for declared in module.also_reload() {
        if declared.is_empty() {
            continue;
        }
        if let Ok(resolved) = resolve_relative_name(package, name, &declared)
            && resolved != declared
        {
            candidates.push(declared);
            candidates.push(resolved);
        } else {
            candidates.push(declared);
        }
    }

    let mut seen = FxHashSet::default();
    let children: Vec<ModuleRef> = candidates
        .into_iter()
        .filter(|candidate| candidate != name && seen.insert(candidate.clone()))
        .filter_map(|candidate| modules.get(&candidate))
        .collect();

    if crate::logger::is_verbose(2) {
        let names: Vec<&str> = children.iter().map(|c| c.name()).collect();
        trace!("deps"; "dependencies of {}: [{}]", name, names.join(", "));
    }
    children
}

/// Resolved top-level import names of a source file. Parse failures and
/// unresolvable relative names are dropped with a diagnostic.
fn top_level_imports(path: &Path, package: &str, module: &str) -> Vec<String> {
    let discovered = match discover_file(path, DiscoveryMode::TopLevel) {
        Discovery::Parsed(names) => names,
        Discovery::Failed(err) => {
            debug!("deps"; "cannot parse {}: {}", path.display(), err);
            return Vec::new();
        }
    };

    trace!("deps"; "top-level imports of {}: [{}]", module, discovered.join(", "));

    discovered
        .iter()
        .filter_map(|raw| match resolve_relative_name(package, module, raw) {
            Ok(resolved) => Some(resolved),
            Err(err) => {
                debug!("deps"; "{}", err);
                None
            }
        })
        .collect()
}
