//! File-backed modules: every `.py` file under a root is one module.
//!
//! Reinitialization re-reads the file; nothing is executed. This is the
//! host used by the `watch` command and by the engine's integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use jwalk::WalkDir;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::{Module, ModuleRef, ModuleTable};
use crate::discovery::declared_also_reload;
use crate::source::{ModuleSpec, SOURCE_EXTENSION, module_spec_for_path};

// =============================================================================
// SourceModule
// =============================================================================

/// A module backed by a single source file.
#[derive(Debug)]
pub struct SourceModule {
    name: String,
    file: PathBuf,
    package: Option<String>,
    /// `__also_reload__` names declared in the source.
    also: Mutex<Vec<String>>,
    /// Number of successful reinitializations.
    generation: AtomicU64,
}

impl SourceModule {
    pub fn new(spec: ModuleSpec, file: PathBuf) -> Self {
        let also = fs::read_to_string(&file)
            .map(|source| declared_also_reload(&source))
            .unwrap_or_default();

        Self {
            name: spec.name,
            file,
            package: spec.package,
            also: Mutex::new(also),
            generation: AtomicU64::new(0),
        }
    }

    /// Load a module from a path, deriving its name from the package layout.
    pub fn from_path(path: &Path) -> Option<Self> {
        let spec = module_spec_for_path(path)?;
        Some(Self::new(spec, path.to_path_buf()))
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.file
    }
}

impl Module for SourceModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn file(&self) -> Option<&Path> {
        Some(&self.file)
    }

    fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    fn also_reload(&self) -> Vec<String> {
        self.also.lock().clone()
    }

    fn reinitialize(&self) -> Result<()> {
        let source = fs::read_to_string(&self.file)
            .with_context(|| format!("failed to read `{}`", self.file.display()))?;

        *self.also.lock() = declared_also_reload(&source);
        self.generation.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// SourceTree
// =============================================================================

/// Result of [`SourceTree::refresh`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl RefreshSummary {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// All source modules found under a root directory.
#[derive(Debug)]
pub struct SourceTree {
    root: PathBuf,
    modules: FxHashMap<String, Arc<SourceModule>>,
}

impl SourceTree {
    /// Scan `root` for source files.
    pub fn scan(root: &Path) -> Result<Self> {
        let root = crate::utils::path::normalize_path(root);
        if !root.is_dir() {
            anyhow::bail!("`{}` is not a directory", root.display());
        }

        let mut tree = Self {
            root,
            modules: FxHashMap::default(),
        };
        tree.refresh();
        Ok(tree)
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Pick up created files and drop deleted ones.
    ///
    /// Modules that still exist keep their handle, so anything holding a
    /// [`ModuleRef`] keeps pointing at the live module.
    pub fn refresh(&mut self) -> RefreshSummary {
        let found = collect_sources(&self.root);
        let mut summary = RefreshSummary::default();

        self.modules.retain(|name, module| {
            let keep = found
                .get(name)
                .is_some_and(|(_, path)| path == module.path());
            if !keep {
                summary.removed.push(name.clone());
            }
            keep
        });

        for (name, (spec, path)) in found {
            if self.modules.contains_key(&name) {
                continue;
            }
            self.modules
                .insert(name.clone(), Arc::new(SourceModule::new(spec, path)));
            summary.added.push(name);
        }

        summary.added.sort();
        summary.removed.sort();
        crate::debug!("scan"; "{} modules under {} (+{} -{})",
            self.modules.len(), self.root.display(), summary.added.len(), summary.removed.len());
        summary
    }

    /// Module names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.modules.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn module(&self, name: &str) -> Option<&Arc<SourceModule>> {
        self.modules.get(name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleTable for SourceTree {
    fn get(&self, name: &str) -> Option<ModuleRef> {
        self.modules.get(name).map(|m| m.clone() as ModuleRef)
    }
}

/// Walk `root` for source files, skipping hidden and cache directories.
fn collect_sources(root: &Path) -> FxHashMap<String, (ModuleSpec, PathBuf)> {
    let mut found = FxHashMap::default();

    let files = WalkDir::new(root)
        .sort(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path());

    for path in files {
        if path.extension().and_then(|e| e.to_str()) != Some(SOURCE_EXTENSION) {
            continue;
        }
        if is_ignored(root, &path) {
            continue;
        }
        let Some(spec) = module_spec_for_path(&path) else {
            continue;
        };
        // First path wins if two files claim the same name.
        found.entry(spec.name.clone()).or_insert((spec, path));
    }

    found
}

/// Hidden and bytecode-cache directories never hold importable modules.
fn is_ignored(root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let Some(dir) = relative.parent() else {
        return false;
    };
    dir.components().any(|c| {
        let name = c.as_os_str().to_string_lossy();
        name.starts_with('.') || name == "__pycache__"
    })
}
