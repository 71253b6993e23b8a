//! Module capability interface.
//!
//! A module is owned by the host runtime; the engine only sees it through
//! [`Module`]. Identity is the dotted name: the object behind a name may
//! change contents on reload, but the name never does.
//!
//! ```text
//! ModuleTable (host)            ReloadEngine
//! ├── "pkg"        ──────────►  children_of / is_stale / reload
//! ├── "pkg.core"
//! └── "pkg.gui"
//! ```

mod tree;

use std::any::Any;
use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashMap;

pub use tree::{RefreshSummary, SourceModule, SourceTree};

/// Shared handle to a loaded module.
pub type ModuleRef = Arc<dyn Module>;

/// Opaque state captured by [`Module::before_reload`].
pub type Snapshot = Box<dyn Any + Send>;

/// A named, reloadable unit of code.
///
/// Only `name` and `reinitialize` are required; everything else has a
/// no-op default.
pub trait Module: Send + Sync {
    /// Dotted name, the identity key.
    fn name(&self) -> &str;

    /// File the module was loaded from, if any (may be a compiled artifact).
    fn file(&self) -> Option<&Path> {
        None
    }

    /// Package used to resolve relative names. Equal to `name` for packages.
    fn package(&self) -> Option<&str> {
        None
    }

    /// Extra dependency names to track even if discovery cannot see them.
    /// May be relative to this module.
    fn also_reload(&self) -> Vec<String> {
        Vec::new()
    }

    /// Called before reinitialization; the result is handed to `after_reload`.
    fn before_reload(&self) -> Option<Snapshot> {
        None
    }

    /// Called after a successful reinitialization.
    fn after_reload(&self, _state: Option<Snapshot>) {}

    /// Reinitialize the module from its current source.
    fn reinitialize(&self) -> anyhow::Result<()>;
}

/// The set of currently loaded modules, by name.
pub trait ModuleTable {
    fn get(&self, name: &str) -> Option<ModuleRef>;
}

impl ModuleTable for FxHashMap<String, ModuleRef> {
    fn get(&self, name: &str) -> Option<ModuleRef> {
        FxHashMap::get(self, name).cloned()
    }
}

// =============================================================================
// Test support
// =============================================================================

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Shared event log, e.g. `["before:a", "reinit:a", "after:a:7"]`.
    pub type Events = Arc<Mutex<Vec<String>>>;

    /// In-memory module that records every hook invocation.
    pub struct RecordingModule {
        pub name: String,
        pub file: Option<PathBuf>,
        pub package: Option<String>,
        pub also: Vec<String>,
        pub hooks: bool,
        pub fail: AtomicBool,
        pub events: Events,
    }

    impl RecordingModule {
        pub fn new(name: &str, events: &Events) -> Self {
            Self {
                name: name.to_string(),
                file: None,
                package: name.rsplit_once('.').map(|(parent, _)| parent.to_string()),
                also: Vec::new(),
                hooks: false,
                fail: AtomicBool::new(false),
                events: events.clone(),
            }
        }

        pub fn with_file(mut self, file: PathBuf) -> Self {
            self.file = Some(file);
            self
        }

        pub fn with_also(mut self, names: &[&str]) -> Self {
            self.also = names.iter().map(|s| s.to_string()).collect();
            self
        }

        pub fn with_hooks(mut self) -> Self {
            self.hooks = true;
            self
        }

        pub fn failing(self) -> Self {
            self.fail.store(true, Ordering::SeqCst);
            self
        }
    }

    impl Module for RecordingModule {
        fn name(&self) -> &str {
            &self.name
        }

        fn file(&self) -> Option<&Path> {
            self.file.as_deref()
        }

        fn package(&self) -> Option<&str> {
            self.package.as_deref()
        }

        fn also_reload(&self) -> Vec<String> {
            self.also.clone()
        }

        fn before_reload(&self) -> Option<Snapshot> {
            if !self.hooks {
                return None;
            }
            self.events.lock().push(format!("before:{}", self.name));
            Some(Box::new(self.name.len()))
        }

        fn after_reload(&self, state: Option<Snapshot>) {
            if !self.hooks {
                return;
            }
            let value = state
                .and_then(|s| s.downcast::<usize>().ok())
                .map_or_else(|| "none".to_string(), |v| v.to_string());
            self.events.lock().push(format!("after:{}:{}", self.name, value));
        }

        fn reinitialize(&self) -> anyhow::Result<()> {
            self.events.lock().push(format!("reinit:{}", self.name));
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("{} failed to initialize", self.name);
            }
            Ok(())
        }
    }

    /// Build a module table from recording modules.
    pub fn table(modules: Vec<RecordingModule>) -> FxHashMap<String, ModuleRef> {
        modules
            .into_iter()
            .map(|m| (m.name.clone(), Arc::new(m) as ModuleRef))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_table_lookup_by_name() {
        let events = Events::default();
        let modules = table(vec![RecordingModule::new("pkg.core", &events)]);

        let found = ModuleTable::get(&modules, "pkg.core").unwrap();
        assert_eq!(found.name(), "pkg.core");
        assert_eq!(found.package(), Some("pkg"));
        assert!(ModuleTable::get(&modules, "pkg.gui").is_none());
    }

    #[test]
    fn test_default_hooks_are_noops() {
        struct Bare;
        impl Module for Bare {
            fn name(&self) -> &str {
                "bare"
            }
            fn reinitialize(&self) -> anyhow::Result<()> {
                Ok(())
            }
        }

        let bare = Bare;
        assert!(bare.file().is_none());
        assert!(bare.package().is_none());
        assert!(bare.also_reload().is_empty());
        assert!(bare.before_reload().is_none());
        bare.after_reload(None);
    }
}
