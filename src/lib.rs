//! Incremental module reloading.
//!
//! Given a table of loaded modules, [`ReloadEngine`] finds the ones whose
//! source changed on disk and reinitializes them in dependency order:
//! children first, then every module that imports something reloaded in the
//! same pass. Only modules under the owned roots are considered, so a change
//! in installed third-party code never cascades.
//!
//! ```ignore
//! use autoreload::{OwnedRoots, ReloadEngine, SourceTree};
//!
//! let tree = SourceTree::scan(Path::new("src"))?;
//! let mut engine = ReloadEngine::new(OwnedRoots::new([tree.root().to_path_buf()]));
//! let app = tree.module("app").cloned().unwrap();
//!
//! engine.autoreload(&tree, app.as_ref(), false)?; // records baselines
//! // ... edit src/models.py ...
//! engine.autoreload(&tree, app.as_ref(), false)?; // reloads models, then app
//! ```

pub mod logger;

pub mod cli;
pub mod config;
pub mod deps;
pub mod discovery;
pub mod engine;
pub mod filter;
pub mod freshness;
pub mod graph;
pub mod module;
pub mod resolve;
pub mod source;
pub mod utils;

pub use deps::{DependencyCache, discover_children};
pub use discovery::{Discovery, DiscoveryMode, SyntaxError, discover_file, discover_imports};
pub use engine::{EngineState, ReloadEngine, ReloadError};
pub use filter::{OwnedRoots, owned};
pub use freshness::{LogicalTime, MtimeTable, ReloadTimes};
pub use graph::ImportGraph;
pub use module::{Module, ModuleRef, ModuleTable, Snapshot, SourceModule, SourceTree};
pub use resolve::{ResolveError, resolve_relative_name};
pub use source::{ModuleSpec, module_spec_for_path, source_path};
