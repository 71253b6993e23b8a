//! `autoreload watch`: reload modules as their sources change.
//!
//! ```text
//! notify → Debouncer (timing, dedup) → Session::apply → autoreload → WatchStatus
//! ```
//!
//! The watcher is started before the priming cycle so no edit made while
//! the baselines are recorded is lost.

mod debouncer;


use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};

use anyhow::Result;
use notify::{RecursiveMode, Watcher};

use crate::config::ReloadConfig;
use crate::engine::{ReloadEngine, ReloadError};
use crate::filter::OwnedRoots;
use crate::logger::{self, status_detach, status_error, status_success, status_unchanged};
use crate::module::SourceTree;
use crate::utils::path::normalize_path;
use crate::{debug, log};

use debouncer::{ChangeKind, Changes, Debouncer};

/// Watch `root` until the watcher goes away.
///
/// `entries` overrides `watch.entries` from the config; with neither, every
/// module in the tree is checked each cycle.
pub fn run_watch(root: &Path, entries: &[String], config: ReloadConfig) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })?;

    let mut session = Session::new(root, entries.to_vec(), config)?;
    watcher.watch(session.tree.root(), RecursiveMode::Recursive)?;
    if let Some(dir) = session.config_dir()
        && !dir.starts_with(session.tree.root())
    {
        // Editors replace files on save; watch the directory, not the file.
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    }

    session.prime();
    log!(
        "watch";
        "watching {} ({} modules)",
        session.tree.root().display(),
        session.tree.len()
    );

    let mut debouncer = Debouncer::with_debounce(session.config.debounce());
    loop {
        match rx.recv_timeout(debouncer.sleep_duration()) {
            Ok(Ok(event)) => debouncer.add_event(&event),
            Ok(Err(err)) => log!("watch"; "notify error: {}", err),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if let Some(changes) = debouncer.take_if_ready() {
            session.apply(&changes).report();
            debouncer.set_debounce(session.config.debounce());
        }
    }
    Ok(())
}

// =============================================================================
// Session
// =============================================================================

/// Result of one reload cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Modules reloaded during the cycle, sorted.
    Reloaded(Vec<String>),
    Unchanged,
    Failed(ReloadError),
}

impl CycleOutcome {
    fn report(&self) {
        match self {
            Self::Reloaded(names) => {
                // Reload lines were printed since the last block.
                status_detach();
                status_success(&format!("reloaded {}", names.join(", ")));
            }
            Self::Unchanged => status_unchanged("no modules reloaded"),
            Self::Failed(err) => {
                status_detach();
                let detail = match err {
                    ReloadError::Reinitialize { source, .. } => format!("{source:#}"),
                };
                status_error(&err.to_string(), &detail);
            }
        }
    }
}

/// A scanned tree, its engine, and the config they were built from.
pub struct Session {
    tree: SourceTree,
    engine: ReloadEngine,
    config: ReloadConfig,
    entries: Vec<String>,
    /// Verbosity requested on the command line; config reloads never go below it.
    verbosity_floor: u8,
}

impl Session {
    pub fn new(root: &Path, entries: Vec<String>, config: ReloadConfig) -> Result<Self> {
        let tree = SourceTree::scan(root)?;
        let engine = ReloadEngine::new(owned_roots(&config, tree.root()));
        Ok(Self {
            tree,
            engine,
            config,
            entries,
            verbosity_floor: logger::verbosity(),
        })
    }

    pub fn tree(&self) -> &SourceTree {
        &self.tree
    }

    pub fn engine(&self) -> &ReloadEngine {
        &self.engine
    }

    /// Record mtime baselines for everything reachable from the targets.
    pub fn prime(&mut self) -> CycleOutcome {
        self.cycle()
    }

    /// React to a batch of debounced changes, then run a cycle.
    pub(super) fn apply(&mut self, changes: &Changes) -> CycleOutcome {
        if self.config_changed(changes) {
            self.reload_config();
        }

        if changes.values().any(|kind| *kind != ChangeKind::Modified) {
            let summary = self.tree.refresh();
            if !summary.is_empty() {
                // Cached child lists hold handles of removed modules and
                // miss newly created ones.
                self.engine.forget_dependencies();
                log!(
                    "watch";
                    "modules added: [{}], removed: [{}]",
                    summary.added.join(", "),
                    summary.removed.join(", ")
                );
                status_detach();
            }
        }

        self.cycle()
    }

    /// Autoreload every target once; the first failure ends the cycle.
    pub fn cycle(&mut self) -> CycleOutcome {
        let mark = self.engine.clock();

        for name in self.targets() {
            let Some(module) = self.tree.module(&name).cloned() else {
                debug!("watch"; "entry {} is not in the tree", name);
                continue;
            };
            if let Err(err) = self.engine.autoreload(&self.tree, module.as_ref(), false) {
                return CycleOutcome::Failed(err);
            }
        }

        let reloaded = self.engine.reloaded_after(mark);
        if reloaded.is_empty() {
            CycleOutcome::Unchanged
        } else {
            CycleOutcome::Reloaded(reloaded)
        }
    }

    fn targets(&self) -> Vec<String> {
        if !self.entries.is_empty() {
            self.entries.clone()
        } else if !self.config.watch.entries.is_empty() {
            self.config.watch.entries.clone()
        } else {
            self.tree.names()
        }
    }

    fn config_dir(&self) -> Option<PathBuf> {
        let path = self.config.config_path.as_deref()?;
        path.parent().map(Path::to_path_buf)
    }

    fn config_changed(&self, changes: &Changes) -> bool {
        self.config
            .config_path
            .as_deref()
            .is_some_and(|path| changes.contains_key(&normalize_path(path)))
    }

    /// Re-read the config file and move the engine state onto an engine
    /// built from it. A broken config keeps the current one.
    fn reload_config(&mut self) {
        let path = self.config.config_path.clone();
        match ReloadConfig::load(path.as_deref()) {
            Ok(config) => {
                logger::set_verbosity(config.reload.verbosity.max(self.verbosity_floor));

                let state = self.engine.take_state();
                self.engine = ReloadEngine::new(owned_roots(&config, self.tree.root()));
                self.engine.restore(state);
                self.config = config;

                log!("watch"; "config reloaded");
                status_detach();
            }
            Err(err) => {
                log!("error"; "config not reloaded: {:#}", err);
                status_detach();
            }
        }
    }
}

/// Configured owned roots plus the watched tree itself.
fn owned_roots(config: &ReloadConfig, tree_root: &Path) -> OwnedRoots {
    let mut roots = config.owned_roots();
    roots.push(tree_root);
    roots
}
