//! Import graph of a source tree, rendered as Graphviz DOT.
//!
//! ```text
//! digraph "src" {
//!     "pkg" [style=filled]
//!     "pkg.views" -> "pkg.models" [constraint=false]
//!     "pkg" -> "pkg.extra" [style=dotted]
//!     {rank=same; "pkg"}
//!     {rank=same; "pkg.extra" "pkg.models" "pkg.views"}
//! }
//! ```
//!
//! Only edges between modules found under the root are kept. An import of
//! one's own ancestor package is implied by the nesting and not drawn.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::debug;
use crate::discovery::{Discovery, DiscoveryMode, discover_file};
use crate::module::{Module, SourceTree};
use crate::resolve::resolve_relative_name;
use crate::source::PACKAGE_INIT;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Node {
    is_package: bool,
    /// Resolved imports that name other modules in the graph, in source order.
    imports: Vec<String>,
}

/// Modules under a root and the imports between them.
#[derive(Debug, Clone)]
pub struct ImportGraph {
    root: PathBuf,
    nodes: BTreeMap<String, Node>,
}

impl ImportGraph {
    /// Parse every source file under `root`.
    pub fn scan(root: &Path, mode: DiscoveryMode) -> Result<Self> {
        let tree = SourceTree::scan(root)?;
        let mut nodes = BTreeMap::new();

        for name in tree.names() {
            let Some(module) = tree.module(&name) else {
                continue;
            };
            let path = module.path();
            let imports = match discover_file(path, mode) {
                Discovery::Parsed(names) => names,
                Discovery::Failed(err) => {
                    debug!("graph"; "cannot parse {}: {}", path.display(), err);
                    Vec::new()
                }
            };

            let package = module.package().unwrap_or("");
            let imports = imports
                .iter()
                .filter_map(|raw| resolve_relative_name(package, &name, raw).ok())
                .collect();

            let is_package = path.file_name().is_some_and(|f| f == PACKAGE_INIT);
            nodes.insert(name, Node { is_package, imports });
        }

        // Keep only edges inside the tree, first occurrence of each.
        let known: Vec<String> = nodes.keys().cloned().collect();
        for node in nodes.values_mut() {
            let mut kept: Vec<String> = Vec::new();
            for import in node.imports.drain(..) {
                if known.binary_search(&import).is_ok() && !kept.contains(&import) {
                    kept.push(import);
                }
            }
            node.imports = kept;
        }

        Ok(Self {
            root: tree.root().to_path_buf(),
            nodes,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Module names, sorted.
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// In-tree imports of `module`.
    pub fn imports(&self, module: &str) -> &[String] {
        self.nodes.get(module).map_or(&[], |n| n.imports.as_slice())
    }

    /// Render as a DOT digraph. Output is deterministic.
    pub fn render_dot(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "digraph \"{}\" {{", self.root.display());

        let mut levels: Vec<Vec<&str>> = Vec::new();
        for (module, node) in &self.nodes {
            let level = depth(module);
            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(module);

            if node.is_package {
                let _ = writeln!(out, "\t\"{module}\" [style=filled]");
            }

            for import in &node.imports {
                if is_ancestor(import, module) {
                    continue;
                }
                if depth(module) >= depth(import) {
                    let _ = writeln!(out, "\t\"{module}\" -> \"{import}\" [constraint=false]");
                } else {
                    let _ = writeln!(out, "\t\"{module}\" -> \"{import}\"");
                }
            }
        }

        // Membership edges not already drawn as imports.
        for (module, node) in &self.nodes {
            let Some((parent, _)) = module.rsplit_once('.') else {
                continue;
            };
            let Some(parent_node) = self.nodes.get(parent) else {
                continue;
            };
            let already = node.imports.iter().any(|i| i == parent)
                || parent_node.imports.iter().any(|i| i == module);
            if !already {
                let _ = writeln!(out, "\t\"{parent}\" -> \"{module}\" [style=dotted]");
            }
        }

        for modules in levels.iter().filter(|m| !m.is_empty()) {
            let quoted: Vec<String> = modules.iter().map(|m| format!("\"{m}\"")).collect();
            let _ = writeln!(out, "\t{{rank=same; {}}}", quoted.join(" "));
        }

        out.push_str("}\n");
        out
    }
}

fn depth(module: &str) -> usize {
    module.matches('.').count()
}

/// Is `candidate` equal to `module` or one of its enclosing packages?
fn is_ancestor(candidate: &str, module: &str) -> bool {
    module == candidate
        || module
            .strip_prefix(candidate)
            .is_some_and(|rest| rest.starts_with('.'))
}
