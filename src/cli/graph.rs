//! `autoreload graph`: DOT import graph of a source tree.

use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;

use crate::debug;
use crate::discovery::DiscoveryMode;
use crate::graph::ImportGraph;

pub fn run_graph(root: &Path, deep: bool) -> Result<()> {
    let mode = if deep {
        DiscoveryMode::Deep
    } else {
        DiscoveryMode::TopLevel
    };

    let graph = ImportGraph::scan(root, mode)?;
    debug!("graph"; "{} modules under {}", graph.modules().count(), graph.root().display());

    let mut out = io::stdout().lock();
    out.write_all(graph.render_dot().as_bytes())?;
    out.flush()?;
    Ok(())
}
