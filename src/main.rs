//! autoreload - reload only the modules whose sources changed.

use anyhow::Result;
use autoreload::cli::{self, Cli, Commands};
use autoreload::config::ReloadConfig;
use autoreload::logger;
use clap::{ColorChoice, Parser};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    // Verbosity from the command line wins until the config says more.
    logger::set_verbosity(cli.verbose);
    let config = ReloadConfig::load(cli.config.as_deref())?;
    logger::set_verbosity(cli.verbose.max(config.reload.verbosity));

    match &cli.command {
        Commands::Imports { args } => cli::imports::run_imports(args),
        Commands::Graph { root, deep } => cli::graph::run_graph(root, *deep),
        Commands::Watch { root, entries } => cli::watch::run_watch(root, entries, config),
    }
}
