//! Command-line interface definitions.

use clap::{ArgAction, ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Reload modules whose sources changed, dependencies first
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Increase diagnostic output (-v traversal, -vv discovery)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Config file path (default: search upward for autoreload.toml)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the imports discovered in a source file
    #[command(visible_alias = "i")]
    Imports {
        #[command(flatten)]
        args: ImportsArgs,
    },

    /// Print the import graph of a source tree as Graphviz DOT
    #[command(visible_alias = "g")]
    Graph {
        /// Directory to scan
        #[arg(value_hint = clap::ValueHint::DirPath)]
        root: PathBuf,

        /// Include imports nested in functions and blocks
        #[arg(short, long)]
        deep: bool,
    },

    /// Watch a source tree and reload changed modules
    #[command(visible_alias = "w")]
    Watch {
        /// Directory to scan and watch
        #[arg(value_hint = clap::ValueHint::DirPath)]
        root: PathBuf,

        /// Module to autoreload each cycle (repeatable; default: all)
        #[arg(short, long = "entry", value_name = "NAME")]
        entries: Vec<String>,
    },
}

/// Imports command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct ImportsArgs {
    /// Source file to inspect
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// Include imports nested in functions and blocks
    #[arg(short, long)]
    pub deep: bool,

    /// Dotted name of the module, for resolving relative imports
    #[arg(short, long, value_name = "NAME")]
    pub module: Option<String>,

    /// Package of the module (default: derived from --module)
    #[arg(short, long, value_name = "NAME")]
    pub package: Option<String>,
}

impl Commands {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Imports { .. } => "imports",
            Self::Graph { .. } => "graph",
            Self::Watch { .. } => "watch",
        }
    }
}
