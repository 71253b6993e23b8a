//! Command-line interface module.

mod args;
pub mod graph;
pub mod imports;
pub mod watch;

pub use args::{Cli, Commands, ImportsArgs};
