//! Utility modules.
//!
//! - [`path`]: Filesystem path normalization (`normalize_path`)

pub mod path;

pub use path::normalize_path;
