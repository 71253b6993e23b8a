//! Path normalization utilities.
//!
//! Ownership checks compare paths component by component, so both sides
//! must be absolute and free of `.`/`..` segments first.

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Lexical cleanup if already absolute
/// - Join with current directory, then lexical cleanup, if relative
///
/// # Example
/// ```ignore
/// use autoreload::utils::path::normalize_path;
/// let abs = normalize_path(Path::new("./src/pkg/core.py"));
/// ```
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            clean(path)
        } else {
            std::env::current_dir().map_or_else(|_| clean(path), |cwd| clean(&cwd.join(path)))
        }
    })
}

/// Remove `.` and resolve `..` without touching the filesystem.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` stays `/`
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
