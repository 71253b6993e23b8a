//! Owned-root filtering.
//!
//! Only modules whose source lives under an owned root are reload
//! candidates. Standard library and installed third-party code never are,
//! so a change there cannot cascade into user modules.

use std::path::{Component, Path, PathBuf};

use crate::utils::path::normalize_path;

/// Is `path` equal to or nested under any of `roots`?
///
/// Matching is per path component: `/foo/barbaz` is not under `/foo/bar`.
pub fn owned(path: &Path, roots: &[PathBuf]) -> bool {
    let path = normalize_path(path);
    roots.iter().any(|root| path.starts_with(normalize_path(root)))
}

/// Directory name that marks installed third-party packages.
const SITE_PACKAGES: &str = "site-packages";

/// The set of directories whose modules the engine may reload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnedRoots {
    roots: Vec<PathBuf>,
}

impl OwnedRoots {
    /// Roots are normalized and deduplicated, keeping first-seen order.
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut owned = Self::default();
        for root in roots {
            owned.push(&root);
        }
        owned
    }

    /// Explicit roots plus every search-path entry outside the excluded
    /// prefixes. Entries under an excluded prefix are still kept when they
    /// are a `site-packages` directory.
    pub fn from_search_path(
        explicit: &[PathBuf],
        search_path: &[PathBuf],
        excluded: &[PathBuf],
    ) -> Self {
        let mut owned = Self::new(explicit.iter().cloned());
        for entry in search_path {
            if is_excluded(entry, excluded) {
                crate::trace!("roots"; "skipping search path entry {}", entry.display());
                continue;
            }
            owned.push(entry);
        }
        owned
    }

    pub fn push(&mut self, root: &Path) {
        let root = normalize_path(root);
        if !self.roots.contains(&root) {
            self.roots.push(root);
        }
    }

    /// Is `path` under one of the roots?
    pub fn contains(&self, path: &Path) -> bool {
        let path = normalize_path(path);
        self.roots.iter().any(|root| path.starts_with(root))
    }

    /// Like [`contains`](Self::contains), with one extra root for this query.
    pub fn contains_with(&self, path: &Path, extra: Option<&Path>) -> bool {
        if self.contains(path) {
            return true;
        }
        extra.is_some_and(|root| normalize_path(path).starts_with(normalize_path(root)))
    }

    pub fn as_slice(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

fn is_excluded(entry: &Path, excluded: &[PathBuf]) -> bool {
    let entry = normalize_path(entry);
    let site_packages = entry
        .components()
        .any(|c| matches!(c, Component::Normal(name) if name == SITE_PACKAGES));

    excluded.iter().any(|prefix| {
        let prefix = normalize_path(prefix);
        entry == prefix || (entry.starts_with(&prefix) && !site_packages)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_owned_nested_and_equal() {
        let roots = paths(&["/work/src"]);
        assert!(owned(Path::new("/work/src"), &roots));
        assert!(owned(Path::new("/work/src/pkg/core.py"), &roots));
        assert!(!owned(Path::new("/work/other.py"), &roots));
    }

    #[test]
    fn test_owned_is_not_a_string_prefix_match() {
        let roots = paths(&["/foo/bar"]);
        assert!(!owned(Path::new("/foo/barbaz"), &roots));
        assert!(!owned(Path::new("/foo/barbaz/x.py"), &roots));
        assert!(owned(Path::new("/foo/bar/baz"), &roots));
    }

    #[test]
    fn test_owned_normalizes_dot_segments() {
        let roots = paths(&["/work/src/../src"]);
        assert!(owned(Path::new("/work/./src/a.py"), &roots));
        assert!(!owned(Path::new("/work/src/../lib/a.py"), &roots));
    }

    #[test]
    fn test_owned_roots_dedup() {
        let roots = OwnedRoots::new(paths(&["/a", "/a/", "/b"]));
        assert_eq!(roots.as_slice(), paths(&["/a", "/b"]).as_slice());
    }

    #[test]
    fn test_contains_with_extra_root() {
        let roots = OwnedRoots::new(paths(&["/work"]));
        assert!(roots.contains_with(Path::new("/work/a.py"), None));
        assert!(!roots.contains_with(Path::new("/site/a.py"), None));
        assert!(roots.contains_with(Path::new("/site/a.py"), Some(Path::new("/site"))));
    }

    #[test]
    fn test_from_search_path_skips_stdlib() {
        let roots = OwnedRoots::from_search_path(
            &paths(&["/work"]),
            &paths(&[
                "/nonexistent-py/lib/python3.12",
                "/nonexistent-py/lib/python3.12/lib-dynload",
                "/nonexistent-py/lib/python3.12/site-packages",
                "/nonexistent-home/lib",
            ]),
            &paths(&["/nonexistent-py/lib/python3.12"]),
        );

        assert_eq!(
            roots.as_slice(),
            paths(&["/work", "/nonexistent-py/lib/python3.12/site-packages", "/nonexistent-home/lib"]).as_slice()
        );
        assert!(!roots.contains(Path::new("/nonexistent-py/lib/python3.12/os.py")));
    }
}
