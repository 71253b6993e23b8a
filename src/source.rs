//! Source location: module handle → editable source file.
//!
//! Compiled artifacts are mapped back to the source they came from:
//!
//! ```text
//! pkg/core.pyc                           → pkg/core.py
//! pkg/__pycache__/core.cpython-312.pyc   → pkg/core.py
//! pkg/_speedups.so                       → None (compiled-only)
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::module::Module;

/// Extension of editable source files.
pub const SOURCE_EXTENSION: &str = "py";

/// Extensions of compiled artifacts that have a source sibling.
const COMPILED_EXTENSIONS: &[&str] = &["pyc", "pyo"];

/// Marker file that turns a directory into a package.
pub const PACKAGE_INIT: &str = "__init__.py";

const PACKAGE_INIT_STEM: &str = "__init__";
const CACHE_DIR: &str = "__pycache__";

/// Path to the module's editable source, or `None` if it has none on disk.
pub fn source_path(module: &dyn Module) -> Option<PathBuf> {
    module.file().and_then(editable_source)
}

/// Map a loaded-from path to an existing editable source file.
pub fn editable_source(path: &Path) -> Option<PathBuf> {
    let ext = path.extension()?.to_str()?;

    let candidate = if COMPILED_EXTENSIONS.contains(&ext) {
        compiled_to_source(path)?
    } else if ext == SOURCE_EXTENSION {
        path.to_path_buf()
    } else {
        return None;
    };

    candidate.is_file().then_some(candidate)
}

fn compiled_to_source(path: &Path) -> Option<PathBuf> {
    let parent = path.parent()?;
    if parent.file_name() != Some(OsStr::new(CACHE_DIR)) {
        return Some(path.with_extension(SOURCE_EXTENSION));
    }

    // `name.<tag>.pyc` inside the cache dir; the source lives one level up.
    let stem = path.file_stem()?.to_str()?;
    let base = stem.split('.').next().filter(|s| !s.is_empty())?;
    Some(parent.parent()?.join(format!("{base}.{SOURCE_EXTENSION}")))
}

/// Does this directory hold a package marker?
#[inline]
pub fn is_package_dir(dir: &Path) -> bool {
    dir.join(PACKAGE_INIT).is_file()
}

/// Directory that contains the outermost package holding `path`.
///
/// For `/src/pkg/sub/mod.py` with packages `pkg` and `pkg.sub`, this is `/src`.
pub fn package_root(path: &Path) -> PathBuf {
    let mut dir = path.parent().unwrap_or(path);
    while is_package_dir(dir) {
        match dir.parent() {
            Some(parent) => dir = parent,
            None => break,
        }
    }
    dir.to_path_buf()
}

/// Naming information derived from a source file's location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    pub name: String,
    /// `None` for a top-level plain module.
    pub package: Option<String>,
    pub is_package: bool,
}

/// Derive the dotted name of a source file from the packages around it.
///
/// `pkg/__init__.py` names the package itself.
pub fn module_spec_for_path(path: &Path) -> Option<ModuleSpec> {
    let stem = path.file_stem()?.to_str()?;
    let mut parts = vec![stem.to_string()];

    let mut dir = path.parent();
    while let Some(current) = dir
        && is_package_dir(current)
    {
        let Some(component) = current.file_name().and_then(OsStr::to_str) else {
            break;
        };
        parts.insert(0, component.to_string());
        dir = current.parent();
    }

    let is_package = stem == PACKAGE_INIT_STEM;
    if is_package {
        parts.pop();
        if parts.is_empty() {
            return None;
        }
    }

    let name = parts.join(".");
    let package = if is_package {
        Some(name.clone())
    } else {
        name.rsplit_once('.').map(|(parent, _)| parent.to_string())
    };

    Some(ModuleSpec {
        name,
        package,
        is_package,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::testing::{Events, RecordingModule};
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_source_path_plain() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("mod.py");
        touch(&file);

        let module = RecordingModule::new("mod", &Events::default()).with_file(file.clone());
        assert_eq!(source_path(&module), Some(file));
    }

    #[test]
    fn test_source_path_without_file() {
        let module = RecordingModule::new("builtin", &Events::default());
        assert_eq!(source_path(&module), None);
    }

    #[test]
    fn test_compiled_maps_to_sibling_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("mod.py");
        touch(&source);

        assert_eq!(editable_source(&dir.path().join("mod.pyc")), Some(source));
    }

    #[test]
    fn test_compiled_in_cache_dir_maps_up() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("core.py");
        touch(&source);

        let cached = dir.path().join("__pycache__/core.cpython-312.pyc");
        assert_eq!(editable_source(&cached), Some(source));
    }

    #[test]
    fn test_compiled_without_source_is_none() {
        let dir = TempDir::new().unwrap();
        let cached = dir.path().join("orphan.pyc");
        touch(&cached);

        assert_eq!(editable_source(&cached), None);
    }

    #[test]
    fn test_extension_module_is_none() {
        let dir = TempDir::new().unwrap();
        let ext = dir.path().join("_speedups.so");
        touch(&ext);

        assert_eq!(editable_source(&ext), None);
    }

    #[test]
    fn test_missing_source_is_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(editable_source(&dir.path().join("gone.py")), None);
    }

    #[test]
    fn test_module_spec_nested() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("pkg/__init__.py"));
        touch(&dir.path().join("pkg/sub/__init__.py"));
        touch(&dir.path().join("pkg/sub/mod.py"));

        let spec = module_spec_for_path(&dir.path().join("pkg/sub/mod.py")).unwrap();
        assert_eq!(spec.name, "pkg.sub.mod");
        assert_eq!(spec.package.as_deref(), Some("pkg.sub"));
        assert!(!spec.is_package);

        let spec = module_spec_for_path(&dir.path().join("pkg/sub/__init__.py")).unwrap();
        assert_eq!(spec.name, "pkg.sub");
        assert_eq!(spec.package.as_deref(), Some("pkg.sub"));
        assert!(spec.is_package);
    }

    #[test]
    fn test_module_spec_top_level() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("script.py"));

        let spec = module_spec_for_path(&dir.path().join("script.py")).unwrap();
        assert_eq!(spec.name, "script");
        assert_eq!(spec.package, None);
    }

    #[test]
    fn test_package_root() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("pkg/__init__.py"));
        touch(&dir.path().join("pkg/sub/__init__.py"));
        touch(&dir.path().join("pkg/sub/mod.py"));

        assert_eq!(package_root(&dir.path().join("pkg/sub/mod.py")), dir.path());
        assert_eq!(package_root(&dir.path().join("loose.py")), dir.path());
    }
}
