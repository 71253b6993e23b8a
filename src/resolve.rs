//! Relative → absolute module names.
//!
//! Each leading dot drops one trailing component of the importing module's
//! name. A package's own `__init__` is named like the package, so a
//! placeholder component is appended first to make `.` mean "this package":
//!
//! ```text
//! package   module           name   → result
//! pkg       pkg.mod          .a     → pkg.a
//! pkg       pkg              .a     → pkg.a      (pkg + placeholder)
//! pkg.sub   pkg.sub.mod      ..a    → pkg.a
//! ```

use thiserror::Error;

/// A relative name that cannot be anchored inside any package.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("relative import `{name}` in `{module}` goes beyond the top-level package")]
    BeyondTopLevel { name: String, module: String },
}

/// Stands in for the `__init__` component of a package.
const PLACEHOLDER: &str = "__init__";

/// Resolve `name` as imported from `module` (inside `package`).
///
/// Absolute names are returned unchanged.
pub fn resolve_relative_name(
    package: &str,
    module: &str,
    name: &str,
) -> Result<String, ResolveError> {
    if !name.starts_with('.') {
        return Ok(name.to_string());
    }

    let mut parts: Vec<&str> = module.split('.').collect();
    if package == module {
        parts.push(PLACEHOLDER);
    }

    let suffix = name.trim_start_matches('.');
    let levels = name.len() - suffix.len();

    let beyond = || ResolveError::BeyondTopLevel {
        name: name.to_string(),
        module: module.to_string(),
    };

    for _ in 0..levels {
        parts.pop().ok_or_else(beyond)?;
    }
    if parts.is_empty() || parts.iter().any(|p| p.is_empty()) {
        return Err(beyond());
    }

    let anchor = parts.join(".");
    Ok(if suffix.is_empty() {
        anchor
    } else {
        format!("{anchor}.{suffix}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(package: &str, module: &str, name: &str) -> String {
        resolve_relative_name(package, module, name).unwrap()
    }

    #[test]
    fn test_absolute_names_pass_through() {
        assert_eq!(resolve("package", "module", "a.b.c"), "a.b.c");
    }

    #[test]
    fn test_relative_to_current_package() {
        assert_eq!(resolve("package", "package.module", "."), "package");
        assert_eq!(resolve("package", "package", "."), "package");
    }

    #[test]
    fn test_from_module() {
        assert_eq!(resolve("package", "package.module", ".a"), "package.a");
        assert_eq!(resolve("package.sub", "package.sub.module", ".a"), "package.sub.a");
        assert_eq!(resolve("package.sub", "package.sub.module", "..a"), "package.a");
    }

    #[test]
    fn test_from_package() {
        assert_eq!(resolve("pkg", "pkg", ".a"), "pkg.a");
        assert_eq!(resolve("package.sub", "package.sub", ".a"), "package.sub.a");
        assert_eq!(resolve("package.sub", "package.sub", "..a"), "package.a");
    }

    #[test]
    fn test_dotted_suffix() {
        assert_eq!(resolve("pkg.sub", "pkg.sub.mod", "..x.y"), "pkg.x.y");
    }

    #[test]
    fn test_beyond_top_level() {
        let err = resolve_relative_name("package", "module", ".b.c").unwrap_err();
        assert_eq!(
            err,
            ResolveError::BeyondTopLevel {
                name: ".b.c".to_string(),
                module: "module".to_string(),
            }
        );

        assert!(resolve_relative_name("pkg", "pkg", "..a").is_err());
        assert!(resolve_relative_name("pkg", "pkg.mod", "...a").is_err());
        assert!(resolve_relative_name("", "", ".a").is_err());
    }
}
