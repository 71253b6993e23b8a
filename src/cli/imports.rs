//! `autoreload imports`: show what discovery sees in one file.
//!
//! With a module context (from `--module`/`--package`, or derived from the
//! package layout around the file) relative names are printed resolved.

use std::io::{self, Write};

use anyhow::{Result, bail};

use super::ImportsArgs;
use crate::discovery::{Discovery, DiscoveryMode, discover_file};
use crate::log;
use crate::resolve::resolve_relative_name;
use crate::source::module_spec_for_path;

/// Module and package names used to resolve relative imports.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Context {
    module: String,
    package: String,
}

impl Context {
    fn from_args(args: &ImportsArgs) -> Option<Self> {
        if let Some(module) = &args.module {
            let package = args.package.clone().unwrap_or_else(|| {
                module
                    .rsplit_once('.')
                    .map_or_else(String::new, |(parent, _)| parent.to_string())
            });
            return Some(Self {
                module: module.clone(),
                package,
            });
        }

        let spec = module_spec_for_path(&args.file)?;
        Some(Self {
            package: args.package.clone().or(spec.package).unwrap_or_default(),
            module: spec.name,
        })
    }
}

pub fn run_imports(args: &ImportsArgs) -> Result<()> {
    if !args.file.is_file() {
        bail!("`{}` is not a file", args.file.display());
    }

    let mode = if args.deep {
        DiscoveryMode::Deep
    } else {
        DiscoveryMode::TopLevel
    };

    let names = match discover_file(&args.file, mode) {
        Discovery::Parsed(names) => names,
        Discovery::Failed(err) => bail!("cannot parse `{}`: {}", args.file.display(), err),
    };

    let context = Context::from_args(args);
    let mut out = io::stdout().lock();
    for line in render(&names, context.as_ref()) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// One line per distinct name, resolved when a context is available.
fn render(names: &[String], context: Option<&Context>) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in names {
        let line = match context {
            Some(ctx) => match resolve_relative_name(&ctx.package, &ctx.module, raw) {
                Ok(resolved) => resolved,
                Err(err) => {
                    log!("imports"; "{}", err);
                    continue;
                }
            },
            None => raw.clone(),
        };
        if !lines.contains(&line) {
            lines.push(line);
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn args(file: PathBuf) -> ImportsArgs {
        ImportsArgs {
            file,
            deep: false,
            module: None,
            package: None,
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_render_without_context_keeps_raw_names() {
        let names = strings(&[".", ".a", "os", "os"]);
        assert_eq!(render(&names, None), vec![".", ".a", "os"]);
    }

    #[test]
    fn test_render_resolves_and_drops_unresolvable() {
        let context = Context {
            module: "pkg.sub.mod".into(),
            package: "pkg.sub".into(),
        };
        let names = strings(&[".", ".relative", "..", "..parent", "....gone", "os"]);
        assert_eq!(
            render(&names, Some(&context)),
            vec!["pkg.sub", "pkg.sub.relative", "pkg", "pkg.parent", "os"]
        );
    }

    #[test]
    fn test_context_from_module_flag() {
        let mut a = args(PathBuf::from("x.py"));
        a.module = Some("pkg.sub.mod".into());
        let ctx = Context::from_args(&a).unwrap();
        assert_eq!(ctx.package, "pkg.sub");

        a.package = Some("pkg.sub.mod".into());
        assert_eq!(Context::from_args(&a).unwrap().package, "pkg.sub.mod");
    }

    #[test]
    fn test_context_from_layout() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("pkg/__init__.py"), "").unwrap();
        let file = dir.path().join("pkg/core.py");
        fs::write(&file, "from . import util\n").unwrap();

        let ctx = Context::from_args(&args(file.clone())).unwrap();
        assert_eq!(
            ctx,
            Context {
                module: "pkg.core".into(),
                package: "pkg".into(),
            }
        );
        assert!(run_imports(&args(file)).is_ok());
    }

    #[test]
    fn test_run_imports_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("broken.py");
        fs::write(&file, "from import\n").unwrap();

        let err = run_imports(&args(file)).unwrap_err();
        assert!(err.to_string().contains("cannot parse"));

        assert!(run_imports(&args(dir.path().to_path_buf())).is_err());
    }
}
