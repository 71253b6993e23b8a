//! Import discovery: statically visible imports of a source file.
//!
//! Nothing is executed, so the result over-approximates: every name that
//! follows `from X import` is reported both as `X` and as `X.name`, since
//! `name` may be a submodule or just an attribute.
//!
//! ```text
//! import a.b, c as d        → a.b, c
//! from x.y import z         → x.y, x.y.z
//! from . import sibling     → ., .sibling
//! from ..up import (p, q)   → ..up, ..up.p, ..up.q
//! ```
//!
//! Relative names are returned unresolved; see [`crate::resolve`].

mod lexer;

use std::fs;
use std::path::Path;

use thiserror::Error;

use lexer::{Statement, Token};

/// Source that could not be tokenized or holds a malformed import.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

impl SyntaxError {
    pub(crate) fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Which statements to inspect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiscoveryMode {
    /// Only unindented statements: what runs when the module loads.
    #[default]
    TopLevel,
    /// Every statement, including function bodies and one-line compound
    /// statements such as `try: import x`.
    Deep,
}

/// Outcome of discovery on one source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    Parsed(Vec<String>),
    /// Treated as "no discoverable imports" by callers.
    Failed(SyntaxError),
}

impl Discovery {
    /// Discovered names, empty on failure.
    pub fn names(&self) -> &[String] {
        match self {
            Self::Parsed(names) => names,
            Self::Failed(_) => &[],
        }
    }

    pub fn into_names(self) -> Vec<String> {
        match self {
            Self::Parsed(names) => names,
            Self::Failed(_) => Vec::new(),
        }
    }

    pub fn error(&self) -> Option<&SyntaxError> {
        match self {
            Self::Parsed(_) => None,
            Self::Failed(err) => Some(err),
        }
    }
}

/// Keywords that open a block; in deep mode the statement after their
/// colon is inspected too.
const COMPOUND_KEYWORDS: &[&str] = &[
    "if", "elif", "else", "try", "except", "finally", "with", "for", "while", "def", "class",
    "async",
];

/// Discover imports in `source`.
pub fn discover_imports(source: &str, mode: DiscoveryMode) -> Discovery {
    match parse(source.trim_end(), mode) {
        Ok(names) => Discovery::Parsed(names),
        Err(err) => Discovery::Failed(err),
    }
}

/// Read and discover a file. Unreadable files are reported as failures.
pub fn discover_file(path: &Path, mode: DiscoveryMode) -> Discovery {
    match fs::read_to_string(path) {
        Ok(source) => discover_imports(&source, mode),
        Err(err) => Discovery::Failed(SyntaxError::new(0, format!("unreadable: {err}"))),
    }
}

fn parse(source: &str, mode: DiscoveryMode) -> Result<Vec<String>, SyntaxError> {
    let mut names = Vec::new();
    for statement in lexer::statements(source)? {
        if mode == DiscoveryMode::TopLevel && (statement.indented || statement.nested) {
            continue;
        }
        collect(&statement, &statement.tokens, mode, &mut names)?;
    }
    Ok(names)
}

fn collect(
    statement: &Statement,
    tokens: &[Token],
    mode: DiscoveryMode,
    names: &mut Vec<String>,
) -> Result<(), SyntaxError> {
    let Some(Token::Name(keyword)) = tokens.first() else {
        return Ok(());
    };

    match keyword.as_str() {
        "import" => ImportParser::new(statement, &tokens[1..]).import(names),
        "from" => ImportParser::new(statement, &tokens[1..]).from(names),
        kw if mode == DiscoveryMode::Deep && COMPOUND_KEYWORDS.contains(&kw) => {
            match block_body(tokens) {
                Some(body) => collect(statement, body, mode, names),
                None => Ok(()),
            }
        }
        _ => Ok(()),
    }
}

/// Tokens after the block colon of a one-line compound statement.
fn block_body(tokens: &[Token]) -> Option<&[Token]> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Open(_) => depth += 1,
            Token::Close(_) => depth = depth.saturating_sub(1),
            // `:=` is not a block colon
            Token::Colon if depth == 0 && tokens.get(i + 1) != Some(&Token::Equals) => {
                let body = &tokens[i + 1..];
                return (!body.is_empty()).then_some(body);
            }
            _ => {}
        }
    }
    None
}

// =============================================================================
// Import statement grammar
// =============================================================================

struct ImportParser<'a> {
    line: usize,
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> ImportParser<'a> {
    fn new(statement: &Statement, tokens: &'a [Token]) -> Self {
        Self {
            line: statement.line,
            tokens,
            pos: 0,
        }
    }

    /// `import a.b [as c], d ...`
    fn import(mut self, names: &mut Vec<String>) -> Result<(), SyntaxError> {
        loop {
            let dotted = self.dotted_name()?;
            self.alias()?;
            names.push(dotted);

            match self.next() {
                None => return Ok(()),
                Some(Token::Comma) => continue,
                Some(_) => return Err(self.error("invalid syntax in import statement")),
            }
        }
    }

    /// `from [.]*[module] import (* | names | '(' names ')')`
    fn from(mut self, names: &mut Vec<String>) -> Result<(), SyntaxError> {
        let mut base = String::new();
        while self.peek() == Some(&Token::Dot) {
            self.pos += 1;
            base.push('.');
        }

        let has_module = matches!(self.peek(), Some(Token::Name(n)) if n != "import");
        if has_module {
            base.push_str(&self.dotted_name()?);
        }
        if base.is_empty() {
            return Err(self.error("expected module name after 'from'"));
        }

        match self.next() {
            Some(Token::Name(kw)) if kw == "import" => {}
            _ => return Err(self.error("expected 'import'")),
        }

        // The base itself is a dependency: `from . import x` needs the package.
        names.push(base.clone());
        let prefix = if has_module {
            format!("{base}.")
        } else {
            base
        };

        match self.peek() {
            Some(Token::Star) => {
                self.pos += 1;
                self.expect_end()
            }
            Some(Token::Open('(')) => {
                self.pos += 1;
                self.targets(&prefix, names, true)
            }
            _ => self.targets(&prefix, names, false),
        }
    }

    /// `name [as alias], ...` optionally wrapped in parentheses.
    fn targets(
        &mut self,
        prefix: &str,
        names: &mut Vec<String>,
        parenthesized: bool,
    ) -> Result<(), SyntaxError> {
        let mut count = 0usize;
        loop {
            if parenthesized && self.peek() == Some(&Token::Close(')')) {
                self.pos += 1;
                break;
            }

            let Some(Token::Name(name)) = self.next() else {
                return Err(self.error("expected name to import"));
            };
            let name = name.clone();
            self.alias()?;
            names.push(format!("{prefix}{name}"));
            count += 1;

            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::Close(')')) if parenthesized => break,
                None if !parenthesized => break,
                _ => return Err(self.error("invalid syntax in import list")),
            }
        }

        if count == 0 {
            return Err(self.error("expected name to import"));
        }
        if parenthesized {
            self.expect_end()?;
        }
        Ok(())
    }

    fn dotted_name(&mut self) -> Result<String, SyntaxError> {
        let Some(Token::Name(first)) = self.next() else {
            return Err(self.error("expected module name"));
        };
        let mut dotted = first.clone();

        while self.peek() == Some(&Token::Dot) {
            self.pos += 1;
            let Some(Token::Name(part)) = self.next() else {
                return Err(self.error("trailing '.' in module name"));
            };
            dotted.push('.');
            dotted.push_str(part);
        }
        Ok(dotted)
    }

    /// Optional `as name`; the alias is irrelevant for dependencies.
    fn alias(&mut self) -> Result<(), SyntaxError> {
        if matches!(self.peek(), Some(Token::Name(kw)) if kw == "as") {
            self.pos += 1;
            if !matches!(self.next(), Some(Token::Name(_))) {
                return Err(self.error("expected name after 'as'"));
            }
        }
        Ok(())
    }

    fn expect_end(&self) -> Result<(), SyntaxError> {
        match self.peek() {
            None => Ok(()),
            Some(_) => Err(self.error("unexpected tokens after import")),
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn error(&self, message: &str) -> SyntaxError {
        SyntaxError::new(self.line, message)
    }
}

// =============================================================================
// Declared dependencies
// =============================================================================

/// Module-level dependency declaration read from source.
pub const ALSO_RELOAD: &str = "__also_reload__";

/// Names listed in a top-level `__also_reload__ = ['a', '.b']` assignment.
///
/// Anything that is not a plain list or tuple of string literals yields
/// nothing. The last assignment wins.
pub fn declared_also_reload(source: &str) -> Vec<String> {
    let Ok(statements) = lexer::statements(source) else {
        return Vec::new();
    };

    let mut declared = Vec::new();
    for statement in statements.iter().filter(|s| !s.indented && !s.nested) {
        if let Some(names) = string_list_assignment(&statement.tokens, ALSO_RELOAD) {
            declared = names;
        }
    }
    declared
}

fn string_list_assignment(tokens: &[Token], target: &str) -> Option<Vec<String>> {
    let [Token::Name(name), Token::Equals, Token::Open(open), rest @ ..] = tokens else {
        return None;
    };
    if name != target || !matches!(*open, '[' | '(') {
        return None;
    }

    let close = if *open == '[' { ']' } else { ')' };
    let mut values = Vec::new();
    let mut expect_value = true;

    for (i, token) in rest.iter().enumerate() {
        match token {
            Token::Str(value) if expect_value => {
                values.push(value.clone());
                expect_value = false;
            }
            Token::Comma if !expect_value => expect_value = true,
            Token::Close(c) if *c == close && i + 1 == rest.len() => return Some(values),
            _ => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn top(source: &str) -> Vec<String> {
        match discover_imports(source, DiscoveryMode::TopLevel) {
            Discovery::Parsed(names) => names,
            Discovery::Failed(err) => panic!("unexpected failure: {err}"),
        }
    }

    #[test]
    fn test_parse_mixed_imports() {
        let names = top(concat!(
            "\n",
            "import os\n",
            "import sys\n",
            "\n",
            "from PyQt4 import QtCore, QtGui\n",
            "\n",
            "import absolute\n",
            "from absolute.module import function\n",
            "from absolute.package import module\n",
            "from . import relative\n",
            "from .. import parent_relative\n",
            "\n",
        ));

        assert_eq!(
            names,
            vec![
                "os",
                "sys",
                "PyQt4",
                "PyQt4.QtCore",
                "PyQt4.QtGui",
                "absolute",
                "absolute.module",
                "absolute.module.function",
                "absolute.package",
                "absolute.package.module",
                ".",
                ".relative",
                "..",
                "..parent_relative",
            ]
        );
    }

    #[test]
    fn test_aliases_are_ignored() {
        let names = top("import numpy as np, a.b as c\nfrom x import y as z\n");
        assert_eq!(names, vec!["numpy", "a.b", "x", "x.y"]);
    }

    #[test]
    fn test_relative_with_module() {
        let names = top("from .sibling import thing\nfrom ...far.away import (a,\n    b,)\n");
        assert_eq!(
            names,
            vec![
                ".sibling",
                ".sibling.thing",
                "...far.away",
                "...far.away.a",
                "...far.away.b"
            ]
        );
    }

    #[test]
    fn test_star_import_reports_base_only() {
        assert_eq!(top("from pkg.core import *\n"), vec!["pkg.core"]);
    }

    #[test]
    fn test_top_level_skips_nested_imports() {
        let source = "import a\ndef f():\n    import b\nif x: import c\ntry:\n    import d\nexcept ImportError:\n    pass\n";
        assert_eq!(top(source), vec!["a"]);
    }

    #[test]
    fn test_top_level_skips_one_line_block_bodies() {
        let source = "if x: pass; import c\nclass A: x = 1; from .y import z\nimport a; import b\n";
        assert_eq!(top(source), vec!["a", "b"]);

        let names = discover_imports(source, DiscoveryMode::Deep).into_names();
        assert_eq!(names, vec!["c", ".y", ".y.z", "a", "b"]);
    }

    #[test]
    fn test_leading_bom_keeps_first_import() {
        assert_eq!(top("\u{feff}import os\nimport sys\n"), vec!["os", "sys"]);
    }

    #[test]
    fn test_deep_finds_nested_imports() {
        let source = "import a\ndef f():\n    import b\nif x: import c\ntry:\n    from . import d\nexcept ImportError:\n    pass\n";
        let names = discover_imports(source, DiscoveryMode::Deep).into_names();
        assert_eq!(names, vec!["a", "b", "c", ".", ".d"]);
    }

    #[test]
    fn test_deep_ignores_walrus_colon() {
        let source = "if (n := 1): import a\nwhile x := f(): pass\n";
        let names = discover_imports(source, DiscoveryMode::Deep).into_names();
        assert_eq!(names, vec!["a"]);
    }

    #[test]
    fn test_identifiers_starting_with_keywords() {
        assert!(top("import_path = 1\nfromage = 2\n").is_empty());
    }

    #[test]
    fn test_trailing_whitespace_is_tolerated() {
        assert_eq!(top("import a\n    \n   "), vec!["a"]);
    }

    #[test]
    fn test_parse_failure_yields_no_names() {
        let discovery = discover_imports("import a\nx = (\n", DiscoveryMode::TopLevel);
        assert!(discovery.names().is_empty());
        assert_eq!(discovery.error().unwrap().line, 2);
    }

    #[test]
    fn test_malformed_imports_fail() {
        for source in [
            "import\n",
            "import a.\n",
            "import a as\n",
            "from a\n",
            "from import b\n",
            "from . import\n",
            "from a import b,\n",
            "from a import (b c)\n",
            "from a import * , b\n",
        ] {
            let discovery = discover_imports(source, DiscoveryMode::TopLevel);
            assert!(discovery.error().is_some(), "expected failure for {source:?}");
        }
    }

    #[test]
    fn test_discover_missing_file() {
        let discovery = discover_file(Path::new("/definitely/not/here.py"), DiscoveryMode::TopLevel);
        assert!(discovery.error().unwrap().message.contains("unreadable"));
    }

    #[test]
    fn test_declared_also_reload() {
        assert_eq!(
            declared_also_reload("__also_reload__ = ['a', \".b\",]\n"),
            vec!["a", ".b"]
        );
        assert_eq!(declared_also_reload("__also_reload__ = ('x',)\n"), vec!["x"]);
        assert_eq!(
            declared_also_reload("__also_reload__ = ['a']\n__also_reload__ = ['b']\n"),
            vec!["b"]
        );
    }

    #[test]
    fn test_declared_also_reload_ignores_non_literals() {
        assert!(declared_also_reload("__also_reload__ = names\n").is_empty());
        assert!(declared_also_reload("__also_reload__ = ['a' + 'b']\n").is_empty());
        assert!(declared_also_reload("def f():\n    __also_reload__ = ['a']\n").is_empty());
        assert!(declared_also_reload("x = (\n").is_empty());
    }
}
