//! Statement-level tokenizer.
//!
//! Splits source text into logical statements the way the language does:
//! newlines inside brackets and after a backslash do not end a statement,
//! `;` does, and comments and string literals never leak tokens. Only the
//! token kinds the import grammar needs are distinguished.

use std::iter::Peekable;
use std::str::Chars;

use super::{COMPOUND_KEYWORDS, SyntaxError, block_body};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Token {
    Name(String),
    /// String literal contents (escapes left as written).
    Str(String),
    Dot,
    Comma,
    Star,
    Colon,
    Equals,
    Open(char),
    Close(char),
    Other,
}

/// One logical statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Statement {
    /// 1-based line the statement starts on.
    pub line: usize,
    /// Whether the logical line starts with indentation.
    pub indented: bool,
    /// Split off by `;` after the colon of a one-line compound statement,
    /// as in `if x: pass; import y`.
    pub nested: bool,
    pub tokens: Vec<Token>,
}

/// Tokenize `source` into statements.
pub(super) fn statements(source: &str) -> Result<Vec<Statement>, SyntaxError> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    /// Open brackets with the line they were opened on.
    brackets: Vec<(char, usize)>,
    at_line_start: bool,
    statements: Vec<Statement>,
    current: Option<Statement>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        Self {
            chars: source.chars().peekable(),
            line: 1,
            brackets: Vec::new(),
            at_line_start: true,
            statements: Vec::new(),
            current: None,
        }
    }

    fn run(mut self) -> Result<Vec<Statement>, SyntaxError> {
        loop {
            if self.at_line_start {
                self.at_line_start = false;
                let indented = self.skip_indent();
                self.begin(indented, false);
            }

            let Some(c) = self.chars.next() else {
                break;
            };

            match c {
                '\n' => {
                    self.line += 1;
                    if self.brackets.is_empty() {
                        self.finish();
                        self.at_line_start = true;
                    }
                }
                '\r' | ' ' | '\t' | '\x0c' => {}
                '#' => self.skip_comment(),
                '\\' => self.continuation()?,
                '\'' | '"' => {
                    let text = self.string(c)?;
                    self.push(Token::Str(text));
                }
                '.' if self.chars.peek().is_some_and(char::is_ascii_digit) => {
                    self.number();
                    self.push(Token::Other);
                }
                '.' => self.push(Token::Dot),
                ',' => self.push(Token::Comma),
                '*' => self.push(Token::Star),
                ':' => self.push(Token::Colon),
                '=' => self.push(Token::Equals),
                ';' if self.brackets.is_empty() => {
                    let (indented, nested) = self.current.as_ref().map_or((false, false), |s| {
                        (s.indented, s.nested || opens_block(&s.tokens))
                    });
                    self.finish();
                    self.begin(indented, nested);
                }
                '(' | '[' | '{' => {
                    self.brackets.push((c, self.line));
                    self.push(Token::Open(c));
                }
                ')' | ']' | '}' => self.close(c)?,
                c if c.is_ascii_digit() => {
                    self.number();
                    self.push(Token::Other);
                }
                c if is_ident_start(c) => {
                    let ident = self.ident(c);
                    if is_string_prefix(&ident)
                        && let Some(&quote) = self.chars.peek()
                        && (quote == '\'' || quote == '"')
                    {
                        self.chars.next();
                        let text = self.string(quote)?;
                        self.push(Token::Str(text));
                    } else {
                        self.push(Token::Name(ident));
                    }
                }
                _ => self.push(Token::Other),
            }
        }

        if let Some(&(open, line)) = self.brackets.last() {
            return Err(SyntaxError::new(line, format!("'{open}' was never closed")));
        }

        self.finish();
        Ok(self.statements)
    }

    // -------------------------------------------------------------------------
    // Statement bookkeeping
    // -------------------------------------------------------------------------

    fn begin(&mut self, indented: bool, nested: bool) {
        self.current = Some(Statement {
            line: self.line,
            indented,
            nested,
            tokens: Vec::new(),
        });
    }

    fn push(&mut self, token: Token) {
        if let Some(statement) = self.current.as_mut() {
            statement.tokens.push(token);
        }
    }

    fn finish(&mut self) {
        if let Some(statement) = self.current.take()
            && !statement.tokens.is_empty()
        {
            self.statements.push(statement);
        }
    }

    // -------------------------------------------------------------------------
    // Lexemes
    // -------------------------------------------------------------------------

    /// Consume leading whitespace; returns whether there was any.
    fn skip_indent(&mut self) -> bool {
        let mut indented = false;
        while let Some(&c) = self.chars.peek() {
            if c == ' ' || c == '\t' || c == '\x0c' {
                indented = true;
                self.chars.next();
            } else {
                break;
            }
        }
        indented
    }

    fn skip_comment(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == '\n' {
                break;
            }
            self.chars.next();
        }
    }

    fn continuation(&mut self) -> Result<(), SyntaxError> {
        if self.chars.peek() == Some(&'\r') {
            self.chars.next();
        }
        match self.chars.next() {
            Some('\n') => {
                self.line += 1;
                Ok(())
            }
            _ => Err(SyntaxError::new(
                self.line,
                "unexpected character after line continuation character",
            )),
        }
    }

    fn close(&mut self, c: char) -> Result<(), SyntaxError> {
        let expected = match c {
            ')' => '(',
            ']' => '[',
            _ => '{',
        };
        match self.brackets.pop() {
            Some((open, _)) if open == expected => {
                self.push(Token::Close(c));
                Ok(())
            }
            Some((open, _)) => Err(SyntaxError::new(
                self.line,
                format!("closing parenthesis '{c}' does not match opening parenthesis '{open}'"),
            )),
            None => Err(SyntaxError::new(self.line, format!("unmatched '{c}'"))),
        }
    }

    fn number(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    fn ident(&mut self, first: char) -> String {
        let mut ident = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if is_ident_continue(c) {
                ident.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        ident
    }

    /// Whether the next `n` characters are all `c`.
    fn lookahead_is(&self, c: char, n: usize) -> bool {
        let mut ahead = self.chars.clone();
        (0..n).all(|_| ahead.next() == Some(c))
    }

    /// Lex a string literal whose opening `quote` was just consumed.
    fn string(&mut self, quote: char) -> Result<String, SyntaxError> {
        let start = self.line;

        if self.lookahead_is(quote, 2) {
            self.chars.next();
            self.chars.next();
            return self.triple_string(quote, start);
        }

        let mut text = String::new();
        loop {
            match self.chars.next() {
                None | Some('\n') => return Err(unterminated(start, false)),
                Some('\\') => self.escape(&mut text),
                Some(c) if c == quote => return Ok(text),
                Some(c) => text.push(c),
            }
        }
    }

    fn triple_string(&mut self, quote: char, start: usize) -> Result<String, SyntaxError> {
        let mut text = String::new();
        loop {
            match self.chars.next() {
                None => return Err(unterminated(start, true)),
                Some('\\') => self.escape(&mut text),
                Some(c) if c == quote && self.lookahead_is(quote, 2) => {
                    self.chars.next();
                    self.chars.next();
                    return Ok(text);
                }
                Some(c) => {
                    if c == '\n' {
                        self.line += 1;
                    }
                    text.push(c);
                }
            }
        }
    }

    /// Keep an escape sequence verbatim; an escaped newline continues the line.
    fn escape(&mut self, text: &mut String) {
        text.push('\\');
        if let Some(escaped) = self.chars.next() {
            if escaped == '\n' {
                self.line += 1;
            }
            text.push(escaped);
        }
    }
}

/// Does the statement open a block whose body continues on this line?
fn opens_block(tokens: &[Token]) -> bool {
    matches!(tokens.first(), Some(Token::Name(kw)) if COMPOUND_KEYWORDS.contains(&kw.as_str()))
        && block_body(tokens).is_some()
}

fn unterminated(line: usize, triple: bool) -> SyntaxError {
    let message = if triple {
        "unterminated triple-quoted string literal"
    } else {
        "unterminated string literal"
    };
    SyntaxError::new(line, message)
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// `r"..."`, `b'...'`, `f"""..."""` and their combinations.
fn is_string_prefix(ident: &str) -> bool {
    matches!(
        ident.to_ascii_lowercase().as_str(),
        "r" | "u" | "b" | "f" | "t" | "br" | "rb" | "fr" | "rf" | "tr" | "rt"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(statement: &Statement) -> Vec<&str> {
        statement
            .tokens
            .iter()
            .filter_map(|t| match t {
                Token::Name(n) => Some(n.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_statements_split_on_newline_and_semicolon() {
        let stmts = statements("import a; import b\nx = 1\n").unwrap();
        assert_eq!(stmts.len(), 3);
        assert_eq!(names(&stmts[0]), vec!["import", "a"]);
        assert_eq!(names(&stmts[1]), vec!["import", "b"]);
        assert_eq!(stmts[2].line, 2);
    }

    #[test]
    fn test_brackets_join_lines() {
        let stmts = statements("from a import (\n    b,\n    c,\n)\nimport d\n").unwrap();
        assert_eq!(stmts.len(), 2);
        assert_eq!(names(&stmts[0]), vec!["from", "a", "import", "b", "c"]);
        assert_eq!(stmts[1].line, 5);
    }

    #[test]
    fn test_semicolon_after_block_colon_is_nested() {
        let stmts = statements("if x: pass; import a; import b\nimport c; import d\n").unwrap();
        let nested: Vec<_> = stmts.iter().map(|s| s.nested).collect();
        assert_eq!(nested, vec![false, true, true, false, false]);
    }

    #[test]
    fn test_leading_bom_is_skipped() {
        let stmts = statements("\u{feff}import a\n").unwrap();
        assert_eq!(stmts[0].tokens[0], Token::Name("import".to_string()));
    }

    #[test]
    fn test_backslash_continuation() {
        let stmts = statements("import a, \\\n    b\n").unwrap();
        assert_eq!(stmts.len(), 1);
        assert_eq!(names(&stmts[0]), vec!["import", "a", "b"]);
    }

    #[test]
    fn test_indentation_flag() {
        let stmts = statements("def f():\n    import inner\nimport outer\n").unwrap();
        assert!(!stmts[0].indented);
        assert!(stmts[1].indented);
        assert!(!stmts[2].indented);
    }

    #[test]
    fn test_strings_and_comments_hide_keywords() {
        let source = "x = 'import a'  # import b\ny = \"\"\"\nimport c\n\"\"\"\nz = r'\\'' + ''\n";
        let stmts = statements(source).unwrap();
        assert_eq!(stmts.len(), 3);
        for stmt in &stmts {
            assert!(!names(stmt).contains(&"import"));
        }
        assert_eq!(stmts[2].line, 5);
    }

    #[test]
    fn test_string_prefix_is_not_a_name() {
        let stmts = statements("x = rb'raw' + f\"{y}\"\n").unwrap();
        assert_eq!(names(&stmts[0]), vec!["x"]);
    }

    #[test]
    fn test_string_contents_are_kept() {
        let stmts = statements("x = ['a.b', \"c\"]\n").unwrap();
        let strings: Vec<_> = stmts[0]
            .tokens
            .iter()
            .filter_map(|t| match t {
                Token::Str(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(strings, vec!["a.b", "c"]);
    }

    #[test]
    fn test_unterminated_string() {
        let err = statements("x = 'oops\nimport a\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("unterminated string"));

        let err = statements("\n\nx = '''never\nclosed\n").unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.message.contains("triple-quoted"));
    }

    #[test]
    fn test_bracket_errors() {
        let err = statements("x = (1,\n").unwrap_err();
        assert!(err.message.contains("never closed"));

        let err = statements("x = 1)\n").unwrap_err();
        assert!(err.message.contains("unmatched"));

        let err = statements("x = [1)\n").unwrap_err();
        assert!(err.message.contains("does not match"));
    }
}
