//! Tokenizer for the subset of TypeScript found in module descriptors.
//!
//! Whitespace and comments are dropped; every token keeps its byte span so
//! the patcher can splice text relative to the original source.

use crate::error::{AppError, AppResult};

/// A half-open byte range `[start, end)` into the descriptor text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// First byte.
    pub start: usize,
    /// One past the last byte.
    pub end: usize,
}

impl Span {
    /// Creates a span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the covered text.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// The lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifiers and keywords.
    Ident,
    /// Single or double quoted string literal.
    Str,
    /// Backtick template literal (including any `${}` parts).
    Template,
    /// Numeric literal.
    Number,
    /// Regular expression literal, flags included.
    Regex,
    /// The `...` spread operator.
    Spread,
    /// Any other single character.
    Punct(char),
}

/// A lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Category.
    pub kind: TokenKind,
    /// Location in the source.
    pub span: Span,
}

impl Token {
    /// True if this is the punctuation character `c`.
    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }

    /// True if this is the identifier or keyword `word`.
    pub fn is_ident(&self, source: &str, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.span.text(source) == word
    }
}

/// Keywords after which `/` opens a regular expression rather than dividing.
const REGEX_PREFIX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case",
    "do", "else", "yield", "await",
];

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    prev: Option<Token>,
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn error(&self, start: usize, what: &str) -> AppError {
        let line = self.source[..start].matches('\n').count() + 1;
        AppError::Parse(format!("{} starting on line {}", what, line))
    }

    /// Skips whitespace and comments. Returns false at end of input.
    fn skip_trivia(&mut self) -> AppResult<bool> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (None, _) => return Ok(false),
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => self.eat_while(|c| c != '\n'),
                (Some('/'), Some('*')) => {
                    let start = self.pos;
                    match self.source[self.pos + 2..].find("*/") {
                        Some(end) => self.pos += 2 + end + 2,
                        None => return Err(self.error(start, "Unterminated block comment")),
                    }
                }
                _ => return Ok(true),
            }
        }
    }

    fn string(&mut self, quote: char) -> AppResult<()> {
        let start = self.pos;
        self.bump();
        loop {
            match self.bump() {
                None => return Err(self.error(start, "Unterminated string literal")),
                Some('\\') => {
                    self.bump();
                }
                Some(c) if c == quote => return Ok(()),
                Some('\n') if quote != '`' => {
                    return Err(self.error(start, "Unterminated string literal"))
                }
                Some(_) => {}
            }
        }
    }

    fn template(&mut self) -> AppResult<()> {
        let start = self.pos;
        self.bump();
        loop {
            match self.bump() {
                None => return Err(self.error(start, "Unterminated template literal")),
                Some('\\') => {
                    self.bump();
                }
                Some('`') => return Ok(()),
                Some('$') if self.peek() == Some('{') => {
                    self.bump();
                    self.substitution(start)?;
                }
                Some(_) => {}
            }
        }
    }

    /// True when a `/` at the current position starts a regular expression.
    fn regex_allowed(&self) -> bool {
        let Some(prev) = self.prev else {
            return true;
        };
        match prev.kind {
            TokenKind::Punct(')' | ']' | '}') => false,
            TokenKind::Punct(_) | TokenKind::Spread => true,
            TokenKind::Ident => REGEX_PREFIX_KEYWORDS.contains(&prev.span.text(self.source)),
            TokenKind::Str | TokenKind::Template | TokenKind::Number | TokenKind::Regex => false,
        }
    }

    /// Consumes `/body/flags`. Inside a `[...]` class a `/` does not terminate.
    fn regex(&mut self) -> AppResult<()> {
        let start = self.pos;
        self.bump();
        let mut in_class = false;
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(self.error(start, "Unterminated regular expression"))
                }
                Some('\\') => {
                    self.bump();
                }
                Some('[') => in_class = true,
                Some(']') => in_class = false,
                Some('/') if !in_class => break,
                Some(_) => {}
            }
        }
        self.eat_while(is_ident_continue);
        Ok(())
    }

    /// Consumes a `${ ... }` body up to its matching brace.
    fn substitution(&mut self, template_start: usize) -> AppResult<()> {
        let mut depth = 1usize;
        while depth > 0 {
            if !self.skip_trivia()? {
                return Err(self.error(template_start, "Unterminated template literal"));
            }
            match self.peek() {
                Some('{') => {
                    depth += 1;
                    self.bump();
                }
                Some('}') => {
                    depth -= 1;
                    self.bump();
                }
                Some(q @ ('\'' | '"')) => self.string(q)?,
                Some('`') => self.template()?,
                _ => {
                    self.bump();
                }
            }
        }
        Ok(())
    }

    fn next_token(&mut self) -> AppResult<Option<Token>> {
        if !self.skip_trivia()? {
            return Ok(None);
        }
        let start = self.pos;
        let kind = match self.peek() {
            Some(c) if is_ident_start(c) => {
                self.eat_while(is_ident_continue);
                TokenKind::Ident
            }
            Some(c) if c.is_ascii_digit() => {
                self.eat_while(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
                TokenKind::Number
            }
            Some(q @ ('\'' | '"')) => {
                self.string(q)?;
                TokenKind::Str
            }
            Some('`') => {
                self.template()?;
                TokenKind::Template
            }
            Some('/') if self.regex_allowed() => {
                self.regex()?;
                TokenKind::Regex
            }
            Some('.') if self.source[self.pos..].starts_with("...") => {
                self.pos += 3;
                TokenKind::Spread
            }
            Some(c) => {
                self.bump();
                TokenKind::Punct(c)
            }
            None => return Ok(None),
        };
        let token = Token {
            kind,
            span: Span::new(start, self.pos),
        };
        self.prev = Some(token);
        Ok(Some(token))
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphanumeric()
}

/// Splits descriptor text into tokens.
pub fn tokenize(source: &str) -> AppResult<Vec<Token>> {
    let mut lexer = Lexer {
        source,
        pos: 0,
        prev: None,
    };
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

/// Returns the unquoted content of a string literal token.
pub fn unquote(raw: &str) -> &str {
    if raw.len() >= 2 {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}
