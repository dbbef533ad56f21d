#![deny(missing_docs)]

//! # Module Descriptor Parsing
//!
//! Reads the text of a module descriptor (a TypeScript file carrying an
//! `@NgModule({...})` decorator) into a typed tree:
//!
//! - **lexer**: byte-span tokens, comments and whitespace dropped.
//! - **ast**: object/array literals, identifiers, import declarations.
//!
//! The parser is a small recursive descent over the tokens. It only
//! understands the parts of the language needed to find collection literals;
//! any other expression is kept as an opaque span.

/// Syntax node types.
pub mod ast;

/// Tokenizer.
pub mod lexer;

use crate::error::{AppError, AppResult};
use ast::{ArrayLit, Expr, ImportDecl, ObjectLit, Property};
use lexer::{tokenize, unquote, Span, Token, TokenKind};

/// The decorator that marks a module descriptor.
pub const NG_MODULE: &str = "NgModule";

/// A parsed module descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    source: String,
    imports: Vec<ImportDecl>,
    metadata: ObjectLit,
}

impl ModuleDescriptor {
    /// Parses descriptor text looking for the `@NgModule(...)` decorator.
    ///
    /// # Examples
    /// ```
    /// use modreg_core::descriptor::ModuleDescriptor;
    ///
    /// let src = "@NgModule({ declarations: [AppComponent] }) export class AppModule {}";
    /// let descriptor = ModuleDescriptor::parse(src).unwrap();
    /// let list = descriptor.collection("declarations").unwrap().unwrap();
    /// assert!(list.contains_symbol("AppComponent"));
    /// ```
    pub fn parse(source: &str) -> AppResult<Self> {
        Self::parse_with_decorator(source, NG_MODULE)
    }

    /// Parses descriptor text using a custom decorator name.
    ///
    /// The first `@<decorator>(...)` whose argument is an object literal is
    /// used as the metadata object.
    pub fn parse_with_decorator(source: &str, decorator: &str) -> AppResult<Self> {
        let tokens = tokenize(source)?;
        let mut parser = Parser::new(source, &tokens);

        let mut imports = Vec::new();
        let mut metadata = None;
        let mut depth = 0usize;
        let mut prev: Option<Token> = None;

        while let Some(token) = parser.peek() {
            let after_dot = prev.is_some_and(|p| p.is_punct('.'));

            if depth == 0
                && !after_dot
                && token.is_ident(source, "import")
                && !parser.peek_nth(1).is_some_and(|t| t.is_punct('(') || t.is_punct('.'))
            {
                if let Some(import) = parser.parse_import()? {
                    imports.push(import);
                }
                prev = parser.previous();
                continue;
            }

            if metadata.is_none()
                && token.is_punct('@')
                && parser
                    .peek_nth(1)
                    .is_some_and(|t| t.is_ident(source, decorator))
                && parser.peek_nth(2).is_some_and(|t| t.is_punct('('))
            {
                parser.bump();
                parser.bump();
                parser.bump();
                // The call's `)` is consumed by the generic scan below.
                depth += 1;
                let expr = parser.parse_expr()?;
                match expr {
                    Expr::Object(object) => metadata = Some(object),
                    other => {
                        return Err(parser.error_at(
                            other.span().start,
                            &format!(
                                "@{} expects an object literal, found {}",
                                decorator,
                                other.kind_name()
                            ),
                        ))
                    }
                }
                prev = parser.previous();
                continue;
            }

            match token.kind {
                TokenKind::Punct('{' | '(' | '[') => depth += 1,
                TokenKind::Punct('}' | ')' | ']') => depth = depth.saturating_sub(1),
                _ => {}
            }
            prev = parser.bump();
        }

        let metadata = metadata.ok_or_else(|| {
            AppError::Parse(format!("No @{} decorator with metadata found", decorator))
        })?;

        Ok(Self {
            source: source.to_string(),
            imports,
            metadata,
        })
    }

    /// The text this descriptor was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Top-level import declarations in source order.
    pub fn imports(&self) -> &[ImportDecl] {
        &self.imports
    }

    /// The decorator's metadata object.
    pub fn metadata(&self) -> &ObjectLit {
        &self.metadata
    }

    /// True if any top-level import binds `symbol`.
    pub fn imports_symbol(&self, symbol: &str) -> bool {
        self.imports
            .iter()
            .any(|i| i.symbols.iter().any(|s| s == symbol))
    }

    /// Looks up a metadata property by key.
    ///
    /// Fails with `AmbiguousDeclaration` when the key appears more than once.
    pub fn property(&self, key: &str) -> AppResult<Option<&Property>> {
        let mut matches = self.metadata.properties_named(key);
        let first = matches.next();
        if matches.next().is_some() {
            return Err(AppError::AmbiguousDeclaration(key.to_string()));
        }
        Ok(first)
    }

    /// Looks up a metadata property whose value must be an array literal.
    pub fn collection(&self, key: &str) -> AppResult<Option<&ArrayLit>> {
        let Some(property) = self.property(key)? else {
            return Ok(None);
        };
        match &property.value {
            Some(Expr::Array(list)) => Ok(Some(list)),
            Some(other) => Err(AppError::Parse(format!(
                "Property '{}' is a {}, not a list literal",
                key,
                other.kind_name()
            ))),
            None => Err(AppError::Parse(format!(
                "Property '{}' has no list value",
                key
            ))),
        }
    }
}

struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, tokens: &'a [Token]) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
        }
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_nth(&self, n: usize) -> Option<Token> {
        self.tokens.get(self.pos + n).copied()
    }

    fn previous(&self) -> Option<Token> {
        self.pos.checked_sub(1).and_then(|i| self.tokens.get(i).copied())
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    /// End offset of the last consumed token.
    fn last_end(&self) -> usize {
        self.previous().map_or(0, |t| t.span.end)
    }

    fn error_at(&self, offset: usize, msg: &str) -> AppError {
        let line = self.source[..offset.min(self.source.len())]
            .matches('\n')
            .count()
            + 1;
        AppError::Parse(format!("{} (line {})", msg, line))
    }

    fn unexpected_eof(&self) -> AppError {
        self.error_at(self.source.len(), "Unexpected end of file")
    }

    fn expect_punct(&mut self, c: char) -> AppResult<Token> {
        match self.peek() {
            Some(t) if t.is_punct(c) => {
                self.pos += 1;
                Ok(t)
            }
            Some(t) => Err(self.error_at(
                t.span.start,
                &format!("Expected '{}', found '{}'", c, t.span.text(self.source)),
            )),
            None => Err(self.unexpected_eof()),
        }
    }

    fn at_separator(&self) -> bool {
        match self.peek() {
            None => true,
            Some(t) => matches!(t.kind, TokenKind::Punct(',' | ')' | ']' | '}')),
        }
    }

    fn parse_expr(&mut self) -> AppResult<Expr> {
        let first = self.peek().ok_or_else(|| self.unexpected_eof())?;
        let start = first.span.start;

        let head = match first.kind {
            TokenKind::Punct('{') => Some(Expr::Object(self.parse_object()?)),
            TokenKind::Punct('[') => Some(Expr::Array(self.parse_array()?)),
            TokenKind::Ident => {
                self.bump();
                Some(Expr::Ident {
                    name: first.span.text(self.source).to_string(),
                    span: first.span,
                })
            }
            TokenKind::Str => {
                self.bump();
                Some(Expr::Str {
                    value: unquote(first.span.text(self.source)).to_string(),
                    span: first.span,
                })
            }
            _ => None,
        };

        if let Some(expr) = head {
            if self.at_separator() {
                return Ok(expr);
            }
        }

        let end = self.skip_expression_tail(start)?;
        Ok(Expr::Other(Span::new(start, end)))
    }

    /// Consumes tokens up to the next `,` or closer at nesting depth zero.
    fn skip_expression_tail(&mut self, start: usize) -> AppResult<usize> {
        let mut depth = 0usize;
        let mut end = self.last_end().max(start);
        loop {
            let token = match self.peek() {
                Some(t) => t,
                None if depth == 0 => return Ok(end),
                None => return Err(self.error_at(start, "Unbalanced brackets in expression")),
            };
            match token.kind {
                TokenKind::Punct('(' | '[' | '{') => depth += 1,
                TokenKind::Punct(')' | ']' | '}') => {
                    if depth == 0 {
                        return Ok(end);
                    }
                    depth -= 1;
                }
                TokenKind::Punct(',') if depth == 0 => return Ok(end),
                _ => {}
            }
            self.bump();
            end = token.span.end;
        }
    }

    fn parse_object(&mut self) -> AppResult<ObjectLit> {
        let open = self.expect_punct('{')?;
        let mut properties = Vec::new();
        let mut trailing_comma = false;

        loop {
            match self.peek() {
                None => return Err(self.error_at(open.span.start, "Unterminated object literal")),
                Some(t) if t.is_punct('}') => {
                    self.bump();
                    break;
                }
                Some(_) => {}
            }

            properties.push(self.parse_property()?);
            trailing_comma = false;

            match self.peek() {
                Some(t) if t.is_punct(',') => {
                    self.bump();
                    trailing_comma = true;
                }
                Some(t) if t.is_punct('}') => {}
                Some(t) => {
                    return Err(self.error_at(
                        t.span.start,
                        &format!(
                            "Expected ',' or '}}' in object literal, found '{}'",
                            t.span.text(self.source)
                        ),
                    ))
                }
                None => return Err(self.error_at(open.span.start, "Unterminated object literal")),
            }
        }

        Ok(ObjectLit {
            span: Span::new(open.span.start, self.last_end()),
            properties,
            trailing_comma,
        })
    }

    fn parse_property(&mut self) -> AppResult<Property> {
        let first = self.peek().ok_or_else(|| self.unexpected_eof())?;
        let start = first.span.start;

        let key = match first.kind {
            TokenKind::Spread => {
                self.bump();
                self.parse_expr()?;
                return Ok(Property {
                    key: None,
                    value: None,
                    span: Span::new(start, self.last_end()),
                });
            }
            TokenKind::Punct('[') => {
                // Computed key: `[expr]: value`
                self.parse_array()?;
                None
            }
            TokenKind::Ident | TokenKind::Number => {
                self.bump();
                Some(first.span.text(self.source).to_string())
            }
            TokenKind::Str => {
                self.bump();
                Some(unquote(first.span.text(self.source)).to_string())
            }
            _ => {
                return Err(self.error_at(
                    start,
                    &format!(
                        "Unexpected '{}' in object literal",
                        first.span.text(self.source)
                    ),
                ))
            }
        };

        let value = match self.peek() {
            Some(t) if t.is_punct(':') => {
                self.bump();
                Some(self.parse_expr()?)
            }
            // Shorthand `{ declarations }`
            Some(t) if (t.is_punct(',') || t.is_punct('}')) && first.kind == TokenKind::Ident => {
                Some(Expr::Ident {
                    name: first.span.text(self.source).to_string(),
                    span: first.span,
                })
            }
            // Methods, accessors and anything else we do not model.
            _ => {
                self.skip_expression_tail(start)?;
                None
            }
        };

        Ok(Property {
            key,
            value,
            span: Span::new(start, self.last_end()),
        })
    }

    fn parse_array(&mut self) -> AppResult<ArrayLit> {
        let open = self.expect_punct('[')?;
        let mut elements = Vec::new();
        let mut trailing_comma = None;

        loop {
            match self.peek() {
                None => return Err(self.error_at(open.span.start, "Unterminated list literal")),
                Some(t) if t.is_punct(']') => {
                    self.bump();
                    break;
                }
                Some(t) if t.is_punct(',') => {
                    // Elision
                    self.bump();
                    trailing_comma = Some(t.span.end);
                    continue;
                }
                Some(_) => {}
            }

            elements.push(self.parse_expr()?);
            trailing_comma = None;

            match self.peek() {
                Some(t) if t.is_punct(',') => {
                    self.bump();
                    trailing_comma = Some(t.span.end);
                }
                Some(t) if t.is_punct(']') => {}
                Some(t) => {
                    return Err(self.error_at(
                        t.span.start,
                        &format!(
                            "Expected ',' or ']' in list literal, found '{}'",
                            t.span.text(self.source)
                        ),
                    ))
                }
                None => return Err(self.error_at(open.span.start, "Unterminated list literal")),
            }
        }

        Ok(ArrayLit {
            span: Span::new(open.span.start, self.last_end()),
            elements,
            trailing_comma,
        })
    }

    /// Parses `import ... from '...';`. Unsupported forms are skipped.
    fn parse_import(&mut self) -> AppResult<Option<ImportDecl>> {
        let start = self.bump().ok_or_else(|| self.unexpected_eof())?.span.start;
        let mut symbols = Vec::new();
        let mut named_last_end = None;

        let type_only = self.peek().is_some_and(|t| {
            t.is_ident(self.source, "type")
                && self
                    .peek_nth(1)
                    .is_some_and(|n| {
                        n.is_punct('{')
                            || n.is_punct('*')
                            || (n.kind == TokenKind::Ident && !n.is_ident(self.source, "from"))
                    })
        });
        if type_only {
            self.bump();
        }

        let specifier = loop {
            let token = self.peek().ok_or_else(|| self.unexpected_eof())?;
            match token.kind {
                TokenKind::Str => {
                    self.bump();
                    break token;
                }
                TokenKind::Punct('{') => {
                    self.bump();
                    named_last_end = self.parse_named_imports(&mut symbols)?;
                }
                TokenKind::Punct('*') => {
                    self.bump();
                    if self.peek().is_some_and(|t| t.is_ident(self.source, "as")) {
                        self.bump();
                    }
                    if let Some(alias) = self.peek().filter(|t| t.kind == TokenKind::Ident) {
                        self.bump();
                        symbols.push(alias.span.text(self.source).to_string());
                    }
                }
                TokenKind::Punct(',') => {
                    self.bump();
                }
                TokenKind::Ident if token.is_ident(self.source, "from") => {
                    self.bump();
                }
                TokenKind::Ident => {
                    self.bump();
                    symbols.push(token.span.text(self.source).to_string());
                }
                _ => {
                    // e.g. `import x = require('y')`
                    self.skip_statement();
                    return Ok(None);
                }
            }
        };

        if self.peek().is_some_and(|t| t.is_punct(';')) {
            self.bump();
        }

        let raw = specifier.span.text(self.source);
        Ok(Some(ImportDecl {
            span: Span::new(start, self.last_end()),
            symbols,
            specifier: unquote(raw).to_string(),
            quote: raw.chars().next().unwrap_or('\''),
            named_last_end,
            type_only,
        }))
    }

    /// Parses the body of `{ A, B as C, type D }` after the opening brace.
    fn parse_named_imports(&mut self, symbols: &mut Vec<String>) -> AppResult<Option<usize>> {
        let mut last_end = None;
        let mut current: Option<Token> = None;

        loop {
            let token = self.bump().ok_or_else(|| self.unexpected_eof())?;
            match token.kind {
                TokenKind::Punct('}') | TokenKind::Punct(',') => {
                    if let Some(local) = current.take() {
                        symbols.push(local.span.text(self.source).to_string());
                        last_end = Some(local.span.end);
                    }
                    if token.is_punct('}') {
                        return Ok(last_end);
                    }
                }
                // The local binding is always the last name in the specifier.
                TokenKind::Ident | TokenKind::Str => current = Some(token),
                _ => {
                    return Err(self.error_at(
                        token.span.start,
                        &format!(
                            "Unexpected '{}' in import list",
                            token.span.text(self.source)
                        ),
                    ))
                }
            }
        }
    }

    fn skip_statement(&mut self) {
        while let Some(token) = self.bump() {
            if token.is_punct(';') {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORE: &str = "@NgModule({ imports: [CommonModule], declarations: [], exports: [] }) export class CoreModule {}";

    #[test]
    fn test_parse_simple_descriptor() {
        let d = ModuleDescriptor::parse(CORE).unwrap();
        assert_eq!(d.metadata().properties.len(), 3);
        let imports = d.collection("imports").unwrap().unwrap();
        assert!(imports.contains_symbol("CommonModule"));
        assert!(d.collection("declarations").unwrap().unwrap().elements.is_empty());
        assert!(d.collection("providers").unwrap().is_none());
    }

    #[test]
    fn test_nested_keys_do_not_match() {
        let src = r#"
@NgModule({
  imports: [RouterModule.forRoot([{ path: '', declarations: [Fake] }])],
  providers: [{ provide: X, useValue: { exports: [] } }],
})
export class AppModule {}
"#;
        let d = ModuleDescriptor::parse(src).unwrap();
        assert!(d.collection("declarations").unwrap().is_none());
        assert!(d.collection("exports").unwrap().is_none());
        assert!(d.metadata().trailing_comma);
    }

    #[test]
    fn test_duplicate_keys_are_ambiguous() {
        let src = "@NgModule({ declarations: [A], 'declarations': [B] }) class M {}";
        let d = ModuleDescriptor::parse(src).unwrap();
        let err = d.collection("declarations").unwrap_err();
        assert!(matches!(err, AppError::AmbiguousDeclaration(ref k) if k == "declarations"));
    }

    #[test]
    fn test_non_list_collection_is_error() {
        let src = "const COMPONENTS = [A];\n@NgModule({ declarations: COMPONENTS }) class M {}";
        let d = ModuleDescriptor::parse(src).unwrap();
        assert!(matches!(
            d.collection("declarations"),
            Err(AppError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_decorator() {
        let err = ModuleDescriptor::parse("export class Nothing {}").unwrap_err();
        assert!(format!("{}", err).contains("No @NgModule decorator"));
    }

    #[test]
    fn test_parse_imports() {
        let src = r#"
import { NgModule } from '@angular/core';
import { CommonModule as CM, type Foo, } from "@angular/common";
import * as utils from './utils';
import Default, { Named } from './default';
import './side-effect';

@NgModule({}) export class M {}
"#;
        let d = ModuleDescriptor::parse(src).unwrap();
        let imports = d.imports();
        assert_eq!(imports.len(), 5);
        assert_eq!(imports[0].symbols, vec!["NgModule"]);
        assert_eq!(imports[0].quote, '\'');
        assert_eq!(imports[1].symbols, vec!["CM", "Foo"]);
        assert_eq!(imports[1].quote, '"');
        assert_eq!(imports[2].symbols, vec!["utils"]);
        assert_eq!(imports[3].symbols, vec!["Default", "Named"]);
        assert!(imports[4].symbols.is_empty());
        assert!(imports[4].named_last_end.is_none());
        assert!(d.imports_symbol("Named"));
        assert!(!d.imports_symbol("CommonModule"));
    }

    #[test]
    fn test_type_only_imports_are_flagged() {
        let src = "import type { A } from './a';\nimport { type B, C } from './b';\nimport type from './t';\n@NgModule({}) class M {}";
        let d = ModuleDescriptor::parse(src).unwrap();
        assert!(d.imports()[0].type_only);
        assert_eq!(d.imports()[0].symbols, vec!["A"]);
        assert!(!d.imports()[1].type_only);
        assert!(!d.imports()[2].type_only);
        assert_eq!(d.imports()[2].symbols, vec!["type"]);
    }

    #[test]
    fn test_regex_literals_in_descriptor() {
        let src = r#"const QUOTE = /'/;
const OPEN = /[{[]/g;
@NgModule({ providers: [{ provide: PATTERN, useValue: /}]/ }], declarations: [] })
export class M {}
"#;
        let d = ModuleDescriptor::parse(src).unwrap();
        assert_eq!(d.metadata().properties.len(), 2);
        assert!(d.collection("declarations").unwrap().unwrap().elements.is_empty());
    }

    #[test]
    fn test_spans_point_into_source() {
        let d = ModuleDescriptor::parse(CORE).unwrap();
        let list = d.collection("imports").unwrap().unwrap();
        assert_eq!(list.span.text(d.source()), "[CommonModule]");
        assert_eq!(&d.source()[list.close()..list.close() + 1], "]");
        assert_eq!(&d.source()[d.metadata().open()..d.metadata().open() + 1], "{");
    }

    #[test]
    fn test_methods_and_spreads_are_opaque() {
        let src = "@NgModule({ ...base, get x() { return [1]; }, declarations: [A] }) class M {}";
        let d = ModuleDescriptor::parse(src).unwrap();
        assert_eq!(d.metadata().properties.len(), 3);
        assert!(d.collection("declarations").unwrap().unwrap().contains_symbol("A"));
    }
}
