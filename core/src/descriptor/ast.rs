//! Typed syntax nodes produced by the descriptor parser.
//!
//! Only the shapes the registration engine cares about get their own variant;
//! everything else collapses into [`Expr::Other`] with its span preserved.

use super::lexer::Span;

/// An expression inside the metadata object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// `{ key: value, ... }`
    Object(ObjectLit),
    /// `[a, b, ...]`
    Array(ArrayLit),
    /// A bare identifier such as `CommonModule`.
    Ident {
        /// Identifier text.
        name: String,
        /// Location.
        span: Span,
    },
    /// A string literal (quotes stripped).
    Str {
        /// Unquoted value.
        value: String,
        /// Location, quotes included.
        span: Span,
    },
    /// Anything else: calls, member access, spreads, arrow functions, ...
    Other(Span),
}

impl Expr {
    /// The source range covered by the expression.
    pub fn span(&self) -> Span {
        match self {
            Expr::Object(o) => o.span,
            Expr::Array(a) => a.span,
            Expr::Ident { span, .. } | Expr::Str { span, .. } | Expr::Other(span) => *span,
        }
    }

    /// Returns the identifier name if this is a bare identifier.
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Expr::Ident { name, .. } => Some(name),
            _ => None,
        }
    }

    /// A short human label for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Object(_) => "object literal",
            Expr::Array(_) => "array literal",
            Expr::Ident { .. } => "identifier",
            Expr::Str { .. } => "string literal",
            Expr::Other(_) => "expression",
        }
    }
}

/// An object literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLit {
    /// From `{` through `}`.
    pub span: Span,
    /// Properties in source order.
    pub properties: Vec<Property>,
    /// Whether the last property is followed by a comma.
    pub trailing_comma: bool,
}

impl ObjectLit {
    /// Offset of the opening brace.
    pub fn open(&self) -> usize {
        self.span.start
    }

    /// Offset of the closing brace.
    pub fn close(&self) -> usize {
        self.span.end - 1
    }

    /// All properties whose key is `key`, in source order.
    pub fn properties_named<'s: 'k, 'k>(
        &'s self,
        key: &'k str,
    ) -> impl Iterator<Item = &'s Property> + 'k {
        self.properties
            .iter()
            .filter(move |p| p.key.as_deref() == Some(key))
    }
}

/// One entry of an object literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// The key, unquoted. `None` for spreads and computed keys.
    pub key: Option<String>,
    /// The value. `None` for methods and spreads.
    pub value: Option<Expr>,
    /// The whole property, key through value.
    pub span: Span,
}

/// An array literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayLit {
    /// From `[` through `]`.
    pub span: Span,
    /// Elements in source order.
    pub elements: Vec<Expr>,
    /// Offset just past the trailing comma, if the list has one.
    pub trailing_comma: Option<usize>,
}

impl ArrayLit {
    /// Offset of the opening bracket.
    pub fn open(&self) -> usize {
        self.span.start
    }

    /// Offset of the closing bracket.
    pub fn close(&self) -> usize {
        self.span.end - 1
    }

    /// True if a bare identifier `symbol` is already listed.
    pub fn contains_symbol(&self, symbol: &str) -> bool {
        self.elements.iter().any(|e| e.as_ident() == Some(symbol))
    }
}

/// A top-level `import ... from '...'` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    /// From `import` through the optional `;`.
    pub span: Span,
    /// Local names bound by the import.
    pub symbols: Vec<String>,
    /// The module specifier, unquoted.
    pub specifier: String,
    /// The quote character used for the specifier.
    pub quote: char,
    /// End of the last specifier in a non-empty `{ ... }` list.
    pub named_last_end: Option<usize>,
    /// `import type { ... }`: binds types only, never values.
    pub type_only: bool,
}
