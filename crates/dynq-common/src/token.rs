use serde::Serialize;

use crate::span::Span;

/// The kind of a lexed token.
///
/// Word operators (`and`, `or`, `not`, `mod`) and the `alias`/ordering
/// keywords are *not* token kinds: they lex as `Ident` and the parser
/// matches their lexemes case-insensitively. Only `as` and `is` are
/// retagged at lex time, because they act as infix operators whose right
/// operand is a type name rather than an expression.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    /// End of input.
    End,
    /// An identifier (also `@`-prefixed substitution names like `@0`).
    Ident,
    /// The identifier `as`, retagged.
    AsKw,
    /// The identifier `is`, retagged.
    IsKw,
    /// A `"` or `'` delimited string literal (delimiters included).
    StringLit,
    /// An integer literal.
    IntLit,
    /// A real literal (fraction, exponent, or `F` suffix).
    RealLit,

    // ── Single-character punctuators ───────────────────────────────────
    Bang,
    Percent,
    Amp,
    LParen,
    RParen,
    Star,
    Plus,
    Comma,
    Minus,
    Dot,
    Slash,
    Colon,
    Lt,
    Eq,
    Gt,
    Question,
    LBracket,
    RBracket,
    Bar,

    // ── Two-character compounds ────────────────────────────────────────
    /// `!=`
    NotEq,
    /// `&&`
    AmpAmp,
    /// `<=`
    LtEq,
    /// `<>`
    Diamond,
    /// `==`
    EqEq,
    /// `>=`
    GtEq,
    /// `||`
    BarBar,
}

/// A lexed token. The lexeme is recovered by slicing the source with the
/// span, so tokens stay two words wide.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Create a new token covering `start..end`.
    pub fn new(kind: TokenKind, start: u32, end: u32) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
        }
    }

    /// The token's lexeme within `source`.
    pub fn text<'src>(&self, source: &'src str) -> &'src str {
        &source[self.span.start as usize..self.span.end as usize]
    }

    /// The token's starting byte offset.
    pub fn pos(&self) -> u32 {
        self.span.start
    }
}
