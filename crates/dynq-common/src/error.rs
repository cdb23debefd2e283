use std::fmt;

use serde::Serialize;

/// A parse-time failure with the byte offset where it was detected.
///
/// The first error aborts the parse; there is no recovery, so a failed
/// parse produces exactly one `ParseError`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// 0-based byte offset into the source expression.
    pub position: u32,
}

impl ParseError {
    /// Create a new parse error at the given offset.
    pub fn new(kind: ParseErrorKind, position: u32) -> Self {
        Self { kind, position }
    }
}

/// The specific kind of parse error.
///
/// Variants are grouped the way failures arise: lexical, syntactic, name
/// resolution, typing, and overload resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ParseErrorKind {
    // ── Lexical ────────────────────────────────────────────────────────
    /// A string literal was not closed before end of input.
    UnterminatedStringLiteral,
    /// An unexpected character was encountered.
    InvalidCharacter(char),
    /// A digit was required (after `.` or an exponent sign).
    DigitExpected,
    /// An integer literal is out of range for every integral type.
    InvalidIntegerLiteral(String),
    /// A real literal could not be parsed.
    InvalidRealLiteral(String),
    /// A character literal must contain exactly one character.
    InvalidCharacterLiteral,

    // ── Syntactic ──────────────────────────────────────────────────────
    /// Generic syntax error at the current token.
    SyntaxError,
    OpenParenExpected,
    CloseParenOrCommaExpected,
    CloseParenOrOperatorExpected,
    ColonExpected,
    DotOrOpenParenExpected,
    CloseBracketOrCommaExpected,
    IdentifierExpected,
    /// A `new(...)` element that is not a member access needs `alias Name`.
    MissingAsClause,
    ExpressionExpected,

    // ── Name resolution ────────────────────────────────────────────────
    UnknownIdentifier(String),
    /// No property or field with this name on the given type.
    UnknownPropertyOrField { name: String, ty: String },
    DuplicateIdentifier(String),
    /// `it` (or `it_k`) referenced with no iteration scope in reach.
    NoItInScope,

    // ── Typing ─────────────────────────────────────────────────────────
    /// The top-level expression did not have the requested result type.
    ExpressionTypeMismatch { expected: String },
    /// `?` applied to a reference type or an already-nullable type.
    TypeHasNoNullableForm(String),
    CannotConvertValue { from: String, to: String },
    /// The ternary test expression must be boolean.
    FirstExprMustBeBool,
    /// Ternary arms each promote to the other's type.
    BothTypesConvertToOther { left: String, right: String },
    /// Neither ternary arm promotes to the other's type.
    NeitherTypeConvertsToOther { left: String, right: String },
    /// A unary operator rejected its operand type.
    IncompatibleOperand { op: String, ty: String },
    /// A binary operator rejected its operand types.
    IncompatibleOperands { op: String, left: String, right: String },
    /// An array index was not an integer expression.
    InvalidIndex,
    CannotIndexMultiDimArray,

    // ── Overload resolution ────────────────────────────────────────────
    NoApplicableMethod { name: String, ty: String },
    AmbiguousMethodInvocation { name: String, ty: String },
    NoApplicableIndexer(String),
    AmbiguousIndexerInvocation(String),
    NoMatchingConstructor(String),
    AmbiguousConstructorInvocation(String),
    /// No aggregate form with this name applies to the arguments.
    NoApplicableAggregate(String),
    /// Methods on this type are not accessible (type not allowed).
    MethodsAreInaccessible(String),
    /// The resolved method returns no value.
    MethodIsVoid { name: String, ty: String },
    /// A lambda-valued substitution was invoked with incompatible args.
    ArgsIncompatibleWithLambda,
    IifRequiresThreeArgs,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedStringLiteral => write!(f, "unterminated string literal"),
            Self::InvalidCharacter(c) => write!(f, "syntax error: unexpected character {c:?}"),
            Self::DigitExpected => write!(f, "digit expected"),
            Self::InvalidIntegerLiteral(s) => write!(f, "invalid integer literal: {s}"),
            Self::InvalidRealLiteral(s) => write!(f, "invalid real literal: {s}"),
            Self::InvalidCharacterLiteral => {
                write!(f, "character literal must contain exactly one character")
            }
            Self::SyntaxError => write!(f, "syntax error"),
            Self::OpenParenExpected => write!(f, "'(' expected"),
            Self::CloseParenOrCommaExpected => write!(f, "')' or ',' expected"),
            Self::CloseParenOrOperatorExpected => write!(f, "')' or operator expected"),
            Self::ColonExpected => write!(f, "':' expected"),
            Self::DotOrOpenParenExpected => write!(f, "'.' or '(' expected"),
            Self::CloseBracketOrCommaExpected => write!(f, "']' or ',' expected"),
            Self::IdentifierExpected => write!(f, "identifier expected"),
            Self::MissingAsClause => {
                write!(f, "expression is missing an 'alias Name' clause")
            }
            Self::ExpressionExpected => write!(f, "expression expected"),
            Self::UnknownIdentifier(name) => write!(f, "unknown identifier `{name}`"),
            Self::UnknownPropertyOrField { name, ty } => {
                write!(f, "no property or field `{name}` exists on type `{ty}`")
            }
            Self::DuplicateIdentifier(name) => {
                write!(f, "identifier `{name}` defined more than once")
            }
            Self::NoItInScope => write!(f, "no `it` is in scope"),
            Self::ExpressionTypeMismatch { expected } => {
                write!(f, "expression of type `{expected}` expected")
            }
            Self::TypeHasNoNullableForm(ty) => {
                write!(f, "type `{ty}` has no nullable form")
            }
            Self::CannotConvertValue { from, to } => {
                write!(f, "a value of type `{from}` cannot be converted to type `{to}`")
            }
            Self::FirstExprMustBeBool => {
                write!(f, "the first expression must be of boolean type")
            }
            Self::BothTypesConvertToOther { left, right } => {
                write!(f, "both of the types `{left}` and `{right}` convert to the other")
            }
            Self::NeitherTypeConvertsToOther { left, right } => {
                write!(f, "neither of the types `{left}` and `{right}` converts to the other")
            }
            Self::IncompatibleOperand { op, ty } => {
                write!(f, "operator `{op}` is incompatible with operand type `{ty}`")
            }
            Self::IncompatibleOperands { op, left, right } => {
                write!(
                    f,
                    "operator `{op}` is incompatible with operand types `{left}` and `{right}`"
                )
            }
            Self::InvalidIndex => write!(f, "array index must be an integer expression"),
            Self::CannotIndexMultiDimArray => {
                write!(f, "indexing of multi-dimensional arrays is not supported")
            }
            Self::NoApplicableMethod { name, ty } => {
                write!(f, "no applicable method `{name}` exists on type `{ty}`")
            }
            Self::AmbiguousMethodInvocation { name, ty } => {
                write!(f, "ambiguous invocation of method `{name}` on type `{ty}`")
            }
            Self::NoApplicableIndexer(ty) => {
                write!(f, "no applicable indexer exists on type `{ty}`")
            }
            Self::AmbiguousIndexerInvocation(ty) => {
                write!(f, "ambiguous invocation of indexer on type `{ty}`")
            }
            Self::NoMatchingConstructor(ty) => {
                write!(f, "no matching constructor on type `{ty}`")
            }
            Self::AmbiguousConstructorInvocation(ty) => {
                write!(f, "ambiguous invocation of constructor on type `{ty}`")
            }
            Self::NoApplicableAggregate(name) => {
                write!(f, "no applicable aggregate method `{name}` exists")
            }
            Self::MethodsAreInaccessible(ty) => {
                write!(f, "methods on type `{ty}` are not accessible")
            }
            Self::MethodIsVoid { name, ty } => {
                write!(f, "method `{name}` on type `{ty}` returns no value")
            }
            Self::ArgsIncompatibleWithLambda => {
                write!(f, "argument list incompatible with lambda expression")
            }
            Self::IifRequiresThreeArgs => {
                write!(f, "iif requires exactly three arguments")
            }
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at offset {})", self.kind, self.position)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let err = ParseError::new(ParseErrorKind::UnknownIdentifier("foo".into()), 4);
        assert_eq!(err.to_string(), "unknown identifier `foo` (at offset 4)");
    }

    #[test]
    fn operand_error_display() {
        let err = ParseErrorKind::IncompatibleOperands {
            op: "+".into(),
            left: "bool".into(),
            right: "int".into(),
        };
        assert_eq!(
            err.to_string(),
            "operator `+` is incompatible with operand types `bool` and `int`"
        );
    }
}
