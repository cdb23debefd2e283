//! dynq: a typed dynamic-expression language.
//!
//! Parses a C#-family infix expression syntax -- query aggregates,
//! `new(...)` record construction, `is`/`as`, nested iteration scopes --
//! into a typed expression tree, with full overload resolution and
//! numeric/enum promotion, plus an anonymous-record factory keyed by
//! structural signature.
//!
//! This crate is the public facade: it re-exports the parser entry
//! points, the type model, and the record factory, and adds a thin
//! query-builder layer over the parser.

pub mod query;

pub use dynq_common::{diagnostics, ParseError, ParseErrorKind, Span, Token, TokenKind};
pub use dynq_lexer::Lexer;
pub use dynq_parser::{
    parse, parse_it_lambda, parse_lambda, parse_ordering, Ordering, ParseOptions,
};
pub use dynq_records::{create_class, DynamicProperty, Record, RecordError, Signature};
pub use dynq_types::{
    builtins, code, BinaryOp, ClassBuilder, EnumDef, Expr, Param, Prim, SequenceOp, Ty, UnaryOp,
    Value,
};
