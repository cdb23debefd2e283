//! dynq parser: recursive descent over a typed expression language.
//!
//! Parses a C#-family infix expression syntax -- with query-aggregate
//! calls, `new(...)` record construction, `is`/`as` type operators, and
//! nested iteration scopes (`it`, `it_1`, ...) -- into the typed
//! expression tree defined by `dynq-types`. Overload resolution and
//! numeric/enum promotion run at every operator and call site, so a
//! successful parse is also a successful type check.

mod aggregates;
mod ordering;
mod parser;
mod promote;
mod resolve;
mod signatures;

pub use ordering::Ordering;

use dynq_common::ParseError;
use dynq_types::{Expr, Param, Ty, Value};

use parser::Parser;

/// Caller-supplied parse configuration.
///
/// `allowed_types` extends the predefined set: each added type becomes
/// referenceable by its short name and a legal method-invocation target.
/// `values` is the positional substitution array (`@0`, `@1`, ...); a
/// trailing [`Value::Map`] is installed as the external symbol table
/// instead of a positional slot.
#[derive(Clone, Debug, Default)]
pub struct ParseOptions {
    pub allowed_types: Vec<Ty>,
    pub values: Vec<Value>,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(mut self, ty: Ty) -> Self {
        self.allowed_types.push(ty);
        self
    }

    pub fn value(mut self, value: Value) -> Self {
        self.values.push(value);
        self
    }
}

/// Parse a single expression.
///
/// When `result_ty` is given, the top-level expression is promoted to it
/// exactly; a promotion failure is an `ExpressionTypeMismatch`.
pub fn parse(text: &str, result_ty: Option<&Ty>, opts: &ParseOptions) -> Result<Expr, ParseError> {
    tracing::debug!(expression = text, "parse");
    let mut parser = Parser::new(text, &[], opts)?;
    parser.parse_to(result_ty)
}

/// Parse an expression over the given parameters and wrap it in a lambda.
///
/// Named parameters become symbols; a single parameter with an empty name
/// is pushed as the implicit `it` receiver.
pub fn parse_lambda(
    params: &[Param],
    result_ty: Option<&Ty>,
    text: &str,
    opts: &ParseOptions,
) -> Result<Expr, ParseError> {
    tracing::debug!(expression = text, params = params.len(), "parse_lambda");
    let mut parser = Parser::new(text, params, opts)?;
    let body = parser.parse_to(result_ty)?;
    Ok(Expr::Lambda {
        params: params.to_vec(),
        body: Box::new(body),
    })
}

/// Parse an expression over a single anonymous `it` parameter of the
/// given element type and wrap it in a lambda.
pub fn parse_it_lambda(
    element_ty: &Ty,
    result_ty: Option<&Ty>,
    text: &str,
    opts: &ParseOptions,
) -> Result<Expr, ParseError> {
    let param = Param::new("", element_ty.clone());
    parse_lambda(std::slice::from_ref(&param), result_ty, text, opts)
}

/// Parse a comma-separated ordering clause list over an anonymous `it`
/// parameter of the given element type:
/// `expr [asc|ascending|desc|descending], ...`.
pub fn parse_ordering(
    element_ty: &Ty,
    text: &str,
    opts: &ParseOptions,
) -> Result<Vec<Ordering>, ParseError> {
    tracing::debug!(expression = text, "parse_ordering");
    let param = Param::new("", element_ty.clone());
    let mut parser = Parser::new(text, std::slice::from_ref(&param), opts)?;
    parser.parse_ordering_list(&param)
}
