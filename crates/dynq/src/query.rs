//! Thin query-builder wrappers over the parser.
//!
//! A [`Query`] holds a source expression of sequence type and appends
//! aggregate nodes by parsing textual predicate/selector bodies against
//! the element scope. This layer is glue: it contains no typing logic of
//! its own and produces exactly the nodes the parser would.

use std::fmt;

use dynq_parser::{parse_it_lambda, parse_ordering, Ordering, ParseOptions};
use dynq_types::{Expr, SequenceOp, Ty};

use crate::ParseError;

/// Failure constructing or extending a query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    /// The source expression is not a sequence.
    NotASequence(String),
    /// A predicate/selector body failed to parse.
    Parse(ParseError),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotASequence(ty) => write!(f, "type `{ty}` is not a sequence"),
            Self::Parse(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for QueryError {}

impl From<ParseError> for QueryError {
    fn from(err: ParseError) -> Self {
        QueryError::Parse(err)
    }
}

/// A query under construction over a sequence-typed source expression.
#[derive(Clone, Debug)]
pub struct Query {
    source: Expr,
    element: Ty,
    orderings: Vec<Ordering>,
    opts: ParseOptions,
}

impl Query {
    /// Start a query over `source`, which must be enumerable.
    pub fn new(source: Expr, opts: ParseOptions) -> Result<Query, QueryError> {
        let element = source
            .ty()
            .enumerable_element()
            .ok_or_else(|| QueryError::NotASequence(source.ty().name()))?;
        Ok(Query {
            source,
            element,
            orderings: Vec::new(),
            opts,
        })
    }

    /// The element type iterated by this query.
    pub fn element(&self) -> &Ty {
        &self.element
    }

    /// Append `Where` with the given boolean predicate body.
    pub fn filter(mut self, predicate: &str) -> Result<Query, QueryError> {
        let lambda = parse_it_lambda(&self.element, Some(&Ty::bool()), predicate, &self.opts)?;
        self.source = self.sequence_call(
            SequenceOp::Where,
            vec![self.element.clone()],
            lambda,
            Ty::sequence(self.element.clone()),
        );
        Ok(self)
    }

    /// Append `Select` with the given selector body; the element type
    /// becomes the selector's result type.
    pub fn map(mut self, selector: &str) -> Result<Query, QueryError> {
        let lambda = parse_it_lambda(&self.element, None, selector, &self.opts)?;
        let Ty::Func(sig) = lambda.ty() else {
            unreachable!("parse_it_lambda returns a lambda");
        };
        let result = sig.result.clone();
        self.source = self.sequence_call(
            SequenceOp::Select,
            vec![self.element.clone()],
            lambda,
            Ty::sequence(result.clone()),
        );
        self.element = result;
        Ok(self)
    }

    /// Record ordering clauses (`expr [asc|desc], ...`) for the query
    /// surface to consume.
    pub fn order_by(mut self, clauses: &str) -> Result<Query, QueryError> {
        let parsed = parse_ordering(&self.element, clauses, &self.opts)?;
        self.orderings.extend(parsed);
        Ok(self)
    }

    /// Terminal `Any`, with an optional predicate body.
    pub fn any(self, predicate: Option<&str>) -> Result<Expr, QueryError> {
        self.terminal(SequenceOp::Any, predicate)
    }

    /// Terminal `Count`, with an optional predicate body.
    pub fn count(self, predicate: Option<&str>) -> Result<Expr, QueryError> {
        self.terminal(SequenceOp::Count, predicate)
    }

    /// Terminal `FirstOrDefault`, with an optional predicate body.
    pub fn first_or_default(self, predicate: Option<&str>) -> Result<Expr, QueryError> {
        self.terminal(SequenceOp::FirstOrDefault, predicate)
    }

    /// The built-up source expression.
    pub fn expr(&self) -> &Expr {
        &self.source
    }

    /// The recorded ordering clauses.
    pub fn orderings(&self) -> &[Ordering] {
        &self.orderings
    }

    /// Finish the query, handing back the source expression and the
    /// ordering clauses.
    pub fn finish(self) -> (Expr, Vec<Ordering>) {
        (self.source, self.orderings)
    }

    fn terminal(self, op: SequenceOp, predicate: Option<&str>) -> Result<Expr, QueryError> {
        let ty = match op {
            SequenceOp::Count => Ty::int32(),
            SequenceOp::Any => Ty::bool(),
            _ => self.element.clone(),
        };
        let args = match predicate {
            Some(body) => {
                let lambda = parse_it_lambda(&self.element, Some(&Ty::bool()), body, &self.opts)?;
                vec![self.source.clone(), lambda]
            }
            None => vec![self.source.clone()],
        };
        Ok(Expr::SequenceCall {
            op,
            type_args: vec![self.element.clone()],
            args,
            ty,
        })
    }

    fn sequence_call(&self, op: SequenceOp, type_args: Vec<Ty>, lambda: Expr, ty: Ty) -> Expr {
        Expr::SequenceCall {
            op,
            type_args,
            args: vec![self.source.clone(), lambda],
            ty,
        }
    }
}
