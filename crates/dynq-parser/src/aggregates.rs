//! The aggregate dispatcher.
//!
//! Maps query-aggregate identifiers (`Any`, `Where`, `Sum`, ...) on
//! enumerable receivers to standard set operations. The argument body is
//! parsed inside a fresh iteration scope, the matching form is selected
//! by the overload resolver against a fixed signature table, and the
//! call is assembled as a `SequenceCall` node.

use dynq_common::{ParseError, ParseErrorKind};
use dynq_types::{Expr, Param, Prim, SequenceOp, Ty};

use crate::parser::Parser;
use crate::resolve::{Candidate, Resolution};

/// The fixed signature table: the operation and its candidate parameter
/// lists, matched by case-insensitive name.
fn aggregate_forms(name: &str) -> Option<(SequenceOp, Vec<Candidate>)> {
    use SequenceOp::*;
    let none = Vec::new;
    let boolean = || vec![Ty::bool()];
    let any = || vec![Ty::object()];
    let op = match name.to_ascii_lowercase().as_str() {
        "where" => (Where, vec![boolean()]),
        "any" => (Any, vec![none(), boolean()]),
        "all" => (All, vec![boolean()]),
        "count" => (Count, vec![none(), boolean()]),
        "first" => (First, vec![none(), boolean()]),
        "firstordefault" => (FirstOrDefault, vec![none(), boolean()]),
        "min" => (Min, vec![any()]),
        "max" => (Max, vec![any()]),
        "sum" => (Sum, numeric_selectors()),
        "average" => (Average, numeric_selectors()),
        "contains" => (Contains, contains_operands()),
        "select" => (Select, vec![any()]),
        "selectmany" => (SelectMany, vec![any()]),
        "groupby" => (GroupBy, vec![any()]),
        "distinct" => (Distinct, vec![none(), boolean()]),
        "union" => (Union, vec![none(), boolean()]),
        "concat" => (Concat, vec![none(), boolean()]),
        _ => return None,
    };
    let (op, params) = op;
    Some((op, params.into_iter().map(Candidate::new).collect()))
}

/// Selector types accepted by `Sum`/`Average`.
fn numeric_selectors() -> Vec<Vec<Ty>> {
    use Prim::*;
    let plain: Vec<Ty> = [Int32, Int64, Single, Double, Decimal]
        .into_iter()
        .map(Ty::Prim)
        .collect();
    let mut out: Vec<Vec<Ty>> = plain.iter().cloned().map(|t| vec![t]).collect();
    out.extend(plain.into_iter().map(|t| vec![Ty::nullable(t)]));
    out
}

/// Operand types accepted by `Contains`: numerics or a string.
fn contains_operands() -> Vec<Vec<Ty>> {
    let mut out = numeric_selectors();
    out.push(vec![Ty::string()]);
    out
}

/// The result type of an assembled aggregate call.
fn result_type(op: SequenceOp, element: &Ty, arg: Option<&Ty>) -> Ty {
    use SequenceOp::*;
    match op {
        Where | Distinct | Union | Concat => Ty::sequence(element.clone()),
        Any | All | Contains => Ty::bool(),
        Count => Ty::int32(),
        First | FirstOrDefault => element.clone(),
        Min | Max | Sum => arg.cloned().unwrap_or_else(|| element.clone()),
        Average => average_type(arg.expect("average always takes a selector")),
        Select => Ty::sequence(arg.cloned().unwrap_or_else(Ty::object)),
        SelectMany => {
            let inner = arg
                .and_then(Ty::enumerable_element)
                .unwrap_or_else(Ty::object);
            Ty::sequence(inner)
        }
        GroupBy => Ty::sequence(Ty::sequence(element.clone())),
    }
}

/// Averages of integral selectors are `Double`; floating selectors keep
/// their kind. Nullability is preserved.
fn average_type(selector: &Ty) -> Ty {
    let inner = match selector.non_nullable() {
        Ty::Prim(Prim::Single) => Ty::Prim(Prim::Single),
        Ty::Prim(Prim::Decimal) => Ty::decimal(),
        _ => Ty::double(),
    };
    if selector.is_nullable() {
        Ty::nullable(inner)
    } else {
        inner
    }
}

impl Parser<'_> {
    /// Parse and assemble an aggregate call on `receiver`.
    ///
    /// A fresh iteration parameter typed as the element is pushed while
    /// the arguments parse, so `it` refers to the element and `it_1` to
    /// the enclosing scope.
    pub(crate) fn parse_aggregate(
        &mut self,
        receiver: Expr,
        element: Ty,
        name: &str,
        err_pos: u32,
    ) -> Result<Expr, ParseError> {
        let inner = Param::new("it", element.clone());
        self.it_stack.push(inner.clone());
        let parsed = self.parse_argument_list();
        self.it_stack.pop();
        let args = parsed?;

        let Some((op, forms)) = aggregate_forms(name) else {
            return Err(self.error_at(
                ParseErrorKind::NoApplicableAggregate(name.to_string()),
                err_pos,
            ));
        };
        let Resolution::Single { args, .. } = self.find_best(&forms, &args) else {
            return Err(self.error_at(
                ParseErrorKind::NoApplicableAggregate(name.to_string()),
                err_pos,
            ));
        };

        let arg_ty = args.first().map(Expr::ty);
        let ty = result_type(op, &element, arg_ty.as_ref());
        let type_args = match op {
            SequenceOp::Min | SequenceOp::Max => {
                vec![element, arg_ty.clone().expect("min/max take a selector")]
            }
            _ => vec![element],
        };
        let call_args = match args.into_iter().next() {
            None => vec![receiver],
            Some(arg) if op == SequenceOp::Contains => vec![receiver, arg],
            Some(body) => vec![
                receiver,
                Expr::Lambda {
                    params: vec![inner],
                    body: Box::new(body),
                },
            ],
        };
        Ok(Expr::SequenceCall {
            op,
            type_args,
            args: call_args,
            ty,
        })
    }
}
