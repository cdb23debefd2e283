//! Synthetic operator signature sets.
//!
//! Each operator class is described as an over-generous candidate set and
//! handed to the overload resolver; the better-conversion rule does all
//! disambiguation. No operator pair is special-cased.

use dynq_types::{Prim, Ty};

/// One operator signature: parameter types plus the result type the
/// operation produces when this signature is selected.
#[derive(Clone, Debug)]
pub(crate) struct OpSig {
    pub params: Vec<Ty>,
    pub result: Ty,
}

fn unary(p: Ty, result: Ty) -> OpSig {
    OpSig {
        params: vec![p],
        result,
    }
}

fn binary(a: Ty, b: Ty, result: Ty) -> OpSig {
    OpSig {
        params: vec![a, b],
        result,
    }
}

/// Same-type binary signature over `t`, producing `t`.
fn homogeneous(t: Ty) -> OpSig {
    binary(t.clone(), t.clone(), t)
}

/// The arithmetic operand types, plain and nullable-lifted.
fn numeric_operands() -> Vec<Ty> {
    use Prim::*;
    let plain: Vec<Ty> = [Int32, UInt32, Int64, UInt64, Single, Double, Decimal]
        .into_iter()
        .map(Ty::Prim)
        .collect();
    let mut out = plain.clone();
    out.extend(plain.into_iter().map(Ty::nullable));
    out
}

/// The extra relational operand types: string plus the orderable scalars,
/// with nullable lifts for the value types.
fn relational_extras() -> Vec<Ty> {
    let mut out = vec![
        Ty::string(),
        Ty::char(),
        Ty::date_time(),
        Ty::time_span(),
    ];
    out.extend([Ty::char(), Ty::date_time(), Ty::time_span()].map(Ty::nullable));
    out
}

/// `&&` / `||`: boolean operands, lifted result for lifted operands.
pub(crate) fn logical() -> Vec<OpSig> {
    vec![
        homogeneous(Ty::bool()),
        homogeneous(Ty::nullable(Ty::bool())),
    ]
}

/// `* / %` and plain `+ -`: same-type numeric operands.
pub(crate) fn arithmetic() -> Vec<OpSig> {
    numeric_operands().into_iter().map(homogeneous).collect()
}

/// `< <= > >=`: arithmetic operands plus the orderable extras. All
/// comparisons produce plain `Boolean`.
pub(crate) fn relational() -> Vec<OpSig> {
    let mut out: Vec<OpSig> = arithmetic()
        .into_iter()
        .map(|s| OpSig {
            params: s.params,
            result: Ty::bool(),
        })
        .collect();
    out.extend(relational_extras().into_iter().map(|t| binary(t.clone(), t, Ty::bool())));
    out
}

/// `= == != <>`: the relational set plus booleans.
pub(crate) fn equality() -> Vec<OpSig> {
    let mut out = relational();
    out.push(binary(Ty::bool(), Ty::bool(), Ty::bool()));
    out.push(binary(
        Ty::nullable(Ty::bool()),
        Ty::nullable(Ty::bool()),
        Ty::bool(),
    ));
    out
}

/// `+`: arithmetic plus the date/span forms.
pub(crate) fn additive() -> Vec<OpSig> {
    let mut out = arithmetic();
    out.push(binary(Ty::date_time(), Ty::time_span(), Ty::date_time()));
    out.push(binary(Ty::time_span(), Ty::time_span(), Ty::time_span()));
    out.push(binary(
        Ty::nullable(Ty::date_time()),
        Ty::nullable(Ty::time_span()),
        Ty::nullable(Ty::date_time()),
    ));
    out.push(binary(
        Ty::nullable(Ty::time_span()),
        Ty::nullable(Ty::time_span()),
        Ty::nullable(Ty::time_span()),
    ));
    out
}

/// `-`: the additive set plus date difference.
pub(crate) fn subtractive() -> Vec<OpSig> {
    let mut out = additive();
    out.push(binary(Ty::date_time(), Ty::date_time(), Ty::time_span()));
    out.push(binary(
        Ty::nullable(Ty::date_time()),
        Ty::nullable(Ty::date_time()),
        Ty::nullable(Ty::time_span()),
    ));
    out
}

/// Unary `-`: signed numerics only.
pub(crate) fn negation() -> Vec<OpSig> {
    use Prim::*;
    let plain: Vec<Ty> = [Int32, Int64, Single, Double, Decimal]
        .into_iter()
        .map(Ty::Prim)
        .collect();
    let mut operands = plain.clone();
    operands.extend(plain.into_iter().map(Ty::nullable));
    operands.into_iter().map(|t| unary(t.clone(), t)).collect()
}

/// Unary `!` / `not`.
pub(crate) fn logical_not() -> Vec<OpSig> {
    vec![
        unary(Ty::bool(), Ty::bool()),
        unary(Ty::nullable(Ty::bool()), Ty::nullable(Ty::bool())),
    ]
}
