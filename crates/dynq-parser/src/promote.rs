//! The promotion engine.
//!
//! Produces an expression of exactly the target type, or nothing. The
//! interesting cases are literal constants: their source text is kept in
//! a parse-local side table so a literal can be re-lexed directly into a
//! narrower numeric type (or, for strings, an enum member) instead of
//! going through a runtime conversion.

use std::str::FromStr;

use dynq_common::{ParseError, ParseErrorKind};
use dynq_types::code::is_numeric;
use dynq_types::{Expr, Prim, Ty, Value};
use rust_decimal::Decimal;

use crate::parser::{operand_type_name, Parser};

/// Side-table key for a literal constant.
///
/// Keyed by value rather than node address: equal-valued literals of the
/// same kind re-lex identically, and the table never outlives the parse.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum LiteralKey {
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Double(u64),
    Str(String),
}

/// The side-table key for a constant value, when that kind of constant
/// participates in literal re-lexing.
pub(crate) fn literal_key(value: &Value) -> Option<LiteralKey> {
    match value {
        Value::Int32(v) => Some(LiteralKey::Int32(*v)),
        Value::UInt32(v) => Some(LiteralKey::UInt32(*v)),
        Value::Int64(v) => Some(LiteralKey::Int64(*v)),
        Value::UInt64(v) => Some(LiteralKey::UInt64(*v)),
        Value::Double(v) => Some(LiteralKey::Double(v.to_bits())),
        Value::Str(s) => Some(LiteralKey::Str(s.clone())),
        _ => None,
    }
}

impl Parser<'_> {
    /// Promote `expr` to exactly `target`, or report failure with `None`.
    ///
    /// In order: identity; typed null; literal re-lexing; widening (as a
    /// checked convert when the target is a value type or `exact` is
    /// requested, otherwise as-is).
    pub(crate) fn promote_expression(
        &self,
        expr: &Expr,
        target: &Ty,
        exact: bool,
    ) -> Option<Expr> {
        if expr.ty() == *target {
            return Some(expr.clone());
        }

        if let Expr::Constant { value, .. } = expr {
            if expr.is_null_literal() {
                if !target.is_value_type() || target.is_nullable() {
                    return Some(Expr::Constant {
                        value: Value::Null,
                        ty: target.clone(),
                    });
                }
            } else if let Some(key) = literal_key(value) {
                if let Some(text) = self.literals.get(&key) {
                    let inner = target.non_nullable();
                    let reparsed = match value {
                        Value::Int32(_) | Value::UInt32(_) | Value::Int64(_) | Value::UInt64(_) => {
                            parse_number(text, &inner)
                        }
                        Value::Double(_) if inner == Ty::decimal() => parse_number(text, &inner),
                        Value::Str(s) => parse_enum_member(s, &inner),
                        _ => None,
                    };
                    if let Some(value) = reparsed {
                        return Some(Expr::Constant {
                            value,
                            ty: target.clone(),
                        });
                    }
                }
            }
        }

        if dynq_types::code::is_compatible_with(&expr.ty(), target) {
            if target.is_value_type() || exact {
                return Some(Expr::Convert {
                    operand: Box::new(expr.clone()),
                    ty: target.clone(),
                    checked: true,
                });
            }
            return Some(expr.clone());
        }

        None
    }

    /// Explicit `T(x)` conversion: nullable lifts of the same underlying
    /// type and numeric/enum pairs convert checked; assignable or
    /// interface-related pairs convert plain; anything else fails.
    pub(crate) fn generate_conversion(
        &self,
        expr: Expr,
        target: &Ty,
        err_pos: u32,
    ) -> Result<Expr, ParseError> {
        let source = expr.ty();
        if source == *target {
            return Ok(expr);
        }
        if source.is_value_type() && target.is_value_type() {
            if (source.is_nullable() || target.is_nullable())
                && source.non_nullable() == target.non_nullable()
            {
                return Ok(Expr::Convert {
                    operand: Box::new(expr),
                    ty: target.clone(),
                    checked: false,
                });
            }
            if (is_numeric(&source) || source.is_enum())
                && (is_numeric(target) || target.is_enum())
            {
                return Ok(Expr::Convert {
                    operand: Box::new(expr),
                    ty: target.clone(),
                    checked: true,
                });
            }
        }
        if source.assignable_from(target)
            || target.assignable_from(&source)
            || is_interface(&source)
            || is_interface(target)
        {
            return Ok(Expr::Convert {
                operand: Box::new(expr),
                ty: target.clone(),
                checked: false,
            });
        }
        Err(ParseError::new(
            ParseErrorKind::CannotConvertValue {
                from: operand_type_name(&expr),
                to: target.name(),
            },
            err_pos,
        ))
    }
}

/// Re-lex `text` as the given numeric primitive.
fn parse_number(text: &str, target: &Ty) -> Option<Value> {
    let Ty::Prim(p) = target else {
        return None;
    };
    match p {
        Prim::SByte => text.parse::<i8>().ok().map(Value::SByte),
        Prim::Byte => text.parse::<u8>().ok().map(Value::Byte),
        Prim::Int16 => text.parse::<i16>().ok().map(Value::Int16),
        Prim::UInt16 => text.parse::<u16>().ok().map(Value::UInt16),
        Prim::Int32 => text.parse::<i32>().ok().map(Value::Int32),
        Prim::UInt32 => text.parse::<u32>().ok().map(Value::UInt32),
        Prim::Int64 => text.parse::<i64>().ok().map(Value::Int64),
        Prim::UInt64 => text.parse::<u64>().ok().map(Value::UInt64),
        Prim::Single => text.parse::<f32>().ok().map(Value::Single),
        Prim::Double => text.parse::<f64>().ok().map(Value::Double),
        Prim::Decimal => Decimal::from_str(text).ok().map(Value::Decimal),
        _ => None,
    }
}

/// Look up an enum member by case-insensitive name.
fn parse_enum_member(name: &str, target: &Ty) -> Option<Value> {
    let Ty::Enum(def) = target else {
        return None;
    };
    def.member(name).map(|(member, value)| Value::Enum {
        ty: target.clone(),
        member: member.to_string(),
        value,
    })
}

fn is_interface(ty: &Ty) -> bool {
    matches!(ty, Ty::Sequence(_))
}
