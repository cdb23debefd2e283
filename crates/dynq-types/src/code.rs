//! Type-code classification and the implicit-widening relation.
//!
//! The promotion engine and overload resolver never look at nominal types
//! directly; they work over type codes and the widening matrix defined
//! here.

use crate::ty::{Prim, Ty};

/// Classification of a type for conversion purposes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypeCode {
    Boolean,
    Char,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Decimal,
    DateTime,
    String,
    /// Everything else, including enums when they take part in the
    /// widening relation.
    Object,
}

/// The type code of a type's non-nullable form.
///
/// Enums report `Object`: they never widen implicitly and only match
/// themselves (see [`is_compatible_with`]).
pub fn type_code(ty: &Ty) -> TypeCode {
    match ty.non_nullable() {
        Ty::Prim(p) => match p {
            Prim::Bool => TypeCode::Boolean,
            Prim::Char => TypeCode::Char,
            Prim::SByte => TypeCode::SByte,
            Prim::Byte => TypeCode::Byte,
            Prim::Int16 => TypeCode::Int16,
            Prim::UInt16 => TypeCode::UInt16,
            Prim::Int32 => TypeCode::Int32,
            Prim::UInt32 => TypeCode::UInt32,
            Prim::Int64 => TypeCode::Int64,
            Prim::UInt64 => TypeCode::UInt64,
            Prim::Single => TypeCode::Single,
            Prim::Double => TypeCode::Double,
            Prim::Decimal => TypeCode::Decimal,
            Prim::DateTime => TypeCode::DateTime,
            Prim::Str => TypeCode::String,
            Prim::TimeSpan | Prim::Guid | Prim::Object => TypeCode::Object,
        },
        _ => TypeCode::Object,
    }
}

/// Numeric classification over the non-nullable form:
/// 0 = not numeric, 1 = floating-like (incl. `Char`), 2 = signed
/// integral, 3 = unsigned integral. Enums report 0.
pub fn numeric_kind(ty: &Ty) -> u8 {
    let nn = ty.non_nullable();
    if nn.is_enum() {
        return 0;
    }
    match nn {
        Ty::Prim(p) => match p {
            Prim::Char | Prim::Single | Prim::Double | Prim::Decimal => 1,
            Prim::SByte | Prim::Int16 | Prim::Int32 | Prim::Int64 => 2,
            Prim::Byte | Prim::UInt16 | Prim::UInt32 | Prim::UInt64 => 3,
            _ => 0,
        },
        _ => 0,
    }
}

/// Whether the non-nullable form is any numeric type.
pub fn is_numeric(ty: &Ty) -> bool {
    numeric_kind(ty) != 0
}

/// Whether the non-nullable form is a signed integral type.
pub fn is_signed_integral(ty: &Ty) -> bool {
    numeric_kind(ty) == 2
}

/// Whether the non-nullable form is an unsigned integral type.
pub fn is_unsigned_integral(ty: &Ty) -> bool {
    numeric_kind(ty) == 3
}

/// The implicit conversion relation.
///
/// Identity always holds. Conversion to a reference type is
/// assignability. Between value types, nullability may only be added,
/// and the source's type code must widen to the target's per the matrix
/// below; enums collapse to `Object` on both sides, which only matches
/// when the non-nullable forms are the same type.
pub fn is_compatible_with(source: &Ty, target: &Ty) -> bool {
    if source == target {
        return true;
    }
    if !target.is_value_type() {
        return target.assignable_from(source);
    }
    let st = source.non_nullable();
    let tt = target.non_nullable();
    // A nullable source cannot lose its nullability implicitly.
    if st != *source && tt == *target {
        return false;
    }
    let sc = type_code(&st);
    let tc = type_code(&tt);
    use TypeCode::*;
    match sc {
        SByte => matches!(tc, SByte | Int16 | Int32 | Int64 | Single | Double | Decimal),
        Byte => matches!(
            tc,
            Byte | Int16 | UInt16 | Int32 | UInt32 | Int64 | UInt64 | Single | Double | Decimal
        ),
        Int16 => matches!(tc, Int16 | Int32 | Int64 | Single | Double | Decimal),
        UInt16 => matches!(
            tc,
            UInt16 | Int32 | UInt32 | Int64 | UInt64 | Single | Double | Decimal
        ),
        Int32 => matches!(tc, Int32 | Int64 | Single | Double | Decimal),
        UInt32 => matches!(tc, UInt32 | Int64 | UInt64 | Single | Double | Decimal),
        Int64 => matches!(tc, Int64 | Single | Double | Decimal),
        UInt64 => matches!(tc, UInt64 | Single | Double | Decimal),
        Single => matches!(tc, Single | Double),
        _ => st == tt,
    }
}
