//! Constant values carried by the typed IR.
//!
//! A [`Value`] is what a constant node holds and what callers pass as
//! positional substitutions (`@0`, `@1`, ...). Values never evaluate
//! anything; they are data the host eventually interprets.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{NaiveDateTime, TimeDelta};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::expr::Expr;
use crate::ty::Ty;

/// A constant value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Value {
    /// The untyped null literal (typed nulls keep their type on the
    /// constant node, not the value).
    Null,
    Bool(bool),
    Char(char),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Single(f32),
    Double(f64),
    Decimal(Decimal),
    Str(String),
    DateTime(NaiveDateTime),
    TimeSpan(#[serde(serialize_with = "ser_time_span")] TimeDelta),
    Guid(Uuid),
    /// A member of an enum type, by declared name and underlying value.
    Enum {
        #[serde(serialize_with = "ser_type_name")]
        ty: Ty,
        member: String,
        value: i64,
    },
    /// A prebuilt lambda installable as a substitution value; referencing
    /// it followed by an argument list invokes it.
    Lambda(#[serde(serialize_with = "ser_lambda")] Arc<Expr>),
    /// A string-keyed value map. A trailing map in the substitution array
    /// becomes the parser's external symbol table.
    Map(HashMap<String, Value>),
}

/// Time spans serialize as `(seconds, subsecond nanos)`, the same
/// decomposition hashing uses.
fn ser_time_span<S: Serializer>(delta: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
    let secs = delta.num_seconds();
    let nanos = (*delta - TimeDelta::seconds(secs))
        .num_nanoseconds()
        .unwrap_or(0);
    (secs, nanos).serialize(serializer)
}

/// Enum member types serialize by name.
fn ser_type_name<S: Serializer>(ty: &Ty, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ty.name())
}

/// Lambda values serialize through their rendering.
fn ser_lambda<S: Serializer>(expr: &Arc<Expr>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(expr)
}

impl Value {
    /// The natural type of this value.
    pub fn ty(&self) -> Ty {
        match self {
            Value::Null => Ty::object(),
            Value::Bool(_) => Ty::bool(),
            Value::Char(_) => Ty::char(),
            Value::SByte(_) => Ty::Prim(crate::ty::Prim::SByte),
            Value::Byte(_) => Ty::Prim(crate::ty::Prim::Byte),
            Value::Int16(_) => Ty::Prim(crate::ty::Prim::Int16),
            Value::UInt16(_) => Ty::Prim(crate::ty::Prim::UInt16),
            Value::Int32(_) => Ty::int32(),
            Value::UInt32(_) => Ty::Prim(crate::ty::Prim::UInt32),
            Value::Int64(_) => Ty::int64(),
            Value::UInt64(_) => Ty::Prim(crate::ty::Prim::UInt64),
            Value::Single(_) => Ty::Prim(crate::ty::Prim::Single),
            Value::Double(_) => Ty::double(),
            Value::Decimal(_) => Ty::decimal(),
            Value::Str(_) => Ty::string(),
            Value::DateTime(_) => Ty::date_time(),
            Value::TimeSpan(_) => Ty::time_span(),
            Value::Guid(_) => Ty::guid(),
            Value::Enum { ty, .. } => ty.clone(),
            Value::Lambda(expr) => expr.ty(),
            Value::Map(_) => Ty::object(),
        }
    }

    /// Whether this is the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(v) => v.hash(state),
            Value::Char(v) => v.hash(state),
            Value::SByte(v) => v.hash(state),
            Value::Byte(v) => v.hash(state),
            Value::Int16(v) => v.hash(state),
            Value::UInt16(v) => v.hash(state),
            Value::Int32(v) => v.hash(state),
            Value::UInt32(v) => v.hash(state),
            Value::Int64(v) => v.hash(state),
            Value::UInt64(v) => v.hash(state),
            // Floats hash by bit pattern, with -0.0 folded onto 0.0 so
            // equal values hash equally.
            Value::Single(v) => (if *v == 0.0 { 0.0f32 } else { *v }).to_bits().hash(state),
            Value::Double(v) => (if *v == 0.0 { 0.0f64 } else { *v }).to_bits().hash(state),
            Value::Decimal(v) => v.hash(state),
            Value::Str(v) => v.hash(state),
            Value::DateTime(v) => v.hash(state),
            // Time spans hash by (seconds, subsecond nanos).
            Value::TimeSpan(v) => {
                let secs = v.num_seconds();
                let nanos = (*v - TimeDelta::seconds(secs)).num_nanoseconds().unwrap_or(0);
                secs.hash(state);
                nanos.hash(state);
            }
            Value::Guid(v) => v.hash(state),
            Value::Enum { ty, value, .. } => {
                ty.hash(state);
                value.hash(state);
            }
            Value::Lambda(expr) => (Arc::as_ptr(expr) as usize).hash(state),
            // Maps are not meaningful record slots; hash by size.
            Value::Map(m) => m.len().hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "'{v}'"),
            Value::SByte(v) => write!(f, "{v}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::UInt16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::UInt32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::UInt64(v) => write!(f, "{v}"),
            Value::Single(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "\"{v}\""),
            Value::DateTime(v) => write!(f, "{v}"),
            Value::TimeSpan(v) => write!(f, "{v}"),
            Value::Guid(v) => write!(f, "{v}"),
            Value::Enum { ty, member, .. } => write!(f, "{}.{}", ty.name(), member),
            Value::Lambda(expr) => write!(f, "{expr}"),
            Value::Map(m) => write!(f, "<map of {} entries>", m.len()),
        }
    }
}
