//! Type model and typed expression IR for the dynq expression language.
//!
//! This crate plays the role a reflective runtime plays for the parser:
//! it defines type identity, assignability, member enumeration, type-code
//! classification, and the typed expression tree the parser emits. It has
//! no evaluation semantics; the IR is data.

pub mod builtins;
pub mod code;
pub mod expr;
pub mod ty;
pub mod value;

pub use code::TypeCode;
pub use expr::{BinaryOp, Expr, Param, SequenceOp, UnaryOp};
pub use ty::{
    ClassBuilder, ClassDef, CtorDef, EnumDef, FieldDef, FuncTy, IndexerDef, MethodDef, ParamDef,
    Prim, PropertyDef, Ty, TypeId,
};
pub use value::Value;
