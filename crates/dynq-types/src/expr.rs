//! The typed expression tree.
//!
//! Every node knows its type at construction; the parser never emits a
//! node it could not type. Nodes are plain data -- rendering them for
//! humans is the only behavior they carry.

use std::fmt;

use crate::ty::{FieldDef, MethodDef, PropertyDef, Ty};
use crate::value::Value;

/// A lambda parameter: the unit of iteration scope.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Ty,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Unary operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

/// Binary operators. `Or`/`And` are the short-circuit forms.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOp {
    /// The surface symbol, used in rendering and error messages.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
        }
    }
}

/// The standard set operations an aggregate call lowers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SequenceOp {
    Where,
    Any,
    All,
    Count,
    First,
    FirstOrDefault,
    Min,
    Max,
    Sum,
    Average,
    Contains,
    Select,
    SelectMany,
    GroupBy,
    Distinct,
    Union,
    Concat,
}

impl SequenceOp {
    pub fn name(self) -> &'static str {
        match self {
            SequenceOp::Where => "Where",
            SequenceOp::Any => "Any",
            SequenceOp::All => "All",
            SequenceOp::Count => "Count",
            SequenceOp::First => "First",
            SequenceOp::FirstOrDefault => "FirstOrDefault",
            SequenceOp::Min => "Min",
            SequenceOp::Max => "Max",
            SequenceOp::Sum => "Sum",
            SequenceOp::Average => "Average",
            SequenceOp::Contains => "Contains",
            SequenceOp::Select => "Select",
            SequenceOp::SelectMany => "SelectMany",
            SequenceOp::GroupBy => "GroupBy",
            SequenceOp::Distinct => "Distinct",
            SequenceOp::Union => "Union",
            SequenceOp::Concat => "Concat",
        }
    }
}

/// A typed expression node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A constant. Typed nulls carry their target type here.
    Constant { value: Value, ty: Ty },
    /// A reference to a lambda parameter.
    Param(Param),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// A binary operation; `ty` is the result type (comparisons are
    /// boolean even over lifted operands).
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        ty: Ty,
    },
    /// `test ? if_true : if_false`; both arms share a type.
    Conditional {
        test: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },
    /// Property access; `target` is `None` for static access.
    Property {
        target: Option<Box<Expr>>,
        owner: Ty,
        prop: PropertyDef,
    },
    /// Field access; `target` is `None` for static access.
    Field {
        target: Option<Box<Expr>>,
        owner: Ty,
        field: FieldDef,
    },
    /// Method call; `ty` is the (non-void) return type.
    Call {
        target: Option<Box<Expr>>,
        owner: Ty,
        method: MethodDef,
        args: Vec<Expr>,
        ty: Ty,
    },
    /// Constructor invocation.
    New {
        ty: Ty,
        args: Vec<Expr>,
    },
    /// Array element or indexer access.
    Index {
        target: Box<Expr>,
        args: Vec<Expr>,
        ty: Ty,
    },
    /// Conversion to `ty`; `checked` conversions trap on overflow.
    Convert {
        operand: Box<Expr>,
        ty: Ty,
        checked: bool,
    },
    /// `operand is test` -- boolean type test.
    TypeIs {
        operand: Box<Expr>,
        test: Ty,
    },
    /// `operand as ty` -- conversion yielding null on failure.
    TypeAs {
        operand: Box<Expr>,
        ty: Ty,
    },
    Lambda {
        params: Vec<Param>,
        body: Box<Expr>,
    },
    /// Invocation of a lambda-typed expression.
    Invoke {
        target: Box<Expr>,
        args: Vec<Expr>,
        ty: Ty,
    },
    /// A query-aggregate call on a sequence. `args[0]` is the receiver;
    /// the remaining argument, if any, is a raw value (`Contains`) or a
    /// lambda over the element scope.
    SequenceCall {
        op: SequenceOp,
        type_args: Vec<Ty>,
        args: Vec<Expr>,
        ty: Ty,
    },
    /// Record construction: bind each named property of `ty`.
    MemberInit {
        ty: Ty,
        bindings: Vec<(String, Expr)>,
    },
}

impl Expr {
    /// Build a constant from a raw value, typed by the value itself.
    pub fn constant(value: Value) -> Expr {
        let ty = value.ty();
        Expr::Constant { value, ty }
    }

    /// The static type of this expression.
    pub fn ty(&self) -> Ty {
        match self {
            Expr::Constant { ty, .. } => ty.clone(),
            Expr::Param(p) => p.ty.clone(),
            Expr::Unary { operand, .. } => operand.ty(),
            Expr::Binary { ty, .. } => ty.clone(),
            Expr::Conditional { if_true, .. } => if_true.ty(),
            Expr::Property { prop, .. } => prop.ty.clone(),
            Expr::Field { field, .. } => field.ty.clone(),
            Expr::Call { ty, .. } => ty.clone(),
            Expr::New { ty, .. } => ty.clone(),
            Expr::Index { ty, .. } => ty.clone(),
            Expr::Convert { ty, .. } => ty.clone(),
            Expr::TypeIs { .. } => Ty::bool(),
            Expr::TypeAs { ty, .. } => ty.clone(),
            Expr::Lambda { params, body } => Ty::func(
                params.iter().map(|p| p.ty.clone()).collect(),
                body.ty(),
            ),
            Expr::Invoke { ty, .. } => ty.clone(),
            Expr::SequenceCall { ty, .. } => ty.clone(),
            Expr::MemberInit { ty, .. } => ty.clone(),
        }
    }

    /// Whether this is the untyped null constant.
    pub fn is_null_literal(&self) -> bool {
        matches!(
            self,
            Expr::Constant { value: Value::Null, ty } if *ty == Ty::object()
        )
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{arg}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant { value, .. } => write!(f, "{value}"),
            Expr::Param(p) => write!(f, "{}", p.name),
            Expr::Unary { op, operand } => match op {
                UnaryOp::Negate => write!(f, "-{operand}"),
                UnaryOp::Not => write!(f, "!{operand}"),
            },
            Expr::Binary { op, left, right, .. } => {
                write!(f, "({left} {} {right})", op.symbol())
            }
            Expr::Conditional {
                test,
                if_true,
                if_false,
            } => write!(f, "({test} ? {if_true} : {if_false})"),
            Expr::Property { target, owner, prop } => match target {
                Some(t) => write!(f, "{t}.{}", prop.name),
                None => write!(f, "{}.{}", owner.name(), prop.name),
            },
            Expr::Field { target, owner, field } => match target {
                Some(t) => write!(f, "{t}.{}", field.name),
                None => write!(f, "{}.{}", owner.name(), field.name),
            },
            Expr::Call {
                target,
                owner,
                method,
                args,
                ..
            } => {
                match target {
                    Some(t) => write!(f, "{t}.{}(", method.name)?,
                    None => write!(f, "{}.{}(", owner.name(), method.name)?,
                }
                write_args(f, args)?;
                write!(f, ")")
            }
            Expr::New { ty, args } => {
                write!(f, "new {}(", ty.name())?;
                write_args(f, args)?;
                write!(f, ")")
            }
            Expr::Index { target, args, .. } => {
                write!(f, "{target}[")?;
                write_args(f, args)?;
                write!(f, "]")
            }
            Expr::Convert { operand, ty, .. } => write!(f, "{}({operand})", ty.name()),
            Expr::TypeIs { operand, test } => write!(f, "({operand} is {})", test.name()),
            Expr::TypeAs { operand, ty } => write!(f, "({operand} as {})", ty.name()),
            Expr::Lambda { params, body } => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p.name)?;
                }
                write!(f, ") => {body}")
            }
            Expr::Invoke { target, args, .. } => {
                write!(f, "{target}(")?;
                write_args(f, args)?;
                write!(f, ")")
            }
            Expr::SequenceCall { op, args, .. } => {
                write!(f, "{}.{}(", args[0], op.name())?;
                write_args(f, &args[1..])?;
                write!(f, ")")
            }
            Expr::MemberInit { ty, bindings } => {
                write!(f, "new {} {{ ", ty.name())?;
                for (i, (name, expr)) in bindings.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name} = {expr}")?;
                }
                write!(f, " }}")
            }
        }
    }
}
