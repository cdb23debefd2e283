//! The host type model.
//!
//! Defines [`Ty`] -- the type handle the parser works against -- together
//! with nominal class and enum definitions and their member tables.
//! Primitive and structural types compare by shape; nominal types compare
//! by an identity minted when the definition is created.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Identity of a nominal type definition.
///
/// Ids are minted from a process-wide counter, so two definitions are the
/// same type only if they are literally the same definition. This is what
/// makes the record factory's interning observable: equal signatures hand
/// back the same id.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

impl TypeId {
    fn mint() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        TypeId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Built-in scalar and reference primitives.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Prim {
    Bool,
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
    TimeSpan,
    Guid,
    Str,
    Object,
}

impl Prim {
    /// The short name used in keyword tables and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Prim::Bool => "Boolean",
            Prim::Char => "Char",
            Prim::SByte => "SByte",
            Prim::Byte => "Byte",
            Prim::Int16 => "Int16",
            Prim::UInt16 => "UInt16",
            Prim::Int32 => "Int32",
            Prim::UInt32 => "UInt32",
            Prim::Int64 => "Int64",
            Prim::UInt64 => "UInt64",
            Prim::Single => "Single",
            Prim::Double => "Double",
            Prim::Decimal => "Decimal",
            Prim::DateTime => "DateTime",
            Prim::TimeSpan => "TimeSpan",
            Prim::Guid => "Guid",
            Prim::Str => "String",
            Prim::Object => "Object",
        }
    }

    /// The namespace-qualified name, accepted in `is`/`as` type positions.
    pub fn full_name(self) -> String {
        format!("System.{}", self.name())
    }

    /// Whether values of this primitive live inline (value types).
    pub fn is_value_type(self) -> bool {
        !matches!(self, Prim::Str | Prim::Object)
    }
}

/// A property definition: a named, typed, readable slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyDef {
    pub name: String,
    pub ty: Ty,
    pub is_static: bool,
}

/// A field definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: Ty,
    pub is_static: bool,
}

/// A method parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamDef {
    pub name: String,
    pub ty: Ty,
    /// Out/by-ref parameters disqualify a method from overload resolution.
    pub is_out: bool,
}

impl ParamDef {
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
            is_out: false,
        }
    }
}

/// A method definition. `result` is `None` for void methods, which the
/// parser rejects at call sites.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodDef {
    pub name: String,
    pub params: Vec<ParamDef>,
    pub result: Option<Ty>,
    pub is_static: bool,
}

/// A constructor definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CtorDef {
    pub params: Vec<ParamDef>,
}

/// An indexer (default member) definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexerDef {
    pub params: Vec<ParamDef>,
    pub ty: Ty,
}

/// A nominal class definition.
///
/// Identity lives in `id`; everything else is description. `PartialEq`
/// and `Hash` are implemented by hand on the id alone so that `Ty` stays
/// cheap to compare even for deep member tables.
#[derive(Clone, Debug)]
pub struct ClassDef {
    pub id: TypeId,
    pub name: String,
    pub namespace: Option<String>,
    pub is_value_type: bool,
    /// Minted by the record factory rather than declared by the host.
    pub is_record: bool,
    pub base: Option<Ty>,
    pub interfaces: Vec<Ty>,
    pub properties: Vec<PropertyDef>,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<MethodDef>,
    pub constructors: Vec<CtorDef>,
    pub indexers: Vec<IndexerDef>,
}

impl PartialEq for ClassDef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id // nominal identity only
    }
}

impl Eq for ClassDef {}

impl std::hash::Hash for ClassDef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state); // nominal identity only
    }
}

impl ClassDef {
    /// The namespace-qualified name.
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }
}

/// An enum definition: a named value type with named integral members.
#[derive(Clone, Debug)]
pub struct EnumDef {
    pub id: TypeId,
    pub name: String,
    pub namespace: Option<String>,
    /// The underlying integral kind (`Int32` unless declared otherwise).
    pub underlying: Prim,
    pub members: Vec<(String, i64)>,
}

impl PartialEq for EnumDef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EnumDef {}

impl std::hash::Hash for EnumDef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl EnumDef {
    /// Define a new enum type.
    pub fn define(
        name: impl Into<String>,
        members: impl IntoIterator<Item = (impl Into<String>, i64)>,
    ) -> Ty {
        Ty::Enum(Arc::new(EnumDef {
            id: TypeId::mint(),
            name: name.into(),
            namespace: None,
            underlying: Prim::Int32,
            members: members.into_iter().map(|(n, v)| (n.into(), v)).collect(),
        }))
    }

    /// Look up a member by case-insensitive name, returning its declared
    /// name and value.
    pub fn member(&self, name: &str) -> Option<(&str, i64)> {
        self.members
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(n, v)| (n.as_str(), *v))
    }

    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }
}

/// A lambda (function value) type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FuncTy {
    pub params: Vec<Ty>,
    pub result: Ty,
}

/// A type handle.
///
/// Primitives compare by kind, `Nullable`/`Array`/`Sequence`/`Func`
/// structurally, classes and enums by definition identity. Cloning is an
/// `Arc` bump for everything non-primitive.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    Prim(Prim),
    /// A value-type wrapper around a single inner value type.
    Nullable(Arc<Ty>),
    /// A single-dimensional array.
    Array(Arc<Ty>),
    /// The generic-enumerable interface over an element type.
    Sequence(Arc<Ty>),
    /// A lambda type.
    Func(Arc<FuncTy>),
    Class(Arc<ClassDef>),
    Enum(Arc<EnumDef>),
}

impl Ty {
    // ── Constructors ───────────────────────────────────────────────────

    pub fn bool() -> Ty {
        Ty::Prim(Prim::Bool)
    }

    pub fn char() -> Ty {
        Ty::Prim(Prim::Char)
    }

    pub fn int32() -> Ty {
        Ty::Prim(Prim::Int32)
    }

    pub fn int64() -> Ty {
        Ty::Prim(Prim::Int64)
    }

    pub fn double() -> Ty {
        Ty::Prim(Prim::Double)
    }

    pub fn decimal() -> Ty {
        Ty::Prim(Prim::Decimal)
    }

    pub fn string() -> Ty {
        Ty::Prim(Prim::Str)
    }

    pub fn object() -> Ty {
        Ty::Prim(Prim::Object)
    }

    pub fn date_time() -> Ty {
        Ty::Prim(Prim::DateTime)
    }

    pub fn time_span() -> Ty {
        Ty::Prim(Prim::TimeSpan)
    }

    pub fn guid() -> Ty {
        Ty::Prim(Prim::Guid)
    }

    /// Wrap a value type in its nullable form. Callers must check
    /// [`Ty::is_value_type`] first; wrapping a reference type is a logic
    /// error in the host, not a parse error.
    pub fn nullable(inner: Ty) -> Ty {
        Ty::Nullable(Arc::new(inner))
    }

    pub fn array(element: Ty) -> Ty {
        Ty::Array(Arc::new(element))
    }

    pub fn sequence(element: Ty) -> Ty {
        Ty::Sequence(Arc::new(element))
    }

    pub fn func(params: Vec<Ty>, result: Ty) -> Ty {
        Ty::Func(Arc::new(FuncTy { params, result }))
    }

    // ── Shape predicates ───────────────────────────────────────────────

    /// Whether this is the nullable wrapper over some value type.
    pub fn is_nullable(&self) -> bool {
        matches!(self, Ty::Nullable(_))
    }

    /// Unwrap one level of nullable, or return self unchanged.
    pub fn non_nullable(&self) -> Ty {
        match self {
            Ty::Nullable(inner) => (**inner).clone(),
            other => other.clone(),
        }
    }

    /// Whether values of this type live inline.
    pub fn is_value_type(&self) -> bool {
        match self {
            Ty::Prim(p) => p.is_value_type(),
            Ty::Nullable(_) | Ty::Enum(_) => true,
            Ty::Class(def) => def.is_value_type,
            Ty::Array(_) | Ty::Sequence(_) | Ty::Func(_) => false,
        }
    }

    /// Whether this is a reference type.
    pub fn is_reference(&self) -> bool {
        !self.is_value_type()
    }

    /// Whether the non-nullable form is an enum type.
    pub fn is_enum(&self) -> bool {
        matches!(self.non_nullable(), Ty::Enum(_))
    }

    /// The element type when this type is enumerable: arrays, sequences,
    /// and classes implementing the sequence interface. `String` is
    /// deliberately not enumerable here; aggregate dispatch never
    /// preempts its methods.
    pub fn enumerable_element(&self) -> Option<Ty> {
        match self {
            Ty::Array(el) | Ty::Sequence(el) => Some((**el).clone()),
            Ty::Class(def) => def.interfaces.iter().find_map(|i| match i {
                Ty::Sequence(el) => Some((**el).clone()),
                _ => None,
            }),
            _ => None,
        }
    }

    // ── Relations ──────────────────────────────────────────────────────

    /// Reflection-style assignability: `self` is assignable from `other`
    /// when a value of type `other` can stand where `self` is expected
    /// without conversion.
    pub fn assignable_from(&self, other: &Ty) -> bool {
        if self == other {
            return true;
        }
        if matches!(self, Ty::Prim(Prim::Object)) {
            return true;
        }
        match (self, other) {
            // Arrays and sequence-implementing classes erase to the
            // sequence interface.
            (Ty::Sequence(el), _) => other
                .enumerable_element()
                .is_some_and(|src| **el == src || **el == Ty::Prim(Prim::Object)),
            (Ty::Class(_), Ty::Class(_)) | (Ty::Class(_), Ty::Array(_)) => other
                .self_and_base_types()
                .iter()
                .chain(other.interfaces().iter())
                .any(|t| t == self),
            _ => false,
        }
    }

    /// This type followed by its base-class chain.
    pub fn self_and_base_types(&self) -> Vec<Ty> {
        let mut out = vec![self.clone()];
        let mut current = self.clone();
        loop {
            let base = match &current {
                Ty::Class(def) => def.base.clone(),
                _ => None,
            };
            match base {
                Some(base) => {
                    out.push(base.clone());
                    current = base;
                }
                None => break,
            }
        }
        out
    }

    /// Declared interfaces, walking the base chain.
    pub fn interfaces(&self) -> Vec<Ty> {
        let mut out = Vec::new();
        for ty in self.self_and_base_types() {
            if let Ty::Class(def) = &ty {
                out.extend(def.interfaces.iter().cloned());
            }
        }
        out
    }

    // ── Names ──────────────────────────────────────────────────────────

    /// The short name used for keyword registration and messages.
    pub fn name(&self) -> String {
        match self {
            Ty::Prim(p) => p.name().to_string(),
            Ty::Nullable(inner) => format!("{}?", inner.name()),
            Ty::Array(el) => format!("{}[]", el.name()),
            Ty::Sequence(el) => format!("Sequence<{}>", el.name()),
            Ty::Func(sig) => {
                let params: Vec<String> = sig.params.iter().map(Ty::name).collect();
                format!("({}) => {}", params.join(", "), sig.result.name())
            }
            Ty::Class(def) => def.name.clone(),
            Ty::Enum(def) => def.name.clone(),
        }
    }

    /// The namespace-qualified name, when the type has one.
    pub fn full_name(&self) -> String {
        match self {
            Ty::Prim(p) => p.full_name(),
            Ty::Class(def) => def.full_name(),
            Ty::Enum(def) => def.full_name(),
            other => other.name(),
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Builder for nominal class definitions.
///
/// Hosts describe their types through this builder; the record factory
/// uses it to mint anonymous record types.
pub struct ClassBuilder {
    def: ClassDef,
}

impl ClassBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            def: ClassDef {
                id: TypeId::mint(),
                name: name.into(),
                namespace: None,
                is_value_type: false,
                is_record: false,
                base: None,
                interfaces: Vec::new(),
                properties: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
                constructors: Vec::new(),
                indexers: Vec::new(),
            },
        }
    }

    pub fn namespace(mut self, ns: impl Into<String>) -> Self {
        self.def.namespace = Some(ns.into());
        self
    }

    pub fn value_type(mut self) -> Self {
        self.def.is_value_type = true;
        self
    }

    pub fn record(mut self) -> Self {
        self.def.is_record = true;
        self
    }

    pub fn base(mut self, base: Ty) -> Self {
        self.def.base = Some(base);
        self
    }

    pub fn interface(mut self, iface: Ty) -> Self {
        self.def.interfaces.push(iface);
        self
    }

    pub fn property(mut self, name: impl Into<String>, ty: Ty) -> Self {
        self.def.properties.push(PropertyDef {
            name: name.into(),
            ty,
            is_static: false,
        });
        self
    }

    pub fn field(mut self, name: impl Into<String>, ty: Ty) -> Self {
        self.def.fields.push(FieldDef {
            name: name.into(),
            ty,
            is_static: false,
        });
        self
    }

    pub fn method(mut self, name: impl Into<String>, params: Vec<ParamDef>, result: Ty) -> Self {
        self.def.methods.push(MethodDef {
            name: name.into(),
            params,
            result: Some(result),
            is_static: false,
        });
        self
    }

    pub fn static_method(
        mut self,
        name: impl Into<String>,
        params: Vec<ParamDef>,
        result: Ty,
    ) -> Self {
        self.def.methods.push(MethodDef {
            name: name.into(),
            params,
            result: Some(result),
            is_static: true,
        });
        self
    }

    /// A method with no result; call sites reject these, but hosts can
    /// still declare them.
    pub fn void_method(mut self, name: impl Into<String>, params: Vec<ParamDef>) -> Self {
        self.def.methods.push(MethodDef {
            name: name.into(),
            params,
            result: None,
            is_static: false,
        });
        self
    }

    pub fn ctor(mut self, params: Vec<ParamDef>) -> Self {
        self.def.constructors.push(CtorDef { params });
        self
    }

    pub fn indexer(mut self, params: Vec<ParamDef>, ty: Ty) -> Self {
        self.def.indexers.push(IndexerDef { params, ty });
        self
    }

    pub fn build(self) -> Ty {
        Ty::Class(Arc::new(self.def))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nominal_identity_distinguishes_equal_shapes() {
        let a = ClassBuilder::new("Point").property("X", Ty::int32()).build();
        let b = ClassBuilder::new("Point").property("X", Ty::int32()).build();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn structural_types_compare_by_shape() {
        assert_eq!(Ty::nullable(Ty::int32()), Ty::nullable(Ty::int32()));
        assert_eq!(Ty::array(Ty::string()), Ty::array(Ty::string()));
        assert_ne!(Ty::array(Ty::string()), Ty::sequence(Ty::string()));
    }

    #[test]
    fn non_nullable_unwraps_one_level() {
        let t = Ty::nullable(Ty::int32());
        assert_eq!(t.non_nullable(), Ty::int32());
        assert_eq!(Ty::int32().non_nullable(), Ty::int32());
    }

    #[test]
    fn enumerable_element_sees_arrays_sequences_and_interfaces() {
        assert_eq!(Ty::array(Ty::char()).enumerable_element(), Some(Ty::char()));
        assert_eq!(
            Ty::sequence(Ty::string()).enumerable_element(),
            Some(Ty::string())
        );
        let bag = ClassBuilder::new("Bag")
            .interface(Ty::sequence(Ty::int32()))
            .build();
        assert_eq!(bag.enumerable_element(), Some(Ty::int32()));
        assert_eq!(Ty::string().enumerable_element(), None);
    }

    #[test]
    fn object_is_assignable_from_everything() {
        assert!(Ty::object().assignable_from(&Ty::int32()));
        assert!(Ty::object().assignable_from(&Ty::string()));
        assert!(!Ty::string().assignable_from(&Ty::object()));
    }

    #[test]
    fn base_chain_assignability() {
        let animal = ClassBuilder::new("Animal").build();
        let dog = ClassBuilder::new("Dog").base(animal.clone()).build();
        assert!(animal.assignable_from(&dog));
        assert!(!dog.assignable_from(&animal));
    }

    #[test]
    fn enum_member_lookup_is_case_insensitive() {
        let ty = EnumDef::define("Color", [("Red", 0), ("Green", 1)]);
        let Ty::Enum(def) = &ty else { unreachable!() };
        assert_eq!(def.member("green"), Some(("Green", 1)));
        assert_eq!(def.member("Blue"), None);
    }

    #[test]
    fn display_names() {
        assert_eq!(Ty::nullable(Ty::int32()).name(), "Int32?");
        assert_eq!(Ty::array(Ty::string()).name(), "String[]");
        assert_eq!(Ty::int32().full_name(), "System.Int32");
    }
}
