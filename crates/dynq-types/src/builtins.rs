//! Built-in types and their member tables.
//!
//! The parser resolves members against whatever the host declares; for
//! the predefined primitive types the declarations live here. Static
//! utility types (`Math`, `Convert`) are minted once per process so
//! repeated parses agree on type identity.

use std::sync::OnceLock;

use crate::ty::{
    ClassBuilder, CtorDef, FieldDef, IndexerDef, MethodDef, ParamDef, Prim, PropertyDef, Ty,
};

fn prop(name: &str, ty: Ty) -> PropertyDef {
    PropertyDef {
        name: name.into(),
        ty,
        is_static: false,
    }
}

fn method(name: &str, params: Vec<(&str, Ty)>, result: Ty) -> MethodDef {
    MethodDef {
        name: name.into(),
        params: params.into_iter().map(|(n, t)| ParamDef::new(n, t)).collect(),
        result: Some(result),
        is_static: false,
    }
}

fn static_method(name: &str, params: Vec<(&str, Ty)>, result: Ty) -> MethodDef {
    MethodDef {
        is_static: true,
        ..method(name, params, result)
    }
}

fn ctor(params: Vec<(&str, Ty)>) -> CtorDef {
    CtorDef {
        params: params.into_iter().map(|(n, t)| ParamDef::new(n, t)).collect(),
    }
}

// ── Default allowed types ──────────────────────────────────────────────

/// The predefined allowed-type set: primitive value types, `String`,
/// `Object`, the date/time/guid kinds, and the two static utility types.
pub fn default_allowed_types() -> Vec<Ty> {
    use Prim::*;
    let mut out: Vec<Ty> = [
        Object, Bool, Char, Str, SByte, Byte, Int16, UInt16, Int32, UInt32, Int64, UInt64,
        Single, Double, Decimal, DateTime, TimeSpan, Guid,
    ]
    .into_iter()
    .map(Ty::Prim)
    .collect();
    out.push(math());
    out.push(convert());
    out
}

/// The `Math` utility type.
pub fn math() -> Ty {
    static TY: OnceLock<Ty> = OnceLock::new();
    TY.get_or_init(|| {
        let d = Ty::double;
        let i = Ty::int32;
        let l = Ty::int64;
        let m = Ty::decimal;
        let mut b = ClassBuilder::new("Math").namespace("System");
        for (p, r) in [(i(), i()), (l(), l()), (d(), d()), (m(), m())] {
            b = b.static_method("Abs", vec![ParamDef::new("value", p)], r);
        }
        for name in ["Min", "Max"] {
            for t in [i(), l(), d(), m()] {
                b = b.static_method(
                    name,
                    vec![ParamDef::new("val1", t.clone()), ParamDef::new("val2", t.clone())],
                    t,
                );
            }
        }
        b.static_method("Round", vec![ParamDef::new("value", d())], d())
            .static_method(
                "Round",
                vec![ParamDef::new("value", d()), ParamDef::new("digits", i())],
                d(),
            )
            .static_method("Round", vec![ParamDef::new("value", m())], m())
            .static_method("Floor", vec![ParamDef::new("value", d())], d())
            .static_method("Ceiling", vec![ParamDef::new("value", d())], d())
            .static_method("Truncate", vec![ParamDef::new("value", d())], d())
            .static_method("Sqrt", vec![ParamDef::new("value", d())], d())
            .static_method(
                "Pow",
                vec![ParamDef::new("x", d()), ParamDef::new("y", d())],
                d(),
            )
            .build()
    })
    .clone()
}

/// The `Convert` utility type.
pub fn convert() -> Ty {
    static TY: OnceLock<Ty> = OnceLock::new();
    TY.get_or_init(|| {
        let o = Ty::object;
        ClassBuilder::new("Convert")
            .namespace("System")
            .static_method("ToBoolean", vec![ParamDef::new("value", o())], Ty::bool())
            .static_method("ToChar", vec![ParamDef::new("value", o())], Ty::char())
            .static_method("ToInt32", vec![ParamDef::new("value", o())], Ty::int32())
            .static_method("ToInt64", vec![ParamDef::new("value", o())], Ty::int64())
            .static_method("ToDouble", vec![ParamDef::new("value", o())], Ty::double())
            .static_method("ToDecimal", vec![ParamDef::new("value", o())], Ty::decimal())
            .static_method("ToString", vec![ParamDef::new("value", o())], Ty::string())
            .static_method(
                "ToDateTime",
                vec![ParamDef::new("value", o())],
                Ty::date_time(),
            )
            .build()
    })
    .clone()
}

// ── Well-known methods the parser emits directly ───────────────────────

/// `String.Compare(strA, strB) -> Int32`; relational string operators
/// compile to a call of this compared against zero.
pub fn string_compare() -> MethodDef {
    static_method(
        "Compare",
        vec![("strA", Ty::string()), ("strB", Ty::string())],
        Ty::int32(),
    )
}

/// `String.Concat(arg0, arg1) -> String`; the `&` operator and `+` over
/// strings compile to a call of this.
pub fn string_concat() -> MethodDef {
    static_method(
        "Concat",
        vec![("arg0", Ty::object()), ("arg1", Ty::object())],
        Ty::string(),
    )
}

// ── Member enumeration ─────────────────────────────────────────────────

/// Properties declared directly on `ty` (no base walk).
pub fn properties_of(ty: &Ty) -> Vec<PropertyDef> {
    match ty {
        Ty::Prim(Prim::Str) => vec![prop("Length", Ty::int32())],
        Ty::Array(_) => vec![prop("Length", Ty::int32())],
        Ty::Prim(Prim::DateTime) => {
            let mut out: Vec<PropertyDef> = [
                "Year",
                "Month",
                "Day",
                "Hour",
                "Minute",
                "Second",
                "Millisecond",
                "DayOfYear",
            ]
            .into_iter()
            .map(|n| prop(n, Ty::int32()))
            .collect();
            out.push(prop("Date", Ty::date_time()));
            out.push(prop("TimeOfDay", Ty::time_span()));
            out
        }
        Ty::Prim(Prim::TimeSpan) => {
            let mut out: Vec<PropertyDef> =
                ["Days", "Hours", "Minutes", "Seconds", "Milliseconds"]
                    .into_iter()
                    .map(|n| prop(n, Ty::int32()))
                    .collect();
            out.extend(
                ["TotalDays", "TotalHours", "TotalMinutes", "TotalSeconds", "TotalMilliseconds"]
                    .into_iter()
                    .map(|n| prop(n, Ty::double())),
            );
            out
        }
        Ty::Nullable(inner) => vec![
            prop("HasValue", Ty::bool()),
            prop("Value", (**inner).clone()),
        ],
        Ty::Class(def) => def.properties.clone(),
        _ => Vec::new(),
    }
}

/// Fields declared directly on `ty`.
pub fn fields_of(ty: &Ty) -> Vec<FieldDef> {
    match ty {
        Ty::Class(def) => def.fields.clone(),
        _ => Vec::new(),
    }
}

/// Methods declared directly on `ty`, instance and static together; the
/// overload resolver filters by receiver shape.
pub fn methods_of(ty: &Ty) -> Vec<MethodDef> {
    match ty {
        Ty::Prim(Prim::Str) => {
            let s = Ty::string;
            let i = Ty::int32;
            vec![
                method("StartsWith", vec![("value", s())], Ty::bool()),
                method("EndsWith", vec![("value", s())], Ty::bool()),
                method("Contains", vec![("value", s())], Ty::bool()),
                method("IndexOf", vec![("value", s())], i()),
                method("Substring", vec![("startIndex", i())], s()),
                method("Substring", vec![("startIndex", i()), ("length", i())], s()),
                method("ToLower", vec![], s()),
                method("ToUpper", vec![], s()),
                method("Trim", vec![], s()),
                method("Replace", vec![("oldValue", s()), ("newValue", s())], s()),
                method("CompareTo", vec![("other", s())], i()),
                string_compare(),
                string_concat(),
                static_method("IsNullOrEmpty", vec![("value", s())], Ty::bool()),
            ]
        }
        Ty::Class(def) => def.methods.clone(),
        _ => Vec::new(),
    }
}

/// Constructors declared on `ty`.
pub fn constructors_of(ty: &Ty) -> Vec<CtorDef> {
    let i = Ty::int32;
    match ty {
        Ty::Prim(Prim::DateTime) => vec![
            ctor(vec![("ticks", Ty::int64())]),
            ctor(vec![("year", i()), ("month", i()), ("day", i())]),
            ctor(vec![
                ("year", i()),
                ("month", i()),
                ("day", i()),
                ("hour", i()),
                ("minute", i()),
                ("second", i()),
            ]),
        ],
        Ty::Prim(Prim::TimeSpan) => vec![
            ctor(vec![("ticks", Ty::int64())]),
            ctor(vec![("hours", i()), ("minutes", i()), ("seconds", i())]),
            ctor(vec![
                ("days", i()),
                ("hours", i()),
                ("minutes", i()),
                ("seconds", i()),
            ]),
        ],
        Ty::Prim(Prim::Guid) => vec![ctor(vec![("g", Ty::string())])],
        Ty::Class(def) => def.constructors.clone(),
        _ => Vec::new(),
    }
}

/// Indexers (default members) declared on `ty`. Arrays are not listed
/// here; the parser emits a dedicated array-index node for them.
pub fn indexers_of(ty: &Ty) -> Vec<IndexerDef> {
    match ty {
        Ty::Prim(Prim::Str) => vec![IndexerDef {
            params: vec![ParamDef::new("index", Ty::int32())],
            ty: Ty::char(),
        }],
        Ty::Class(def) => def.indexers.clone(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utility_types_are_process_singletons() {
        assert_eq!(math(), math());
        assert_eq!(convert(), convert());
        assert_ne!(math(), convert());
    }

    #[test]
    fn default_set_contains_the_utility_types() {
        let types = default_allowed_types();
        assert!(types.contains(&math()));
        assert!(types.contains(&convert()));
        assert!(types.contains(&Ty::string()));
        assert_eq!(types.len(), 20);
    }

    #[test]
    fn string_members() {
        let props = properties_of(&Ty::string());
        assert!(props.iter().any(|p| p.name == "Length" && p.ty == Ty::int32()));
        let methods = methods_of(&Ty::string());
        assert!(methods.iter().any(|m| m.name == "Substring" && m.params.len() == 2));
        assert!(indexers_of(&Ty::string())[0].ty == Ty::char());
    }

    #[test]
    fn nullable_members() {
        let props = properties_of(&Ty::nullable(Ty::int32()));
        assert!(props.iter().any(|p| p.name == "HasValue" && p.ty == Ty::bool()));
        assert!(props.iter().any(|p| p.name == "Value" && p.ty == Ty::int32()));
    }
}
