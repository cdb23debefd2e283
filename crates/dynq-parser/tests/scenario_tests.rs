//! End-to-end scenario tests.
//!
//! Execution is out of scope for the parser, so each scenario asserts
//! the structure and types of the emitted tree: the lambda a host would
//! compile and run over the scenario's values.

use dynq_parser::{parse_it_lambda, parse_lambda, ParseOptions};
use dynq_types::{
    BinaryOp, ClassBuilder, EnumDef, Expr, Param, PropertyDef, SequenceOp, Ty, Value,
};

// ── Helpers ────────────────────────────────────────────────────────────

fn opts() -> ParseOptions {
    ParseOptions::new()
}

/// Unwrap the body of a parsed lambda.
fn body_of(expr: Expr) -> Expr {
    match expr {
        Expr::Lambda { body, .. } => *body,
        other => panic!("expected a lambda, got {other}"),
    }
}

fn length_property() -> PropertyDef {
    PropertyDef {
        name: "Length".into(),
        ty: Ty::int32(),
        is_static: false,
    }
}

/// Scenario 1: `x.Length == 4` over strings selects `"food"`.
/// The emitted body compares the `Length` property against 4.
#[test]
fn scenario_string_length_filter() {
    let x = Param::new("x", Ty::string());
    let expr = parse_lambda(&[x.clone()], Some(&Ty::bool()), "x.Length == 4", &opts())
        .expect("parse failed");
    let expected = Expr::Binary {
        op: BinaryOp::Equal,
        left: Box::new(Expr::Property {
            target: Some(Box::new(Expr::Param(x))),
            owner: Ty::string(),
            prop: length_property(),
        }),
        right: Box::new(Expr::constant(Value::Int32(4))),
        ty: Ty::bool(),
    };
    assert_eq!(body_of(expr), expected);
}

/// Scenario 2: `x.Any(it == 'a')` over char sequences: the aggregate
/// opens a fresh `it` scope typed as the element.
#[test]
fn scenario_any_over_chars() {
    let x = Param::new("x", Ty::sequence(Ty::char()));
    let expr =
        parse_lambda(&[x.clone()], Some(&Ty::bool()), "x.Any(it == 'a')", &opts())
            .expect("parse failed");
    let it = Param::new("it", Ty::char());
    let expected = Expr::SequenceCall {
        op: SequenceOp::Any,
        type_args: vec![Ty::char()],
        args: vec![
            Expr::Param(x),
            Expr::Lambda {
                params: vec![it.clone()],
                body: Box::new(Expr::Binary {
                    op: BinaryOp::Equal,
                    left: Box::new(Expr::Param(it)),
                    right: Box::new(Expr::constant(Value::Char('a'))),
                    ty: Ty::bool(),
                }),
            },
        ],
        ty: Ty::bool(),
    };
    assert_eq!(body_of(expr), expected);
}

/// Scenario 3: `it == MyEnum.Yes` with `it: Int32`. The enum constant
/// is coerced to the numeric operand type with a checked convert.
#[test]
fn scenario_enum_against_int() {
    let my_enum = EnumDef::define("MyEnum", [("Yes", 0), ("No", 1)]);
    let options = opts().allow(my_enum.clone());
    for int_ty in [Ty::int32(), Ty::int64()] {
        let expr = parse_it_lambda(&int_ty, Some(&Ty::bool()), "it == MyEnum.Yes", &options)
            .expect("parse failed");
        let it = Param::new("", int_ty.clone());
        let expected = Expr::Binary {
            op: BinaryOp::Equal,
            left: Box::new(Expr::Param(it)),
            right: Box::new(Expr::Convert {
                operand: Box::new(Expr::Constant {
                    value: Value::Enum {
                        ty: my_enum.clone(),
                        member: "Yes".into(),
                        value: 0,
                    },
                    ty: my_enum.clone(),
                }),
                ty: int_ty,
                checked: true,
            }),
            ty: Ty::bool(),
        };
        assert_eq!(body_of(expr), expected);
    }
}

/// Scenario 3, promotion direction: with `it: MyEnum`, a string literal
/// promotes to the enum member instead.
#[test]
fn scenario_string_literal_promotes_to_enum() {
    let my_enum = EnumDef::define("MyEnum", [("Yes", 0), ("No", 1)]);
    let options = opts().allow(my_enum.clone());
    let expr = parse_it_lambda(&my_enum, Some(&Ty::bool()), "it == \"no\"", &options)
        .expect("parse failed");
    let Expr::Binary { op, right, ty, .. } = body_of(expr) else {
        panic!("expected a comparison");
    };
    assert_eq!(op, BinaryOp::Equal);
    assert_eq!(ty, Ty::bool());
    // Case-insensitive member lookup yields the declared casing.
    assert_eq!(
        *right,
        Expr::Constant {
            value: Value::Enum {
                ty: my_enum.clone(),
                member: "No".into(),
                value: 1,
            },
            ty: my_enum,
        }
    );
}

/// Scenario 4: `FirstOrDefault(it == "2")` with the sequence itself as
/// the implicit receiver.
#[test]
fn scenario_first_or_default() {
    let seq = Ty::sequence(Ty::string());
    let expr = parse_it_lambda(&seq, None, "FirstOrDefault(it == \"2\")", &opts())
        .expect("parse failed");
    let outer = Param::new("", seq);
    let inner = Param::new("it", Ty::string());
    let expected = Expr::SequenceCall {
        op: SequenceOp::FirstOrDefault,
        type_args: vec![Ty::string()],
        args: vec![
            Expr::Param(outer),
            Expr::Lambda {
                params: vec![inner.clone()],
                body: Box::new(Expr::Binary {
                    op: BinaryOp::Equal,
                    left: Box::new(Expr::Param(inner)),
                    right: Box::new(Expr::constant(Value::Str("2".into()))),
                    ty: Ty::bool(),
                }),
            },
        ],
        ty: Ty::string(),
    };
    assert_eq!(body_of(expr), expected);
}

/// Scenario 5: `is` builds a type test; `as` builds a safe cast whose
/// members are then accessible.
#[test]
fn scenario_is_and_as() {
    let resource = Param::new("resource", Ty::object());

    let is_expr = parse_lambda(
        &[resource.clone()],
        Some(&Ty::bool()),
        "resource is System.String",
        &opts(),
    )
    .expect("parse failed");
    assert_eq!(
        body_of(is_expr),
        Expr::TypeIs {
            operand: Box::new(Expr::Param(resource.clone())),
            test: Ty::string(),
        }
    );

    let as_expr = parse_lambda(
        &[resource.clone()],
        None,
        "(resource as System.String).Length",
        &opts(),
    )
    .expect("parse failed");
    assert_eq!(
        body_of(as_expr),
        Expr::Property {
            target: Some(Box::new(Expr::TypeAs {
                operand: Box::new(Expr::Param(resource)),
                ty: Ty::string(),
            })),
            owner: Ty::string(),
            prop: length_property(),
        }
    );
}

/// Scenario 6: `resource.Any(allowed.Contains(it_1.Item1))` -- the inner
/// aggregate captures the outer element through `it_1`.
#[test]
fn scenario_cross_scope_capture() {
    let tuple = ClassBuilder::new("Tuple")
        .property("Item1", Ty::string())
        .build();
    let resource = Param::new("resource", Ty::array(tuple.clone()));
    let allowed = Param::new("allowed", Ty::array(Ty::string()));

    let expr = parse_lambda(
        &[resource.clone(), allowed.clone()],
        Some(&Ty::bool()),
        "resource.Any(allowed.Contains(it_1.Item1))",
        &opts(),
    )
    .expect("parse failed");

    let outer_it = Param::new("it", tuple.clone());
    let item1 = PropertyDef {
        name: "Item1".into(),
        ty: Ty::string(),
        is_static: false,
    };
    let contains = Expr::SequenceCall {
        op: SequenceOp::Contains,
        type_args: vec![Ty::string()],
        args: vec![
            Expr::Param(allowed),
            Expr::Property {
                target: Some(Box::new(Expr::Param(outer_it.clone()))),
                owner: tuple.clone(),
                prop: item1,
            },
        ],
        ty: Ty::bool(),
    };
    let expected = Expr::SequenceCall {
        op: SequenceOp::Any,
        type_args: vec![tuple],
        args: vec![
            Expr::Param(resource),
            Expr::Lambda {
                params: vec![outer_it],
                body: Box::new(contains),
            },
        ],
        ty: Ty::bool(),
    };
    assert_eq!(body_of(expr), expected);
}

/// Scenario 7: `new(resource.Length alias Len)` mints a record type with
/// `Len: Int32`; parsing the same shape twice returns the same type.
#[test]
fn scenario_record_projection() {
    let resource = Param::new("resource", Ty::string());
    let parse_once = || {
        let expr = parse_lambda(
            &[resource.clone()],
            None,
            "new(resource.Length alias Len)",
            &opts(),
        )
        .expect("parse failed");
        match body_of(expr) {
            Expr::MemberInit { ty, bindings } => (ty, bindings),
            other => panic!("expected a record init, got {other}"),
        }
    };

    let (ty1, bindings) = parse_once();
    let Ty::Class(def) = &ty1 else {
        panic!("expected a class type")
    };
    assert!(def.is_record);
    assert_eq!(def.properties.len(), 1);
    assert_eq!(def.properties[0].name, "Len");
    assert_eq!(def.properties[0].ty, Ty::int32());

    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].0, "Len");
    assert_eq!(
        bindings[0].1,
        Expr::Property {
            target: Some(Box::new(Expr::Param(resource.clone()))),
            owner: Ty::string(),
            prop: length_property(),
        }
    );

    // Structural identity: a second parse reuses the minted type.
    let (ty2, _) = parse_once();
    assert_eq!(ty1, ty2);
}

/// Determinism: the same text against the same inputs yields a
/// structurally identical tree.
#[test]
fn parsing_is_deterministic() {
    let x = Param::new("x", Ty::sequence(Ty::string()));
    let text = "x.Where(it.Length > 2).Count() * 2 + 1";
    let a = parse_lambda(&[x.clone()], None, text, &opts()).expect("parse failed");
    let b = parse_lambda(&[x], None, text, &opts()).expect("parse failed");
    assert_eq!(a, b);
}
