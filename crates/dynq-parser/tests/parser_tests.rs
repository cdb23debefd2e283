//! Core parsing and typing tests: literal typing, operator promotion,
//! the ternary, member/index/type access, and substitution values.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use dynq_parser::{parse, parse_lambda, parse_ordering, ParseOptions};
use dynq_types::{builtins, BinaryOp, Expr, Param, Prim, PropertyDef, Ty, UnaryOp, Value};
use rust_decimal::Decimal;

// ── Helpers ────────────────────────────────────────────────────────────

fn opts() -> ParseOptions {
    ParseOptions::new()
}

fn body_of(expr: Expr) -> Expr {
    match expr {
        Expr::Lambda { body, .. } => *body,
        other => panic!("expected a lambda, got {other}"),
    }
}

fn constant_value(expr: &Expr) -> &Value {
    match expr {
        Expr::Constant { value, .. } => value,
        other => panic!("expected a constant, got {other}"),
    }
}

// ── Literals ───────────────────────────────────────────────────────────

/// Integer literals take the narrowest of Int32/UInt32/Int64/UInt64
/// that holds their value.
#[test]
fn integer_literals_type_by_range() {
    let cases = [
        ("2147483647", Value::Int32(i32::MAX)),
        ("2147483648", Value::UInt32(2_147_483_648)),
        ("4294967296", Value::Int64(4_294_967_296)),
        ("9223372036854775808", Value::UInt64(9_223_372_036_854_775_808)),
    ];
    for (text, expected) in cases {
        let expr = parse(text, None, &opts()).expect("parse failed");
        assert_eq!(constant_value(&expr), &expected, "for {text}");
    }
}

/// A folded unary minus reaches the minimum signed values.
#[test]
fn negative_literals_fold_the_sign() {
    let expr = parse("-2147483648", None, &opts()).expect("parse failed");
    assert_eq!(constant_value(&expr), &Value::Int32(i32::MIN));
    let expr = parse("-2147483649", None, &opts()).expect("parse failed");
    assert_eq!(constant_value(&expr), &Value::Int64(-2_147_483_649));
}

/// Reals are Double, or Single with an `F` suffix; exponents parse.
#[test]
fn real_literals() {
    let expr = parse("1.5", None, &opts()).expect("parse failed");
    assert_eq!(constant_value(&expr), &Value::Double(1.5));
    let expr = parse("10f", None, &opts()).expect("parse failed");
    assert_eq!(constant_value(&expr), &Value::Single(10.0));
    let expr = parse("2E+2", None, &opts()).expect("parse failed");
    assert_eq!(constant_value(&expr), &Value::Double(200.0));
}

/// Single-quoted single characters decay to char; doubled delimiters
/// unescape.
#[test]
fn string_and_char_literals() {
    let expr = parse("'a'", None, &opts()).expect("parse failed");
    assert_eq!(constant_value(&expr), &Value::Char('a'));
    let expr = parse("\"he said \"\"hi\"\"\"", None, &opts()).expect("parse failed");
    assert_eq!(
        constant_value(&expr),
        &Value::Str("he said \"hi\"".into())
    );
    let expr = parse("''''", None, &opts()).expect("parse failed");
    assert_eq!(constant_value(&expr), &Value::Char('\''));
}

// ── Literal promotion ──────────────────────────────────────────────────

/// A literal promoted to a requested result type is re-lexed directly
/// into it, with no convert node in between.
#[test]
fn literal_promotion_re_lexes() {
    let expr = parse("2", Some(&Ty::Prim(Prim::Byte)), &opts()).expect("parse failed");
    assert_eq!(
        expr,
        Expr::Constant {
            value: Value::Byte(2),
            ty: Ty::Prim(Prim::Byte),
        }
    );

    let expr = parse("1.5", Some(&Ty::decimal()), &opts()).expect("parse failed");
    assert_eq!(
        expr,
        Expr::Constant {
            value: Value::Decimal(Decimal::from_str("1.5").expect("valid decimal")),
            ty: Ty::decimal(),
        }
    );

    // Into a nullable target, the constant keeps the lifted type.
    let expr = parse("2", Some(&Ty::nullable(Ty::int64())), &opts()).expect("parse failed");
    assert_eq!(
        expr,
        Expr::Constant {
            value: Value::Int64(2),
            ty: Ty::nullable(Ty::int64()),
        }
    );
}

/// Nullable lifting of a non-literal emits a checked convert; the
/// converse direction is rejected.
#[test]
fn nullable_lifting() {
    let x = Param::new("x", Ty::int32());
    let expr = parse_lambda(&[x.clone()], Some(&Ty::nullable(Ty::int32())), "x", &opts())
        .expect("parse failed");
    assert_eq!(
        body_of(expr),
        Expr::Convert {
            operand: Box::new(Expr::Param(x)),
            ty: Ty::nullable(Ty::int32()),
            checked: true,
        }
    );

    let y = Param::new("y", Ty::nullable(Ty::int32()));
    let err = parse_lambda(&[y], Some(&Ty::int32()), "y", &opts()).unwrap_err();
    assert_eq!(err.position, 0);
}

// ── Operators ──────────────────────────────────────────────────────────

/// `||` binds looser than `&&`.
#[test]
fn logical_precedence() {
    let expr = parse("true && false || true", None, &opts()).expect("parse failed");
    let Expr::Binary { op, left, ty, .. } = expr else {
        panic!("expected a binary node")
    };
    assert_eq!(op, BinaryOp::Or);
    assert_eq!(ty, Ty::bool());
    assert!(matches!(
        *left,
        Expr::Binary {
            op: BinaryOp::And,
            ..
        }
    ));
}

/// Arithmetic promotes both sides to the selected signature and the
/// result takes the operand type.
#[test]
fn arithmetic_promotion() {
    let expr = parse("1 + 2", None, &opts()).expect("parse failed");
    assert_eq!(expr.ty(), Ty::int32());

    let expr = parse("1 + 2.5", None, &opts()).expect("parse failed");
    assert_eq!(expr.ty(), Ty::double());
    let Expr::Binary { left, .. } = &expr else {
        panic!("expected a binary node")
    };
    // The integer literal re-lexed to Double; no convert node.
    assert_eq!(constant_value(left), &Value::Double(1.0));

    // A literal too large for Int32 drives selection to UInt32.
    let expr = parse("2 + 3000000000", None, &opts()).expect("parse failed");
    assert_eq!(expr.ty(), Ty::Prim(Prim::UInt32));
}

/// `mod` and word operators are recognized case-insensitively.
#[test]
fn word_operators() {
    let expr = parse("7 MOD 2", None, &opts()).expect("parse failed");
    assert!(matches!(
        expr,
        Expr::Binary {
            op: BinaryOp::Modulo,
            ..
        }
    ));
    let expr = parse("true AND NOT false OR false", None, &opts()).expect("parse failed");
    assert_eq!(expr.ty(), Ty::bool());
}

/// Unary negation over a non-literal resolves against the negation set.
#[test]
fn unary_negation() {
    let x = Param::new("x", Ty::double());
    let expr = parse_lambda(&[x.clone()], None, "-x", &opts()).expect("parse failed");
    assert_eq!(
        body_of(expr),
        Expr::Unary {
            op: UnaryOp::Negate,
            operand: Box::new(Expr::Param(x)),
        }
    );
}

/// `&` concatenates; `+` concatenates when either side is a string.
#[test]
fn string_concatenation() {
    for text in ["\"a\" & \"b\"", "\"a\" + \"b\"", "1 & \"b\""] {
        let expr = parse(text, None, &opts()).expect("parse failed");
        let Expr::Call { method, ty, .. } = &expr else {
            panic!("expected a concat call for {text}")
        };
        assert_eq!(method.name, "Concat");
        assert_eq!(*ty, Ty::string());
    }
}

/// String orderings compile to `Compare(x, y)` against zero.
#[test]
fn string_comparison_lowers_to_compare() {
    let x = Param::new("x", Ty::string());
    let y = Param::new("y", Ty::string());
    let expr = parse_lambda(&[x, y], None, "x < y", &opts()).expect("parse failed");
    let Expr::Binary { op, left, right, ty } = body_of(expr) else {
        panic!("expected a binary node")
    };
    assert_eq!(op, BinaryOp::LessThan);
    assert_eq!(ty, Ty::bool());
    assert_eq!(constant_value(&right), &Value::Int32(0));
    let Expr::Call { method, .. } = *left else {
        panic!("expected a Compare call")
    };
    assert_eq!(method.name, "Compare");
}

/// Reference equality against `null` converts the typed side to the
/// common reference type.
#[test]
fn null_equality_over_references() {
    let x = Param::new("x", Ty::string());
    let expr = parse_lambda(&[x.clone()], None, "x == null", &opts()).expect("parse failed");
    let Expr::Binary { op, left, right, ty } = body_of(expr) else {
        panic!("expected a binary node")
    };
    assert_eq!(op, BinaryOp::Equal);
    assert_eq!(ty, Ty::bool());
    assert_eq!(
        *left,
        Expr::Convert {
            operand: Box::new(Expr::Param(x)),
            ty: Ty::object(),
            checked: false,
        }
    );
    assert!(right.is_null_literal());
}

/// Equality against `null` over a value type lifts both sides.
#[test]
fn null_equality_lifts_value_types() {
    let expr = parse("1 == null", None, &opts()).expect("parse failed");
    let Expr::Binary { left, right, ty, .. } = expr else {
        panic!("expected a binary node")
    };
    assert_eq!(ty, Ty::bool());
    assert_eq!(left.ty(), Ty::nullable(Ty::int32()));
    assert_eq!(right.ty(), Ty::nullable(Ty::int32()));
}

// ── Ternary ────────────────────────────────────────────────────────────

/// Arm types reconcile by one-directional promotion.
#[test]
fn ternary_reconciles_arms() {
    let expr = parse("true ? 1 : 2.5", None, &opts()).expect("parse failed");
    let Expr::Conditional { if_true, .. } = &expr else {
        panic!("expected a conditional")
    };
    assert_eq!(expr.ty(), Ty::double());
    assert_eq!(constant_value(if_true), &Value::Double(1.0));
}

/// `iif(a, b, c)` is the ternary.
#[test]
fn iif_is_ternary_sugar() {
    let expr = parse("iif(true, 1, 2)", None, &opts()).expect("parse failed");
    assert!(matches!(expr, Expr::Conditional { .. }));
    assert_eq!(expr.ty(), Ty::int32());
}

// ── Member, index, and type access ─────────────────────────────────────

/// Member names resolve case-insensitively.
#[test]
fn member_lookup_is_case_insensitive() {
    let x = Param::new("x", Ty::string());
    let expr = parse_lambda(&[x], None, "x.length", &opts()).expect("parse failed");
    let Expr::Property { prop, .. } = body_of(expr) else {
        panic!("expected a property access")
    };
    assert_eq!(prop.name, "Length");
}

/// Instance method calls resolve over declared overloads.
#[test]
fn string_method_overloads() {
    let x = Param::new("x", Ty::string());
    let expr = parse_lambda(&[x], None, "x.Substring(1, 2)", &opts()).expect("parse failed");
    let Expr::Call { method, ty, .. } = body_of(expr) else {
        panic!("expected a call")
    };
    assert_eq!(method.params.len(), 2);
    assert_eq!(ty, Ty::string());
}

/// Static utility methods rank overloads by conversion quality.
#[test]
fn math_abs_picks_the_int_overload() {
    let expr = parse("Math.Abs(-5)", None, &opts()).expect("parse failed");
    let Expr::Call { target, method, ty, args, .. } = expr else {
        panic!("expected a call")
    };
    assert!(target.is_none());
    assert_eq!(method.name, "Abs");
    assert_eq!(ty, Ty::int32());
    assert_eq!(constant_value(&args[0]), &Value::Int32(-5));
}

/// Arrays index with an exactly-int argument; strings expose an indexer.
#[test]
fn element_access() {
    let xs = Param::new("xs", Ty::array(Ty::int32()));
    let expr = parse_lambda(&[xs], None, "xs[1]", &opts()).expect("parse failed");
    assert_eq!(body_of(expr).ty(), Ty::int32());

    let s = Param::new("s", Ty::string());
    let expr = parse_lambda(&[s], None, "s[0]", &opts()).expect("parse failed");
    assert_eq!(body_of(expr).ty(), Ty::char());
}

/// A type name with parens is a constructor call, or a conversion when
/// no constructor applies to a single argument.
#[test]
fn type_access_constructor_and_conversion() {
    let expr = parse("DateTime(2020, 1, 3)", None, &opts()).expect("parse failed");
    let Expr::New { ty, args } = expr else {
        panic!("expected a constructor call")
    };
    assert_eq!(ty, Ty::date_time());
    assert_eq!(args.len(), 3);

    let expr = parse("Int32(1.5)", None, &opts()).expect("parse failed");
    assert_eq!(
        expr,
        Expr::Convert {
            operand: Box::new(Expr::constant(Value::Double(1.5))),
            ty: Ty::int32(),
            checked: true,
        }
    );
}

/// `T?` lifts a value type; nullable members are reachable.
#[test]
fn nullable_type_access() {
    let expr = parse("Int32?(null)", None, &opts()).expect("parse failed");
    assert_eq!(expr.ty(), Ty::nullable(Ty::int32()));

    let x = Param::new("x", Ty::nullable(Ty::int32()));
    let expr = parse_lambda(&[x], None, "x.HasValue && x.Value > 1", &opts())
        .expect("parse failed");
    assert_eq!(body_of(expr).ty(), Ty::bool());
}

// ── Substitution values and externals ──────────────────────────────────

/// `@k` resolves positionally into the substitution array.
#[test]
fn positional_substitutions() {
    let options = opts().value(Value::Int32(42));
    let expr = parse("@0 + 1", None, &options).expect("parse failed");
    let Expr::Binary { left, .. } = &expr else {
        panic!("expected a binary node")
    };
    assert_eq!(constant_value(left), &Value::Int32(42));
}

/// A trailing map installs names looked up after symbols.
#[test]
fn externals_resolve_by_name() {
    let mut map = HashMap::new();
    map.insert("limit".to_string(), Value::Int32(10));
    let options = opts().value(Value::Map(map));
    let expr = parse("Limit * 2", None, &options).expect("parse failed");
    assert_eq!(expr.ty(), Ty::int32());
}

/// A lambda-valued substitution is invoked; arguments must promote onto
/// its parameters.
#[test]
fn lambda_values_invoke() {
    let n = Param::new("n", Ty::int32());
    let lambda = Expr::Lambda {
        params: vec![n.clone()],
        body: Box::new(Expr::Binary {
            op: BinaryOp::Multiply,
            left: Box::new(Expr::Param(n)),
            right: Box::new(Expr::constant(Value::Int32(2))),
            ty: Ty::int32(),
        }),
    };
    let options = opts().value(Value::Lambda(Arc::new(lambda)));
    let expr = parse("@0(5)", None, &options).expect("parse failed");
    let Expr::Invoke { args, ty, .. } = expr else {
        panic!("expected an invocation")
    };
    assert_eq!(constant_value(&args[0]), &Value::Int32(5));
    assert_eq!(ty, Ty::int32());
}

// ── Orderings ──────────────────────────────────────────────────────────

/// Clauses default ascending; direction words consume case-insensitively.
#[test]
fn ordering_clauses() {
    let orderings =
        parse_ordering(&Ty::string(), "Length DESC, it", &opts()).expect("parse failed");
    assert_eq!(orderings.len(), 2);
    assert!(!orderings[0].ascending);
    assert!(orderings[1].ascending);

    let it = Param::new("", Ty::string());
    assert_eq!(orderings[0].parameter, it);
    assert_eq!(
        orderings[0].selector,
        Expr::Property {
            target: Some(Box::new(Expr::Param(it.clone()))),
            owner: Ty::string(),
            prop: PropertyDef {
                name: "Length".into(),
                ty: Ty::int32(),
                is_static: false,
            },
        }
    );
    assert_eq!(orderings[1].selector, Expr::Param(it));
}

// ── Allowed types ──────────────────────────────────────────────────────

/// Methods on types outside the allowed set are inaccessible until the
/// caller allows them.
#[test]
fn allowed_types_gate_method_calls() {
    let widget = dynq_types::ClassBuilder::new("Widget")
        .method(
            "Price",
            vec![],
            Ty::decimal(),
        )
        .build();
    let w = Param::new("w", widget.clone());

    let err = parse_lambda(&[w.clone()], None, "w.Price()", &opts()).unwrap_err();
    assert!(matches!(
        err.kind,
        dynq_common::ParseErrorKind::MethodsAreInaccessible(_)
    ));

    let options = opts().allow(widget);
    let expr = parse_lambda(&[w], None, "w.Price()", &options).expect("parse failed");
    assert_eq!(body_of(expr).ty(), Ty::decimal());
}

/// The default allowed set is always present alongside extensions.
#[test]
fn default_allowed_set_remains_available() {
    let options = opts().allow(builtins::math());
    let expr = parse("Math.Sqrt(2.0) + Convert.ToDouble(1)", None, &options)
        .expect("parse failed");
    assert_eq!(expr.ty(), Ty::double());
}
