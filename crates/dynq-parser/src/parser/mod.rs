//! Parser state and the operator precedence ladder.
//!
//! Each ladder level consumes operands from the next tighter level and
//! loops left-to-right while its operators remain, applying promotion
//! and overload resolution inline so every emitted node is typed.

mod primary;

use dynq_common::{ParseError, ParseErrorKind, Token, TokenKind};
use dynq_lexer::Lexer;
use dynq_types::code::is_numeric;
use dynq_types::{builtins, BinaryOp, Expr, Param, Ty, UnaryOp, Value};
use rustc_hash::FxHashMap;

use crate::promote::LiteralKey;
use crate::resolve::{Candidate, Resolution};
use crate::signatures::{self, OpSig};
use crate::ParseOptions;

/// What a keyword resolves to.
#[derive(Clone, Debug)]
pub(crate) enum Keyword {
    /// An allowed type, referenced by short name.
    Type(Ty),
    /// The implicit iteration receiver.
    It,
    /// Ternary-as-call sugar.
    Iif,
    /// Record construction.
    New,
    /// A literal constant (`true`, `false`, `null`).
    Literal(Expr),
}

/// What a symbol resolves to: a prebuilt expression (parameters, lambda
/// values) or a raw substitution value.
#[derive(Clone, Debug)]
pub(crate) enum Symbol {
    Expr(Expr),
    Value(Value),
}

/// The parser. One instance per parse; all mutable state lives here.
pub(crate) struct Parser<'src> {
    pub(crate) source: &'src str,
    lexer: Lexer<'src>,
    pub(crate) token: Token,
    pub(crate) keywords: FxHashMap<String, Keyword>,
    pub(crate) symbols: FxHashMap<String, Symbol>,
    pub(crate) externals: FxHashMap<String, Value>,
    /// Literal source texts for re-lexing during promotion; local to
    /// this parse, never part of the emitted tree.
    pub(crate) literals: FxHashMap<LiteralKey, String>,
    /// Iteration-scope parameters; the top is the implicit `it`.
    pub(crate) it_stack: Vec<Param>,
    pub(crate) allowed_types: Vec<Ty>,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(
        source: &'src str,
        params: &[Param],
        opts: &ParseOptions,
    ) -> Result<Self, ParseError> {
        let mut allowed_types = builtins::default_allowed_types();
        for ty in &opts.allowed_types {
            if !allowed_types.contains(ty) {
                allowed_types.push(ty.clone());
            }
        }

        let mut keywords = FxHashMap::default();
        keywords.insert(
            "true".to_string(),
            Keyword::Literal(Expr::constant(Value::Bool(true))),
        );
        keywords.insert(
            "false".to_string(),
            Keyword::Literal(Expr::constant(Value::Bool(false))),
        );
        keywords.insert(
            "null".to_string(),
            Keyword::Literal(Expr::constant(Value::Null)),
        );
        keywords.insert("it".to_string(), Keyword::It);
        keywords.insert("iif".to_string(), Keyword::Iif);
        keywords.insert("new".to_string(), Keyword::New);
        for ty in &allowed_types {
            keywords.insert(ty.name().to_ascii_lowercase(), Keyword::Type(ty.clone()));
        }

        let mut symbols: FxHashMap<String, Symbol> = FxHashMap::default();
        let mut it_stack = Vec::new();
        for param in params {
            if param.name.is_empty() {
                continue;
            }
            let key = param.name.to_ascii_lowercase();
            if symbols.contains_key(&key) {
                return Err(ParseError::new(
                    ParseErrorKind::DuplicateIdentifier(param.name.clone()),
                    0,
                ));
            }
            symbols.insert(key, Symbol::Expr(Expr::Param(param.clone())));
        }
        if params.len() == 1 && params[0].name.is_empty() {
            it_stack.push(params[0].clone());
        }

        let mut externals = FxHashMap::default();
        let last = opts.values.len().wrapping_sub(1);
        for (i, value) in opts.values.iter().enumerate() {
            if i == last {
                if let Value::Map(map) = value {
                    for (name, v) in map {
                        externals.insert(name.to_ascii_lowercase(), v.clone());
                    }
                    continue;
                }
            }
            symbols.insert(format!("@{i}"), Symbol::Value(value.clone()));
        }

        let mut lexer = Lexer::new(source);
        let token = lexer.next_token()?;
        Ok(Self {
            source,
            lexer,
            token,
            keywords,
            symbols,
            externals,
            literals: FxHashMap::default(),
            it_stack,
            allowed_types,
        })
    }

    // ── Token helpers ──────────────────────────────────────────────────

    /// Advance to the next token.
    pub(crate) fn bump(&mut self) -> Result<(), ParseError> {
        self.token = self.lexer.next_token()?;
        Ok(())
    }

    /// The current token's lexeme.
    pub(crate) fn text(&self) -> &'src str {
        self.token.text(self.source)
    }

    /// Whether the current token is an identifier with the given lexeme,
    /// case-insensitively.
    pub(crate) fn token_is_ident(&self, name: &str) -> bool {
        self.token.kind == TokenKind::Ident && self.text().eq_ignore_ascii_case(name)
    }

    /// Consume a token of the given kind, or fail with `kind_err`.
    pub(crate) fn expect(
        &mut self,
        kind: TokenKind,
        kind_err: ParseErrorKind,
    ) -> Result<(), ParseError> {
        if self.token.kind != kind {
            return Err(self.error(kind_err));
        }
        self.bump()
    }

    /// An error at the current token.
    pub(crate) fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.token.pos())
    }

    pub(crate) fn error_at(&self, kind: ParseErrorKind, pos: u32) -> ParseError {
        ParseError::new(kind, pos)
    }

    // ── Entry ──────────────────────────────────────────────────────────

    /// Parse the whole input; promote to `result_ty` (exactly) when
    /// given; require the input to be fully consumed.
    pub(crate) fn parse_to(&mut self, result_ty: Option<&Ty>) -> Result<Expr, ParseError> {
        let err_pos = self.token.pos();
        let mut expr = self.parse_expression()?;
        if let Some(target) = result_ty {
            expr = self.promote_expression(&expr, target, true).ok_or_else(|| {
                self.error_at(
                    ParseErrorKind::ExpressionTypeMismatch {
                        expected: target.name(),
                    },
                    err_pos,
                )
            })?;
        }
        self.expect(TokenKind::End, ParseErrorKind::SyntaxError)?;
        Ok(expr)
    }

    // ── Precedence ladder ──────────────────────────────────────────────

    /// `expr := or ('?' expr ':' expr)?`
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let err_pos = self.token.pos();
        let expr = self.parse_logical_or()?;
        if self.token.kind != TokenKind::Question {
            return Ok(expr);
        }
        self.bump()?;
        let if_true = self.parse_expression()?;
        self.expect(TokenKind::Colon, ParseErrorKind::ColonExpected)?;
        let if_false = self.parse_expression()?;
        self.generate_conditional(expr, if_true, if_false, err_pos)
    }

    /// `or := and (('||' | 'or') and)*`
    fn parse_logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_logical_and()?;
        while self.token.kind == TokenKind::BarBar || self.token_is_ident("or") {
            let op_text = self.text().to_string();
            let err_pos = self.token.pos();
            self.bump()?;
            let mut right = self.parse_logical_and()?;
            let ty = self.check_and_promote_2(
                &signatures::logical(),
                &op_text,
                &mut left,
                &mut right,
                err_pos,
            )?;
            left = Expr::Binary {
                op: BinaryOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                ty,
            };
        }
        Ok(left)
    }

    /// `and := rel (('&&' | 'and') rel)*`
    fn parse_logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_comparison()?;
        while self.token.kind == TokenKind::AmpAmp || self.token_is_ident("and") {
            let op_text = self.text().to_string();
            let err_pos = self.token.pos();
            self.bump()?;
            let mut right = self.parse_comparison()?;
            let ty = self.check_and_promote_2(
                &signatures::logical(),
                &op_text,
                &mut left,
                &mut right,
                err_pos,
            )?;
            left = Expr::Binary {
                op: BinaryOp::And,
                left: Box::new(left),
                right: Box::new(right),
                ty,
            };
        }
        Ok(left)
    }

    /// `rel := add ((relop add) | ('as' type) | ('is' type))*`
    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            match self.token.kind {
                TokenKind::AsKw => {
                    let err_pos = self.token.pos();
                    self.bump()?;
                    let ty = self.parse_qualified_type()?;
                    if ty.is_value_type() && !ty.is_nullable() {
                        return Err(self.error_at(
                            ParseErrorKind::CannotConvertValue {
                                from: operand_type_name(&left),
                                to: ty.name(),
                            },
                            err_pos,
                        ));
                    }
                    left = Expr::TypeAs {
                        operand: Box::new(left),
                        ty,
                    };
                }
                TokenKind::IsKw => {
                    self.bump()?;
                    let test = self.parse_qualified_type()?;
                    left = Expr::TypeIs {
                        operand: Box::new(left),
                        test,
                    };
                }
                TokenKind::Eq
                | TokenKind::EqEq
                | TokenKind::NotEq
                | TokenKind::Diamond
                | TokenKind::Lt
                | TokenKind::LtEq
                | TokenKind::Gt
                | TokenKind::GtEq => {
                    let kind = self.token.kind;
                    let op_text = self.text().to_string();
                    let err_pos = self.token.pos();
                    self.bump()?;
                    let mut right = self.parse_additive()?;

                    let is_equality = matches!(
                        kind,
                        TokenKind::Eq | TokenKind::EqEq | TokenKind::NotEq | TokenKind::Diamond
                    );
                    let (lt, rt) = (left.ty(), right.ty());
                    if is_equality && !lt.is_value_type() && !rt.is_value_type() {
                        // Reference equality: reconcile by one-directional
                        // reference conversion.
                        if lt != rt {
                            if lt.assignable_from(&rt) {
                                right = Expr::Convert {
                                    operand: Box::new(right),
                                    ty: lt.clone(),
                                    checked: false,
                                };
                            } else if rt.assignable_from(&lt) {
                                left = Expr::Convert {
                                    operand: Box::new(left),
                                    ty: rt.clone(),
                                    checked: false,
                                };
                            } else {
                                return Err(self.incompatible_operands(
                                    &op_text, &left, &right, err_pos,
                                ));
                            }
                        }
                    } else if lt.is_enum() || rt.is_enum() {
                        if lt != rt {
                            if let Some(e) = self.promote_expression(&right, &lt, true) {
                                right = e;
                            } else if let Some(e) = self.promote_expression(&left, &rt, true) {
                                left = e;
                            } else if lt.is_enum() && is_numeric(&rt) {
                                // Enums coerce numerically only through an
                                // explicit checked narrowing.
                                left = Expr::Convert {
                                    operand: Box::new(left),
                                    ty: rt.clone(),
                                    checked: true,
                                };
                            } else if rt.is_enum() && is_numeric(&lt) {
                                right = Expr::Convert {
                                    operand: Box::new(right),
                                    ty: lt.clone(),
                                    checked: true,
                                };
                            } else {
                                return Err(self.incompatible_operands(
                                    &op_text, &left, &right, err_pos,
                                ));
                            }
                        }
                    } else {
                        let set = if is_equality {
                            signatures::equality()
                        } else {
                            signatures::relational()
                        };
                        self.check_and_promote_2(&set, &op_text, &mut left, &mut right, err_pos)?;
                    }

                    let op = match kind {
                        TokenKind::Eq | TokenKind::EqEq => BinaryOp::Equal,
                        TokenKind::NotEq | TokenKind::Diamond => BinaryOp::NotEqual,
                        TokenKind::Lt => BinaryOp::LessThan,
                        TokenKind::LtEq => BinaryOp::LessThanOrEqual,
                        TokenKind::Gt => BinaryOp::GreaterThan,
                        _ => BinaryOp::GreaterThanOrEqual,
                    };
                    left = generate_comparison(op, left, right);
                }
                _ => break,
            }
        }
        Ok(left)
    }

    /// `add := mul (('+' | '-' | '&') mul)*`
    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        while matches!(
            self.token.kind,
            TokenKind::Plus | TokenKind::Minus | TokenKind::Amp
        ) {
            let kind = self.token.kind;
            let op_text = self.text().to_string();
            let err_pos = self.token.pos();
            self.bump()?;
            let mut right = self.parse_multiplicative()?;
            match kind {
                TokenKind::Plus
                    if left.ty() == Ty::string() || right.ty() == Ty::string() =>
                {
                    left = generate_string_concat(left, right);
                }
                TokenKind::Plus => {
                    let ty = self.check_and_promote_2(
                        &signatures::additive(),
                        &op_text,
                        &mut left,
                        &mut right,
                        err_pos,
                    )?;
                    left = Expr::Binary {
                        op: BinaryOp::Add,
                        left: Box::new(left),
                        right: Box::new(right),
                        ty,
                    };
                }
                TokenKind::Minus => {
                    let ty = self.check_and_promote_2(
                        &signatures::subtractive(),
                        &op_text,
                        &mut left,
                        &mut right,
                        err_pos,
                    )?;
                    left = Expr::Binary {
                        op: BinaryOp::Subtract,
                        left: Box::new(left),
                        right: Box::new(right),
                        ty,
                    };
                }
                _ => {
                    left = generate_string_concat(left, right);
                }
            }
        }
        Ok(left)
    }

    /// `mul := unary (('*' | '/' | '%' | 'mod') unary)*`
    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        while matches!(
            self.token.kind,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent
        ) || self.token_is_ident("mod")
        {
            let kind = self.token.kind;
            let op_text = self.text().to_string();
            let err_pos = self.token.pos();
            self.bump()?;
            let mut right = self.parse_unary()?;
            let ty = self.check_and_promote_2(
                &signatures::arithmetic(),
                &op_text,
                &mut left,
                &mut right,
                err_pos,
            )?;
            let op = match kind {
                TokenKind::Star => BinaryOp::Multiply,
                TokenKind::Slash => BinaryOp::Divide,
                _ => BinaryOp::Modulo,
            };
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                ty,
            };
        }
        Ok(left)
    }

    /// `unary := ('-' | '!' | 'not')? primary-suffixed`
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let is_not = self.token.kind == TokenKind::Bang || self.token_is_ident("not");
        let is_minus = self.token.kind == TokenKind::Minus;
        if !is_not && !is_minus {
            return self.parse_primary();
        }

        let op_text = self.text().to_string();
        let err_pos = self.token.pos();
        self.bump()?;

        if is_minus
            && matches!(self.token.kind, TokenKind::IntLit | TokenKind::RealLit)
        {
            // Fold the sign into the literal so minimum signed values
            // have a representation.
            let literal = self.parse_signed_numeric_literal()?;
            return self.parse_postfix(literal);
        }

        let mut operand = self.parse_unary()?;
        if is_minus {
            self.check_and_promote_1(
                &signatures::negation(),
                &op_text,
                &mut operand,
                err_pos,
            )?;
            Ok(Expr::Unary {
                op: UnaryOp::Negate,
                operand: Box::new(operand),
            })
        } else {
            self.check_and_promote_1(
                &signatures::logical_not(),
                &op_text,
                &mut operand,
                err_pos,
            )?;
            Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            })
        }
    }

    // ── Operand promotion against signature sets ───────────────────────

    /// Promote a unary operand against a signature set, writing the
    /// promoted operand back. Fails as `IncompatibleOperand`.
    fn check_and_promote_1(
        &self,
        set: &[OpSig],
        op_text: &str,
        operand: &mut Expr,
        err_pos: u32,
    ) -> Result<Ty, ParseError> {
        let candidates: Vec<Candidate> =
            set.iter().map(|s| Candidate::new(s.params.clone())).collect();
        match self.find_best(&candidates, std::slice::from_ref(operand)) {
            Resolution::Single { index, mut args } => {
                *operand = args.pop().expect("one promoted operand");
                Ok(set[index].result.clone())
            }
            _ => Err(self.error_at(
                ParseErrorKind::IncompatibleOperand {
                    op: op_text.to_string(),
                    ty: operand_type_name(operand),
                },
                err_pos,
            )),
        }
    }

    /// Promote both operands against a signature set, writing them back
    /// and returning the selected signature's result type. Fails as
    /// `IncompatibleOperands`.
    fn check_and_promote_2(
        &self,
        set: &[OpSig],
        op_text: &str,
        left: &mut Expr,
        right: &mut Expr,
        err_pos: u32,
    ) -> Result<Ty, ParseError> {
        let candidates: Vec<Candidate> =
            set.iter().map(|s| Candidate::new(s.params.clone())).collect();
        let args = [left.clone(), right.clone()];
        match self.find_best(&candidates, &args) {
            Resolution::Single { index, mut args } => {
                *right = args.pop().expect("two promoted operands");
                *left = args.pop().expect("two promoted operands");
                Ok(set[index].result.clone())
            }
            _ => Err(self.incompatible_operands(op_text, left, right, err_pos)),
        }
    }

    pub(crate) fn incompatible_operands(
        &self,
        op_text: &str,
        left: &Expr,
        right: &Expr,
        err_pos: u32,
    ) -> ParseError {
        self.error_at(
            ParseErrorKind::IncompatibleOperands {
                op: op_text.to_string(),
                left: operand_type_name(left),
                right: operand_type_name(right),
            },
            err_pos,
        )
    }

    // ── Shared node generators ─────────────────────────────────────────

    /// Build the ternary, reconciling arm types by bidirectional exact
    /// promotion; exactly one direction must succeed, and the null
    /// literal is never a promotion target.
    pub(crate) fn generate_conditional(
        &self,
        test: Expr,
        if_true: Expr,
        if_false: Expr,
        err_pos: u32,
    ) -> Result<Expr, ParseError> {
        if test.ty() != Ty::bool() {
            return Err(self.error_at(ParseErrorKind::FirstExprMustBeBool, err_pos));
        }
        let (mut if_true, mut if_false) = (if_true, if_false);
        if if_true.ty() != if_false.ty() {
            let true_as_false = if !if_false.is_null_literal() {
                self.promote_expression(&if_true, &if_false.ty(), true)
            } else {
                None
            };
            let false_as_true = if !if_true.is_null_literal() {
                self.promote_expression(&if_false, &if_true.ty(), true)
            } else {
                None
            };
            match (true_as_false, false_as_true) {
                (Some(promoted), None) => if_true = promoted,
                (None, Some(promoted)) => if_false = promoted,
                (Some(_), Some(_)) => {
                    return Err(self.error_at(
                        ParseErrorKind::BothTypesConvertToOther {
                            left: operand_type_name(&if_true),
                            right: operand_type_name(&if_false),
                        },
                        err_pos,
                    ))
                }
                (None, None) => {
                    return Err(self.error_at(
                        ParseErrorKind::NeitherTypeConvertsToOther {
                            left: operand_type_name(&if_true),
                            right: operand_type_name(&if_false),
                        },
                        err_pos,
                    ))
                }
            }
        }
        Ok(Expr::Conditional {
            test: Box::new(test),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        })
    }
}

/// The display name of an operand's type; the null literal reads `null`.
pub(crate) fn operand_type_name(expr: &Expr) -> String {
    if expr.is_null_literal() {
        "null".to_string()
    } else {
        expr.ty().name()
    }
}

/// Build a comparison node. String orderings compare through
/// `Compare(left, right)` against zero.
fn generate_comparison(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let ordering = matches!(
        op,
        BinaryOp::LessThan
            | BinaryOp::LessThanOrEqual
            | BinaryOp::GreaterThan
            | BinaryOp::GreaterThanOrEqual
    );
    if ordering && left.ty() == Ty::string() {
        let compare = Expr::Call {
            target: None,
            owner: Ty::string(),
            method: builtins::string_compare(),
            args: vec![left, right],
            ty: Ty::int32(),
        };
        return Expr::Binary {
            op,
            left: Box::new(compare),
            right: Box::new(Expr::constant(Value::Int32(0))),
            ty: Ty::bool(),
        };
    }
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        ty: Ty::bool(),
    }
}

/// `&` and `+`-over-strings compile to `Concat(object, object)`.
fn generate_string_concat(left: Expr, right: Expr) -> Expr {
    Expr::Call {
        target: None,
        owner: Ty::string(),
        method: builtins::string_concat(),
        args: vec![left, right],
        ty: Ty::string(),
    }
}
