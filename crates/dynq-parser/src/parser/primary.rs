//! Primary expressions and their suffixes.
//!
//! Covers literals, parenthesized expressions, the identifier dispatch
//! chain (`it_k` references, keywords, symbols, externals, implicit-`it`
//! members), type access, member access with aggregate preemption,
//! indexers, `new(...)` record construction, and `iif`.

use dynq_common::{ParseError, ParseErrorKind, TokenKind};
use dynq_records::{create_class, DynamicProperty};
use dynq_types::{builtins, Expr, FieldDef, MethodDef, PropertyDef, Ty, Value};

use crate::promote::literal_key;
use crate::resolve::{Candidate, Resolution};

use super::{Keyword, Parser, Symbol};

/// A resolved method lookup.
enum MethodResolution {
    Found {
        owner: Ty,
        method: MethodDef,
        args: Vec<Expr>,
    },
    NotFound,
    Ambiguous,
}

/// A resolved property-or-field lookup.
enum MemberKind {
    Property(Ty, PropertyDef),
    Field(Ty, FieldDef),
    EnumMember(Expr),
}

impl<'src> Parser<'src> {
    /// `primary-suffixed := primary ('.' member | '[' args ']')*`
    pub(crate) fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_primary_start()?;
        self.parse_postfix(expr)
    }

    /// The member-access / index-access suffix loop.
    pub(crate) fn parse_postfix(&mut self, mut expr: Expr) -> Result<Expr, ParseError> {
        loop {
            match self.token.kind {
                TokenKind::Dot => {
                    self.bump()?;
                    let ty = expr.ty();
                    expr = self.parse_member_access(Some(expr), ty)?;
                }
                TokenKind::LBracket => {
                    expr = self.parse_element_access(expr)?;
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary_start(&mut self) -> Result<Expr, ParseError> {
        match self.token.kind {
            TokenKind::Ident => self.parse_identifier(),
            TokenKind::StringLit => self.parse_string_literal(),
            TokenKind::IntLit => self.parse_integer_literal(false),
            TokenKind::RealLit => self.parse_real_literal(false),
            TokenKind::LParen => self.parse_paren_expression(),
            _ => Err(self.error(ParseErrorKind::ExpressionExpected)),
        }
    }

    fn parse_paren_expression(&mut self) -> Result<Expr, ParseError> {
        self.bump()?; // '('
        let expr = self.parse_expression()?;
        self.expect(
            TokenKind::RParen,
            ParseErrorKind::CloseParenOrOperatorExpected,
        )?;
        Ok(expr)
    }

    // ── Identifier dispatch ────────────────────────────────────────────

    /// Resolve an identifier, in order: `it_k` reference, keyword,
    /// symbol, external, then member access on the implicit `it`.
    /// The chains never fall back into one another.
    fn parse_identifier(&mut self) -> Result<Expr, ParseError> {
        let text = self.text().to_string();
        let lower = text.to_ascii_lowercase();

        if let Some(digits) = lower.strip_prefix("it_") {
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                return self.parse_outer_it(digits);
            }
        }

        if let Some(keyword) = self.keywords.get(&lower).cloned() {
            return match keyword {
                Keyword::Type(ty) => self.parse_type_access(ty),
                Keyword::It => self.parse_it(),
                Keyword::Iif => self.parse_iif(),
                Keyword::New => self.parse_new(),
                Keyword::Literal(expr) => {
                    self.bump()?;
                    Ok(expr)
                }
            };
        }

        let symbol = self
            .symbols
            .get(&lower)
            .cloned()
            .or_else(|| self.externals.get(&lower).cloned().map(Symbol::Value));
        if let Some(symbol) = symbol {
            return match symbol {
                Symbol::Expr(expr) => {
                    if matches!(expr, Expr::Lambda { .. }) {
                        self.parse_lambda_invocation(expr)
                    } else {
                        self.bump()?;
                        Ok(expr)
                    }
                }
                Symbol::Value(Value::Lambda(lambda)) => {
                    self.parse_lambda_invocation((*lambda).clone())
                }
                Symbol::Value(value) => {
                    self.bump()?;
                    Ok(Expr::constant(value))
                }
            };
        }

        if let Some(it) = self.it_stack.last().cloned() {
            let receiver = Expr::Param(it);
            let ty = receiver.ty();
            return self.parse_member_access(Some(receiver), ty);
        }

        Err(self.error(ParseErrorKind::UnknownIdentifier(text)))
    }

    /// The implicit iteration receiver.
    fn parse_it(&mut self) -> Result<Expr, ParseError> {
        let param = self
            .it_stack
            .last()
            .cloned()
            .ok_or_else(|| self.error(ParseErrorKind::NoItInScope))?;
        self.bump()?;
        Ok(Expr::Param(param))
    }

    /// `it_k`: the k-th iteration scope below the current one; `it_0` is
    /// the current scope.
    fn parse_outer_it(&mut self, digits: &str) -> Result<Expr, ParseError> {
        let k: usize = digits
            .parse()
            .map_err(|_| self.error(ParseErrorKind::NoItInScope))?;
        let index = self
            .it_stack
            .len()
            .checked_sub(1 + k)
            .ok_or_else(|| self.error(ParseErrorKind::NoItInScope))?;
        let param = self.it_stack[index].clone();
        self.bump()?;
        Ok(Expr::Param(param))
    }

    /// `iif(test, then, else)` -- sugar for the ternary.
    fn parse_iif(&mut self) -> Result<Expr, ParseError> {
        let err_pos = self.token.pos();
        self.bump()?;
        if self.token.kind != TokenKind::LParen {
            return Err(self.error(ParseErrorKind::OpenParenExpected));
        }
        let args = self.parse_argument_list()?;
        if args.len() != 3 {
            return Err(self.error_at(ParseErrorKind::IifRequiresThreeArgs, err_pos));
        }
        let mut args = args.into_iter();
        let test = args.next().expect("three arguments");
        let if_true = args.next().expect("three arguments");
        let if_false = args.next().expect("three arguments");
        self.generate_conditional(test, if_true, if_false, err_pos)
    }

    // ── new(...) record construction ───────────────────────────────────

    /// `new(expr [alias Name], ...)`: mint (or fetch) the record type for
    /// the element list and bind each property.
    fn parse_new(&mut self) -> Result<Expr, ParseError> {
        self.bump()?; // 'new'
        self.expect(TokenKind::LParen, ParseErrorKind::OpenParenExpected)?;
        let mut properties = Vec::new();
        let mut bindings = Vec::new();
        loop {
            let expr_pos = self.token.pos();
            let expr = self.parse_expression()?;
            let name = if self.token_is_ident("alias") {
                self.bump()?;
                let name = self.expect_identifier_text()?.to_string();
                self.bump()?;
                name
            } else {
                match &expr {
                    Expr::Property { prop, .. } => prop.name.clone(),
                    Expr::Field { field, .. } => field.name.clone(),
                    _ => {
                        return Err(
                            self.error_at(ParseErrorKind::MissingAsClause, expr_pos)
                        )
                    }
                }
            };
            properties.push(DynamicProperty::new(name.clone(), expr.ty()));
            bindings.push((name, expr));
            if self.token.kind != TokenKind::Comma {
                break;
            }
            self.bump()?;
        }
        self.expect(TokenKind::RParen, ParseErrorKind::CloseParenOrCommaExpected)?;
        let ty = create_class(&properties);
        Ok(Expr::MemberInit { ty, bindings })
    }

    // ── Type access ────────────────────────────────────────────────────

    /// A type name in expression position: optional `?` nullable lift,
    /// then a constructor/conversion call or static member access.
    fn parse_type_access(&mut self, ty: Ty) -> Result<Expr, ParseError> {
        let err_pos = self.token.pos();
        self.bump()?;
        let mut ty = ty;
        if self.token.kind == TokenKind::Question {
            if !ty.is_value_type() || ty.is_nullable() {
                return Err(self.error_at(
                    ParseErrorKind::TypeHasNoNullableForm(ty.name()),
                    err_pos,
                ));
            }
            ty = Ty::nullable(ty);
            self.bump()?;
        }
        if self.token.kind == TokenKind::LParen {
            let args = self.parse_argument_list()?;
            let ctors = builtins::constructors_of(&ty);
            let candidates: Vec<Candidate> = ctors
                .iter()
                .map(|c| Candidate {
                    params: c.params.iter().map(|p| p.ty.clone()).collect(),
                    has_out: c.params.iter().any(|p| p.is_out),
                })
                .collect();
            return match self.find_best(&candidates, &args) {
                Resolution::Single { args, .. } => Ok(Expr::New { ty, args }),
                Resolution::None => {
                    if args.len() == 1 {
                        let arg = args.into_iter().next().expect("one argument");
                        self.generate_conversion(arg, &ty, err_pos)
                    } else {
                        Err(self.error_at(
                            ParseErrorKind::NoMatchingConstructor(ty.name()),
                            err_pos,
                        ))
                    }
                }
                Resolution::Ambiguous => Err(self.error_at(
                    ParseErrorKind::AmbiguousConstructorInvocation(ty.name()),
                    err_pos,
                )),
            };
        }
        self.expect(TokenKind::Dot, ParseErrorKind::DotOrOpenParenExpected)?;
        self.parse_member_access(None, ty)
    }

    /// A dotted type name in an `is`/`as` position, resolved against the
    /// allowed types by short or namespace-qualified name.
    pub(crate) fn parse_qualified_type(&mut self) -> Result<Ty, ParseError> {
        let err_pos = self.token.pos();
        let mut name = self.expect_identifier_text()?.to_string();
        self.bump()?;
        while self.token.kind == TokenKind::Dot {
            self.bump()?;
            let segment = self.expect_identifier_text()?;
            name.push('.');
            name.push_str(segment);
            self.bump()?;
        }
        self.find_type(&name)
            .ok_or_else(|| self.error_at(ParseErrorKind::UnknownIdentifier(name), err_pos))
    }

    fn find_type(&self, name: &str) -> Option<Ty> {
        self.allowed_types
            .iter()
            .find(|t| {
                t.full_name().eq_ignore_ascii_case(name) || t.name().eq_ignore_ascii_case(name)
            })
            .cloned()
    }

    // ── Member access ──────────────────────────────────────────────────

    /// Member access on `instance` (or statically on `ty`): a method
    /// call, an aggregate call when the receiver is enumerable, or a
    /// property/field.
    pub(crate) fn parse_member_access(
        &mut self,
        instance: Option<Expr>,
        ty: Ty,
    ) -> Result<Expr, ParseError> {
        let err_pos = self.token.pos();
        let name = self.expect_identifier_text()?.to_string();
        self.bump()?;

        if self.token.kind == TokenKind::LParen {
            // Aggregate dispatch preempts method lookup for enumerable
            // instance receivers (string is not enumerable here).
            if let Some(inst) = &instance {
                if let Some(element) = ty.enumerable_element() {
                    let receiver = inst.clone();
                    return self.parse_aggregate(receiver, element, &name, err_pos);
                }
            }
            let args = self.parse_argument_list()?;
            return match self.resolve_method(&ty, &name, instance.is_none(), &args) {
                MethodResolution::Found { owner, method, args } => {
                    if !self.allowed_types.contains(&owner) {
                        return Err(self.error_at(
                            ParseErrorKind::MethodsAreInaccessible(owner.name()),
                            err_pos,
                        ));
                    }
                    let Some(result) = method.result.clone() else {
                        return Err(self.error_at(
                            ParseErrorKind::MethodIsVoid {
                                name: method.name.clone(),
                                ty: owner.name(),
                            },
                            err_pos,
                        ));
                    };
                    Ok(Expr::Call {
                        target: instance.map(Box::new),
                        owner,
                        method,
                        args,
                        ty: result,
                    })
                }
                MethodResolution::NotFound => Err(self.error_at(
                    ParseErrorKind::NoApplicableMethod {
                        name,
                        ty: ty.name(),
                    },
                    err_pos,
                )),
                MethodResolution::Ambiguous => Err(self.error_at(
                    ParseErrorKind::AmbiguousMethodInvocation {
                        name,
                        ty: ty.name(),
                    },
                    err_pos,
                )),
            };
        }

        match self.find_property_or_field(&ty, &name, instance.is_none()) {
            Some(MemberKind::Property(owner, prop)) => Ok(Expr::Property {
                target: instance.map(Box::new),
                owner,
                prop,
            }),
            Some(MemberKind::Field(owner, field)) => Ok(Expr::Field {
                target: instance.map(Box::new),
                owner,
                field,
            }),
            Some(MemberKind::EnumMember(expr)) => Ok(expr),
            None => Err(self.error_at(
                ParseErrorKind::UnknownPropertyOrField {
                    name,
                    ty: ty.name(),
                },
                err_pos,
            )),
        }
    }

    /// Walk the self-and-bases chain; the first level with at least one
    /// applicable overload decides the outcome.
    fn resolve_method(
        &self,
        ty: &Ty,
        name: &str,
        static_access: bool,
        args: &[Expr],
    ) -> MethodResolution {
        for level in ty.self_and_base_types() {
            let methods: Vec<MethodDef> = builtins::methods_of(&level)
                .into_iter()
                .filter(|m| m.name.eq_ignore_ascii_case(name) && m.is_static == static_access)
                .collect();
            if methods.is_empty() {
                continue;
            }
            let candidates: Vec<Candidate> = methods
                .iter()
                .map(|m| Candidate {
                    params: m.params.iter().map(|p| p.ty.clone()).collect(),
                    has_out: m.params.iter().any(|p| p.is_out),
                })
                .collect();
            match self.find_best(&candidates, args) {
                Resolution::Single { index, args } => {
                    return MethodResolution::Found {
                        owner: level,
                        method: methods[index].clone(),
                        args,
                    }
                }
                Resolution::Ambiguous => return MethodResolution::Ambiguous,
                Resolution::None => continue,
            }
        }
        MethodResolution::NotFound
    }

    /// Case-insensitive property/field lookup on the self-and-bases
    /// chain; enum members resolve to constants under static access.
    fn find_property_or_field(
        &self,
        ty: &Ty,
        name: &str,
        static_access: bool,
    ) -> Option<MemberKind> {
        for level in ty.self_and_base_types() {
            if static_access {
                if let Ty::Enum(def) = &level {
                    if let Some((member, value)) = def.member(name) {
                        return Some(MemberKind::EnumMember(Expr::Constant {
                            value: Value::Enum {
                                ty: level.clone(),
                                member: member.to_string(),
                                value,
                            },
                            ty: level.clone(),
                        }));
                    }
                }
            }
            if let Some(prop) = builtins::properties_of(&level)
                .into_iter()
                .find(|p| p.name.eq_ignore_ascii_case(name) && p.is_static == static_access)
            {
                return Some(MemberKind::Property(level, prop));
            }
            if let Some(field) = builtins::fields_of(&level)
                .into_iter()
                .find(|f| f.name.eq_ignore_ascii_case(name) && f.is_static == static_access)
            {
                return Some(MemberKind::Field(level, field));
            }
        }
        None
    }

    // ── Element access ─────────────────────────────────────────────────

    /// `expr[args]`: array indexing with an exactly-int index, or an
    /// indexer resolved over the self-and-bases chain.
    fn parse_element_access(&mut self, expr: Expr) -> Result<Expr, ParseError> {
        let err_pos = self.token.pos();
        self.bump()?; // '['
        let args = self.parse_arguments()?;
        self.expect(
            TokenKind::RBracket,
            ParseErrorKind::CloseBracketOrCommaExpected,
        )?;

        if let Ty::Array(element) = expr.ty() {
            if args.len() != 1 {
                return Err(
                    self.error_at(ParseErrorKind::CannotIndexMultiDimArray, err_pos)
                );
            }
            let arg = &args[0];
            let index = self
                .promote_expression(arg, &Ty::int32(), true)
                .ok_or_else(|| self.error_at(ParseErrorKind::InvalidIndex, err_pos))?;
            return Ok(Expr::Index {
                target: Box::new(expr),
                args: vec![index],
                ty: (*element).clone(),
            });
        }

        let ty = expr.ty();
        for level in ty.self_and_base_types() {
            let indexers = builtins::indexers_of(&level);
            if indexers.is_empty() {
                continue;
            }
            let candidates: Vec<Candidate> = indexers
                .iter()
                .map(|ix| Candidate {
                    params: ix.params.iter().map(|p| p.ty.clone()).collect(),
                    has_out: ix.params.iter().any(|p| p.is_out),
                })
                .collect();
            match self.find_best(&candidates, &args) {
                Resolution::Single { index, args } => {
                    return Ok(Expr::Index {
                        target: Box::new(expr),
                        args,
                        ty: indexers[index].ty.clone(),
                    })
                }
                Resolution::Ambiguous => {
                    return Err(self.error_at(
                        ParseErrorKind::AmbiguousIndexerInvocation(ty.name()),
                        err_pos,
                    ))
                }
                Resolution::None => continue,
            }
        }
        Err(self.error_at(ParseErrorKind::NoApplicableIndexer(ty.name()), err_pos))
    }

    // ── Lambda invocation ──────────────────────────────────────────────

    /// Invocation of a lambda-valued symbol: the argument list must
    /// promote onto the lambda's parameters.
    fn parse_lambda_invocation(&mut self, lambda: Expr) -> Result<Expr, ParseError> {
        let err_pos = self.token.pos();
        self.bump()?; // the symbol name
        let Ty::Func(sig) = lambda.ty() else {
            return Err(self.error_at(ParseErrorKind::ArgsIncompatibleWithLambda, err_pos));
        };
        let args = self.parse_argument_list()?;
        let candidate = Candidate::new(sig.params.clone());
        match self.find_best(&[candidate], &args) {
            Resolution::Single { args, .. } => Ok(Expr::Invoke {
                target: Box::new(lambda),
                args,
                ty: sig.result.clone(),
            }),
            _ => Err(self.error_at(ParseErrorKind::ArgsIncompatibleWithLambda, err_pos)),
        }
    }

    // ── Argument lists ─────────────────────────────────────────────────

    /// `'(' (expr (',' expr)*)? ')'` -- trailing commas are not allowed.
    pub(crate) fn parse_argument_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(TokenKind::LParen, ParseErrorKind::OpenParenExpected)?;
        let args = if self.token.kind != TokenKind::RParen {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        self.expect(TokenKind::RParen, ParseErrorKind::CloseParenOrCommaExpected)?;
        Ok(args)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = vec![self.parse_expression()?];
        while self.token.kind == TokenKind::Comma {
            self.bump()?;
            args.push(self.parse_expression()?);
        }
        Ok(args)
    }

    /// The current token as an identifier lexeme, without consuming it.
    pub(crate) fn expect_identifier_text(&self) -> Result<&'src str, ParseError> {
        if self.token.kind != TokenKind::Ident {
            return Err(self.error(ParseErrorKind::IdentifierExpected));
        }
        Ok(self.text())
    }

    // ── Literals ───────────────────────────────────────────────────────

    /// A numeric literal right after a folded unary minus.
    pub(crate) fn parse_signed_numeric_literal(&mut self) -> Result<Expr, ParseError> {
        if self.token.kind == TokenKind::IntLit {
            self.parse_integer_literal(true)
        } else {
            self.parse_real_literal(true)
        }
    }

    /// An integer literal typed by value range: the narrowest of Int32,
    /// UInt32, Int64, UInt64 that holds it (negatives: Int32 or Int64).
    pub(crate) fn parse_integer_literal(&mut self, negated: bool) -> Result<Expr, ParseError> {
        let pos = self.token.pos();
        let raw = self.text();
        let text = if negated {
            format!("-{raw}")
        } else {
            raw.to_string()
        };
        self.bump()?;
        let value = if negated {
            let v: i64 = text.parse().map_err(|_| {
                self.error_at(ParseErrorKind::InvalidIntegerLiteral(text.clone()), pos)
            })?;
            if v >= i32::MIN as i64 {
                Value::Int32(v as i32)
            } else {
                Value::Int64(v)
            }
        } else {
            let v: u64 = text.parse().map_err(|_| {
                self.error_at(ParseErrorKind::InvalidIntegerLiteral(text.clone()), pos)
            })?;
            if v <= i32::MAX as u64 {
                Value::Int32(v as i32)
            } else if v <= u32::MAX as u64 {
                Value::UInt32(v as u32)
            } else if v <= i64::MAX as u64 {
                Value::Int64(v as i64)
            } else {
                Value::UInt64(v)
            }
        };
        Ok(self.create_literal(value, text))
    }

    /// A real literal: `Single` with an `F` suffix, `Double` otherwise.
    pub(crate) fn parse_real_literal(&mut self, negated: bool) -> Result<Expr, ParseError> {
        let pos = self.token.pos();
        let raw = self.text();
        let text = if negated {
            format!("-{raw}")
        } else {
            raw.to_string()
        };
        self.bump()?;
        let value = if text.ends_with('F') || text.ends_with('f') {
            text[..text.len() - 1]
                .parse::<f32>()
                .ok()
                .map(Value::Single)
        } else {
            text.parse::<f64>().ok().map(Value::Double)
        };
        let value = value.ok_or_else(|| {
            self.error_at(ParseErrorKind::InvalidRealLiteral(text.clone()), pos)
        })?;
        Ok(self.create_literal(value, text))
    }

    /// A string literal; single-quoted single-character literals decay
    /// to character constants.
    fn parse_string_literal(&mut self) -> Result<Expr, ParseError> {
        let pos = self.token.pos();
        let raw = self.text();
        let quote = raw.chars().next().expect("string token is non-empty");
        let inner = &raw[1..raw.len() - 1];
        let doubled: String = [quote, quote].iter().collect();
        let unescaped = inner.replace(&doubled, &quote.to_string());
        self.bump()?;
        if quote == '\'' {
            let mut chars = unescaped.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(self.create_literal(Value::Char(c), unescaped)),
                _ => Err(self.error_at(ParseErrorKind::InvalidCharacterLiteral, pos)),
            }
        } else {
            Ok(self.create_literal(Value::Str(unescaped.clone()), unescaped))
        }
    }

    /// Build a constant and remember its source text for literal
    /// re-lexing during promotion.
    fn create_literal(&mut self, value: Value, text: String) -> Expr {
        if let Some(key) = literal_key(&value) {
            self.literals.insert(key, text);
        }
        Expr::constant(value)
    }
}
