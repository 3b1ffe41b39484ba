//! Expression grammar
//!
//! Precedence, loosest first: lambda, conditional, `or`, `and`, `not`,
//! comparisons, `|`, `^`, `&`, shifts, `+ -`, `* / // % @`, unary
//! `+ - ~`, `**`, `await`, primaries.

use super::Parser;
use crate::error::{ParseError, Result};
use crate::lexer::{StringKind, TokenKind};
use xnlogo_core::ast::{
    BinaryOperator, BoolOperator, CompareOperator, Comprehension, Constant, Expr, ExprKind,
    Keyword, Param, ParamKind, UnaryOperator,
};

impl Parser {
    fn node(&self, kind: ExprKind, location: xnlogo_core::SourceLocation, start: usize) -> Expr {
        Expr::new(kind, location, self.span_from(start))
    }

    /// `test` optionally followed by `:=`
    pub(crate) fn parse_named_test(&mut self) -> Result<Expr> {
        if matches!(self.peek_kind(), TokenKind::Name(_))
            && matches!(self.peek_nth_kind(1), TokenKind::Op(":="))
        {
            let location = self.location();
            let start = self.start();
            let target = self.expect_name()?;
            self.advance();
            let value = self.parse_test()?;
            return Ok(self.node(
                ExprKind::NamedExpr {
                    target,
                    value: Box::new(value),
                },
                location,
                start,
            ));
        }
        self.parse_test()
    }

    pub(crate) fn parse_test(&mut self) -> Result<Expr> {
        if self.at_kw("lambda") {
            return self.parse_lambda();
        }
        let location = self.location();
        let start = self.start();
        let body = self.parse_or_test()?;
        if self.eat_kw("if") {
            let test = self.parse_or_test()?;
            self.expect_kw("else")?;
            let orelse = self.parse_test()?;
            return Ok(self.node(
                ExprKind::IfExp {
                    test: Box::new(test),
                    body: Box::new(body),
                    orelse: Box::new(orelse),
                },
                location,
                start,
            ));
        }
        Ok(body)
    }

    /// Condition in a comprehension clause: no unparenthesized ternary
    fn parse_test_no_cond(&mut self) -> Result<Expr> {
        if self.at_kw("lambda") {
            return self.parse_lambda();
        }
        self.parse_or_test()
    }

    fn parse_lambda(&mut self) -> Result<Expr> {
        let location = self.location();
        let start = self.start();
        self.expect_kw("lambda")?;
        let params = self.parse_params(":", false)?;
        self.expect_op(":")?;
        let body = self.parse_test()?;
        Ok(self.node(
            ExprKind::Lambda {
                params,
                body: Box::new(body),
            },
            location,
            start,
        ))
    }

    fn parse_or_test(&mut self) -> Result<Expr> {
        self.parse_bool_chain("or", BoolOperator::Or)
    }

    fn parse_bool_chain(&mut self, kw: &str, op: BoolOperator) -> Result<Expr> {
        let location = self.location();
        let start = self.start();
        let first = match op {
            BoolOperator::Or => self.parse_bool_chain("and", BoolOperator::And)?,
            BoolOperator::And => self.parse_not_test()?,
        };
        if !self.at_kw(kw) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.eat_kw(kw) {
            values.push(match op {
                BoolOperator::Or => self.parse_bool_chain("and", BoolOperator::And)?,
                BoolOperator::And => self.parse_not_test()?,
            });
        }
        Ok(self.node(ExprKind::BoolOp { op, values }, location, start))
    }

    fn parse_not_test(&mut self) -> Result<Expr> {
        if self.at_kw("not") {
            let location = self.location();
            let start = self.start();
            self.advance();
            let operand = self.parse_not_test()?;
            return Ok(self.node(
                ExprKind::UnaryOp {
                    op: UnaryOperator::Not,
                    operand: Box::new(operand),
                },
                location,
                start,
            ));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let location = self.location();
        let start = self.start();
        let left = self.parse_bitor()?;
        let mut comparisons = Vec::new();
        while let Some(op) = self.eat_compare_operator() {
            comparisons.push((op, self.parse_bitor()?));
        }
        if comparisons.is_empty() {
            return Ok(left);
        }
        Ok(self.node(
            ExprKind::Compare {
                left: Box::new(left),
                comparisons,
            },
            location,
            start,
        ))
    }

    fn eat_compare_operator(&mut self) -> Option<CompareOperator> {
        let op = match self.peek_kind() {
            TokenKind::Op("==") => CompareOperator::Eq,
            TokenKind::Op("!=") => CompareOperator::NotEq,
            TokenKind::Op("<") => CompareOperator::Lt,
            TokenKind::Op("<=") => CompareOperator::LtE,
            TokenKind::Op(">") => CompareOperator::Gt,
            TokenKind::Op(">=") => CompareOperator::GtE,
            TokenKind::Keyword("in") => CompareOperator::In,
            TokenKind::Keyword("not") if matches!(self.peek_nth_kind(1), TokenKind::Keyword("in")) => {
                self.advance();
                CompareOperator::NotIn
            }
            TokenKind::Keyword("is") => {
                if matches!(self.peek_nth_kind(1), TokenKind::Keyword("not")) {
                    self.advance();
                    CompareOperator::IsNot
                } else {
                    CompareOperator::Is
                }
            }
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    /// Bitwise or: the `expr` level used for assignment and loop targets
    pub(crate) fn parse_bitor(&mut self) -> Result<Expr> {
        self.parse_binary_level(0)
    }

    fn parse_binary_level(&mut self, level: usize) -> Result<Expr> {
        const LEVELS: &[&[(&str, BinaryOperator)]] = &[
            &[("|", BinaryOperator::BitOr)],
            &[("^", BinaryOperator::BitXor)],
            &[("&", BinaryOperator::BitAnd)],
            &[("<<", BinaryOperator::LShift), (">>", BinaryOperator::RShift)],
            &[("+", BinaryOperator::Add), ("-", BinaryOperator::Sub)],
            &[
                ("*", BinaryOperator::Mul),
                ("/", BinaryOperator::Div),
                ("//", BinaryOperator::FloorDiv),
                ("%", BinaryOperator::Mod),
                ("@", BinaryOperator::MatMul),
            ],
        ];

        let Some(operators) = LEVELS.get(level) else {
            return self.parse_factor();
        };

        let location = self.location();
        let start = self.start();
        let mut left = self.parse_binary_level(level + 1)?;
        loop {
            let found = operators
                .iter()
                .find(|(symbol, _)| self.at_op(symbol))
                .map(|(_, op)| *op);
            let Some(op) = found else { break };
            self.advance();
            let right = self.parse_binary_level(level + 1)?;
            left = self.node(
                ExprKind::BinOp {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                location,
                start,
            );
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Op("-") => Some(UnaryOperator::Neg),
            TokenKind::Op("+") => Some(UnaryOperator::Pos),
            TokenKind::Op("~") => Some(UnaryOperator::Invert),
            _ => None,
        };
        if let Some(op) = op {
            let location = self.location();
            let start = self.start();
            self.advance();
            let operand = self.parse_factor()?;
            return Ok(self.node(
                ExprKind::UnaryOp {
                    op,
                    operand: Box::new(operand),
                },
                location,
                start,
            ));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr> {
        let location = self.location();
        let start = self.start();
        let base = if self.eat_kw("await") {
            let operand = self.parse_primary()?;
            self.node(ExprKind::Await(Box::new(operand)), location, start)
        } else {
            self.parse_primary()?
        };
        if self.eat_op("**") {
            let exponent = self.parse_factor()?;
            return Ok(self.node(
                ExprKind::BinOp {
                    left: Box::new(base),
                    op: BinaryOperator::Pow,
                    right: Box::new(exponent),
                },
                location,
                start,
            ));
        }
        Ok(base)
    }

    /// Atom followed by calls, subscripts and attribute accesses
    fn parse_primary(&mut self) -> Result<Expr> {
        let location = self.location();
        let start = self.start();
        let mut expr = self.parse_atom()?;
        loop {
            if self.eat_op(".") {
                let attr = self.expect_name()?;
                expr = self.node(
                    ExprKind::Attribute {
                        value: Box::new(expr),
                        attr,
                    },
                    location,
                    start,
                );
            } else if self.eat_op("(") {
                let (args, keywords) = self.parse_call_arguments()?;
                self.expect_op(")")?;
                expr = self.node(
                    ExprKind::Call {
                        func: Box::new(expr),
                        args,
                        keywords,
                    },
                    location,
                    start,
                );
            } else if self.eat_op("[") {
                let index = self.parse_subscript_list()?;
                self.expect_op("]")?;
                expr = self.node(
                    ExprKind::Subscript {
                        value: Box::new(expr),
                        index: Box::new(index),
                    },
                    location,
                    start,
                );
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_call_arguments(&mut self) -> Result<(Vec<Expr>, Vec<Keyword>)> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        while !self.at_op(")") {
            let location = self.location();
            let start = self.start();
            if self.eat_op("*") {
                let value = self.parse_test()?;
                args.push(self.node(ExprKind::Starred(Box::new(value)), location, start));
            } else if self.eat_op("**") {
                let value = self.parse_test()?;
                keywords.push(Keyword { arg: None, value });
            } else if matches!(self.peek_kind(), TokenKind::Name(_))
                && matches!(self.peek_nth_kind(1), TokenKind::Op("="))
            {
                let arg = self.expect_name()?;
                self.advance();
                let value = self.parse_test()?;
                keywords.push(Keyword {
                    arg: Some(arg),
                    value,
                });
            } else {
                let value = self.parse_named_test()?;
                if self.at_kw("for") || self.at_kw("async") {
                    let generators = self.parse_comprehension_clauses()?;
                    args.push(self.node(
                        ExprKind::GeneratorExp {
                            element: Box::new(value),
                            generators,
                        },
                        location,
                        start,
                    ));
                } else {
                    args.push(value);
                }
            }
            if !self.eat_op(",") {
                break;
            }
        }
        Ok((args, keywords))
    }

    fn parse_subscript_list(&mut self) -> Result<Expr> {
        let location = self.location();
        let start = self.start();
        let first = self.parse_subscript()?;
        if !self.at_op(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.at_op("]") {
                break;
            }
            items.push(self.parse_subscript()?);
        }
        Ok(self.node(ExprKind::Tuple(items), location, start))
    }

    fn parse_subscript(&mut self) -> Result<Expr> {
        let location = self.location();
        let start = self.start();
        let lower = if self.at_op(":") {
            None
        } else {
            let value = self.parse_named_test()?;
            if !self.at_op(":") {
                return Ok(value);
            }
            Some(Box::new(value))
        };
        self.expect_op(":")?;
        let upper = if self.at_op(":") || self.at_op("]") || self.at_op(",") {
            None
        } else {
            Some(Box::new(self.parse_test()?))
        };
        let step = if self.eat_op(":") && !(self.at_op("]") || self.at_op(",")) {
            Some(Box::new(self.parse_test()?))
        } else {
            None
        };
        Ok(self.node(ExprKind::Slice { lower, upper, step }, location, start))
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        let location = self.location();
        let start = self.start();
        let kind = match self.peek_kind().clone() {
            TokenKind::Name(name) => {
                self.advance();
                ExprKind::Name(name)
            }
            TokenKind::Int(value) => {
                self.advance();
                ExprKind::Constant(Constant::Int(value))
            }
            TokenKind::Float(value) => {
                self.advance();
                ExprKind::Constant(Constant::Float(value))
            }
            TokenKind::Str { .. } => self.parse_strings(),
            TokenKind::Keyword("True") => {
                self.advance();
                ExprKind::Constant(Constant::Bool(true))
            }
            TokenKind::Keyword("False") => {
                self.advance();
                ExprKind::Constant(Constant::Bool(false))
            }
            TokenKind::Keyword("None") => {
                self.advance();
                ExprKind::Constant(Constant::None)
            }
            TokenKind::Op("...") => {
                self.advance();
                ExprKind::Constant(Constant::Ellipsis)
            }
            TokenKind::Op("(") => return self.parse_paren_atom(),
            TokenKind::Op("[") => return self.parse_list_atom(),
            TokenKind::Op("{") => return self.parse_brace_atom(),
            _ => return Err(self.unexpected("an expression")),
        };
        Ok(self.node(kind, location, start))
    }

    /// Adjacent string literals concatenate
    fn parse_strings(&mut self) -> ExprKind {
        let mut value = String::new();
        let mut combined = StringKind::Plain;
        while let TokenKind::Str { value: part, kind } = self.peek_kind().clone() {
            self.advance();
            value.push_str(&part);
            if kind != StringKind::Plain {
                combined = kind;
            }
        }
        match combined {
            StringKind::Plain => ExprKind::Constant(Constant::Str(value)),
            StringKind::Bytes => ExprKind::Constant(Constant::Bytes(value)),
            StringKind::Format => ExprKind::FString(value),
        }
    }

    fn parse_paren_atom(&mut self) -> Result<Expr> {
        let location = self.location();
        let start = self.start();
        self.expect_op("(")?;
        if self.eat_op(")") {
            return Ok(self.node(ExprKind::Tuple(Vec::new()), location, start));
        }
        if self.at_kw("yield") {
            let value = self.parse_yield()?;
            self.expect_op(")")?;
            return Ok(value);
        }
        let first = self.parse_star_or_named()?;
        if self.at_kw("for") || self.at_kw("async") {
            let generators = self.parse_comprehension_clauses()?;
            self.expect_op(")")?;
            return Ok(self.node(
                ExprKind::GeneratorExp {
                    element: Box::new(first),
                    generators,
                },
                location,
                start,
            ));
        }
        if !self.at_op(",") {
            self.expect_op(")")?;
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.at_op(")") {
                break;
            }
            items.push(self.parse_star_or_named()?);
        }
        self.expect_op(")")?;
        Ok(self.node(ExprKind::Tuple(items), location, start))
    }

    fn parse_list_atom(&mut self) -> Result<Expr> {
        let location = self.location();
        let start = self.start();
        self.expect_op("[")?;
        if self.eat_op("]") {
            return Ok(self.node(ExprKind::List(Vec::new()), location, start));
        }
        let first = self.parse_star_or_named()?;
        if self.at_kw("for") || self.at_kw("async") {
            let generators = self.parse_comprehension_clauses()?;
            self.expect_op("]")?;
            return Ok(self.node(
                ExprKind::ListComp {
                    element: Box::new(first),
                    generators,
                },
                location,
                start,
            ));
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.at_op("]") {
                break;
            }
            items.push(self.parse_star_or_named()?);
        }
        self.expect_op("]")?;
        Ok(self.node(ExprKind::List(items), location, start))
    }

    fn parse_brace_atom(&mut self) -> Result<Expr> {
        let location = self.location();
        let start = self.start();
        self.expect_op("{")?;
        if self.eat_op("}") {
            return Ok(self.node(ExprKind::Dict(Vec::new()), location, start));
        }

        // Dict: `key: value` or `**mapping` first
        if self.at_op("**") || self.is_dict_entry_ahead() {
            let first = self.parse_dict_entry()?;
            if let (Some(key), true) = (&first.0, self.at_kw("for") || self.at_kw("async")) {
                let key = key.clone();
                let generators = self.parse_comprehension_clauses()?;
                self.expect_op("}")?;
                return Ok(self.node(
                    ExprKind::DictComp {
                        key: Box::new(key),
                        value: Box::new(first.1),
                        generators,
                    },
                    location,
                    start,
                ));
            }
            let mut entries = vec![first];
            while self.eat_op(",") {
                if self.at_op("}") {
                    break;
                }
                entries.push(self.parse_dict_entry()?);
            }
            self.expect_op("}")?;
            return Ok(self.node(ExprKind::Dict(entries), location, start));
        }

        let first = self.parse_star_or_named()?;
        if self.at_kw("for") || self.at_kw("async") {
            let generators = self.parse_comprehension_clauses()?;
            self.expect_op("}")?;
            return Ok(self.node(
                ExprKind::SetComp {
                    element: Box::new(first),
                    generators,
                },
                location,
                start,
            ));
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.at_op("}") {
                break;
            }
            items.push(self.parse_star_or_named()?);
        }
        self.expect_op("}")?;
        Ok(self.node(ExprKind::Set(items), location, start))
    }

    /// Look ahead past one expression for a `:` without consuming anything
    fn is_dict_entry_ahead(&mut self) -> bool {
        let saved = (self.pos, self.prev_end);
        let found = self.parse_test().is_ok() && self.at_op(":");
        self.pos = saved.0;
        self.prev_end = saved.1;
        found
    }

    fn parse_dict_entry(&mut self) -> Result<(Option<Expr>, Expr)> {
        if self.eat_op("**") {
            let value = self.parse_bitor()?;
            return Ok((None, value));
        }
        let key = self.parse_test()?;
        self.expect_op(":")?;
        let value = self.parse_test()?;
        Ok((Some(key), value))
    }

    fn parse_star_or_named(&mut self) -> Result<Expr> {
        if self.at_op("*") {
            let location = self.location();
            let start = self.start();
            self.advance();
            let value = self.parse_bitor()?;
            return Ok(self.node(ExprKind::Starred(Box::new(value)), location, start));
        }
        self.parse_named_test()
    }

    fn parse_comprehension_clauses(&mut self) -> Result<Vec<Comprehension>> {
        let mut generators = Vec::new();
        loop {
            let is_async = self.eat_kw("async");
            if !self.eat_kw("for") {
                if is_async {
                    return Err(self.unexpected("'for'"));
                }
                break;
            }
            let target = self.parse_target_list()?;
            self.expect_kw("in")?;
            let iter = self.parse_or_test()?;
            let mut conditions = Vec::new();
            while self.eat_kw("if") {
                conditions.push(self.parse_test_no_cond()?);
            }
            generators.push(Comprehension {
                target,
                iter,
                conditions,
                is_async,
            });
        }
        Ok(generators)
    }

    /// Loop and comprehension targets: `x`, `a, b`, `(a, b)`
    pub(crate) fn parse_target_list(&mut self) -> Result<Expr> {
        let location = self.location();
        let start = self.start();
        let first = self.parse_star_target()?;
        if !self.at_op(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.at_kw("in") || self.at_op("=") {
                break;
            }
            items.push(self.parse_star_target()?);
        }
        Ok(self.node(ExprKind::Tuple(items), location, start))
    }

    fn parse_star_target(&mut self) -> Result<Expr> {
        if self.at_op("*") {
            let location = self.location();
            let start = self.start();
            self.advance();
            let value = self.parse_bitor()?;
            return Ok(self.node(ExprKind::Starred(Box::new(value)), location, start));
        }
        self.parse_bitor()
    }

    /// Comma-separated expressions, a tuple when there is a comma
    pub(crate) fn parse_test_list(&mut self) -> Result<Expr> {
        let location = self.location();
        let start = self.start();
        let first = self.parse_star_or_named()?;
        if !self.at_op(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if !self.starts_expression() {
                break;
            }
            items.push(self.parse_star_or_named()?);
        }
        Ok(self.node(ExprKind::Tuple(items), location, start))
    }

    /// `yield`, `yield value`, `yield from value`
    pub(crate) fn parse_yield(&mut self) -> Result<Expr> {
        let location = self.location();
        let start = self.start();
        self.expect_kw("yield")?;
        if self.eat_kw("from") {
            let value = self.parse_test()?;
            return Ok(self.node(ExprKind::YieldFrom(Box::new(value)), location, start));
        }
        let value = if self.starts_expression() {
            Some(Box::new(self.parse_test_list()?))
        } else {
            None
        };
        Ok(self.node(ExprKind::Yield(value), location, start))
    }

    pub(crate) fn starts_expression(&self) -> bool {
        match self.peek_kind() {
            TokenKind::Name(_)
            | TokenKind::Int(_)
            | TokenKind::Float(_)
            | TokenKind::Str { .. } => true,
            TokenKind::Keyword(kw) => matches!(
                *kw,
                "True" | "False" | "None" | "not" | "lambda" | "await" | "yield"
            ),
            TokenKind::Op(op) => matches!(*op, "(" | "[" | "{" | "-" | "+" | "~" | "*" | "..."),
            _ => false,
        }
    }

    /// Parameter list of a `def` (annotations allowed) or a `lambda`
    pub(crate) fn parse_params(&mut self, closer: &str, annotated: bool) -> Result<Vec<Param>> {
        let mut params = Vec::new();
        let mut keyword_only = false;
        while !self.at_op(closer) {
            if self.eat_op("/") {
                if !self.eat_op(",") {
                    break;
                }
                continue;
            }
            let kind = if self.eat_op("**") {
                ParamKind::VarKeyword
            } else if self.eat_op("*") {
                if self.at_op(",") || self.at_op(closer) {
                    keyword_only = true;
                    if !self.eat_op(",") {
                        break;
                    }
                    continue;
                }
                keyword_only = true;
                ParamKind::VarPositional
            } else if keyword_only {
                ParamKind::KeywordOnly
            } else {
                ParamKind::Positional
            };

            let name = self.expect_name()?;
            let annotation = if annotated && self.eat_op(":") {
                Some(self.parse_test()?)
            } else {
                None
            };
            let default = if self.eat_op("=") {
                Some(self.parse_test()?)
            } else {
                None
            };
            params.push(Param {
                name,
                kind,
                annotation,
                default,
            });
            if !self.eat_op(",") {
                break;
            }
        }
        Ok(params)
    }
}

/// Reject assignment to things that cannot be assigned
pub(crate) fn check_assignable(target: &Expr) -> Result<()> {
    match &target.kind {
        ExprKind::Name(_) | ExprKind::Attribute { .. } | ExprKind::Subscript { .. } => Ok(()),
        ExprKind::Tuple(items) | ExprKind::List(items) => {
            items.iter().try_for_each(check_assignable)
        }
        ExprKind::Starred(inner) => check_assignable(inner),
        _ => Err(ParseError::syntax(
            "cannot assign to expression",
            target.location,
        )),
    }
}
