//! Statement grammar

use super::expression::check_assignable;
use super::Parser;
use crate::error::{ParseError, Result};
use crate::lexer::TokenKind;
use xnlogo_core::ast::{
    Alias, BinaryOperator, ClassDef, ExceptHandler, Expr, ExprKind, FunctionDef, Stmt, StmtKind,
    WithItem,
};

const AUGMENTED: &[(&str, BinaryOperator)] = &[
    ("+=", BinaryOperator::Add),
    ("-=", BinaryOperator::Sub),
    ("*=", BinaryOperator::Mul),
    ("/=", BinaryOperator::Div),
    ("//=", BinaryOperator::FloorDiv),
    ("%=", BinaryOperator::Mod),
    ("**=", BinaryOperator::Pow),
    ("@=", BinaryOperator::MatMul),
    ("&=", BinaryOperator::BitAnd),
    ("|=", BinaryOperator::BitOr),
    ("^=", BinaryOperator::BitXor),
    ("<<=", BinaryOperator::LShift),
    (">>=", BinaryOperator::RShift),
];

impl Parser {
    /// One logical line or one compound statement
    pub(crate) fn parse_statement(&mut self) -> Result<Vec<Stmt>> {
        let keyword = match self.peek_kind() {
            TokenKind::Indent => return Err(self.unexpected("a statement")),
            TokenKind::Op("@") => return Ok(vec![self.parse_decorated()?]),
            TokenKind::Keyword(kw) => *kw,
            _ => return self.parse_simple_statements(),
        };
        let stmt = match keyword {
            "if" => self.parse_if()?,
            "while" => self.parse_while()?,
            "for" => self.parse_for(false)?,
            "try" => self.parse_try()?,
            "with" => self.parse_with(false)?,
            "def" => self.parse_def(Vec::new(), None)?,
            "class" => self.parse_class(Vec::new(), None)?,
            "async" => self.parse_async(Vec::new(), None)?,
            _ => return self.parse_simple_statements(),
        };
        Ok(vec![stmt])
    }

    /// Indented block, or simple statements on the header line
    fn parse_suite(&mut self) -> Result<Vec<Stmt>> {
        if !matches!(self.peek_kind(), TokenKind::Newline) {
            return self.parse_simple_statements();
        }
        self.advance();
        if !matches!(self.peek_kind(), TokenKind::Indent) {
            return Err(self.unexpected("an indented block"));
        }
        self.advance();

        let mut body = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::Dedent => {
                    self.advance();
                    break;
                }
                TokenKind::EndOfFile => break,
                TokenKind::Newline => {
                    self.advance();
                }
                _ => body.extend(self.parse_statement()?),
            }
        }
        Ok(body)
    }

    fn parse_block_after_colon(&mut self) -> Result<Vec<Stmt>> {
        self.expect_op(":")?;
        self.parse_suite()
    }

    // =========================================================================
    // Compound statements
    // =========================================================================

    fn parse_if(&mut self) -> Result<Stmt> {
        let location = self.location();
        let start = self.start();
        self.advance(); // `if` or `elif`
        let test = self.parse_named_test()?;
        let body = self.parse_block_after_colon()?;
        let orelse = if self.at_kw("elif") {
            vec![self.parse_if()?]
        } else if self.eat_kw("else") {
            self.parse_block_after_colon()?
        } else {
            Vec::new()
        };
        Ok(Stmt::new(
            StmtKind::If { test, body, orelse },
            location,
            self.span_from(start),
        ))
    }

    fn parse_while(&mut self) -> Result<Stmt> {
        let location = self.location();
        let start = self.start();
        self.expect_kw("while")?;
        let test = self.parse_named_test()?;
        let body = self.parse_block_after_colon()?;
        let orelse = self.parse_else_block()?;
        Ok(Stmt::new(
            StmtKind::While { test, body, orelse },
            location,
            self.span_from(start),
        ))
    }

    fn parse_for(&mut self, is_async: bool) -> Result<Stmt> {
        let location = self.location();
        let start = self.start();
        self.expect_kw("for")?;
        let target = self.parse_target_list()?;
        check_assignable(&target)?;
        self.expect_kw("in")?;
        let iter = self.parse_test_list()?;
        let body = self.parse_block_after_colon()?;
        let orelse = self.parse_else_block()?;
        Ok(Stmt::new(
            StmtKind::For {
                target,
                iter,
                body,
                orelse,
                is_async,
            },
            location,
            self.span_from(start),
        ))
    }

    fn parse_else_block(&mut self) -> Result<Vec<Stmt>> {
        if self.eat_kw("else") {
            self.parse_block_after_colon()
        } else {
            Ok(Vec::new())
        }
    }

    fn parse_try(&mut self) -> Result<Stmt> {
        let location = self.location();
        let start = self.start();
        self.expect_kw("try")?;
        let body = self.parse_block_after_colon()?;

        let mut handlers = Vec::new();
        while self.eat_kw("except") {
            self.eat_op("*");
            let exc_type = if self.at_op(":") {
                None
            } else {
                Some(self.parse_test()?)
            };
            let name = if self.eat_kw("as") {
                Some(self.expect_name()?)
            } else {
                None
            };
            let body = self.parse_block_after_colon()?;
            handlers.push(ExceptHandler {
                exc_type,
                name,
                body,
            });
        }
        let orelse = self.parse_else_block()?;
        let finalbody = if self.eat_kw("finally") {
            self.parse_block_after_colon()?
        } else {
            Vec::new()
        };
        if handlers.is_empty() && finalbody.is_empty() {
            return Err(self.unexpected("'except' or 'finally'"));
        }

        Ok(Stmt::new(
            StmtKind::Try {
                body,
                handlers,
                orelse,
                finalbody,
            },
            location,
            self.span_from(start),
        ))
    }

    fn parse_with(&mut self, is_async: bool) -> Result<Stmt> {
        let location = self.location();
        let start = self.start();
        self.expect_kw("with")?;
        let parenthesized = self.at_op("(") && self.with_items_parenthesized();
        if parenthesized {
            self.advance();
        }
        let mut items = Vec::new();
        loop {
            if parenthesized && self.at_op(")") {
                break;
            }
            let context = self.parse_test()?;
            let target = if self.eat_kw("as") {
                let target = self.parse_target_list()?;
                check_assignable(&target)?;
                Some(target)
            } else {
                None
            };
            items.push(WithItem { context, target });
            if !self.eat_op(",") {
                break;
            }
        }
        if parenthesized {
            self.expect_op(")")?;
        }
        let body = self.parse_block_after_colon()?;
        Ok(Stmt::new(
            StmtKind::With {
                items,
                body,
                is_async,
            },
            location,
            self.span_from(start),
        ))
    }

    /// `with (a as x, b):` rather than `with (a):`
    fn with_items_parenthesized(&self) -> bool {
        let mut depth = 0usize;
        let mut index = 0;
        loop {
            match self.peek_nth_kind(index) {
                TokenKind::Op("(") | TokenKind::Op("[") | TokenKind::Op("{") => depth += 1,
                TokenKind::Op(")") | TokenKind::Op("]") | TokenKind::Op("}") => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return matches!(self.peek_nth_kind(index + 1), TokenKind::Op(":"));
                    }
                }
                TokenKind::Keyword("as") if depth == 1 => return true,
                TokenKind::Newline | TokenKind::EndOfFile => return false,
                _ => {}
            }
            index += 1;
        }
    }

    fn parse_decorated(&mut self) -> Result<Stmt> {
        let start = self.start();
        let mut decorators = Vec::new();
        while self.eat_op("@") {
            decorators.push(self.parse_named_test()?);
            self.expect_newline()?;
        }
        match self.peek_kind() {
            TokenKind::Keyword("def") => self.parse_def(decorators, Some(start)),
            TokenKind::Keyword("class") => self.parse_class(decorators, Some(start)),
            TokenKind::Keyword("async") => self.parse_async(decorators, Some(start)),
            _ => Err(self.unexpected("'def' or 'class' after decorator")),
        }
    }

    fn parse_async(&mut self, decorators: Vec<Expr>, start: Option<usize>) -> Result<Stmt> {
        let location = self.location();
        let span_start = start.unwrap_or_else(|| self.start());
        self.expect_kw("async")?;
        let mut stmt = match self.peek_kind() {
            TokenKind::Keyword("def") => {
                let mut stmt = self.parse_def(decorators, Some(span_start))?;
                if let StmtKind::FunctionDef(def) = &mut stmt.kind {
                    def.is_async = true;
                }
                stmt
            }
            TokenKind::Keyword("for") if decorators.is_empty() => self.parse_for(true)?,
            TokenKind::Keyword("with") if decorators.is_empty() => self.parse_with(true)?,
            _ => return Err(self.unexpected("'def', 'for' or 'with' after 'async'")),
        };
        stmt.location = location;
        stmt.span = self.span_from(span_start);
        Ok(stmt)
    }

    fn parse_def(&mut self, decorators: Vec<Expr>, start: Option<usize>) -> Result<Stmt> {
        let location = self.location();
        let span_start = start.unwrap_or_else(|| self.start());
        self.expect_kw("def")?;
        let name = self.expect_name()?;
        self.expect_op("(")?;
        let params = self.parse_params(")", true)?;
        self.expect_op(")")?;
        let returns = if self.eat_op("->") {
            Some(self.parse_test()?)
        } else {
            None
        };
        let body = self.parse_block_after_colon()?;
        Ok(Stmt::new(
            StmtKind::FunctionDef(FunctionDef {
                name,
                params,
                body,
                decorators,
                returns,
                is_async: false,
            }),
            location,
            self.span_from(span_start),
        ))
    }

    fn parse_class(&mut self, decorators: Vec<Expr>, start: Option<usize>) -> Result<Stmt> {
        let location = self.location();
        let span_start = start.unwrap_or_else(|| self.start());
        self.expect_kw("class")?;
        let name = self.expect_name()?;
        let mut bases = Vec::new();
        if self.eat_op("(") {
            while !self.at_op(")") {
                // Keyword arguments such as `metaclass=` are parsed and dropped
                if matches!(self.peek_kind(), TokenKind::Name(_))
                    && matches!(self.peek_nth_kind(1), TokenKind::Op("="))
                {
                    self.advance();
                    self.advance();
                    self.parse_test()?;
                } else {
                    bases.push(self.parse_test()?);
                }
                if !self.eat_op(",") {
                    break;
                }
            }
            self.expect_op(")")?;
        }
        let body = self.parse_block_after_colon()?;
        Ok(Stmt::new(
            StmtKind::ClassDef(ClassDef {
                name,
                bases,
                body,
                decorators,
            }),
            location,
            self.span_from(span_start),
        ))
    }

    // =========================================================================
    // Simple statements
    // =========================================================================

    fn parse_simple_statements(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        loop {
            let location = self.location();
            let start = self.start();
            let kind = self.parse_small_statement()?;
            stmts.push(Stmt::new(kind, location, self.span_from(start)));
            if !self.eat_op(";") {
                break;
            }
            if matches!(self.peek_kind(), TokenKind::Newline | TokenKind::EndOfFile) {
                break;
            }
        }
        self.expect_newline()?;
        Ok(stmts)
    }

    fn parse_small_statement(&mut self) -> Result<StmtKind> {
        let keyword = match self.peek_kind() {
            TokenKind::Keyword(kw) => Some(*kw),
            _ => None,
        };
        match keyword {
            Some("pass") => {
                self.advance();
                Ok(StmtKind::Pass)
            }
            Some("break") => {
                self.advance();
                Ok(StmtKind::Break)
            }
            Some("continue") => {
                self.advance();
                Ok(StmtKind::Continue)
            }
            Some("return") => {
                self.advance();
                let value = if self.starts_expression() {
                    Some(self.parse_test_list()?)
                } else {
                    None
                };
                Ok(StmtKind::Return(value))
            }
            Some("raise") => {
                self.advance();
                let exc = if self.starts_expression() {
                    Some(self.parse_test()?)
                } else {
                    None
                };
                let cause = if exc.is_some() && self.eat_kw("from") {
                    Some(self.parse_test()?)
                } else {
                    None
                };
                Ok(StmtKind::Raise { exc, cause })
            }
            Some("global") => {
                self.advance();
                Ok(StmtKind::Global(self.parse_name_list()?))
            }
            Some("nonlocal") => {
                self.advance();
                Ok(StmtKind::Nonlocal(self.parse_name_list()?))
            }
            Some("del") => {
                self.advance();
                let mut targets = vec![self.parse_bitor()?];
                while self.eat_op(",") {
                    if !self.starts_expression() {
                        break;
                    }
                    targets.push(self.parse_bitor()?);
                }
                Ok(StmtKind::Del(targets))
            }
            Some("assert") => {
                self.advance();
                let test = self.parse_test()?;
                let msg = if self.eat_op(",") {
                    Some(self.parse_test()?)
                } else {
                    None
                };
                Ok(StmtKind::Assert { test, msg })
            }
            Some("import") => {
                self.advance();
                let mut names = vec![self.parse_dotted_alias()?];
                while self.eat_op(",") {
                    names.push(self.parse_dotted_alias()?);
                }
                Ok(StmtKind::Import(names))
            }
            Some("from") => self.parse_from_import(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_name_list(&mut self) -> Result<Vec<String>> {
        let mut names = vec![self.expect_name()?];
        while self.eat_op(",") {
            names.push(self.expect_name()?);
        }
        Ok(names)
    }

    fn parse_dotted_name(&mut self) -> Result<String> {
        let mut name = self.expect_name()?;
        while self.eat_op(".") {
            name.push('.');
            name.push_str(&self.expect_name()?);
        }
        Ok(name)
    }

    fn parse_dotted_alias(&mut self) -> Result<Alias> {
        let name = self.parse_dotted_name()?;
        let asname = if self.eat_kw("as") {
            Some(self.expect_name()?)
        } else {
            None
        };
        Ok(Alias { name, asname })
    }

    fn parse_from_import(&mut self) -> Result<StmtKind> {
        self.expect_kw("from")?;
        let mut level = 0;
        loop {
            if self.eat_op(".") {
                level += 1;
            } else if self.eat_op("...") {
                level += 3;
            } else {
                break;
            }
        }
        let module = if matches!(self.peek_kind(), TokenKind::Name(_)) {
            Some(self.parse_dotted_name()?)
        } else if level == 0 {
            return Err(self.unexpected("a module name"));
        } else {
            None
        };
        self.expect_kw("import")?;

        let mut names = Vec::new();
        if self.eat_op("*") {
            names.push(Alias {
                name: "*".to_string(),
                asname: None,
            });
        } else {
            let parenthesized = self.eat_op("(");
            loop {
                let name = self.expect_name()?;
                let asname = if self.eat_kw("as") {
                    Some(self.expect_name()?)
                } else {
                    None
                };
                names.push(Alias { name, asname });
                if !self.eat_op(",") {
                    break;
                }
                if parenthesized && self.at_op(")") {
                    break;
                }
            }
            if parenthesized {
                self.expect_op(")")?;
            }
        }
        Ok(StmtKind::ImportFrom {
            module,
            names,
            level,
        })
    }

    /// Expression, assignment, augmented assignment or annotation
    fn parse_expression_statement(&mut self) -> Result<StmtKind> {
        let first = self.parse_assignment_value()?;

        if self.eat_op(":") {
            if !matches!(
                first.kind,
                ExprKind::Name(_) | ExprKind::Attribute { .. } | ExprKind::Subscript { .. }
            ) {
                return Err(ParseError::syntax(
                    "only single target can be annotated",
                    first.location,
                ));
            }
            let annotation = self.parse_test()?;
            let value = if self.eat_op("=") {
                Some(self.parse_assignment_value()?)
            } else {
                None
            };
            return Ok(StmtKind::AnnAssign {
                target: first,
                annotation,
                value,
            });
        }

        let augmented = AUGMENTED
            .iter()
            .find(|(symbol, _)| self.at_op(symbol))
            .map(|(_, op)| *op);
        if let Some(op) = augmented {
            if !matches!(
                first.kind,
                ExprKind::Name(_) | ExprKind::Attribute { .. } | ExprKind::Subscript { .. }
            ) {
                return Err(ParseError::syntax(
                    "illegal target for augmented assignment",
                    first.location,
                ));
            }
            self.advance();
            let value = self.parse_assignment_value()?;
            return Ok(StmtKind::AugAssign {
                target: first,
                op,
                value,
            });
        }

        if !self.at_op("=") {
            return Ok(StmtKind::Expr(first));
        }

        let mut targets = vec![first];
        let mut value = None;
        while self.eat_op("=") {
            let next = self.parse_assignment_value()?;
            if let Some(previous) = value.replace(next) {
                targets.push(previous);
            }
        }
        for target in &targets {
            check_assignable(target)?;
        }
        let value = match value {
            Some(value) => value,
            None => return Err(self.unexpected("an expression")),
        };
        Ok(StmtKind::Assign { targets, value })
    }

    fn parse_assignment_value(&mut self) -> Result<Expr> {
        if self.at_kw("yield") {
            self.parse_yield()
        } else {
            self.parse_test_list()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_module;
    use xnlogo_core::ast::*;
    use xnlogo_core::{SourceLocation, Span};

    fn first(source: &str) -> Stmt {
        parse_module(source).unwrap().remove(0)
    }

    // =========================================================================
    // Simple statements
    // =========================================================================

    #[test]
    fn test_augmented_assignment() {
        match first("self.energy -= 1").kind {
            StmtKind::AugAssign { target, op, .. } => {
                assert_eq!(op, BinaryOperator::Sub);
                assert_eq!(target.dotted_name(), Some("self.energy".to_string()));
            }
            other => panic!("Expected AugAssign, got {:?}", other),
        }
    }

    #[test]
    fn test_annotated_assignment() {
        match first("count: int = 0").kind {
            StmtKind::AnnAssign {
                target,
                annotation,
                value,
            } => {
                assert_eq!(target.as_name(), Some("count"));
                assert_eq!(annotation.as_name(), Some("int"));
                assert!(value.is_some());
            }
            other => panic!("Expected AnnAssign, got {:?}", other),
        }
    }

    #[test]
    fn test_chained_and_tuple_assignment() {
        match first("a = b = 1").kind {
            StmtKind::Assign { targets, .. } => assert_eq!(targets.len(), 2),
            other => panic!("Expected Assign, got {:?}", other),
        }
        match first("x, y = 1, 2").kind {
            StmtKind::Assign { targets, value } => {
                assert!(matches!(targets[0].kind, ExprKind::Tuple(_)));
                assert!(matches!(value.kind, ExprKind::Tuple(_)));
            }
            other => panic!("Expected Assign, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_assignment_target() {
        let err = parse_module("f() = 1").unwrap_err();
        assert_eq!(err.location(), SourceLocation::new(1, 1));
    }

    #[test]
    fn test_imports() {
        match first("from mesa import Agent, Model as M").kind {
            StmtKind::ImportFrom { module, names, level } => {
                assert_eq!(module.as_deref(), Some("mesa"));
                assert_eq!(names.len(), 2);
                assert_eq!(names[1].asname.as_deref(), Some("M"));
                assert_eq!(level, 0);
            }
            other => panic!("Expected ImportFrom, got {:?}", other),
        }
        assert!(matches!(first("import a.b as c").kind, StmtKind::Import(ref v) if v[0].name == "a.b"));
    }

    #[test]
    fn test_return_forms() {
        assert_eq!(first("return").kind, StmtKind::Return(None));
        assert!(matches!(first("return 1, 2").kind, StmtKind::Return(Some(_))));
    }

    // =========================================================================
    // Compound statements
    // =========================================================================

    #[test]
    fn test_elif_nests_if() {
        let source = "if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n";
        match first(source).kind {
            StmtKind::If { orelse, .. } => {
                assert_eq!(orelse.len(), 1);
                match &orelse[0].kind {
                    StmtKind::If { orelse, .. } => assert_eq!(orelse.len(), 1),
                    other => panic!("Expected nested If, got {:?}", other),
                }
                assert_eq!(orelse[0].location, SourceLocation::new(3, 1));
            }
            other => panic!("Expected If, got {:?}", other),
        }
    }

    #[test]
    fn test_for_with_else() {
        match first("for i in range(3):\n    pass\nelse:\n    pass\n").kind {
            StmtKind::For { target, orelse, .. } => {
                assert_eq!(target.as_name(), Some("i"));
                assert_eq!(orelse.len(), 1);
            }
            other => panic!("Expected For, got {:?}", other),
        }
    }

    #[test]
    fn test_try_except_finally() {
        let source = "try:\n    x()\nexcept ValueError as e:\n    pass\nfinally:\n    y()\n";
        match first(source).kind {
            StmtKind::Try {
                handlers,
                finalbody,
                ..
            } => {
                assert_eq!(handlers[0].name.as_deref(), Some("e"));
                assert_eq!(finalbody.len(), 1);
            }
            other => panic!("Expected Try, got {:?}", other),
        }
    }

    #[test]
    fn test_decorated_class_span_starts_at_decorator() {
        let source = "@agent(breed=\"sheep\")\nclass Sheep:\n    energy: int = 10\n";
        let stmt = first(source);
        assert_eq!(stmt.location, SourceLocation::new(2, 1));
        assert_eq!(stmt.span, Span::new(0, source.trim_end().len()));
        match stmt.kind {
            StmtKind::ClassDef(def) => {
                assert_eq!(def.name, "Sheep");
                assert_eq!(def.decorators.len(), 1);
                assert_eq!(def.body.len(), 1);
            }
            other => panic!("Expected ClassDef, got {:?}", other),
        }
    }

    #[test]
    fn test_method_signature() {
        let source = "def move(self, dx: int, *args, scale=1.0, **kw) -> None:\n    pass\n";
        match first(source).kind {
            StmtKind::FunctionDef(def) => {
                let kinds: Vec<_> = def.params.iter().map(|p| p.kind).collect();
                assert_eq!(
                    kinds,
                    vec![
                        ParamKind::Positional,
                        ParamKind::Positional,
                        ParamKind::VarPositional,
                        ParamKind::KeywordOnly,
                        ParamKind::VarKeyword
                    ]
                );
                assert!(def.params[1].annotation.is_some());
                assert!(def.returns.is_some());
            }
            other => panic!("Expected FunctionDef, got {:?}", other),
        }
    }

    #[test]
    fn test_async_def_and_with() {
        match first("async def f():\n    pass\n").kind {
            StmtKind::FunctionDef(def) => assert!(def.is_async),
            other => panic!("Expected FunctionDef, got {:?}", other),
        }
        match first("with open(p) as f, lock:\n    pass\n").kind {
            StmtKind::With { items, is_async, .. } => {
                assert_eq!(items.len(), 2);
                assert!(!is_async);
            }
            other => panic!("Expected With, got {:?}", other),
        }
    }

    #[test]
    fn test_single_line_suite() {
        match first("if x: y = 1; z = 2\n").kind {
            StmtKind::If { body, .. } => assert_eq!(body.len(), 2),
            other => panic!("Expected If, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_indented_block() {
        let err = parse_module("def f():\nreturn 1\n").unwrap_err();
        assert_eq!(err.location(), SourceLocation::new(2, 1));
    }
}
