//! Unsupported construct detection
//!
//! Shared by the behavioral validation pass and the IR builder: a statement
//! is replaced by `Statement::Unsupported` exactly when this module reports
//! it, which keeps warnings and passthrough blocks one-to-one.
//!
//! Detection is shallow over statements and deep over expressions. A
//! compound statement is checked for its own header; the statements of its
//! blocks are checked separately by the caller.

use xnlogo_core::ast::{
    Comprehension, Constant, Expr, ExprKind, MethodDecl, Stmt, StmtKind, UnaryOperator,
};
use xnlogo_core::ir::SchedulePhase;
use xnlogo_core::{ConstructKind, SourceLocation};

/// Phase of the behavior a statement belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BehaviorContext {
    pub phase: SchedulePhase,
}

impl BehaviorContext {
    pub fn new(phase: SchedulePhase) -> Self {
        Self { phase }
    }

    /// Context without phase-dependent rules
    fn neutral() -> Self {
        Self::new(SchedulePhase::Custom)
    }
}

/// First construct without a translation, with its position
pub fn detect_unsupported(
    stmt: &Stmt,
    ctx: BehaviorContext,
) -> Option<(ConstructKind, SourceLocation)> {
    if let Some(kind) = statement_construct(stmt, ctx) {
        return Some((kind, stmt.location));
    }
    statement_expressions(stmt)
        .into_iter()
        .find_map(expression_construct)
}

fn statement_construct(stmt: &Stmt, ctx: BehaviorContext) -> Option<ConstructKind> {
    match &stmt.kind {
        StmtKind::Try { .. } => Some(ConstructKind::TryExcept),
        StmtKind::Raise { .. } => Some(ConstructKind::Raise),
        StmtKind::Assert { .. } => Some(ConstructKind::Assert),
        StmtKind::FunctionDef(def) if def.is_async => Some(ConstructKind::AsyncFunction),
        StmtKind::FunctionDef(_) => Some(ConstructKind::NestedFunction),
        StmtKind::ClassDef(_) => Some(ConstructKind::NestedClass),
        StmtKind::With { is_async: true, .. } => Some(ConstructKind::AsyncWith),
        StmtKind::With { .. } => Some(ConstructKind::With),
        StmtKind::Import(_) | StmtKind::ImportFrom { .. } => Some(ConstructKind::Import),
        StmtKind::Global(_) | StmtKind::Nonlocal(_) => Some(ConstructKind::GlobalDeclaration),
        StmtKind::Del(_) => Some(ConstructKind::Del),
        StmtKind::Break => Some(ConstructKind::Break),
        StmtKind::Continue => Some(ConstructKind::Continue),
        StmtKind::For { is_async: true, .. } => Some(ConstructKind::AsyncFor),
        StmtKind::For { orelse, .. } | StmtKind::While { orelse, .. } if !orelse.is_empty() => {
            Some(ConstructKind::LoopElse)
        }
        StmtKind::For { target, .. } if target.as_name().is_none() => {
            Some(ConstructKind::TupleAssignment)
        }
        StmtKind::For { iter, body, .. }
            if !is_range_call(iter) && body.iter().any(contains_return) =>
        {
            Some(ConstructKind::LoopBlockReturn)
        }
        StmtKind::Assign { targets, .. } if targets.len() > 1 => {
            Some(ConstructKind::MultiTargetAssignment)
        }
        StmtKind::Assign { targets, .. } if !is_simple_target(&targets[0]) => {
            Some(ConstructKind::TupleAssignment)
        }
        StmtKind::AnnAssign { target, .. } | StmtKind::AugAssign { target, .. }
            if !is_simple_target(target) =>
        {
            Some(ConstructKind::TupleAssignment)
        }
        StmtKind::Return(Some(_)) if ctx.phase.is_lifecycle() => {
            Some(ConstructKind::LifecycleReturnValue)
        }
        StmtKind::Return(None) if ctx.phase == SchedulePhase::Reporter => {
            Some(ConstructKind::ReporterBareReturn)
        }
        _ => None,
    }
}

fn is_simple_target(target: &Expr) -> bool {
    matches!(
        target.kind,
        ExprKind::Name(_) | ExprKind::Attribute { .. } | ExprKind::Subscript { .. }
    )
}

/// `range(...)` with one to three positional arguments
pub fn is_range_call(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Call {
            func,
            args,
            keywords,
        } => func.as_name() == Some("range") && (1..=3).contains(&args.len()) && keywords.is_empty(),
        _ => false,
    }
}

/// `ask` and `foreach` bodies run as blocks of their own, so an exit there
/// cannot leave the enclosing procedure
fn contains_return(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Return(_) => true,
        StmtKind::FunctionDef(_) | StmtKind::ClassDef(_) => false,
        _ => stmt
            .blocks()
            .into_iter()
            .any(|block| block.iter().any(contains_return)),
    }
}

/// Expressions owned by the statement itself, not by its blocks
fn statement_expressions(stmt: &Stmt) -> Vec<&Expr> {
    match &stmt.kind {
        StmtKind::Expr(expr) => vec![expr],
        StmtKind::Assign { targets, value } => {
            let mut exprs: Vec<&Expr> = targets.iter().collect();
            exprs.push(value);
            exprs
        }
        StmtKind::AugAssign { target, value, .. } => vec![target, value],
        StmtKind::AnnAssign { target, value, .. } => {
            let mut exprs = vec![target];
            exprs.extend(value.iter());
            exprs
        }
        StmtKind::If { test, .. } | StmtKind::While { test, .. } => vec![test],
        StmtKind::For { target, iter, .. } => vec![target, iter],
        StmtKind::Return(value) => value.iter().collect(),
        _ => Vec::new(),
    }
}

/// Pre-order search for the outermost untranslatable expression
pub fn expression_construct(expr: &Expr) -> Option<(ConstructKind, SourceLocation)> {
    let own = match &expr.kind {
        ExprKind::Lambda { .. } => Some(ConstructKind::Lambda),
        ExprKind::Yield(_) | ExprKind::YieldFrom(_) => Some(ConstructKind::Yield),
        ExprKind::Await(_) => Some(ConstructKind::Await),
        ExprKind::Dict(_) => Some(ConstructKind::DictLiteral),
        ExprKind::DictComp { .. } => Some(ConstructKind::DictComprehension),
        ExprKind::Set(_) => Some(ConstructKind::SetLiteral),
        ExprKind::SetComp { .. } => Some(ConstructKind::SetComprehension),
        ExprKind::GeneratorExp { .. } => Some(ConstructKind::GeneratorExpression),
        ExprKind::ListComp {
            element,
            generators,
        } if filter_shape(element, generators).is_none() => {
            Some(ConstructKind::ComplexComprehension)
        }
        ExprKind::FString(_) => Some(ConstructKind::FString),
        ExprKind::Starred(_) => Some(ConstructKind::Starred),
        ExprKind::NamedExpr { .. } => Some(ConstructKind::Walrus),
        ExprKind::BinOp { op, .. } if op.is_bitwise() => Some(ConstructKind::BitwiseOperator),
        ExprKind::UnaryOp {
            op: UnaryOperator::Invert,
            ..
        } => Some(ConstructKind::BitwiseOperator),
        ExprKind::Slice { step: Some(_), .. } => Some(ConstructKind::SliceStep),
        ExprKind::Call { keywords, .. } if keywords.iter().any(|k| k.arg.is_none()) => {
            Some(ConstructKind::Starred)
        }
        _ => None,
    };
    if let Some(kind) = own {
        return Some((kind, expr.location));
    }
    children(expr).into_iter().find_map(expression_construct)
}

/// A list comprehension that is an agentset filter:
/// `[t for t in source]` or `[t for t in source if cond]`
pub fn filter_shape<'a>(
    element: &Expr,
    generators: &'a [Comprehension],
) -> Option<&'a Comprehension> {
    let [clause] = generators else {
        return None;
    };
    let variable = clause.target.as_name()?;
    if clause.is_async || element.as_name() != Some(variable) || clause.conditions.len() > 1 {
        return None;
    }
    Some(clause)
}

/// Direct sub-expressions in evaluation order
pub fn children(expr: &Expr) -> Vec<&Expr> {
    match &expr.kind {
        ExprKind::Constant(_) | ExprKind::Name(_) | ExprKind::FString(_) => Vec::new(),
        ExprKind::Attribute { value, .. } => vec![value.as_ref()],
        ExprKind::BinOp { left, right, .. } => vec![left.as_ref(), right.as_ref()],
        ExprKind::UnaryOp { operand, .. } => vec![operand.as_ref()],
        ExprKind::BoolOp { values, .. } => values.iter().collect(),
        ExprKind::Compare { left, comparisons } => {
            let mut exprs = vec![left.as_ref()];
            exprs.extend(comparisons.iter().map(|(_, e)| e));
            exprs
        }
        ExprKind::Call {
            func,
            args,
            keywords,
        } => {
            let mut exprs = vec![func.as_ref()];
            exprs.extend(args.iter());
            exprs.extend(keywords.iter().map(|k| &k.value));
            exprs
        }
        ExprKind::Subscript { value, index } => vec![value.as_ref(), index.as_ref()],
        ExprKind::Slice { lower, upper, step } => lower
            .iter()
            .chain(upper.iter())
            .chain(step.iter())
            .map(|e| e.as_ref())
            .collect(),
        ExprKind::List(items) | ExprKind::Tuple(items) | ExprKind::Set(items) => {
            items.iter().collect()
        }
        ExprKind::Dict(entries) => entries
            .iter()
            .flat_map(|(k, v)| k.iter().chain(std::iter::once(v)))
            .collect(),
        ExprKind::IfExp { test, body, orelse } => {
            vec![test.as_ref(), body.as_ref(), orelse.as_ref()]
        }
        ExprKind::Lambda { body, .. } => vec![body.as_ref()],
        ExprKind::ListComp {
            element,
            generators,
        }
        | ExprKind::SetComp {
            element,
            generators,
        }
        | ExprKind::GeneratorExp {
            element,
            generators,
        } => {
            let mut exprs = comprehension_children(generators);
            exprs.push(element.as_ref());
            exprs
        }
        ExprKind::DictComp {
            key,
            value,
            generators,
        } => {
            let mut exprs = comprehension_children(generators);
            exprs.push(key.as_ref());
            exprs.push(value.as_ref());
            exprs
        }
        ExprKind::Await(inner) | ExprKind::YieldFrom(inner) | ExprKind::Starred(inner) => {
            vec![inner.as_ref()]
        }
        ExprKind::Yield(inner) => inner.iter().map(|e| e.as_ref()).collect(),
        ExprKind::NamedExpr { value, .. } => vec![value.as_ref()],
    }
}

fn comprehension_children(generators: &[Comprehension]) -> Vec<&Expr> {
    generators
        .iter()
        .flat_map(|g| {
            std::iter::once(&g.iter)
                .chain(std::iter::once(&g.target))
                .chain(g.conditions.iter())
        })
        .collect()
}

/// True when `name` is read anywhere in the statements, blocks included
pub fn reads_name(stmts: &[Stmt], name: &str) -> bool {
    stmts.iter().any(|stmt| {
        statement_expressions(stmt)
            .into_iter()
            .any(|expr| expr_mentions(expr, name))
            || stmt.blocks().into_iter().any(|block| reads_name(block, name))
    })
}

fn expr_mentions(expr: &Expr, name: &str) -> bool {
    expr.as_name() == Some(name) || children(expr).into_iter().any(|e| expr_mentions(e, name))
}

/// Docstrings, `pass` and `...` carry no behavior
pub fn is_inert(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Pass => true,
        StmtKind::Expr(expr) => matches!(
            expr.kind,
            ExprKind::Constant(Constant::Str(_)) | ExprKind::Constant(Constant::Ellipsis)
        ),
        _ => false,
    }
}

/// Schedule phase of a method: reserved names first, then whether a
/// translatable `return value` appears in its body
pub fn behavior_phase(method: &MethodDecl) -> SchedulePhase {
    let body: Vec<&Stmt> = method.body.iter().map(|s| &s.node).collect();
    SchedulePhase::classify(&method.name, body.into_iter().any(returns_value))
}

fn returns_value(stmt: &Stmt) -> bool {
    if detect_unsupported(stmt, BehaviorContext::neutral()).is_some() {
        return false;
    }
    match &stmt.kind {
        StmtKind::Return(value) => value.is_some(),
        StmtKind::If { body, orelse, .. } => body.iter().chain(orelse.iter()).any(returns_value),
        StmtKind::For { body, .. } | StmtKind::While { body, .. } => {
            body.iter().any(returns_value)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xnlogo_parser::parse_module;

    fn detect(source: &str, phase: SchedulePhase) -> Option<ConstructKind> {
        let stmts = parse_module(source).unwrap();
        detect_unsupported(&stmts[0], BehaviorContext::new(phase)).map(|(kind, _)| kind)
    }

    fn custom(source: &str) -> Option<ConstructKind> {
        detect(source, SchedulePhase::Custom)
    }

    #[test]
    fn test_supported_statements() {
        assert_eq!(custom("self.x = self.x + 1"), None);
        assert_eq!(custom("for t in turtles:\n    t.x = 1"), None);
        assert_eq!(custom("if a:\n    pass\nelif b:\n    pass"), None);
        assert_eq!(custom("x = [t for t in agents if t.energy > 0]"), None);
        assert_eq!(custom("y = a if c else b"), None);
        assert_eq!(custom("return 1"), None);
    }

    #[test]
    fn test_statement_constructs() {
        assert_eq!(custom("try:\n    x()\nexcept E:\n    pass"), Some(ConstructKind::TryExcept));
        assert_eq!(custom("with open(p) as f:\n    pass"), Some(ConstructKind::With));
        assert_eq!(custom("import os"), Some(ConstructKind::Import));
        assert_eq!(custom("a = b = 1"), Some(ConstructKind::MultiTargetAssignment));
        assert_eq!(custom("a, b = 1, 2"), Some(ConstructKind::TupleAssignment));
        assert_eq!(custom("break"), Some(ConstructKind::Break));
        assert_eq!(custom("while x:\n    pass\nelse:\n    pass"), Some(ConstructKind::LoopElse));
        assert_eq!(custom("def inner():\n    pass"), Some(ConstructKind::NestedFunction));
        assert_eq!(custom("class Inner:\n    pass"), Some(ConstructKind::NestedClass));
    }

    #[test]
    fn test_expression_constructs() {
        assert_eq!(custom("f = lambda x: x"), Some(ConstructKind::Lambda));
        assert_eq!(custom("d = {'a': 1}"), Some(ConstructKind::DictLiteral));
        assert_eq!(custom("s = {1, 2}"), Some(ConstructKind::SetLiteral));
        assert_eq!(custom("n = sum(x for x in xs)"), Some(ConstructKind::GeneratorExpression));
        assert_eq!(custom("v = [a.x for a in agents]"), Some(ConstructKind::ComplexComprehension));
        assert_eq!(custom("m = f'{x}'"), Some(ConstructKind::FString));
        assert_eq!(custom("f(*args)"), Some(ConstructKind::Starred));
        assert_eq!(custom("m = a & b"), Some(ConstructKind::BitwiseOperator));
        assert_eq!(custom("m = xs[::2]"), Some(ConstructKind::SliceStep));
    }

    #[test]
    fn test_outermost_expression_wins() {
        let (kind, location) =
            detect_unsupported(&parse_module("x = f(lambda: {1: 2})").unwrap()[0], BehaviorContext::new(SchedulePhase::Custom))
                .unwrap();
        assert_eq!(kind, ConstructKind::Lambda);
        assert_eq!(location, SourceLocation::new(1, 7));
    }

    #[test]
    fn test_phase_dependent_returns() {
        assert_eq!(detect("return 1", SchedulePhase::Setup), Some(ConstructKind::LifecycleReturnValue));
        assert_eq!(detect("return 1", SchedulePhase::Step), Some(ConstructKind::LifecycleReturnValue));
        assert_eq!(detect("return", SchedulePhase::Reporter), Some(ConstructKind::ReporterBareReturn));
        assert_eq!(detect("return", SchedulePhase::Custom), None);
    }

    #[test]
    fn test_return_inside_block_loop() {
        assert_eq!(
            custom("for t in self.neighbors:\n    if t.energy > 5:\n        return t"),
            Some(ConstructKind::LoopBlockReturn)
        );
        assert_eq!(
            custom("for x in [1, 2, 3]:\n    while x:\n        return"),
            Some(ConstructKind::LoopBlockReturn)
        );
        // `repeat` does not start a block of its own
        assert_eq!(custom("for _ in range(3):\n    if done:\n        return"), None);
        assert_eq!(custom("for t in turtles:\n    def f():\n        return 1"), None);
    }

    #[test]
    fn test_nested_blocks_are_not_inspected() {
        // The inner `try` is reported on its own, not through the `if`
        assert_eq!(custom("if x:\n    try:\n        y()\n    finally:\n        pass"), None);
    }

    #[test]
    fn test_reads_name() {
        let stmts = parse_module("total = 0\nif i > 2:\n    total += i").unwrap();
        assert!(reads_name(&stmts, "i"));
        assert!(!reads_name(&stmts, "j"));
    }
}
