//! Statement translator
//!
//! Lowers each behavior's IR statements into NetLogo procedure body lines.
//! Lines are emitted unindented; the assembler re-indents them from their
//! bracket structure.

use super::expression::{AgentContext, ExpressionTranslator};
use crate::error::{CompileError, Result};
use std::collections::HashSet;
use xnlogo_core::ast::{BinaryOperator, UnaryOperator};
use xnlogo_core::ir::{
    kebab_case, AgentSpec, Behavior, Expression, IterableKind, Literal, ModelSpec, Number,
    SchedulePhase, Statement, SubscriptIndex,
};

/// One behavior rendered as a procedure body
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedBehavior {
    /// Identifier of the owning agent; `None` for model-level behaviors
    pub owner: Option<String>,
    pub name: String,
    pub procedure: String,
    pub params: Vec<String>,
    pub phase: SchedulePhase,
    pub lines: Vec<String>,
}

impl TranslatedBehavior {
    pub fn is_reporter(&self) -> bool {
        self.phase == SchedulePhase::Reporter
    }

    /// Whether the body can leave the procedure before its last line
    pub fn exits_early(&self) -> bool {
        self.lines.iter().any(|line| line.trim() == "stop")
    }
}

/// List methods that rebind their receiver
const MUTATORS: &[&str] = &["append", "extend", "remove", "insert", "clear"];

/// Translate every behavior of the model, agents first in declaration order
pub fn translate_model(model: &ModelSpec) -> Result<Vec<TranslatedBehavior>> {
    let mut translated = Vec::new();

    for agent in &model.agents {
        for behavior in &agent.behaviors {
            let lines = StatementTranslator::new(model, Some(agent), behavior).translate()?;
            translated.push(TranslatedBehavior {
                owner: Some(agent.identifier.clone()),
                name: behavior.name.clone(),
                procedure: agent.procedure_name(&behavior.name),
                params: behavior.params.clone(),
                phase: behavior.schedule_phase,
                lines,
            });
        }
    }

    for behavior in model.behaviors.iter().chain(model.reporters.iter()) {
        let lines = StatementTranslator::new(model, None, behavior).translate()?;
        // `setup` and `go` are taken by the generated entry points
        let procedure = if behavior.schedule_phase.is_lifecycle() {
            format!("model-{}", kebab_case(&behavior.name))
        } else {
            kebab_case(&behavior.name)
        };
        translated.push(TranslatedBehavior {
            owner: None,
            name: behavior.name.clone(),
            procedure,
            params: behavior.params.clone(),
            phase: behavior.schedule_phase,
            lines,
        });
    }

    log::debug!("translated {} behaviors", translated.len());
    Ok(translated)
}

/// Translator for the body of one behavior
pub struct StatementTranslator<'m> {
    expressions: ExpressionTranslator<'m>,
    behavior: &'m Behavior,
    /// Variables owned by agents, patches or the observer
    known: HashSet<String>,
}

impl<'m> StatementTranslator<'m> {
    pub fn new(model: &'m ModelSpec, owner: Option<&'m AgentSpec>, behavior: &'m Behavior) -> Self {
        let mut known: HashSet<String> = model.globals.iter().map(|g| g.name.clone()).collect();
        known.extend(model.patches.state_fields.iter().map(|f| f.name.clone()));
        if let Some(agent) = owner {
            known.extend(agent.state_fields.iter().map(|f| f.name.clone()));
        }

        Self {
            expressions: ExpressionTranslator::new(model, owner),
            behavior,
            known,
        }
    }

    /// Body lines of the procedure
    pub fn translate(&self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        let mut scope: HashSet<String> = self.behavior.params.iter().cloned().collect();

        // Locals read outside the block that first assigns them are
        // declared up front
        for name in hoisted_locals(&self.behavior.statements, &self.known, &scope) {
            lines.push(format!("let {} 0", name));
            scope.insert(name);
        }

        let ctx = AgentContext::default();
        for stmt in &self.behavior.statements {
            self.translate_statement(stmt, &mut scope, &ctx, &mut lines)?;
        }
        Ok(lines)
    }

    fn translate_block(
        &self,
        stmts: &[Statement],
        scope: &HashSet<String>,
        ctx: &AgentContext,
        lines: &mut Vec<String>,
    ) -> Result<()> {
        let mut inner = scope.clone();
        for stmt in stmts {
            self.translate_statement(stmt, &mut inner, ctx, lines)?;
        }
        Ok(())
    }

    fn translate_statement(
        &self,
        stmt: &Statement,
        scope: &mut HashSet<String>,
        ctx: &AgentContext,
        lines: &mut Vec<String>,
    ) -> Result<()> {
        match stmt {
            Statement::Assign { target, value } => {
                lines.push(self.assign(target, value, false, scope, ctx));
            }

            Statement::AugmentedAssign { target, op, value } => {
                let combined = Expression::binary(*op, target.clone(), value.clone());
                lines.push(self.assign(target, &combined, true, scope, ctx));
            }

            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.expressions.operand(condition, ctx);
                if else_branch.is_empty() {
                    lines.push(format!("if {} [", condition));
                    self.translate_block(then_branch, scope, ctx, lines)?;
                    lines.push("]".to_string());
                } else {
                    lines.push(format!("ifelse {} [", condition));
                    self.translate_block(then_branch, scope, ctx, lines)?;
                    lines.push("] [".to_string());
                    self.translate_block(else_branch, scope, ctx, lines)?;
                    lines.push("]".to_string());
                }
            }

            Statement::For {
                target,
                iterable,
                body,
            } => match iterable {
                IterableKind::Range { start, stop, step } => {
                    let count = self.repeat_count(start.as_ref(), stop, step.as_ref(), ctx);
                    lines.push(format!("repeat {} [", count));
                    self.translate_block(body, scope, ctx, lines)?;
                    lines.push("]".to_string());
                }
                IterableKind::Agentset(agents) => {
                    lines.push(format!("ask {} [", self.expressions.operand(agents, ctx)));
                    self.translate_block(body, scope, &ctx.enter(target), lines)?;
                    lines.push("]".to_string());
                }
                IterableKind::List(items) => {
                    lines.push(format!(
                        "foreach {} [ {} ->",
                        self.expressions.operand(items, ctx),
                        target
                    ));
                    let mut inner = scope.clone();
                    inner.insert(target.clone());
                    self.translate_block(body, &inner, ctx, lines)?;
                    lines.push("]".to_string());
                }
            },

            Statement::While { condition, body } => {
                lines.push(format!(
                    "while [ {} ] [",
                    self.expressions.translate(condition, ctx)
                ));
                self.translate_block(body, scope, ctx, lines)?;
                lines.push("]".to_string());
            }

            Statement::Return(value) => lines.push(self.exit(value.as_ref(), ctx)?),

            Statement::Expression(expr) => lines.push(self.expression_statement(expr, scope, ctx)),

            Statement::Pass => {}

            Statement::Unsupported { kind, text } => {
                lines.push(format!("; UNTRANSLATED ({}):", kind.name()));
                for line in text.lines() {
                    lines.push(format!(";   {}", line).trim_end().to_string());
                }
            }
        }
        Ok(())
    }

    /// `set`/`let` line assigning `value` to `target`
    fn assign(
        &self,
        target: &Expression,
        value: &Expression,
        augmented: bool,
        scope: &mut HashSet<String>,
        ctx: &AgentContext,
    ) -> String {
        match target {
            Expression::Name(name) => {
                let value = self.expressions.translate(value, ctx);
                if augmented || scope.contains(name) || self.known.contains(name) {
                    format!("set {} {}", name, value)
                } else {
                    scope.insert(name.clone());
                    format!("let {} {}", name, value)
                }
            }

            Expression::Attribute { base, attr } => self.assign_attribute(base, attr, value, ctx),

            Expression::Subscript {
                base,
                index: SubscriptIndex::Index(index),
            } => {
                let replaced = Expression::call(
                    Expression::name("replace_item"),
                    vec![index.as_ref().clone(), base.as_ref().clone(), value.clone()],
                );
                self.assign(base, &replaced, true, scope, ctx)
            }

            Expression::Subscript {
                base,
                index: SubscriptIndex::Slice { start, stop },
            } => {
                let start = start
                    .as_deref()
                    .cloned()
                    .unwrap_or_else(|| Expression::int(0));
                let stop = stop.as_deref().cloned().unwrap_or_else(|| {
                    Expression::call(Expression::name("len"), vec![base.as_ref().clone()])
                });
                let head = Expression::Subscript {
                    base: base.clone(),
                    index: SubscriptIndex::Slice {
                        start: None,
                        stop: Some(Box::new(start)),
                    },
                };
                let tail = Expression::Subscript {
                    base: base.clone(),
                    index: SubscriptIndex::Slice {
                        start: Some(Box::new(stop)),
                        stop: None,
                    },
                };
                let sentence = |a: Expression, b: Expression| {
                    Expression::call(Expression::name("sentence"), vec![a, b])
                };
                let spliced = sentence(sentence(head, value.clone()), tail);
                self.assign(base, &spliced, true, scope, ctx)
            }

            other => format!(
                "; cannot assign to {}",
                self.expressions.translate(other, ctx)
            ),
        }
    }

    fn assign_attribute(
        &self,
        base: &Expression,
        attr: &str,
        value: &Expression,
        ctx: &AgentContext,
    ) -> String {
        let reference = self.expressions.translate(
            &Expression::Attribute {
                base: Box::new(base.clone()),
                attr: attr.to_string(),
            },
            ctx,
        );

        // Anything the current agent reads as a bare variable is set directly
        if reference == attr {
            return format!("set {} {}", attr, self.expressions.translate(value, ctx));
        }

        if reference == format!("[{}] of myself", attr) {
            let swapped = ctx.swapped();
            return format!(
                "ask myself [ set {} {} ]",
                attr,
                self.expressions.translate(value, &swapped)
            );
        }

        format!(
            "ask {} [ set {} {} ]",
            self.expressions.operand(base, ctx),
            attr,
            self.expressions.translate(value, &ctx.enter_anonymous())
        )
    }

    fn expression_statement(
        &self,
        expr: &Expression,
        scope: &mut HashSet<String>,
        ctx: &AgentContext,
    ) -> String {
        if let Expression::Call { callee, args, .. } = expr {
            if let Expression::Attribute { base, attr } = callee.as_ref() {
                let module = match base.as_ref() {
                    Expression::Name(name) => Some(name.as_str()),
                    _ => None,
                };

                if module == Some("random") && attr == "shuffle" && args.len() == 1 {
                    return self.assign(&args[0], expr, true, scope, ctx);
                }

                if module != Some("random") && module != Some("math") {
                    if attr == "clear" && args.is_empty() {
                        let empty = Expression::Literal(Literal::List(Vec::new()));
                        return self.assign(base, &empty, true, scope, ctx);
                    }
                    if MUTATORS.contains(&attr.as_str()) && !args.is_empty() {
                        return self.assign(base, expr, true, scope, ctx);
                    }
                }
            }
            return self.expressions.command(expr, ctx);
        }

        format!("; {}", self.expressions.translate(expr, ctx))
    }

    /// `stop` or `report`
    fn exit(&self, value: Option<&Expression>, ctx: &AgentContext) -> Result<String> {
        match (value, self.behavior.is_reporter()) {
            (None, false) => Ok("stop".to_string()),
            (None, true) => Ok("report nobody".to_string()),
            (Some(value), true) => Ok(format!("report {}", self.expressions.translate(value, ctx))),
            (Some(_), false) => Err(CompileError::ScopeConflict {
                behavior: self.behavior.name.clone(),
                location: Some(self.behavior.location),
            }),
        }
    }

    /// Iteration count of a `range(...)` loop; integer bounds are folded
    fn repeat_count(
        &self,
        start: Option<&Expression>,
        stop: &Expression,
        step: Option<&Expression>,
        ctx: &AgentContext,
    ) -> String {
        let start = start.cloned().unwrap_or_else(|| Expression::int(0));
        let step = step.cloned().unwrap_or_else(|| Expression::int(1));

        if let (Some(a), Some(b), Some(s)) = (int_value(&start), int_value(stop), int_value(&step))
        {
            if s != 0 {
                // Widened so spans across the whole i64 range cannot overflow
                let (span, s) = (i128::from(b) - i128::from(a), i128::from(s));
                let count = if span.signum() == s.signum() {
                    (span.abs() + s.abs() - 1) / s.abs()
                } else {
                    0
                };
                return count.to_string();
            }
        }

        let span = if int_value(&start) == Some(0) {
            stop.clone()
        } else {
            Expression::binary(BinaryOperator::Sub, stop.clone(), start)
        };
        if int_value(&step) == Some(1) {
            return self.expressions.operand(&span, ctx);
        }
        let ratio = Expression::binary(BinaryOperator::Div, span, step);
        format!("(ceiling {})", self.expressions.operand(&ratio, ctx))
    }
}

fn int_value(expr: &Expression) -> Option<i64> {
    match expr {
        Expression::Literal(Literal::Number(Number::Int(n))) => Some(*n),
        Expression::UnaryOp {
            op: UnaryOperator::Neg,
            operand,
        } => match operand.as_ref() {
            Expression::Literal(Literal::Number(Number::Int(n))) => n.checked_neg(),
            _ => None,
        },
        _ => None,
    }
}

/// Locals first assigned inside a nested block and used outside it.
/// NetLogo `let` is block scoped, so these are declared at procedure level.
fn hoisted_locals(
    stmts: &[Statement],
    known: &HashSet<String>,
    params: &HashSet<String>,
) -> Vec<String> {
    let mut scan = ScopeScan {
        known,
        params,
        next_block: 1,
        first: Vec::new(),
        hoisted: Vec::new(),
    };
    scan.block(stmts, &[0]);
    scan.hoisted
}

struct ScopeScan<'a> {
    known: &'a HashSet<String>,
    params: &'a HashSet<String>,
    next_block: usize,
    /// Local name and the block path of its first assignment
    first: Vec<(String, Vec<usize>)>,
    hoisted: Vec<String>,
}

impl ScopeScan<'_> {
    fn block(&mut self, stmts: &[Statement], path: &[usize]) {
        for stmt in stmts {
            self.statement(stmt, path);
        }
    }

    fn nested(&mut self, stmts: &[Statement], path: &[usize]) {
        let mut inner = path.to_vec();
        inner.push(self.next_block);
        self.next_block += 1;
        self.block(stmts, &inner);
    }

    fn statement(&mut self, stmt: &Statement, path: &[usize]) {
        match stmt {
            Statement::Assign { target, value } => {
                self.uses(value, path);
                match target {
                    Expression::Name(name) => self.define(name, path),
                    other => self.uses(other, path),
                }
            }
            Statement::AugmentedAssign { target, value, .. } => {
                self.uses(target, path);
                self.uses(value, path);
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.uses(condition, path);
                self.nested(then_branch, path);
                self.nested(else_branch, path);
            }
            Statement::For { iterable, body, .. } => {
                match iterable {
                    IterableKind::Range { start, stop, step } => {
                        for e in start.iter().chain(Some(stop)).chain(step.iter()) {
                            self.uses(e, path);
                        }
                    }
                    IterableKind::Agentset(e) | IterableKind::List(e) => self.uses(e, path),
                }
                self.nested(body, path);
            }
            Statement::While { condition, body } => {
                self.uses(condition, path);
                self.nested(body, path);
            }
            Statement::Return(Some(e)) | Statement::Expression(e) => self.uses(e, path),
            Statement::Return(None) | Statement::Pass | Statement::Unsupported { .. } => {}
        }
    }

    fn define(&mut self, name: &str, path: &[usize]) {
        if self.known.contains(name) || self.params.contains(name) {
            return;
        }
        if self.first.iter().any(|(n, _)| n == name) {
            self.use_name(name, path);
        } else {
            self.first.push((name.to_string(), path.to_vec()));
        }
    }

    fn uses(&mut self, expr: &Expression, path: &[usize]) {
        let mentioned: Vec<String> = self
            .first
            .iter()
            .filter(|(name, _)| expr.mentions(name))
            .map(|(name, _)| name.clone())
            .collect();
        for name in mentioned {
            self.use_name(&name, path);
        }
    }

    fn use_name(&mut self, name: &str, path: &[usize]) {
        let outside = self
            .first
            .iter()
            .any(|(n, def)| n == name && !path.starts_with(def));
        if outside && !self.hoisted.iter().any(|h| h == name) {
            self.hoisted.push(name.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xnlogo_core::ast::CompareOperator;
    use xnlogo_core::{ConstructKind, SourceLocation};

    fn behavior(name: &str, phase: SchedulePhase, statements: Vec<Statement>) -> Behavior {
        Behavior {
            name: name.to_string(),
            params: Vec::new(),
            statements,
            schedule_phase: phase,
            location: SourceLocation::new(3, 5),
        }
    }

    fn lines_of(statements: Vec<Statement>) -> Vec<String> {
        let model = ModelSpec::default();
        let b = behavior("act", SchedulePhase::Custom, statements);
        StatementTranslator::new(&model, None, &b).translate().unwrap()
    }

    fn assign(target: Expression, value: Expression) -> Statement {
        Statement::Assign { target, value }
    }

    #[test]
    fn test_let_then_set() {
        let lines = lines_of(vec![
            assign(Expression::name("x"), Expression::int(1)),
            assign(
                Expression::name("x"),
                Expression::binary(BinaryOperator::Add, Expression::name("x"), Expression::int(2)),
            ),
        ]);
        assert_eq!(lines, vec!["let x 1", "set x (x + 2)"]);
    }

    #[test]
    fn test_augmented_self_field() {
        let lines = lines_of(vec![Statement::AugmentedAssign {
            target: Expression::self_attr("count"),
            op: BinaryOperator::Add,
            value: Expression::int(1),
        }]);
        assert_eq!(lines, vec!["set count (count + 1)"]);
    }

    #[test]
    fn test_elif_chain_nests_ifelse() {
        let branch = |n: i64| assign(Expression::self_attr("state"), Expression::int(n));
        let cond = |n: i64| {
            Expression::compare(CompareOperator::Eq, Expression::name("x"), Expression::int(n))
        };
        let chain = Statement::If {
            condition: cond(1),
            then_branch: vec![branch(1)],
            else_branch: vec![Statement::If {
                condition: cond(2),
                then_branch: vec![branch(2)],
                else_branch: vec![branch(3)],
            }],
        };
        let lines = lines_of(vec![chain]);
        assert_eq!(
            lines,
            vec![
                "ifelse (x = 1) [",
                "set state 1",
                "] [",
                "ifelse (x = 2) [",
                "set state 2",
                "] [",
                "set state 3",
                "]",
                "]",
            ]
        );
    }

    #[test]
    fn test_local_defined_in_branch_is_hoisted() {
        let lines = lines_of(vec![
            Statement::If {
                condition: Expression::name("flag"),
                then_branch: vec![assign(Expression::name("y"), Expression::int(1))],
                else_branch: vec![assign(Expression::name("y"), Expression::int(2))],
            },
            Statement::Expression(Expression::call(
                Expression::name("print"),
                vec![Expression::name("y")],
            )),
        ]);
        assert_eq!(
            lines,
            vec![
                "let y 0",
                "ifelse flag [",
                "set y 1",
                "] [",
                "set y 2",
                "]",
                "print y",
            ]
        );
    }

    #[test]
    fn test_block_local_is_not_hoisted() {
        let lines = lines_of(vec![Statement::While {
            condition: Expression::boolean(true),
            body: vec![assign(Expression::name("z"), Expression::int(1))],
        }]);
        assert_eq!(lines, vec!["while [ true ] [", "let z 1", "]"]);
    }

    #[test]
    fn test_loops() {
        let lines = lines_of(vec![
            Statement::For {
                target: "_".to_string(),
                iterable: IterableKind::Range {
                    start: Some(Expression::int(2)),
                    stop: Expression::int(10),
                    step: Some(Expression::int(3)),
                },
                body: vec![],
            },
            Statement::For {
                target: "i".to_string(),
                iterable: IterableKind::Range {
                    start: None,
                    stop: Expression::self_attr("n"),
                    step: None,
                },
                body: vec![],
            },
            Statement::For {
                target: "v".to_string(),
                iterable: IterableKind::List(Expression::self_attr("items")),
                body: vec![Statement::Expression(Expression::call(
                    Expression::name("print"),
                    vec![Expression::name("v")],
                ))],
            },
        ]);
        assert_eq!(
            lines,
            vec![
                "repeat 3 [",
                "]",
                "repeat n [",
                "]",
                "foreach items [ v ->",
                "print v",
                "]",
            ]
        );
    }

    #[test]
    fn test_range_count_spanning_i64() {
        // for _ in range(-9000000000000000000, 9000000000000000000): pass
        let lines = lines_of(vec![Statement::For {
            target: "_".to_string(),
            iterable: IterableKind::Range {
                start: Some(Expression::UnaryOp {
                    op: UnaryOperator::Neg,
                    operand: Box::new(Expression::int(9_000_000_000_000_000_000)),
                }),
                stop: Expression::int(9_000_000_000_000_000_000),
                step: None,
            },
            body: vec![],
        }]);
        assert_eq!(lines, vec!["repeat 18000000000000000000 [", "]"]);

        let lines = lines_of(vec![Statement::For {
            target: "_".to_string(),
            iterable: IterableKind::Range {
                start: Some(Expression::int(i64::MAX)),
                stop: Expression::int(i64::MIN),
                step: Some(Expression::int(-1)),
            },
            body: vec![],
        }]);
        assert_eq!(lines, vec!["repeat 18446744073709551615 [", "]"]);
    }

    #[test]
    fn test_ask_loop_sets_fields_on_both_sides() {
        // for other in self.neighbors:
        //     other.energy -= 1
        //     self.energy += other.energy
        let other_energy = Expression::Attribute {
            base: Box::new(Expression::name("other")),
            attr: "energy".to_string(),
        };
        let lines = lines_of(vec![Statement::For {
            target: "other".to_string(),
            iterable: IterableKind::Agentset(Expression::self_attr("neighbors")),
            body: vec![
                Statement::AugmentedAssign {
                    target: other_energy.clone(),
                    op: BinaryOperator::Sub,
                    value: Expression::int(1),
                },
                Statement::AugmentedAssign {
                    target: Expression::self_attr("energy"),
                    op: BinaryOperator::Add,
                    value: other_energy,
                },
            ],
        }]);
        assert_eq!(
            lines,
            vec![
                "ask neighbors [",
                "set energy (energy - 1)",
                "ask myself [ set energy (energy + ([energy] of myself)) ]",
                "]",
            ]
        );
    }

    #[test]
    fn test_list_mutation() {
        let lines = lines_of(vec![
            Statement::Expression(Expression::call(
                Expression::Attribute {
                    base: Box::new(Expression::self_attr("items")),
                    attr: "append".to_string(),
                },
                vec![Expression::int(4)],
            )),
            assign(
                Expression::Subscript {
                    base: Box::new(Expression::self_attr("items")),
                    index: SubscriptIndex::Index(Box::new(Expression::int(0))),
                },
                Expression::int(9),
            ),
        ]);
        assert_eq!(
            lines,
            vec!["set items lput 4 items", "set items replace-item 0 items 9"]
        );
    }

    #[test]
    fn test_other_agent_assignment() {
        let lines = lines_of(vec![assign(
            Expression::Attribute {
                base: Box::new(Expression::name("prey")),
                attr: "alive".to_string(),
            },
            Expression::boolean(false),
        )]);
        assert_eq!(lines, vec!["ask prey [ set alive false ]"]);
    }

    #[test]
    fn test_unsupported_passthrough() {
        let lines = lines_of(vec![Statement::Unsupported {
            kind: ConstructKind::TryExcept,
            text: "try:\n    self.go()\nexcept Exception:\n    pass".to_string(),
        }]);
        assert_eq!(
            lines,
            vec![
                "; UNTRANSLATED (try/except):",
                ";   try:",
                ";       self.go()",
                ";   except Exception:",
                ";       pass",
            ]
        );
    }

    #[test]
    fn test_return_forms() {
        let model = ModelSpec::default();
        let reporter = behavior(
            "total",
            SchedulePhase::Reporter,
            vec![Statement::Return(Some(Expression::self_attr("n")))],
        );
        let lines = StatementTranslator::new(&model, None, &reporter)
            .translate()
            .unwrap();
        assert_eq!(lines, vec!["report n"]);

        assert_eq!(lines_of(vec![Statement::Return(None)]), vec!["stop"]);

        let broken = behavior(
            "act",
            SchedulePhase::Custom,
            vec![Statement::Return(Some(Expression::int(1)))],
        );
        let err = StatementTranslator::new(&model, None, &broken)
            .translate()
            .unwrap_err();
        assert!(matches!(err, CompileError::ScopeConflict { ref behavior, .. } if behavior == "act"));
    }

    #[test]
    fn test_translate_model_names_procedures() {
        let agent = AgentSpec {
            identifier: "SmartAgent".to_string(),
            breed: None,
            state_fields: vec![],
            behaviors: vec![behavior("step", SchedulePhase::Step, vec![Statement::Pass])],
            initial_count: None,
        };
        let model = ModelSpec {
            agents: vec![agent],
            behaviors: vec![behavior("setup", SchedulePhase::Setup, vec![])],
            ..Default::default()
        };
        let translated = translate_model(&model).unwrap();
        let procedures: Vec<_> = translated.iter().map(|t| t.procedure.as_str()).collect();
        assert_eq!(procedures, vec!["smart-agent-step", "setup"]);
        assert_eq!(translated[0].owner.as_deref(), Some("SmartAgent"));
    }
}
