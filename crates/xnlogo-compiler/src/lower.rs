//! IR construction
//!
//! Lowers a validated [`ParseTree`] into a [`ModelSpec`]. The builder makes
//! no judgments of its own: statements the shared detector flags become
//! `Statement::Unsupported`, and anything else it cannot read (an
//! uninterpretable field default, say) is left out.

use crate::semantic::declarations::{
    breed_option, declared_names, global_candidates, initial_count, initializer_assignments,
    random_seed,
};
use crate::semantic::detect::{
    behavior_phase, detect_unsupported, filter_shape, is_range_call, BehaviorContext,
};
use std::collections::HashSet;
use xnlogo_core::ast::{
    BoolOperator, CompareOperator, Constant, Expr, ExprKind, MethodDecl, ParseTree, Stmt, StmtKind,
    TypeDecl, UnaryOperator,
};
use xnlogo_core::ir::{
    AgentSpec, Behavior, Expression, GlobalVar, IterableKind, Literal, ModelSpec, PatchSpec,
    Statement, StateField, SubscriptIndex,
};
use xnlogo_parser::normalize_indentation;

/// IR builder
#[derive(Debug, Clone, Copy, Default)]
pub struct IrBuilder;

impl IrBuilder {
    /// Create a new IR builder
    pub fn new() -> Self {
        Self
    }

    /// Build the model IR from a tree that passed structural validation
    pub fn build(&self, tree: &ParseTree) -> ModelSpec {
        let mut spec = ModelSpec::default();

        // 1. Globals: first declaration wins
        let mut seen = HashSet::new();
        for candidate in global_candidates(tree) {
            if !seen.insert(candidate.name.clone()) {
                continue;
            }
            spec.globals.push(GlobalVar {
                name: candidate.name,
                type_hint: candidate.type_hint,
                default: candidate.default.and_then(lower_expression),
                default_source: candidate.default_text,
            });
        }

        // 2. Patch variables from every marked class
        let mut patches = PatchSpec::default();
        for decl in tree.type_decls() {
            if let Some(marker) = &decl.marker {
                for declared in declared_names(marker, "patches") {
                    push_field(
                        &mut patches.state_fields,
                        StateField {
                            name: declared.name,
                            type_hint: declared.type_hint,
                            default: None,
                        },
                    );
                }
            }
        }
        spec.patches = patches;

        // 3. Agents, first definition of an identifier wins
        for decl in tree.agents() {
            if spec.agent(&decl.name).is_none() {
                let agent = self.build_agent(decl);
                spec.agents.push(agent);
            }
        }

        // 4. Model-level behaviors and reporters
        if let Some(model) = tree.models().next() {
            spec.model_name = Some(model.name.clone());
            spec.random_seed = model.marker.as_ref().and_then(random_seed);
            for behavior in unique_behaviors(model).map(lower_behavior) {
                if behavior.is_reporter() {
                    spec.reporters.push(behavior);
                } else {
                    spec.behaviors.push(behavior);
                }
            }
        }

        log::debug!(
            "built IR: {} global(s), {} agent(s), {} model behavior(s), {} reporter(s)",
            spec.globals.len(),
            spec.agents.len(),
            spec.behaviors.len(),
            spec.reporters.len()
        );
        spec
    }

    fn build_agent(&self, decl: &TypeDecl) -> AgentSpec {
        let marker = decl.marker.as_ref();
        let mut fields = Vec::new();

        for field in &decl.fields {
            push_field(
                &mut fields,
                StateField {
                    name: field.name.clone(),
                    type_hint: field.type_hint.clone(),
                    default: field.default.as_ref().and_then(lower_expression),
                },
            );
        }

        if let Some(marker) = marker {
            for declared in declared_names(marker, "state") {
                push_field(
                    &mut fields,
                    StateField {
                        name: declared.name,
                        type_hint: declared.type_hint,
                        default: None,
                    },
                );
            }
        }

        if let Some(init) = decl.method("__init__") {
            let (assignments, _) = initializer_assignments(init);
            for assignment in assignments {
                push_field(
                    &mut fields,
                    StateField {
                        name: assignment.name.to_string(),
                        type_hint: assignment.type_hint,
                        default: assignment.value.and_then(lower_expression),
                    },
                );
            }
        }

        AgentSpec {
            identifier: decl.name.clone(),
            breed: marker
                .and_then(breed_option)
                .map(|breed| breed.to_breed_name(&decl.name)),
            state_fields: fields,
            behaviors: unique_behaviors(decl).map(lower_behavior).collect(),
            initial_count: marker.and_then(initial_count).map(Expression::int),
        }
    }
}

/// Add a field, or fill in the default of an earlier declaration
fn push_field(fields: &mut Vec<StateField>, field: StateField) {
    match fields.iter_mut().find(|f| f.name == field.name) {
        Some(existing) => {
            if existing.default.is_none() {
                existing.default = field.default;
            }
            if existing.type_hint.is_none() {
                existing.type_hint = field.type_hint;
            }
        }
        None => fields.push(field),
    }
}

fn unique_behaviors(decl: &TypeDecl) -> impl Iterator<Item = &MethodDecl> {
    let mut seen = HashSet::new();
    decl.behaviors()
        .filter(move |method| seen.insert(method.name.as_str()))
}

fn lower_behavior(method: &MethodDecl) -> Behavior {
    let phase = behavior_phase(method);
    let ctx = BehaviorContext::new(phase);
    let statements = method
        .body
        .iter()
        .filter_map(|stmt| lower_statement(&stmt.node, &stmt.text, ctx))
        .collect();

    Behavior {
        name: method.name.clone(),
        params: method.value_params().map(|p| p.name.clone()).collect(),
        statements,
        schedule_phase: phase,
        location: method.location,
    }
}

fn lower_block(stmts: &[Stmt], text: &str, ctx: BehaviorContext) -> Vec<Statement> {
    stmts
        .iter()
        .filter_map(|stmt| lower_statement(stmt, text, ctx))
        .collect()
}

/// Lower one statement; `text` is the fragment its span indexes into
fn lower_statement(stmt: &Stmt, text: &str, ctx: BehaviorContext) -> Option<Statement> {
    if let Some((kind, _)) = detect_unsupported(stmt, ctx) {
        return Some(Statement::Unsupported {
            kind,
            text: passthrough_text(stmt, text),
        });
    }

    let lowered = match &stmt.kind {
        StmtKind::Expr(expr) => match &expr.kind {
            // Docstrings
            ExprKind::Constant(Constant::Str(_)) => return None,
            ExprKind::Constant(Constant::Ellipsis) => Statement::Pass,
            _ => Statement::Expression(lower_expression(expr)?),
        },
        StmtKind::Assign { targets, value } => Statement::Assign {
            target: lower_expression(targets.first()?)?,
            value: lower_expression(value)?,
        },
        StmtKind::AnnAssign {
            target,
            value: Some(value),
            ..
        } => Statement::Assign {
            target: lower_expression(target)?,
            value: lower_expression(value)?,
        },
        StmtKind::AnnAssign { value: None, .. } => Statement::Pass,
        StmtKind::AugAssign { target, op, value } => Statement::AugmentedAssign {
            target: lower_expression(target)?,
            op: *op,
            value: lower_expression(value)?,
        },
        StmtKind::If { test, body, orelse } => Statement::If {
            condition: lower_expression(test)?,
            then_branch: lower_block(body, text, ctx),
            else_branch: lower_block(orelse, text, ctx),
        },
        StmtKind::For {
            target, iter, body, ..
        } => Statement::For {
            target: target.as_name()?.to_string(),
            iterable: lower_iterable(iter)?,
            body: lower_block(body, text, ctx),
        },
        StmtKind::While { test, body, .. } => Statement::While {
            condition: lower_expression(test)?,
            body: lower_block(body, text, ctx),
        },
        StmtKind::Return(value) => match value {
            Some(value) => Statement::Return(Some(lower_expression(value)?)),
            None => Statement::Return(None),
        },
        StmtKind::Pass => Statement::Pass,
        // Everything else is flagged by the detector
        _ => return None,
    };

    Some(lowered)
}

/// Source of a flagged statement, dedented to its own first column
fn passthrough_text(stmt: &Stmt, text: &str) -> String {
    let raw = stmt.span.slice(text);
    let before = text.get(..stmt.span.start).unwrap_or_default();
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count();
    normalize_indentation(raw, column).text
}

fn lower_iterable(iter: &Expr) -> Option<IterableKind> {
    if is_range_call(iter) {
        if let ExprKind::Call { args, .. } = &iter.kind {
            let args = args
                .iter()
                .map(lower_expression)
                .collect::<Option<Vec<_>>>()?;
            let mut args = args.into_iter();
            return Some(match (args.next(), args.next(), args.next()) {
                (Some(stop), None, _) => IterableKind::Range {
                    start: None,
                    stop,
                    step: None,
                },
                (Some(start), Some(stop), step) => IterableKind::Range {
                    start: Some(start),
                    stop,
                    step,
                },
                _ => return None,
            });
        }
    }

    match &iter.kind {
        ExprKind::List(_) | ExprKind::Tuple(_) => Some(IterableKind::List(lower_expression(iter)?)),
        ExprKind::Call { func, .. } if func.as_name() == Some("list") => {
            Some(IterableKind::List(lower_expression(iter)?))
        }
        _ => Some(IterableKind::Agentset(lower_expression(iter)?)),
    }
}

/// Lower an expression; `None` for shapes the IR has no node for
pub fn lower_expression(expr: &Expr) -> Option<Expression> {
    let lowered = match &expr.kind {
        ExprKind::Constant(constant) => match constant {
            Constant::Int(n) => Expression::int(*n),
            Constant::Float(x) => Expression::float(*x),
            Constant::Str(s) | Constant::Bytes(s) => Expression::string(s.clone()),
            Constant::Bool(b) => Expression::boolean(*b),
            Constant::None | Constant::Ellipsis => Expression::Literal(Literal::None),
        },
        ExprKind::Name(name) if name == "self" => Expression::SelfRef,
        ExprKind::Name(name) => Expression::name(name.clone()),
        ExprKind::Attribute { value, attr } => Expression::Attribute {
            base: Box::new(lower_expression(value)?),
            attr: attr.clone(),
        },
        ExprKind::BinOp { left, op, right } => {
            Expression::binary(*op, lower_expression(left)?, lower_expression(right)?)
        }
        ExprKind::UnaryOp {
            op: UnaryOperator::Pos,
            operand,
        } => lower_expression(operand)?,
        ExprKind::UnaryOp { op, operand } => Expression::UnaryOp {
            op: *op,
            operand: Box::new(lower_expression(operand)?),
        },
        ExprKind::BoolOp { op, values } => Expression::BoolOp {
            op: *op,
            operands: values
                .iter()
                .map(lower_expression)
                .collect::<Option<Vec<_>>>()?,
        },
        ExprKind::Compare { left, comparisons } => lower_comparison(left, comparisons)?,
        ExprKind::Call {
            func,
            args,
            keywords,
        } => Expression::Call {
            callee: Box::new(lower_expression(func)?),
            args: args
                .iter()
                .map(lower_expression)
                .collect::<Option<Vec<_>>>()?,
            keywords: keywords
                .iter()
                .map(|k| Some((k.arg.clone()?, lower_expression(&k.value)?)))
                .collect::<Option<Vec<_>>>()?,
        },
        ExprKind::Subscript { value, index } => {
            let base = Box::new(lower_expression(value)?);
            match &index.kind {
                // `agent["speed"]` reads a variable by name
                ExprKind::Constant(Constant::Str(attr)) => Expression::Attribute {
                    base,
                    attr: attr.clone(),
                },
                ExprKind::Slice {
                    lower,
                    upper,
                    step: None,
                } => Expression::Subscript {
                    base,
                    index: SubscriptIndex::Slice {
                        start: lower_optional(lower.as_deref())?,
                        stop: lower_optional(upper.as_deref())?,
                    },
                },
                ExprKind::Slice { .. } => return None,
                _ => Expression::Subscript {
                    base,
                    index: SubscriptIndex::Index(Box::new(lower_expression(index)?)),
                },
            }
        }
        ExprKind::List(items) | ExprKind::Tuple(items) => Expression::Literal(Literal::List(
            items
                .iter()
                .map(lower_expression)
                .collect::<Option<Vec<_>>>()?,
        )),
        ExprKind::IfExp { test, body, orelse } => Expression::Conditional {
            condition: Box::new(lower_expression(test)?),
            then: Box::new(lower_expression(body)?),
            otherwise: Box::new(lower_expression(orelse)?),
        },
        ExprKind::ListComp {
            element,
            generators,
        } => {
            let clause = filter_shape(element, generators)?;
            let source = lower_expression(&clause.iter)?;
            match clause.conditions.first() {
                Some(condition) => Expression::Filter {
                    source: Box::new(source),
                    variable: clause.target.as_name()?.to_string(),
                    condition: Box::new(lower_expression(condition)?),
                },
                None => source,
            }
        }
        _ => return None,
    };

    Some(lowered)
}

/// `Some(None)` when absent, `None` when present but not lowerable
fn lower_optional(expr: Option<&Expr>) -> Option<Option<Box<Expression>>> {
    match expr {
        Some(expr) => Some(Some(Box::new(lower_expression(expr)?))),
        None => Some(None),
    }
}

/// `a < b < c` becomes `(a < b) and (b < c)`; identity becomes equality
fn lower_comparison(left: &Expr, comparisons: &[(CompareOperator, Expr)]) -> Option<Expression> {
    let mut operands = Vec::with_capacity(comparisons.len());
    let mut previous = lower_expression(left)?;

    for (op, right) in comparisons {
        let right = lower_expression(right)?;
        let op = match op {
            CompareOperator::Is => CompareOperator::Eq,
            CompareOperator::IsNot => CompareOperator::NotEq,
            other => *other,
        };
        operands.push(Expression::compare(op, previous, right.clone()));
        previous = right;
    }

    match operands.len() {
        0 => None,
        1 => operands.pop(),
        _ => Some(Expression::BoolOp {
            op: BoolOperator::And,
            operands,
        }),
    }
}
