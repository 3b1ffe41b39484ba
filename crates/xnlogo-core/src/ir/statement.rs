//! IR statements and expressions
//!
//! These unions are what code generation matches on. They are deliberately
//! untyped: annotations never reach this level.

use crate::ast::{BinaryOperator, BoolOperator, CompareOperator, UnaryOperator};
use crate::diagnostic::ConstructKind;
use serde::{Deserialize, Serialize};

/// IR statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// `target = value`; target is a `Name`, an `Attribute` or a `Subscript`
    Assign {
        target: Expression,
        value: Expression,
    },

    /// `target op= value`
    AugmentedAssign {
        target: Expression,
        op: BinaryOperator,
        value: Expression,
    },

    /// `else_branch` holding exactly one `If` encodes an elif link
    If {
        condition: Expression,
        then_branch: Vec<Statement>,
        else_branch: Vec<Statement>,
    },

    For {
        target: String,
        iterable: IterableKind,
        body: Vec<Statement>,
    },

    While {
        condition: Expression,
        body: Vec<Statement>,
    },

    Return(Option<Expression>),

    Expression(Expression),

    Pass,

    /// Statement with no translation; `text` is the normalized source
    Unsupported { kind: ConstructKind, text: String },
}

impl Statement {
    /// True if this statement, or any nested one, returns a value
    pub fn returns_value(&self) -> bool {
        match self {
            Statement::Return(value) => value.is_some(),
            Statement::If {
                then_branch,
                else_branch,
                ..
            } => then_branch
                .iter()
                .chain(else_branch.iter())
                .any(Statement::returns_value),
            Statement::For { body, .. } | Statement::While { body, .. } => {
                body.iter().any(Statement::returns_value)
            }
            _ => false,
        }
    }

    /// Number of `Unsupported` statements, counted recursively
    pub fn unsupported_count(&self) -> usize {
        match self {
            Statement::Unsupported { .. } => 1,
            Statement::If {
                then_branch,
                else_branch,
                ..
            } => then_branch
                .iter()
                .chain(else_branch.iter())
                .map(Statement::unsupported_count)
                .sum(),
            Statement::For { body, .. } | Statement::While { body, .. } => {
                body.iter().map(Statement::unsupported_count).sum()
            }
            _ => 0,
        }
    }
}

/// What a `for` loop iterates over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IterableKind {
    /// `range(stop)`, `range(start, stop)` or `range(start, stop, step)`
    Range {
        start: Option<Expression>,
        stop: Expression,
        step: Option<Expression>,
    },

    /// Any other collection is treated as a set of agents
    Agentset(Expression),

    /// List literal or `list(...)`
    List(Expression),
}

/// IR expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Literal(Literal),

    Name(String),

    /// The executing agent
    SelfRef,

    Attribute {
        base: Box<Expression>,
        attr: String,
    },

    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// Single comparison; chains are lowered to `BoolOp(And)`
    Compare {
        op: CompareOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    BoolOp {
        op: BoolOperator,
        operands: Vec<Expression>,
    },

    /// Keyword arguments follow the positional ones in declaration order
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
        keywords: Vec<(String, Expression)>,
    },

    Subscript {
        base: Box<Expression>,
        index: SubscriptIndex,
    },

    /// `then if condition else otherwise`
    Conditional {
        condition: Box<Expression>,
        then: Box<Expression>,
        otherwise: Box<Expression>,
    },

    /// `[v for v in source if condition]`
    Filter {
        source: Box<Expression>,
        variable: String,
        condition: Box<Expression>,
    },
}

impl Expression {
    pub fn name(name: impl Into<String>) -> Self {
        Expression::Name(name.into())
    }

    pub fn int(value: i64) -> Self {
        Expression::Literal(Literal::Number(Number::Int(value)))
    }

    pub fn float(value: f64) -> Self {
        Expression::Literal(Literal::Number(Number::Float(value)))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expression::Literal(Literal::Str(value.into()))
    }

    pub fn boolean(value: bool) -> Self {
        Expression::Literal(Literal::Bool(value))
    }

    /// `self.attr`
    pub fn self_attr(attr: impl Into<String>) -> Self {
        Expression::Attribute {
            base: Box::new(Expression::SelfRef),
            attr: attr.into(),
        }
    }

    pub fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn compare(op: CompareOperator, left: Expression, right: Expression) -> Self {
        Expression::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(callee: Expression, args: Vec<Expression>) -> Self {
        Expression::Call {
            callee: Box::new(callee),
            args,
            keywords: Vec::new(),
        }
    }

    /// True for literals that need no evaluation
    pub fn is_constant(&self) -> bool {
        match self {
            Expression::Literal(Literal::List(items)) => items.iter().all(Expression::is_constant),
            Expression::Literal(_) => true,
            Expression::UnaryOp {
                op: UnaryOperator::Neg,
                operand,
            } => matches!(**operand, Expression::Literal(Literal::Number(_))),
            _ => false,
        }
    }

    /// True if `name` is read anywhere inside this expression
    pub fn mentions(&self, name: &str) -> bool {
        match self {
            Expression::Name(n) => n == name,
            Expression::Literal(Literal::List(items)) => items.iter().any(|e| e.mentions(name)),
            Expression::Literal(_) | Expression::SelfRef => false,
            Expression::Attribute { base, .. } => base.mentions(name),
            Expression::BinaryOp { left, right, .. } | Expression::Compare { left, right, .. } => {
                left.mentions(name) || right.mentions(name)
            }
            Expression::UnaryOp { operand, .. } => operand.mentions(name),
            Expression::BoolOp { operands, .. } => operands.iter().any(|e| e.mentions(name)),
            Expression::Call {
                callee,
                args,
                keywords,
            } => {
                callee.mentions(name)
                    || args.iter().any(|e| e.mentions(name))
                    || keywords.iter().any(|(_, e)| e.mentions(name))
            }
            Expression::Subscript { base, index } => {
                base.mentions(name)
                    || match index {
                        SubscriptIndex::Index(i) => i.mentions(name),
                        SubscriptIndex::Slice { start, stop } => {
                            start.as_ref().map_or(false, |e| e.mentions(name))
                                || stop.as_ref().map_or(false, |e| e.mentions(name))
                        }
                    }
            }
            Expression::Conditional {
                condition,
                then,
                otherwise,
            } => condition.mentions(name) || then.mentions(name) || otherwise.mentions(name),
            Expression::Filter {
                source,
                variable,
                condition,
            } => source.mentions(name) || (variable != name && condition.mentions(name)),
        }
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Number(Number),
    Bool(bool),
    Str(String),
    /// `None`
    None,
    List(Vec<Expression>),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Number {
    Int(i64),
    Float(f64),
}

/// Subscript index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SubscriptIndex {
    Index(Box<Expression>),
    /// `[start:stop]` without a step
    Slice {
        start: Option<Box<Expression>>,
        stop: Option<Box<Expression>>,
    },
}
