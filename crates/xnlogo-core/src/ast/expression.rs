//! Expression AST nodes

use super::operator::{BinaryOperator, BoolOperator, CompareOperator, UnaryOperator};
use crate::location::{SourceLocation, Span};
use serde::{Deserialize, Serialize};

/// Expression node with the position of its first token
///
/// `span` indexes the same text as the enclosing statement's span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub location: SourceLocation,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, location: SourceLocation, span: Span) -> Self {
        Self {
            kind,
            location,
            span,
        }
    }

    /// Identifier name if this is a bare name
    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Name(name) => Some(name),
            _ => None,
        }
    }

    /// String value if this is a string literal
    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Constant(Constant::Str(value)) => Some(value),
            _ => None,
        }
    }

    /// True for `self`
    pub fn is_self(&self) -> bool {
        self.as_name() == Some("self")
    }

    /// Dotted path for names and attribute chains (`math.sqrt`, `self.model`)
    pub fn dotted_name(&self) -> Option<String> {
        match &self.kind {
            ExprKind::Name(name) => Some(name.clone()),
            ExprKind::Attribute { value, attr } => {
                value.dotted_name().map(|base| format!("{}.{}", base, attr))
            }
            _ => None,
        }
    }
}

/// Literal constant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(String),
    Bool(bool),
    None,
    Ellipsis,
}

/// Expression kinds of the accepted source subset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Constant(Constant),

    Name(String),

    /// `value.attr`
    Attribute { value: Box<Expr>, attr: String },

    BinOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },

    /// `a and b and c` keeps every operand in one node
    BoolOp { op: BoolOperator, values: Vec<Expr> },

    /// `a < b <= c` keeps the chain: left, then (op, comparator) pairs
    Compare {
        left: Box<Expr>,
        comparisons: Vec<(CompareOperator, Expr)>,
    },

    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
    },

    /// `value[index]`; a slice index is an `ExprKind::Slice`
    Subscript { value: Box<Expr>, index: Box<Expr> },

    /// `lower:upper:step`, only valid as a subscript index
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },

    List(Vec<Expr>),

    Tuple(Vec<Expr>),

    Set(Vec<Expr>),

    /// Key `None` marks a `**mapping` entry
    Dict(Vec<(Option<Expr>, Expr)>),

    /// `body if test else orelse`
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },

    Lambda { params: Vec<Param>, body: Box<Expr> },

    ListComp {
        element: Box<Expr>,
        generators: Vec<Comprehension>,
    },

    SetComp {
        element: Box<Expr>,
        generators: Vec<Comprehension>,
    },

    GeneratorExp {
        element: Box<Expr>,
        generators: Vec<Comprehension>,
    },

    DictComp {
        key: Box<Expr>,
        value: Box<Expr>,
        generators: Vec<Comprehension>,
    },

    Await(Box<Expr>),

    Yield(Option<Box<Expr>>),

    YieldFrom(Box<Expr>),

    /// `*value`
    Starred(Box<Expr>),

    /// `name := value`
    NamedExpr { target: String, value: Box<Expr> },

    /// f-string, kept as its raw body
    FString(String),
}

/// Keyword argument; `arg` is `None` for `**kwargs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub arg: Option<String>,
    pub value: Expr,
}

/// One `for target in iter if cond` clause of a comprehension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comprehension {
    pub target: Expr,
    pub iter: Expr,
    pub conditions: Vec<Expr>,
    pub is_async: bool,
}

/// How a parameter binds its arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    Positional,
    /// `*args`
    VarPositional,
    KeywordOnly,
    /// `**kwargs`
    VarKeyword,
}

/// Function or lambda parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    pub annotation: Option<Expr>,
    pub default: Option<Expr>,
}

impl Param {
    pub fn positional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Positional,
            annotation: None,
            default: None,
        }
    }
}
