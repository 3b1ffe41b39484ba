//! Statement AST nodes

use super::expression::{Expr, Param};
use super::operator::BinaryOperator;
use crate::location::{SourceLocation, Span};
use serde::{Deserialize, Serialize};

/// Statement node
///
/// `location` is always in file coordinates. `span` is a byte range into the
/// text the statement was parsed from, which for method bodies is the
/// normalized fragment rather than the whole file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub location: SourceLocation,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, location: SourceLocation, span: Span) -> Self {
        Self {
            kind,
            location,
            span,
        }
    }

    /// Nested statement blocks, in source order
    pub fn blocks(&self) -> Vec<&[Stmt]> {
        match &self.kind {
            StmtKind::If { body, orelse, .. }
            | StmtKind::For { body, orelse, .. }
            | StmtKind::While { body, orelse, .. } => vec![body, orelse],
            StmtKind::FunctionDef(def) => vec![&def.body],
            StmtKind::ClassDef(def) => vec![&def.body],
            StmtKind::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => {
                let mut blocks: Vec<&[Stmt]> = vec![body];
                blocks.extend(handlers.iter().map(|h| h.body.as_slice()));
                blocks.push(orelse);
                blocks.push(finalbody);
                blocks
            }
            StmtKind::With { body, .. } => vec![body],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    /// Expression evaluated for its side effects
    Expr(Expr),

    /// `a = b = value` keeps every target
    Assign { targets: Vec<Expr>, value: Expr },

    AugAssign {
        target: Expr,
        op: BinaryOperator,
        value: Expr,
    },

    /// `target: annotation = value`
    AnnAssign {
        target: Expr,
        annotation: Expr,
        value: Option<Expr>,
    },

    /// `elif` is an `If` as the only statement of `orelse`
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },

    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        is_async: bool,
    },

    While {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },

    Return(Option<Expr>),

    Pass,
    Break,
    Continue,

    FunctionDef(FunctionDef),

    ClassDef(ClassDef),

    Try {
        body: Vec<Stmt>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<Stmt>,
        finalbody: Vec<Stmt>,
    },

    With {
        items: Vec<WithItem>,
        body: Vec<Stmt>,
        is_async: bool,
    },

    Import(Vec<Alias>),

    ImportFrom {
        module: Option<String>,
        names: Vec<Alias>,
        /// Number of leading dots
        level: usize,
    },

    Global(Vec<String>),
    Nonlocal(Vec<String>),

    Del(Vec<Expr>),

    Raise {
        exc: Option<Expr>,
        cause: Option<Expr>,
    },

    Assert { test: Expr, msg: Option<Expr> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Expr>,
    pub returns: Option<Expr>,
    pub is_async: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<Expr>,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptHandler {
    pub exc_type: Option<Expr>,
    pub name: Option<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithItem {
    pub context: Expr,
    pub target: Option<Expr>,
}

/// `name as asname` in an import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    pub name: String,
    pub asname: Option<String>,
}
