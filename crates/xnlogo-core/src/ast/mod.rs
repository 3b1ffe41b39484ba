//! Syntax tree for the accepted Python subset
//!
//! This module contains:
//! - Expression and statement nodes
//! - Operators
//! - The structural tree of classes, fields and methods

pub mod expression;
pub mod operator;
pub mod statement;
pub mod tree;

pub use expression::{Comprehension, Constant, Expr, ExprKind, Keyword, Param, ParamKind};
pub use operator::{BinaryOperator, BoolOperator, CompareOperator, UnaryOperator};
pub use statement::{Alias, ClassDef, ExceptHandler, FunctionDef, Stmt, StmtKind, WithItem};
pub use tree::{
    Decorator, FieldDecl, Marker, MarkerOption, MethodDecl, ParseTree, SourceStatement,
    TopLevelItem, TypeDecl, TypeKind,
};
