//! Structural tree handed from the parser to validation and lowering
//!
//! The tree records what the source declares (classes, their markers,
//! fields and methods) without judging whether any of it can be compiled.

use super::expression::{Expr, Param};
use super::statement::Stmt;
use crate::location::SourceLocation;
use serde::{Deserialize, Serialize};

/// Parsed source file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseTree {
    pub items: Vec<TopLevelItem>,
}

impl ParseTree {
    /// All class definitions, marked or not
    pub fn type_decls(&self) -> impl Iterator<Item = &TypeDecl> {
        self.items.iter().filter_map(|item| match item {
            TopLevelItem::Type(decl) => Some(decl),
            _ => None,
        })
    }

    /// Classes marked as agents, in source order
    pub fn agents(&self) -> impl Iterator<Item = &TypeDecl> {
        self.type_decls().filter(|d| d.kind() == Some(TypeKind::Agent))
    }

    /// Classes marked as the model
    pub fn models(&self) -> impl Iterator<Item = &TypeDecl> {
        self.type_decls().filter(|d| d.kind() == Some(TypeKind::Model))
    }
}

/// Module-level item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TopLevelItem {
    Type(TypeDecl),

    /// Module-level function, e.g. a decorator stub
    Function {
        name: String,
        location: SourceLocation,
    },

    Import {
        module: String,
        location: SourceLocation,
    },

    Docstring(String),

    /// Any other statement
    Statement(SourceStatement),
}

/// A statement together with the text it was parsed from
///
/// For method bodies `text` is the normalized fragment and `node.span`
/// indexes into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceStatement {
    pub node: Stmt,
    pub text: String,
}

/// Capability tag carried by a class definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Agent,
    Model,
}

/// Recognized marker: `@agent`, `@agent(...)`, `@model`, or a marker base class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub kind: TypeKind,
    pub options: Vec<MarkerOption>,
    /// True when the tag came from an `Agent`/`Model` base class
    pub from_base: bool,
    pub location: SourceLocation,
}

impl Marker {
    /// Keyword option by name
    pub fn option(&self, name: &str) -> Option<&Expr> {
        self.options
            .iter()
            .find(|o| o.name.as_deref() == Some(name))
            .map(|o| &o.value)
    }

    /// Positional arguments in order
    pub fn positional(&self) -> impl Iterator<Item = &Expr> {
        self.options
            .iter()
            .filter(|o| o.name.is_none())
            .map(|o| &o.value)
    }
}

/// One marker argument; `name` is `None` for positional ones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerOption {
    pub name: Option<String>,
    pub value: Expr,
}

/// Decorator that is not a recognized marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decorator {
    pub name: String,
    pub location: SourceLocation,
}

/// Class definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub marker: Option<Marker>,
    pub decorators: Vec<Decorator>,
    /// Base class expressions as written
    pub bases: Vec<String>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    /// Class-level statements that are neither fields nor methods
    pub other_members: Vec<SourceStatement>,
    pub location: SourceLocation,
}

impl TypeDecl {
    pub fn kind(&self) -> Option<TypeKind> {
        self.marker.as_ref().map(|m| m.kind)
    }

    pub fn method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Methods that become behaviors (everything but `__init__`)
    pub fn behaviors(&self) -> impl Iterator<Item = &MethodDecl> {
        self.methods.iter().filter(|m| !m.is_initializer())
    }
}

/// Class-level field: `name: T = default` or `name = default`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub type_hint: Option<String>,
    pub default: Option<Expr>,
    pub default_text: Option<String>,
    pub location: SourceLocation,
}

/// Method definition with its body re-parsed statement by statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    /// Every declared parameter, including the receiver
    pub params: Vec<Param>,
    pub body: Vec<SourceStatement>,
    pub decorators: Vec<String>,
    pub is_async: bool,
    pub location: SourceLocation,
}

impl MethodDecl {
    pub fn is_initializer(&self) -> bool {
        self.name == "__init__"
    }

    /// Parameters after the receiver
    pub fn value_params(&self) -> impl Iterator<Item = &Param> {
        let skip = match self.params.first() {
            Some(p) if p.name == "self" || p.name == "cls" => 1,
            _ => 0,
        };
        self.params.iter().skip(skip)
    }
}
