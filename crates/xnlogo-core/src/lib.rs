//! xnlogo Core - shared types for the Python-to-NetLogo compiler
//!
//! This crate provides the data structures passed between compiler stages:
//! - Source locations
//! - Syntax tree produced by the parser (`ast`)
//! - Backend-agnostic intermediate representation (`ir`)
//! - Diagnostics collected by validation

pub mod ast;
pub mod diagnostic;
pub mod ir;
pub mod location;

// Re-export commonly used types
pub use diagnostic::{ConstructKind, Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use location::{SourceLocation, Span};
