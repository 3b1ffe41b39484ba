//! Compiler error types

use thiserror::Error;
use xnlogo_core::{Diagnostic, DiagnosticKind, Diagnostics, SourceLocation};
use xnlogo_parser::ParseError;

/// Compiler error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// Source text does not parse
    #[error("Syntax error: {0}")]
    Syntax(#[from] ParseError),

    /// A value-returning exit requested from a behavior that is not a
    /// reporter. Indicates a classification bug, not bad input.
    #[error("Scope conflict: behavior '{behavior}' reports a value but is not a reporter")]
    ScopeConflict {
        behavior: String,
        location: Option<SourceLocation>,
    },
}

impl CompileError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            CompileError::Syntax(err) => err.to_diagnostic(),
            CompileError::ScopeConflict { behavior, location } => {
                let diagnostic = Diagnostic::new(
                    DiagnosticKind::ScopeConflict,
                    format!(
                        "behavior '{}' reports a value but is not classified as a reporter",
                        behavior
                    ),
                );
                match location {
                    Some(location) => diagnostic.with_location(*location),
                    None => diagnostic,
                }
            }
        }
    }
}

/// Compilation stopped on at least one error-severity diagnostic
#[derive(Error, Debug, Clone, PartialEq)]
#[error("compilation failed with {} error(s)", .diagnostics.error_count())]
pub struct CompileFailure {
    /// Everything recorded up to the failure, warnings included
    pub diagnostics: Diagnostics,
}

impl CompileFailure {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self { diagnostics }
    }
}

impl From<CompileError> for CompileFailure {
    fn from(err: CompileError) -> Self {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(err.to_diagnostic());
        Self { diagnostics }
    }
}

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, CompileError>;
