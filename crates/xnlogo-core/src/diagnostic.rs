//! Diagnostics produced while compiling a model
//!
//! Every stage after parsing reports problems by appending to a
//! [`Diagnostics`] value that is handed back to the caller. Nothing here is
//! global: each compilation owns its own accumulator.

use crate::location::SourceLocation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Stable classification of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Source text does not parse
    Syntax,
    /// No agent definition and no model-level setup/step behavior
    NoCompilableUnit,
    DuplicateBehavior,
    DuplicateAgent,
    /// Field declaration or class member that cannot become state
    MalformedDeclaration,
    /// Bare statement at module level
    UnsupportedTopLevel,
    MultipleModels,
    UnrecognizedDecorator,
    MultipleInheritance,
    /// Marker argument of the wrong shape, e.g. `@agent(breed=3)`
    MalformedMarkerOption,
    /// Value-returning exit requested from a command procedure
    ScopeConflict,

    UnsupportedConstruct,
    UnmarkedClass,
    MissingBehaviors,
    DuplicateGlobal,
    InitializerStatement,
    UnboundLoopVariable,
    EmptyBehavior,
}

impl DiagnosticKind {
    /// Code printed alongside the message (e.g. "E101", "W100")
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::Syntax => "E001",
            DiagnosticKind::NoCompilableUnit => "E100",
            DiagnosticKind::DuplicateBehavior => "E101",
            DiagnosticKind::DuplicateAgent => "E102",
            DiagnosticKind::MalformedDeclaration => "E103",
            DiagnosticKind::UnsupportedTopLevel => "E104",
            DiagnosticKind::MultipleModels => "E105",
            DiagnosticKind::UnrecognizedDecorator => "E106",
            DiagnosticKind::MultipleInheritance => "E107",
            DiagnosticKind::MalformedMarkerOption => "E108",
            DiagnosticKind::ScopeConflict => "E200",
            DiagnosticKind::UnsupportedConstruct => "W100",
            DiagnosticKind::UnmarkedClass => "W101",
            DiagnosticKind::MissingBehaviors => "W102",
            DiagnosticKind::DuplicateGlobal => "W103",
            DiagnosticKind::InitializerStatement => "W104",
            DiagnosticKind::UnboundLoopVariable => "W105",
            DiagnosticKind::EmptyBehavior => "W106",
        }
    }

    /// Severity the kind is reported with before strict-mode promotion
    pub fn default_severity(&self) -> Severity {
        if self.code().starts_with('E') {
            Severity::Error
        } else {
            Severity::Warning
        }
    }
}

/// Source construct that has no NetLogo counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructKind {
    TryExcept,
    Raise,
    Assert,
    Lambda,
    Yield,
    AsyncFunction,
    AsyncFor,
    AsyncWith,
    Await,
    With,
    Import,
    NestedClass,
    NestedFunction,
    MultiTargetAssignment,
    TupleAssignment,
    DictLiteral,
    DictComprehension,
    SetLiteral,
    SetComprehension,
    GeneratorExpression,
    ComplexComprehension,
    FString,
    Starred,
    Walrus,
    Del,
    GlobalDeclaration,
    Break,
    Continue,
    LoopElse,
    BitwiseOperator,
    /// `items[a:b:step]`
    SliceStep,
    /// `return value` inside `setup` or `step`
    LifecycleReturnValue,
    /// bare `return` inside a value-returning behavior
    ReporterBareReturn,
    /// `return` inside a loop over agents or list items
    LoopBlockReturn,
}

impl ConstructKind {
    /// Short human-readable name, also used in passthrough markers
    pub fn name(&self) -> &'static str {
        match self {
            ConstructKind::TryExcept => "try/except",
            ConstructKind::Raise => "raise",
            ConstructKind::Assert => "assert",
            ConstructKind::Lambda => "lambda",
            ConstructKind::Yield => "yield",
            ConstructKind::AsyncFunction => "async def",
            ConstructKind::AsyncFor => "async for",
            ConstructKind::AsyncWith => "async with",
            ConstructKind::Await => "await",
            ConstructKind::With => "with",
            ConstructKind::Import => "import",
            ConstructKind::NestedClass => "nested class",
            ConstructKind::NestedFunction => "nested function",
            ConstructKind::MultiTargetAssignment => "multi-target assignment",
            ConstructKind::TupleAssignment => "tuple assignment",
            ConstructKind::DictLiteral => "dict literal",
            ConstructKind::DictComprehension => "dict comprehension",
            ConstructKind::SetLiteral => "set literal",
            ConstructKind::SetComprehension => "set comprehension",
            ConstructKind::GeneratorExpression => "generator expression",
            ConstructKind::ComplexComprehension => "complex comprehension",
            ConstructKind::FString => "f-string",
            ConstructKind::Starred => "starred expression",
            ConstructKind::Walrus => "assignment expression",
            ConstructKind::Del => "del",
            ConstructKind::GlobalDeclaration => "global/nonlocal",
            ConstructKind::Break => "break",
            ConstructKind::Continue => "continue",
            ConstructKind::LoopElse => "loop else",
            ConstructKind::BitwiseOperator => "bitwise operator",
            ConstructKind::SliceStep => "slice step",
            ConstructKind::LifecycleReturnValue => "return value in lifecycle behavior",
            ConstructKind::ReporterBareReturn => "bare return in reporter",
            ConstructKind::LoopBlockReturn => "return inside ask/foreach loop",
        }
    }
}

impl fmt::Display for ConstructKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single diagnostic message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,

    pub kind: DiagnosticKind,

    /// Human-readable message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,

    /// Offending construct, for unsupported-construct warnings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub construct: Option<ConstructKind>,
}

impl Diagnostic {
    /// Create a diagnostic with the kind's default severity
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: kind.default_severity(),
            kind,
            message: message.into(),
            location: None,
            construct: None,
        }
    }

    /// Warning for a construct with no translation
    pub fn unsupported(construct: ConstructKind, location: SourceLocation) -> Self {
        Self::new(
            DiagnosticKind::UnsupportedConstruct,
            format!(
                "unsupported construct '{}' is passed through as a comment",
                construct
            ),
        )
        .with_location(location)
        .with_construct(construct)
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_construct(mut self, construct: ConstructKind) -> Self {
        self.construct = Some(construct);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.severity, self.code())?;
        if let Some(location) = self.location {
            write!(f, " {}", location)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Ordered, append-only list of diagnostics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        log::debug!("diagnostic recorded: {}", diagnostic);
        self.items.push(diagnostic);
    }

    /// Record an error-severity diagnostic
    pub fn error(
        &mut self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        location: Option<SourceLocation>,
    ) {
        let mut diagnostic = Diagnostic::new(kind, message);
        diagnostic.severity = Severity::Error;
        diagnostic.location = location;
        self.push(diagnostic);
    }

    /// Record a warning-severity diagnostic
    pub fn warning(
        &mut self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        location: Option<SourceLocation>,
    ) {
        let mut diagnostic = Diagnostic::new(kind, message);
        diagnostic.severity = Severity::Warning;
        diagnostic.location = location;
        self.push(diagnostic);
    }

    /// Append every diagnostic of `other`, keeping order
    pub fn extend(&mut self, other: Diagnostics) {
        for diagnostic in other.items {
            self.push(diagnostic);
        }
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.items.len() - self.error_count()
    }

    /// Strict mode: every warning becomes an error
    pub fn promote_warnings(mut self) -> Self {
        for diagnostic in &mut self.items {
            diagnostic.severity = Severity::Error;
        }
        self
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| !d.is_error())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl From<Vec<Diagnostic>> for Diagnostics {
    fn from(items: Vec<Diagnostic>) -> Self {
        Self { items }
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.items {
            writeln!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}
