//! Parser error types

use thiserror::Error;
use xnlogo_core::{Diagnostic, DiagnosticKind, SourceLocation};

/// Parser error
///
/// Every variant carries the position of the offending input. A source file
/// produces at most one of these: parsing stops at the first problem.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Grammar violation
    #[error("{message} at {location}")]
    Syntax {
        message: String,
        location: SourceLocation,
    },

    /// Dedent to a column that no enclosing block uses
    #[error("unindent does not match any outer indentation level at {location}")]
    InconsistentDedent { location: SourceLocation },

    #[error("unterminated string literal at {location}")]
    UnterminatedString { location: SourceLocation },

    #[error("unexpected character '{ch}' at {location}")]
    UnexpectedCharacter { ch: char, location: SourceLocation },

    #[error("invalid number literal '{text}' at {location}")]
    InvalidNumber {
        text: String,
        location: SourceLocation,
    },

    /// Input ended inside a bracket or block
    #[error("unexpected end of input at {location}")]
    UnexpectedEof { location: SourceLocation },
}

impl ParseError {
    pub fn syntax(message: impl Into<String>, location: SourceLocation) -> Self {
        ParseError::Syntax {
            message: message.into(),
            location,
        }
    }

    pub fn location(&self) -> SourceLocation {
        match self {
            ParseError::Syntax { location, .. }
            | ParseError::InconsistentDedent { location }
            | ParseError::UnterminatedString { location }
            | ParseError::UnexpectedCharacter { location, .. }
            | ParseError::InvalidNumber { location, .. }
            | ParseError::UnexpectedEof { location } => *location,
        }
    }

    /// Fatal syntax diagnostic for this error
    pub fn to_diagnostic(&self) -> Diagnostic {
        let message = match self {
            ParseError::Syntax { message, .. } => message.clone(),
            ParseError::InconsistentDedent { .. } => {
                "unindent does not match any outer indentation level".to_string()
            }
            ParseError::UnterminatedString { .. } => "unterminated string literal".to_string(),
            ParseError::UnexpectedCharacter { ch, .. } => format!("unexpected character '{}'", ch),
            ParseError::InvalidNumber { text, .. } => format!("invalid number literal '{}'", text),
            ParseError::UnexpectedEof { .. } => "unexpected end of input".to_string(),
        };
        Diagnostic::new(DiagnosticKind::Syntax, message).with_location(self.location())
    }
}

/// Result type for parser operations
pub type Result<T> = std::result::Result<T, ParseError>;
