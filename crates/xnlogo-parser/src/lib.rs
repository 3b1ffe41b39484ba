//! xnlogo parser - Python-subset source to a structural parse tree
//!
//! The parser accepts the full statement and expression grammar of the
//! source language so that constructs the compiler cannot translate are
//! reported with positions rather than as syntax errors.

pub mod error;
pub mod lexer;
pub mod normalize;
pub mod parser;
pub mod source_parser;

// Re-export main parser types
pub use error::{ParseError, Result};
pub use lexer::{Lexer, StringKind, Token, TokenKind};
pub use normalize::{normalize_indentation, LineMap, Normalized};
pub use parser::{parse_fragment, parse_module};
pub use source_parser::SourceParser;
