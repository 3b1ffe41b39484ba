//! xnlogo Compiler - Python-subset models to NetLogo programs
//!
//! Validates a parse tree, lowers it into the IR and generates NetLogo code.

pub mod codegen;
pub mod compiler;
pub mod error;
pub mod lower;
pub mod semantic;

// Re-export main types
pub use compiler::{CompiledProgram, Compiler, CompilerOptions};
pub use error::{CompileError, CompileFailure, Result};

pub use codegen::{
    render_document, translate_model, Attachments, ContainerFormat, ProgramAssembler,
    StatementTranslator, TranslatedBehavior,
};
pub use lower::IrBuilder;
pub use semantic::SemanticValidator;
