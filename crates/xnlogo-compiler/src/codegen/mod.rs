//! Code generation
//!
//! Turns the IR into NetLogo program text and wraps it in a model file.

pub mod assembler;
pub mod document;
pub mod expression;
pub mod translator;

pub use assembler::ProgramAssembler;
pub use document::{render_document, Attachments, ContainerFormat, UnknownFormat};
pub use expression::{AgentContext, ExpressionTranslator};
pub use translator::{translate_model, StatementTranslator, TranslatedBehavior};
