//! Main compiler
//!
//! Runs the stages in order: parse, validate, build the IR, translate
//! behaviors, assemble. Every stage is a pure function of its input, so one
//! `Compiler` can be shared across threads.

use crate::codegen::{render_document, translate_model, Attachments, ContainerFormat, ProgramAssembler};
use crate::error::{CompileError, CompileFailure};
use crate::lower::IrBuilder;
use crate::semantic::SemanticValidator;
use serde::Serialize;
use xnlogo_core::ast::ParseTree;
use xnlogo_core::ir::ModelSpec;
use xnlogo_core::Diagnostics;
use xnlogo_parser::SourceParser;

/// Compiler options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Treat every warning as an error
    pub strict: bool,
}

/// Output of a successful compilation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledProgram {
    /// NetLogo program text
    pub code: String,
    pub model: ModelSpec,
    /// Warnings recorded along the way
    pub diagnostics: Diagnostics,
}

impl CompiledProgram {
    /// Model file containing the program
    pub fn render(&self, attachments: &Attachments, format: ContainerFormat) -> String {
        render_document(&self.code, attachments, format)
    }
}

/// The xnlogo compiler
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompilerOptions,
    validator: SemanticValidator,
    builder: IrBuilder,
    assembler: ProgramAssembler,
}

impl Compiler {
    /// Create a new compiler instance with default options
    pub fn new() -> Self {
        Self::with_options(CompilerOptions::default())
    }

    /// Create a new compiler instance with custom options
    pub fn with_options(options: CompilerOptions) -> Self {
        Self {
            options,
            validator: SemanticValidator::new(),
            builder: IrBuilder::new(),
            assembler: ProgramAssembler::new(),
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Check a source file without generating code
    pub fn validate(&self, source: &str) -> Diagnostics {
        match SourceParser::parse(source) {
            Ok(tree) => self.diagnose(&tree),
            Err(err) => {
                let mut diagnostics = Diagnostics::new();
                diagnostics.push(err.to_diagnostic());
                diagnostics
            }
        }
    }

    /// Parse, validate and lower a source file
    pub fn build_model(&self, source: &str) -> Result<(ModelSpec, Diagnostics), CompileFailure> {
        let tree = SourceParser::parse(source).map_err(CompileError::from)?;

        let diagnostics = self.diagnose(&tree);
        if diagnostics.has_errors() {
            log::debug!(
                "validation failed with {} error(s)",
                diagnostics.error_count()
            );
            return Err(CompileFailure::new(diagnostics));
        }

        let model = self.builder.build(&tree);
        log::debug!(
            "built model with {} agent(s), {} global(s)",
            model.agents.len(),
            model.globals.len()
        );
        Ok((model, diagnostics))
    }

    /// Compile a source file to NetLogo program text
    pub fn compile(&self, source: &str) -> Result<CompiledProgram, CompileFailure> {
        let (model, diagnostics) = self.build_model(source)?;

        let behaviors = match translate_model(&model) {
            Ok(behaviors) => behaviors,
            Err(err) => {
                let mut diagnostics = diagnostics;
                diagnostics.push(err.to_diagnostic());
                return Err(CompileFailure::new(diagnostics));
            }
        };

        let code = self.assembler.assemble(&model, &behaviors);
        Ok(CompiledProgram {
            code,
            model,
            diagnostics,
        })
    }

    fn diagnose(&self, tree: &ParseTree) -> Diagnostics {
        let diagnostics = self.validator.validate(tree);
        if self.options.strict {
            diagnostics.promote_warnings()
        } else {
            diagnostics
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNTER: &str = "@agent\nclass Counter:\n    count: int = 0\n\n    def step(self):\n        self.count += 1\n";

    #[test]
    fn test_compiler_compile() {
        let compiler = Compiler::new();
        let program = compiler.compile(COUNTER).unwrap();

        assert!(program.diagnostics.is_empty());
        assert!(program.code.contains("turtles-own [count]"));
        assert!(program.code.contains("set count (count + 1)"));
        assert_eq!(program.model.agents.len(), 1);
    }

    #[test]
    fn test_compiler_syntax_error() {
        let compiler = Compiler::new();
        let failure = compiler.compile("@agent\nclass A\n").unwrap_err();
        assert_eq!(failure.diagnostics.len(), 1);
        assert_eq!(failure.diagnostics.as_slice()[0].code(), "E001");

        let diagnostics = compiler.validate("@agent\nclass A\n");
        assert_eq!(diagnostics, failure.diagnostics);
    }

    #[test]
    fn test_compiler_strict_mode() {
        let source = "@agent\nclass A:\n    def act(self):\n        try:\n            pass\n        finally:\n            pass\n";

        let lenient = Compiler::new().compile(source).unwrap();
        assert_eq!(lenient.diagnostics.warning_count(), 1);

        let strict = Compiler::with_options(CompilerOptions { strict: true });
        let failure = strict.compile(source).unwrap_err();
        assert_eq!(failure.diagnostics.error_count(), 1);
        assert_eq!(failure.diagnostics.as_slice()[0].code(), "W100");
    }

    #[test]
    fn test_compiler_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Compiler>();
    }

    #[test]
    fn test_compiled_program_render() {
        let program = Compiler::new().compile(COUNTER).unwrap();
        let doc = program.render(&Attachments::default(), ContainerFormat::Nlogox);
        assert!(doc.contains("<code><![CDATA[turtles-own [count]"));
    }
}
