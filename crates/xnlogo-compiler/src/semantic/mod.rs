//! Semantic validation
//!
//! Two passes over the parse tree, both returning an explicit diagnostic
//! list:
//! - structural: declarations, markers and the shape of classes (errors)
//! - behavioral: statements with no NetLogo counterpart (warnings)
//!
//! Construct detection lives in [`detect`] and is shared with the IR
//! builder.

pub mod behavioral;
pub mod declarations;
pub mod detect;
pub mod structural;

use xnlogo_core::ast::ParseTree;
use xnlogo_core::Diagnostics;

pub use detect::{behavior_phase, detect_unsupported, BehaviorContext};

/// Semantic validator
#[derive(Debug, Clone, Copy, Default)]
pub struct SemanticValidator;

impl SemanticValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self
    }

    /// Structural pass followed by the behavioral pass
    pub fn validate(&self, tree: &ParseTree) -> Diagnostics {
        let mut diagnostics = self.structural(tree);
        diagnostics.extend(self.behavioral(tree));
        log::debug!(
            "validation finished: {} error(s), {} warning(s)",
            diagnostics.error_count(),
            diagnostics.warning_count()
        );
        diagnostics
    }

    pub fn structural(&self, tree: &ParseTree) -> Diagnostics {
        structural::check(tree)
    }

    pub fn behavioral(&self, tree: &ParseTree) -> Diagnostics {
        behavioral::check(tree)
    }
}
