//! Behavioral validation
//!
//! Walks every behavior body and warns about statements that will be passed
//! through untranslated. The walk mirrors the IR builder's: a flagged
//! statement is reported once and its blocks are not visited.

use super::detect::{
    behavior_phase, detect_unsupported, is_inert, is_range_call, reads_name, BehaviorContext,
};
use xnlogo_core::ast::{ParseTree, Stmt, StmtKind};
use xnlogo_core::{Diagnostic, DiagnosticKind, Diagnostics};

/// Run the behavioral pass
pub fn check(tree: &ParseTree) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();

    for decl in tree.type_decls().filter(|d| d.marker.is_some()) {
        for method in decl.behaviors() {
            if method.body.iter().all(|stmt| is_inert(&stmt.node)) {
                diagnostics.warning(
                    DiagnosticKind::EmptyBehavior,
                    format!("behavior '{}.{}' has no statements", decl.name, method.name),
                    Some(method.location),
                );
            }

            let ctx = BehaviorContext::new(behavior_phase(method));
            for stmt in &method.body {
                walk(&stmt.node, ctx, &mut diagnostics);
            }
        }
    }

    diagnostics
}

fn walk(stmt: &Stmt, ctx: BehaviorContext, diagnostics: &mut Diagnostics) {
    if let Some((kind, location)) = detect_unsupported(stmt, ctx) {
        diagnostics.push(Diagnostic::unsupported(kind, location));
        return;
    }

    if let StmtKind::For {
        target, iter, body, ..
    } = &stmt.kind
    {
        if let Some(variable) = target.as_name() {
            if is_range_call(iter) && reads_name(body, variable) {
                diagnostics.warning(
                    DiagnosticKind::UnboundLoopVariable,
                    format!(
                        "loop variable '{}' is read in the body, but a counted loop does not bind it",
                        variable
                    ),
                    Some(stmt.location),
                );
            }
        }
    }

    for block in stmt.blocks() {
        for inner in block {
            walk(inner, ctx, diagnostics);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xnlogo_core::{ConstructKind, SourceLocation};
    use xnlogo_parser::SourceParser;

    fn run(source: &str) -> Diagnostics {
        check(&SourceParser::parse(source).unwrap())
    }

    #[test]
    fn test_try_block_yields_one_warning() {
        let source = r#"@agent
class A:
    def act(self):
        try:
            self.x = 1 / 0
        except ZeroDivisionError:
            raise
"#;
        let diagnostics = run(source);
        assert_eq!(diagnostics.len(), 1);
        let warning = &diagnostics.as_slice()[0];
        assert_eq!(warning.code(), "W100");
        assert_eq!(warning.construct, Some(ConstructKind::TryExcept));
        assert_eq!(warning.location, Some(SourceLocation::new(4, 9)));
    }

    #[test]
    fn test_nested_statements_are_checked() {
        let source = r#"@agent
class A:
    def act(self):
        if self.ready:
            for t in self.neighbors:
                break
        else:
            del self.x
"#;
        let diagnostics = run(source);
        let constructs: Vec<_> = diagnostics.iter().map(|d| d.construct).collect();
        assert_eq!(
            constructs,
            vec![Some(ConstructKind::Break), Some(ConstructKind::Del)]
        );
    }

    #[test]
    fn test_lifecycle_return_value() {
        let source = "@agent\nclass A:\n    def step(self):\n        return 1\n";
        let diagnostics = run(source);
        assert_eq!(
            diagnostics.as_slice()[0].construct,
            Some(ConstructKind::LifecycleReturnValue)
        );
    }

    #[test]
    fn test_unbound_loop_variable() {
        let source = r#"@agent
class A:
    def act(self):
        for i in range(3):
            self.total += i
        for _ in range(3):
            self.total += 1
"#;
        let diagnostics = run(source);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.as_slice()[0].code(), "W105");
    }

    #[test]
    fn test_empty_behavior() {
        let source = "@agent\nclass A:\n    def act(self):\n        \"\"\"Nothing yet.\"\"\"\n        pass\n";
        let diagnostics = run(source);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.as_slice()[0].code(), "W106");
    }

    #[test]
    fn test_pass_is_idempotent() {
        let source = r#"@agent
class A:
    def act(self):
        with open("f") as f:
            pass
        x = lambda: 1
        yield x
"#;
        let tree = SourceParser::parse(source).unwrap();
        let first = check(&tree);
        let second = check(&tree);
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_unmarked_classes_are_skipped() {
        assert!(run("class Helper:\n    def f(self):\n        try:\n            pass\n        finally:\n            pass\n").is_empty());
    }
}
