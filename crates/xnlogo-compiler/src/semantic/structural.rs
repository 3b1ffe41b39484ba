//! Structural validation
//!
//! Checks the shape of the declarations: which classes take part, how they
//! are marked, and whether their members can become state and behaviors.
//! Reports every problem it finds rather than stopping at the first.

use super::declarations::{
    breed_option, global_candidates, initializer_assignments, marker_errors,
};
use super::detect::behavior_phase;
use std::collections::{HashMap, HashSet};
use xnlogo_core::ast::{ParseTree, TopLevelItem, TypeDecl, TypeKind};
use xnlogo_core::{DiagnosticKind, Diagnostics, SourceLocation};

/// Run the structural pass
pub fn check(tree: &ParseTree) -> Diagnostics {
    let mut checker = StructuralChecker::default();

    for item in &tree.items {
        match item {
            TopLevelItem::Statement(stmt) => {
                let first_line = stmt.text.lines().next().unwrap_or_default();
                checker.diagnostics.error(
                    DiagnosticKind::UnsupportedTopLevel,
                    format!("statement at module level is not supported: `{}`", first_line),
                    Some(stmt.node.location),
                );
            }
            TopLevelItem::Type(decl) => checker.check_type(decl),
            TopLevelItem::Function { .. } | TopLevelItem::Import { .. } => {}
            TopLevelItem::Docstring(_) => {}
        }
    }

    checker.check_globals(tree);
    checker.check_compilable(tree);
    checker.diagnostics
}

#[derive(Default)]
struct StructuralChecker<'a> {
    diagnostics: Diagnostics,
    agents: HashMap<&'a str, SourceLocation>,
    breeds: HashMap<String, &'a str>,
    model: Option<&'a str>,
}

impl<'a> StructuralChecker<'a> {
    fn check_type(&mut self, decl: &'a TypeDecl) {
        let Some(marker) = &decl.marker else {
            self.diagnostics.warning(
                DiagnosticKind::UnmarkedClass,
                format!(
                    "class '{}' has no @agent or @model marker and is ignored",
                    decl.name
                ),
                Some(decl.location),
            );
            return;
        };

        for decorator in &decl.decorators {
            self.diagnostics.error(
                DiagnosticKind::UnrecognizedDecorator,
                format!("unrecognized decorator '@{}' on '{}'", decorator.name, decl.name),
                Some(decorator.location),
            );
        }

        if decl.bases.len() > 1 {
            self.diagnostics.error(
                DiagnosticKind::MultipleInheritance,
                format!(
                    "'{}' inherits from {} classes; at most one base is supported",
                    decl.name,
                    decl.bases.len()
                ),
                Some(decl.location),
            );
        }

        for err in marker_errors(marker) {
            self.diagnostics.error(
                DiagnosticKind::MalformedMarkerOption,
                format!("{} on '{}'", err.message, decl.name),
                Some(err.location),
            );
        }

        match marker.kind {
            TypeKind::Model => self.register_model(decl),
            TypeKind::Agent => self.register_agent(decl),
        }

        self.check_members(decl);
    }

    fn register_model(&mut self, decl: &'a TypeDecl) {
        match self.model {
            Some(first) => self.diagnostics.error(
                DiagnosticKind::MultipleModels,
                format!(
                    "model '{}' is declared after model '{}'; only one model is allowed",
                    decl.name, first
                ),
                Some(decl.location),
            ),
            None => self.model = Some(&decl.name),
        }
    }

    fn register_agent(&mut self, decl: &'a TypeDecl) {
        if let Some(first) = self.agents.get(decl.name.as_str()) {
            self.diagnostics.error(
                DiagnosticKind::DuplicateAgent,
                format!(
                    "agent '{}' is already defined at line {}",
                    decl.name, first.line
                ),
                Some(decl.location),
            );
            return;
        }
        self.agents.insert(&decl.name, decl.location);

        let breed = decl
            .marker
            .as_ref()
            .and_then(breed_option)
            .map(|b| b.to_breed_name(&decl.name).plural);
        if let Some(plural) = breed {
            match self.breeds.get(&plural) {
                Some(owner) => self.diagnostics.error(
                    DiagnosticKind::DuplicateAgent,
                    format!(
                        "breed '{}' of '{}' is already used by '{}'",
                        plural, decl.name, owner
                    ),
                    Some(decl.location),
                ),
                None => {
                    self.breeds.insert(plural, &decl.name);
                }
            }
        }
    }

    fn check_members(&mut self, decl: &TypeDecl) {
        for member in &decl.other_members {
            let first_line = member.text.lines().next().unwrap_or_default();
            self.diagnostics.error(
                DiagnosticKind::MalformedDeclaration,
                format!(
                    "'{}' member `{}` is neither a field nor a method",
                    decl.name, first_line
                ),
                Some(member.node.location),
            );
        }

        let mut seen = HashSet::new();
        for method in &decl.methods {
            if !seen.insert(method.name.as_str()) {
                self.diagnostics.error(
                    DiagnosticKind::DuplicateBehavior,
                    format!("'{}' defines '{}' more than once", decl.name, method.name),
                    Some(method.location),
                );
            }
        }

        if decl.behaviors().next().is_none() {
            self.diagnostics.warning(
                DiagnosticKind::MissingBehaviors,
                format!("'{}' defines no behaviors", decl.name),
                Some(decl.location),
            );
        }

        if let Some(init) = decl.method("__init__") {
            let (_, others) = initializer_assignments(init);
            for stmt in others {
                self.diagnostics.warning(
                    DiagnosticKind::InitializerStatement,
                    format!(
                        "only `self.<name> = <value>` is kept from '{}.__init__'",
                        decl.name
                    ),
                    Some(stmt.node.location),
                );
            }
        }
    }

    fn check_globals(&mut self, tree: &ParseTree) {
        let mut seen = HashSet::new();
        for candidate in global_candidates(tree) {
            if !seen.insert(candidate.name.clone()) {
                self.diagnostics.warning(
                    DiagnosticKind::DuplicateGlobal,
                    format!(
                        "global '{}' is declared more than once; the first declaration is kept",
                        candidate.name
                    ),
                    Some(candidate.location),
                );
            }
        }
    }

    fn check_compilable(&mut self, tree: &ParseTree) {
        let has_agent = tree.agents().next().is_some();
        let has_lifecycle = tree
            .models()
            .flat_map(|model| model.behaviors())
            .any(|method| behavior_phase(method).is_lifecycle());

        if !has_agent && !has_lifecycle {
            self.diagnostics.error(
                DiagnosticKind::NoCompilableUnit,
                "nothing to compile: no @agent class and no model-level setup or step",
                None,
            );
        }
    }
}
