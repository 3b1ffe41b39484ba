//! Source parser
//!
//! Turns a source file into the structural [`ParseTree`]: classes with their
//! markers, fields and methods, plus whatever else sits at module level.
//! Method bodies are cut out of the file statement by statement, dedented,
//! and parsed again so every body statement carries its own source text.

use crate::error::{ParseError, Result};
use crate::normalize::{normalize_indentation, LineMap};
use crate::parser::{parse_fragment, parse_module};
use xnlogo_core::ast::{
    ClassDef, Constant, Decorator, Expr, ExprKind, FieldDecl, FunctionDef, Marker, MarkerOption,
    MethodDecl, ParseTree, SourceStatement, Stmt, StmtKind, TopLevelItem, TypeDecl, TypeKind,
};
use xnlogo_core::SourceLocation;

/// Source file parser
pub struct SourceParser;

impl SourceParser {
    /// Parse a whole source file
    pub fn parse(source: &str) -> Result<ParseTree> {
        let statements = parse_module(source)?;
        let mut items = Vec::with_capacity(statements.len());

        for stmt in &statements {
            match &stmt.kind {
                StmtKind::Expr(expr) if expr.as_str().is_some() => {
                    items.push(TopLevelItem::Docstring(
                        expr.as_str().unwrap_or_default().to_string(),
                    ));
                }
                StmtKind::Import(names) => {
                    items.extend(names.iter().map(|alias| TopLevelItem::Import {
                        module: alias.name.clone(),
                        location: stmt.location,
                    }));
                }
                StmtKind::ImportFrom { module, level, .. } => {
                    let mut path = ".".repeat(*level);
                    path.push_str(module.as_deref().unwrap_or_default());
                    items.push(TopLevelItem::Import {
                        module: path,
                        location: stmt.location,
                    });
                }
                StmtKind::FunctionDef(def) => items.push(TopLevelItem::Function {
                    name: def.name.clone(),
                    location: stmt.location,
                }),
                StmtKind::ClassDef(def) => {
                    items.push(TopLevelItem::Type(Self::parse_type(source, stmt, def)?))
                }
                _ => items.push(TopLevelItem::Statement(extract_statement(source, stmt)?)),
            }
        }

        log::debug!("parsed {} top-level items", items.len());
        Ok(ParseTree { items })
    }

    fn parse_type(source: &str, stmt: &Stmt, def: &ClassDef) -> Result<TypeDecl> {
        let mut marker = None;
        let mut decorators = Vec::new();

        for decorator in &def.decorators {
            let callee = match &decorator.kind {
                ExprKind::Call { func, .. } => func.as_ref(),
                _ => decorator,
            };
            let name = expr_name(source, callee);
            let kind = match last_segment(&name) {
                "agent" => Some(TypeKind::Agent),
                "model" => Some(TypeKind::Model),
                _ => None,
            };
            match kind {
                Some(kind) if marker.is_none() => {
                    marker = Some(Marker {
                        kind,
                        options: marker_options(decorator),
                        from_base: false,
                        location: decorator.location,
                    });
                }
                _ => decorators.push(Decorator {
                    name,
                    location: decorator.location,
                }),
            }
        }

        if marker.is_none() {
            marker = def.bases.iter().find_map(|base| {
                let kind = match last_segment(&expr_name(source, base)) {
                    "Agent" => TypeKind::Agent,
                    "Model" => TypeKind::Model,
                    _ => return None,
                };
                Some(Marker {
                    kind,
                    options: Vec::new(),
                    from_base: true,
                    location: base.location,
                })
            });
        }

        let mut decl = TypeDecl {
            name: def.name.clone(),
            marker,
            decorators,
            bases: def
                .bases
                .iter()
                .map(|b| b.span.slice(source).to_string())
                .collect(),
            fields: Vec::new(),
            methods: Vec::new(),
            other_members: Vec::new(),
            location: stmt.location,
        };

        for member in &def.body {
            match &member.kind {
                StmtKind::Pass => {}
                StmtKind::Expr(expr) if is_inert(expr) => {}
                StmtKind::AnnAssign {
                    target,
                    annotation,
                    value,
                } if target.as_name().is_some() => decl.fields.push(FieldDecl {
                    name: target.as_name().unwrap_or_default().to_string(),
                    type_hint: Some(annotation.span.slice(source).to_string()),
                    default: value.clone(),
                    default_text: value.as_ref().map(|v| v.span.slice(source).to_string()),
                    location: member.location,
                }),
                StmtKind::Assign { targets, value }
                    if targets.len() == 1 && targets[0].as_name().is_some() =>
                {
                    decl.fields.push(FieldDecl {
                        name: targets[0].as_name().unwrap_or_default().to_string(),
                        type_hint: None,
                        default: Some(value.clone()),
                        default_text: Some(value.span.slice(source).to_string()),
                        location: member.location,
                    })
                }
                StmtKind::FunctionDef(function) => decl
                    .methods
                    .push(Self::parse_method(source, member, function)?),
                _ => decl.other_members.push(extract_statement(source, member)?),
            }
        }

        Ok(decl)
    }

    fn parse_method(source: &str, stmt: &Stmt, def: &FunctionDef) -> Result<MethodDecl> {
        let body = def
            .body
            .iter()
            .map(|s| extract_statement(source, s))
            .collect::<Result<Vec<_>>>()?;

        Ok(MethodDecl {
            name: def.name.clone(),
            params: def.params.clone(),
            body,
            decorators: def
                .decorators
                .iter()
                .map(|d| match &d.kind {
                    ExprKind::Call { func, .. } => expr_name(source, func),
                    _ => expr_name(source, d),
                })
                .collect(),
            is_async: def.is_async,
            location: stmt.location,
        })
    }
}

/// Cut a statement out of `source`, dedent it and parse it on its own
fn extract_statement(source: &str, stmt: &Stmt) -> Result<SourceStatement> {
    let raw = stmt.span.slice(source);
    let origin = position_of(source, stmt.span.start);
    let normalized = normalize_indentation(raw, origin.column - 1);
    let line_map = LineMap::new(origin, normalized.stripped.clone());

    let node = parse_fragment(&normalized.text, line_map)?
        .into_iter()
        .next()
        .ok_or_else(|| ParseError::syntax("expected a statement", origin))?;

    Ok(SourceStatement {
        node,
        text: normalized.text,
    })
}

/// 1-based line and character column of a byte offset
fn position_of(source: &str, offset: usize) -> SourceLocation {
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    SourceLocation::new(line, column)
}

fn expr_name(source: &str, expr: &Expr) -> String {
    expr.dotted_name()
        .unwrap_or_else(|| expr.span.slice(source).to_string())
}

fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Decorator call arguments as marker options. A `**mapping` argument is
/// kept as a starred positional so validation can reject it.
fn marker_options(decorator: &Expr) -> Vec<MarkerOption> {
    let ExprKind::Call { args, keywords, .. } = &decorator.kind else {
        return Vec::new();
    };
    let mut options: Vec<MarkerOption> = args
        .iter()
        .map(|value| MarkerOption {
            name: None,
            value: value.clone(),
        })
        .collect();
    for keyword in keywords {
        let option = match &keyword.arg {
            Some(name) => MarkerOption {
                name: Some(name.clone()),
                value: keyword.value.clone(),
            },
            None => MarkerOption {
                name: None,
                value: Expr::new(
                    ExprKind::Starred(Box::new(keyword.value.clone())),
                    keyword.value.location,
                    keyword.value.span,
                ),
            },
        };
        options.push(option);
    }
    options
}

/// Docstrings and `...` placeholders in a class body
fn is_inert(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Constant(Constant::Str(_)) | ExprKind::Constant(Constant::Ellipsis)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use xnlogo_core::Span;

    #[test]
    fn test_position_of() {
        let source = "ab\ncdé\nf";
        assert_eq!(position_of(source, 0), SourceLocation::new(1, 1));
        assert_eq!(position_of(source, 4), SourceLocation::new(2, 2));
        assert_eq!(position_of(source, 8), SourceLocation::new(3, 1));
    }

    #[test]
    fn test_extract_statement_dedents_and_maps() {
        let source = "class A:\n    def f(self):\n        if self.x:\n            self.x = 0\n";
        let tree = SourceParser::parse(source).unwrap();
        let decl = tree.type_decls().next().unwrap();
        let stmt = &decl.methods[0].body[0];

        assert_eq!(stmt.text, "if self.x:\n    self.x = 0");
        assert_eq!(stmt.node.location, SourceLocation::new(3, 9));
        assert_eq!(stmt.node.span, Span::new(0, stmt.text.len()));
        match &stmt.node.kind {
            StmtKind::If { body, .. } => {
                assert_eq!(body[0].location, SourceLocation::new(4, 13));
                assert_eq!(body[0].span.slice(&stmt.text), "self.x = 0");
            }
            other => panic!("Expected If, got {:?}", other),
        }
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("xnlogo.agent"), "agent");
        assert_eq!(last_segment("model"), "model");
    }
}
