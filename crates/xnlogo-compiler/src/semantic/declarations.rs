//! Declarations shared by validation and lowering
//!
//! Marker options, initializer assignments and global candidates are read
//! the same way by the structural pass (which reports malformed shapes) and
//! by the IR builder (which trusts a validated tree and skips anything it
//! cannot read).

use thiserror::Error;
use xnlogo_core::ast::{
    Constant, Expr, ExprKind, Marker, MethodDecl, ParseTree, SourceStatement, StmtKind, TypeKind,
};
use xnlogo_core::ir::BreedName;
use xnlogo_core::SourceLocation;

/// Options accepted by `@agent(...)`
const AGENT_OPTIONS: &[&str] = &["breed", "state", "globals", "patches", "count"];

/// Options accepted by `@model(...)`
const MODEL_OPTIONS: &[&str] = &["globals", "patches", "seed"];

/// Marker argument that cannot be interpreted
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct MarkerOptionError {
    pub message: String,
    pub location: SourceLocation,
}

impl MarkerOptionError {
    fn new(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }
}

/// `breed=` in either of its accepted shapes
#[derive(Debug, Clone, PartialEq)]
pub enum BreedOption {
    Plural(String),
    Pair(String, String),
}

impl BreedOption {
    pub fn to_breed_name(&self, identifier: &str) -> BreedName {
        match self {
            BreedOption::Plural(plural) => BreedName::new(plural.clone(), identifier),
            BreedOption::Pair(plural, singular) => {
                BreedName::explicit(plural.clone(), singular.clone())
            }
        }
    }
}

/// Name declared through a `state=`, `globals=` or `patches=` option
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredName {
    pub name: String,
    pub type_hint: Option<String>,
}

/// `self.name = value` found in `__init__`
#[derive(Debug, Clone)]
pub struct InitAssignment<'a> {
    pub name: &'a str,
    pub type_hint: Option<String>,
    pub value: Option<&'a Expr>,
    /// Source text of the value
    pub value_text: Option<String>,
    pub location: SourceLocation,
}

/// Global variable candidate, in declaration order
#[derive(Debug, Clone)]
pub struct GlobalCandidate<'a> {
    pub name: String,
    pub type_hint: Option<String>,
    pub default: Option<&'a Expr>,
    pub default_text: Option<String>,
    pub location: SourceLocation,
}

/// Every problem with the marker's arguments, in argument order
pub fn marker_errors(marker: &Marker) -> Vec<MarkerOptionError> {
    let mut errors = Vec::new();
    let allowed = match marker.kind {
        TypeKind::Agent => AGENT_OPTIONS,
        TypeKind::Model => MODEL_OPTIONS,
    };
    let mut seen: Vec<&str> = Vec::new();

    for (index, option) in marker.options.iter().enumerate() {
        let value = &option.value;
        if matches!(value.kind, ExprKind::Starred(_)) {
            errors.push(MarkerOptionError::new(
                "unpacked marker arguments are not supported",
                value.location,
            ));
            continue;
        }

        let name = match option.name.as_deref() {
            Some(name) => name,
            // Only the first argument of `@agent("plural")` may be positional
            None if index == 0 && marker.kind == TypeKind::Agent => "breed",
            None => {
                errors.push(MarkerOptionError::new(
                    "unexpected positional marker argument",
                    value.location,
                ));
                continue;
            }
        };

        if !allowed.contains(&name) {
            errors.push(MarkerOptionError::new(
                format!("unknown marker option '{}'", name),
                value.location,
            ));
            continue;
        }
        if seen.contains(&name) {
            errors.push(MarkerOptionError::new(
                format!("marker option '{}' is given more than once", name),
                value.location,
            ));
            continue;
        }
        seen.push(name);

        let result = match name {
            "breed" => breed_value(value).map(|_| ()),
            "count" | "seed" => integer_value(name, value).map(|_| ()),
            _ => name_list_value(name, value).map(|_| ()),
        };
        if let Err(err) = result {
            errors.push(err);
        }
    }

    errors
}

/// Keyword option, or for `breed` the leading positional argument
fn option_value<'a>(marker: &'a Marker, name: &str) -> Option<&'a Expr> {
    marker.option(name).or_else(|| match name {
        "breed" if marker.kind == TypeKind::Agent => marker
            .options
            .first()
            .filter(|o| o.name.is_none())
            .map(|o| &o.value),
        _ => None,
    })
}

/// Declared breed, if any and well-formed
pub fn breed_option(marker: &Marker) -> Option<BreedOption> {
    option_value(marker, "breed").and_then(|value| breed_value(value).ok())
}

/// Names declared by a list or dict option, empty when absent or malformed
pub fn declared_names(marker: &Marker, option: &str) -> Vec<DeclaredName> {
    option_value(marker, option)
        .and_then(|value| name_list_value(option, value).ok())
        .unwrap_or_default()
}

/// Number of agents `setup` creates
pub fn initial_count(marker: &Marker) -> Option<i64> {
    option_value(marker, "count").and_then(|value| integer_value("count", value).ok())
}

/// Fixed random seed of a model
pub fn random_seed(marker: &Marker) -> Option<i64> {
    option_value(marker, "seed").and_then(|value| integer_value("seed", value).ok())
}

fn breed_value(value: &Expr) -> Result<BreedOption, MarkerOptionError> {
    let malformed = || {
        MarkerOptionError::new(
            "'breed' must be a string or a pair of strings (plural, singular)",
            value.location,
        )
    };
    match &value.kind {
        ExprKind::Constant(Constant::Str(plural)) if is_identifier(plural) => {
            Ok(BreedOption::Plural(plural.clone()))
        }
        ExprKind::Tuple(items) | ExprKind::List(items) if items.len() == 2 => {
            match (items[0].as_str(), items[1].as_str()) {
                (Some(plural), Some(singular))
                    if is_identifier(plural) && is_identifier(singular) =>
                {
                    Ok(BreedOption::Pair(plural.to_string(), singular.to_string()))
                }
                _ => Err(malformed()),
            }
        }
        _ => Err(malformed()),
    }
}

fn integer_value(option: &str, value: &Expr) -> Result<i64, MarkerOptionError> {
    match value.kind {
        ExprKind::Constant(Constant::Int(n)) if n >= 0 => Ok(n),
        _ => Err(MarkerOptionError::new(
            format!("'{}' must be a non-negative integer", option),
            value.location,
        )),
    }
}

fn name_list_value(option: &str, value: &Expr) -> Result<Vec<DeclaredName>, MarkerOptionError> {
    let malformed = |location| {
        MarkerOptionError::new(
            format!(
                "'{}' must be a list of names or a dict of name to type",
                option
            ),
            location,
        )
    };

    match &value.kind {
        ExprKind::List(items) | ExprKind::Tuple(items) => items
            .iter()
            .map(|item| match item.as_str() {
                Some(name) if is_identifier(name) => Ok(DeclaredName {
                    name: name.to_string(),
                    type_hint: None,
                }),
                _ => Err(malformed(item.location)),
            })
            .collect(),
        ExprKind::Dict(entries) => entries
            .iter()
            .map(|(key, hint)| match (key.as_ref().and_then(|k| k.as_str()), hint.as_str()) {
                (Some(name), Some(hint)) if is_identifier(name) => Ok(DeclaredName {
                    name: name.to_string(),
                    type_hint: Some(hint.to_string()),
                }),
                _ => Err(malformed(key.as_ref().map_or(hint.location, |k| k.location))),
            })
            .collect(),
        _ => Err(malformed(value.location)),
    }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|c| c.is_whitespace() || "[](){}\";,".contains(c))
}

/// `self.x = v` and `self.x: T = v` statements of an initializer; the
/// second list holds every other non-inert statement
pub fn initializer_assignments(
    method: &MethodDecl,
) -> (Vec<InitAssignment<'_>>, Vec<&SourceStatement>) {
    let mut assignments = Vec::new();
    let mut others = Vec::new();

    for stmt in &method.body {
        let (target, value, type_hint) = match &stmt.node.kind {
            StmtKind::Assign { targets, value } if targets.len() == 1 => {
                (&targets[0], Some(value), None)
            }
            StmtKind::AnnAssign {
                target,
                annotation,
                value,
            } => (
                target,
                value.as_ref(),
                Some(annotation.span.slice(&stmt.text).to_string()),
            ),
            StmtKind::Pass => continue,
            StmtKind::Expr(expr)
                if matches!(
                    expr.kind,
                    ExprKind::Constant(Constant::Str(_)) | ExprKind::Constant(Constant::Ellipsis)
                ) =>
            {
                continue
            }
            _ => {
                others.push(stmt);
                continue;
            }
        };

        match &target.kind {
            ExprKind::Attribute { value: base, attr } if base.is_self() => {
                assignments.push(InitAssignment {
                    name: attr,
                    type_hint,
                    value,
                    value_text: value.map(|v| v.span.slice(&stmt.text).to_string()),
                    location: stmt.node.location,
                })
            }
            _ => others.push(stmt),
        }
    }

    (assignments, others)
}

/// Global variable candidates: model fields, model `__init__` assignments,
/// then `globals=` options of every marked class in source order
pub fn global_candidates(tree: &ParseTree) -> Vec<GlobalCandidate<'_>> {
    let mut candidates = Vec::new();

    if let Some(model) = tree.models().next() {
        candidates.extend(model.fields.iter().map(|field| GlobalCandidate {
            name: field.name.clone(),
            type_hint: field.type_hint.clone(),
            default: field.default.as_ref(),
            default_text: field.default_text.clone(),
            location: field.location,
        }));
        if let Some(init) = model.method("__init__") {
            let (assignments, _) = initializer_assignments(init);
            candidates.extend(assignments.into_iter().map(|a| GlobalCandidate {
                name: a.name.to_string(),
                type_hint: a.type_hint,
                default: a.value,
                default_text: a.value_text,
                location: a.location,
            }));
        }
    }

    for decl in tree.type_decls() {
        if let Some(marker) = &decl.marker {
            candidates.extend(declared_names(marker, "globals").into_iter().map(|declared| {
                GlobalCandidate {
                    name: declared.name,
                    type_hint: declared.type_hint,
                    default: None,
                    default_text: None,
                    location: marker.location,
                }
            }));
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use xnlogo_parser::SourceParser;

    fn first_marker(source: &str) -> Marker {
        let tree = SourceParser::parse(source).unwrap();
        let marker = tree.type_decls().next().unwrap().marker.clone().unwrap();
        marker
    }

    #[test]
    fn test_breed_shapes() {
        let marker = first_marker("@agent(breed=\"wolves\")\nclass Wolf:\n    pass\n");
        assert_eq!(breed_option(&marker), Some(BreedOption::Plural("wolves".into())));

        let marker = first_marker("@agent(breed=(\"mice\", \"mouse\"))\nclass M:\n    pass\n");
        assert_eq!(
            breed_option(&marker),
            Some(BreedOption::Pair("mice".into(), "mouse".into()))
        );

        let marker = first_marker("@agent(\"sheep\")\nclass Sheep:\n    pass\n");
        let breed = breed_option(&marker).unwrap().to_breed_name("Sheep");
        assert_eq!(breed.plural, "sheep");
        assert_eq!(breed.singular, "sheep-agent");
    }

    #[test]
    fn test_malformed_options() {
        let marker = first_marker("@agent(breed=3, state=[\"a\", 1], speed=2)\nclass A:\n    pass\n");
        let errors = marker_errors(&marker);
        assert_eq!(errors.len(), 3);
        assert!(errors[0].message.contains("'breed'"));
        assert!(errors[1].message.contains("'state'"));
        assert!(errors[2].message.contains("unknown marker option 'speed'"));
    }

    #[test]
    fn test_model_rejects_agent_options() {
        let marker = first_marker("@model(breed=\"x\", globals=[\"n\"])\nclass W:\n    pass\n");
        let errors = marker_errors(&marker);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("'breed'"));
    }

    #[test]
    fn test_declared_names_dict_form() {
        let marker =
            first_marker("@agent(state={\"energy\": \"float\", \"age\": \"int\"})\nclass A:\n    pass\n");
        let names = declared_names(&marker, "state");
        assert_eq!(names.len(), 2);
        assert_eq!(names[0].name, "energy");
        assert_eq!(names[0].type_hint.as_deref(), Some("float"));
        assert!(marker_errors(&marker).is_empty());
    }

    #[test]
    fn test_count_option() {
        let marker = first_marker("@agent(count=50)\nclass A:\n    pass\n");
        assert_eq!(initial_count(&marker), Some(50));

        let marker = first_marker("@agent(count=-1)\nclass A:\n    pass\n");
        assert_eq!(initial_count(&marker), None);
        assert_eq!(marker_errors(&marker).len(), 1);

        let marker = first_marker("@model(seed=42)\nclass W:\n    pass\n");
        assert_eq!(random_seed(&marker), Some(42));
        assert!(marker_errors(&marker).is_empty());
    }

    #[test]
    fn test_unpacked_marker_argument() {
        let marker = first_marker("@agent(**opts)\nclass A:\n    pass\n");
        let errors = marker_errors(&marker);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("unpacked"));
    }

    #[test]
    fn test_initializer_assignments() {
        let source = "@agent\nclass A:\n    def __init__(self):\n        \"\"\"Doc.\"\"\"\n        self.energy: float = 2.5\n        self.age = 0\n        super().__init__()\n";
        let tree = SourceParser::parse(source).unwrap();
        let init = tree.agents().next().unwrap().method("__init__").unwrap();
        let (assignments, others) = initializer_assignments(init);

        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments[0].name, "energy");
        assert_eq!(assignments[0].type_hint.as_deref(), Some("float"));
        assert_eq!(assignments[0].value_text.as_deref(), Some("2.5"));
        assert_eq!(assignments[1].location, SourceLocation::new(6, 9));
        assert_eq!(others.len(), 1);
    }

    #[test]
    fn test_global_candidates_order() {
        let source = r#"@model(globals=["tick_count"])
class World:
    population: int = 10

    def __init__(self):
        self.rate = 0.5

    def step(self):
        pass


@agent(globals=["total_walkers"])
class Walker:
    def step(self):
        pass
"#;
        let tree = SourceParser::parse(source).unwrap();
        let names: Vec<_> = global_candidates(&tree).into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["population", "rate", "tick_count", "total_walkers"]);
    }
}
