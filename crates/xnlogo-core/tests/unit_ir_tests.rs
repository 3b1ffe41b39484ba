//! Unit tests for IR (Intermediate Representation) types
//!
//! Tests the model-level helpers used by code generation

use xnlogo_core::ast::CompareOperator;
use xnlogo_core::ir::*;
use xnlogo_core::SourceLocation;

fn behavior(name: &str, statements: Vec<Statement>) -> Behavior {
    let returns = statements.iter().any(Statement::returns_value);
    Behavior {
        name: name.to_string(),
        params: vec![],
        statements,
        schedule_phase: SchedulePhase::classify(name, returns),
        location: SourceLocation::new(1, 1),
    }
}

fn agent(identifier: &str, breed: Option<BreedName>) -> AgentSpec {
    AgentSpec {
        identifier: identifier.to_string(),
        breed,
        state_fields: vec![StateField {
            name: "energy".to_string(),
            type_hint: Some("float".to_string()),
            default: Some(Expression::float(10.0)),
        }],
        behaviors: vec![behavior("setup", vec![Statement::Pass])],
        initial_count: None,
    }
}

// =============================================================================
// ModelSpec Tests
// =============================================================================

#[test]
fn test_empty_model_is_not_compilable() {
    let model = ModelSpec::default();
    assert!(!model.is_compilable());
}

#[test]
fn test_model_with_agent_is_compilable() {
    let model = ModelSpec {
        agents: vec![agent("Sheep", None)],
        ..Default::default()
    };
    assert!(model.is_compilable());
    assert!(model.agent("Sheep").is_some());
    assert!(model.agent("Wolf").is_none());
}

#[test]
fn test_model_level_step_is_compilable() {
    let model = ModelSpec {
        behaviors: vec![behavior("step", vec![Statement::Pass])],
        ..Default::default()
    };
    assert!(model.is_compilable());
    assert!(model.lifecycle(SchedulePhase::Step).is_some());
    assert!(model.lifecycle(SchedulePhase::Setup).is_none());
}

#[test]
fn test_model_level_custom_only_is_not_compilable() {
    let model = ModelSpec {
        behaviors: vec![behavior("helper", vec![Statement::Pass])],
        ..Default::default()
    };
    assert!(!model.is_compilable());
}

// =============================================================================
// AgentSpec Tests
// =============================================================================

#[test]
fn test_agentset_uses_breed_plural() {
    let wolf = agent("Wolf", Some(BreedName::new("wolves", "Wolf")));
    assert_eq!(wolf.agentset(), "wolves");
    assert_eq!(wolf.procedure_name("hunt"), "wolf-hunt");
    assert!(wolf.field("energy").is_some());
    assert_eq!(wolf.lifecycle(SchedulePhase::Setup).unwrap().name, "setup");
}

#[test]
fn test_explicit_breed_names() {
    let breed = BreedName::explicit("mice", "mouse");
    assert_eq!(breed.plural, "mice");
    assert_eq!(breed.singular, "mouse");
}

// =============================================================================
// Behavior Tests
// =============================================================================

#[test]
fn test_value_return_makes_reporter() {
    let b = behavior("total_energy", vec![Statement::Return(Some(Expression::name("e")))]);
    assert_eq!(b.schedule_phase, SchedulePhase::Reporter);
    assert!(b.is_reporter());
}

#[test]
fn test_reserved_name_wins_over_return() {
    let b = behavior("setup", vec![Statement::Return(Some(Expression::int(1)))]);
    assert_eq!(b.schedule_phase, SchedulePhase::Setup);
    assert!(b.schedule_phase.is_lifecycle());
}

#[test]
fn test_bare_return_stays_custom() {
    let b = behavior("maybe_die", vec![Statement::Return(None)]);
    assert_eq!(b.schedule_phase, SchedulePhase::Custom);
}

// =============================================================================
// Statement Tests
// =============================================================================

#[test]
fn test_unsupported_count_recurses() {
    let unsupported = Statement::Unsupported {
        kind: xnlogo_core::ConstructKind::TryExcept,
        text: "try:\n    pass\nexcept:\n    pass".to_string(),
    };
    let stmt = Statement::While {
        condition: Expression::compare(
            CompareOperator::Lt,
            Expression::name("i"),
            Expression::int(3),
        ),
        body: vec![unsupported.clone(), Statement::Pass, unsupported],
    };
    assert_eq!(stmt.unsupported_count(), 2);
}
