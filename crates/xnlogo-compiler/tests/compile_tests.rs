//! End-to-end compilation tests
//!
//! Sources under `tests/data` are compiled and compared against the program
//! texts stored in `tests/data/golden`.

use std::path::PathBuf;
use xnlogo_compiler::*;
use xnlogo_core::ir::SchedulePhase;
use xnlogo_core::{ConstructKind, DiagnosticKind};
use xnlogo_parser::SourceParser;

fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

fn read_data(name: &str) -> String {
    std::fs::read_to_string(data_path(name)).unwrap()
}

fn assert_golden(stem: &str) {
    let source = read_data(&format!("{}.py", stem));
    let expected = read_data(&format!("golden/{}.nls", stem));

    let program = Compiler::new().compile(&source).unwrap();
    assert_eq!(program.code, expected, "golden mismatch for {}", stem);
}

// =============================================================================
// Golden programs
// =============================================================================

#[test]
fn test_golden_simple_agent() {
    assert_golden("simple_agent");
}

#[test]
fn test_golden_agent_with_conditionals() {
    assert_golden("agent_with_conditionals");
}

#[test]
fn test_golden_multi_breed() {
    assert_golden("multi_breed");
}

#[test]
fn test_golden_model_level_definitions() {
    assert_golden("predator_world");
}

// =============================================================================
// Translation properties
// =============================================================================

#[test]
fn test_binary_operations_are_parenthesized() {
    let source = r#"@agent
class A:
    x: int = 0
    y: int = 0

    def act(self):
        self.x = self.x + self.y
        self.y = self.x == self.y
"#;
    let program = Compiler::new().compile(source).unwrap();
    assert!(program.code.contains("set x (x + y)"));
    assert!(program.code.contains("set y (x = y)"));
}

#[test]
fn test_first_assignment_declares_later_ones_mutate() {
    let source = r#"@agent
class A:
    def act(self):
        total = 1
        total = total * 2
        total = total + 3
"#;
    let program = Compiler::new().compile(source).unwrap();
    assert_eq!(program.code.matches("let total").count(), 1);
    assert!(program.code.contains("  let total 1\n  set total (total * 2)\n  set total (total + 3)\n"));
}

#[test]
fn test_elif_chain_depth() {
    let source = r#"@agent
class A:
    state: int = 0

    def act(self):
        if self.state == 0:
            self.state = 1
        elif self.state == 1:
            self.state = 2
        elif self.state == 2:
            self.state = 3
        else:
            self.state = 0
"#;
    let program = Compiler::new().compile(source).unwrap();
    // Four branches, three two-branch conditionals, condition 1 outermost
    assert_eq!(program.code.matches("ifelse ").count(), 3);
    let first = program.code.find("ifelse (state = 0)").unwrap();
    let second = program.code.find("ifelse (state = 1)").unwrap();
    let third = program.code.find("ifelse (state = 2)").unwrap();
    assert!(first < second && second < third);
    assert!(program.code.contains("      ifelse (state = 2) [\n"));
}

#[test]
fn test_count_round_trip() {
    let source = r#"@agent
class Counter:
    count: int = 0

    def step(self):
        self.count = self.count + 1
"#;
    let program = Compiler::new().compile(source).unwrap();
    let code = &program.code;

    assert!(code.contains("to counter-step\n  set count (count + 1)\nend"));
    assert!(code.contains("to go\n  ask turtles [ counter-step ]\n  tick\nend"));

    let declarations = code.split("\n\n").next().unwrap();
    assert_eq!(declarations, "turtles-own [count]");
}

#[test]
fn test_model_lifecycle_return_keeps_setup_and_go_whole() {
    let source = r#"@model
class World:
    ready: bool = False

    def setup(self):
        if self.ready:
            return
        self.ready = True

    def step(self):
        if self.ready:
            return
        print("waiting")


@agent(count=3)
class A:
    energy: int = 0

    def step(self):
        self.energy += 1
"#;
    let program = Compiler::new().compile(source).unwrap();
    let code = &program.code;
    let section = |header: &str| {
        code.split("\n\n")
            .find(|s| s.starts_with(header))
            .unwrap()
            .to_string()
    };

    assert_eq!(
        section("to setup\n"),
        "to setup\n  clear-all\n  set ready false\n  model-setup\n  create-turtles 3 [\n    set energy 0\n  ]\n  reset-ticks\nend"
    );
    assert_eq!(
        section("to go\n"),
        "to go\n  ask turtles [ a-step ]\n  model-step\n  tick\nend"
    );
    assert_eq!(
        section("to model-setup\n"),
        "to model-setup\n  if ready [\n    stop\n  ]\n  set ready true\nend"
    );
    assert_eq!(
        section("to model-step\n"),
        "to model-step\n  if ready [\n    stop\n  ]\n  print \"waiting\"\nend"
    );
}

#[test]
fn test_integer_literal_past_i64() {
    let source = r#"@agent
class A:
    limit: int = 100000000000000000000

    def step(self):
        self.limit -= 1
"#;
    let program = Compiler::new().compile(source).unwrap();
    assert!(program.diagnostics.is_empty());
    assert!(program.code.contains("set limit 1e20"));
}

#[test]
fn test_loops_and_reporter() {
    let program = Compiler::new()
        .compile(&read_data("agent_with_loops.py"))
        .unwrap();
    let code = &program.code;

    assert!(code.starts_with("globals [total_walkers]\nbreed [walker walker-agent]\nwalker-own [energy position steps_taken]\n"));
    assert!(code.contains("  repeat 5 [\n    set position (position + 1)\n"));
    assert!(code.contains("  while [ ((distance < 10) and (not found)) ] [\n"));
    assert!(code.contains("    if (member? position neighbors) [\n"));
    assert!(code.contains("to-report walker-get-energy-level\n"));
    assert!(code.contains("  let target_energy item index levels\n  report target_energy\n"));
    assert!(code.contains("set color ifelse-value (energy > 50) [ 15 ] [ 25 ]"));
    assert!(code.contains("  ask walker [\n    walker-setup\n  ]\n"));
}

// =============================================================================
// Diagnostics
// =============================================================================

#[test]
fn test_try_block_passthrough() {
    let source = r#"@agent
class Careful:
    energy: float = 1.0

    def act(self):
        try:
            self.energy = self.energy / 0
        except ZeroDivisionError:
            self.energy = 0
"#;
    let program = Compiler::new().compile(source).unwrap();

    let warnings: Vec<_> = program.diagnostics.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, DiagnosticKind::UnsupportedConstruct);
    assert_eq!(warnings[0].construct, Some(ConstructKind::TryExcept));

    assert!(program.code.contains(
        "to careful-act\n  ; UNTRANSLATED (try/except):\n  ;   try:\n  ;       self.energy = self.energy / 0\n  ;   except ZeroDivisionError:\n  ;       self.energy = 0\nend"
    ));
}

#[test]
fn test_no_compilable_unit() {
    let source = "\"\"\"Helpers only.\"\"\"\n\ndef helper(x):\n    return x + 1\n";
    let failure = Compiler::new().compile(source).unwrap_err();

    assert_eq!(failure.diagnostics.len(), 1);
    assert_eq!(failure.diagnostics.error_count(), 1);
    assert_eq!(
        failure.diagnostics.as_slice()[0].kind,
        DiagnosticKind::NoCompilableUnit
    );
}

#[test]
fn test_validation_is_idempotent() {
    let source = r#"@agent
class Noisy:
    def act(self):
        with open("log") as f:
            pass
        for i in range(3):
            print(i)
        del self.cache
"#;
    let tree = SourceParser::parse(source).unwrap();
    let validator = SemanticValidator::new();
    let first = validator.validate(&tree);
    let second = validator.validate(&tree);
    assert_eq!(first, second);

    let codes: Vec<_> = first.iter().map(|d| d.code()).collect();
    assert_eq!(codes, vec!["W100", "W105", "W100"]);
}

#[test]
fn test_return_inside_agent_loop_is_passed_through() {
    let source = r#"@agent
class A:
    energy: float = 0.0

    def richest(self):
        for t in self.neighbors:
            if t.energy > 5:
                return t
"#;
    let program = Compiler::new().compile(source).unwrap();

    let warnings: Vec<_> = program.diagnostics.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].construct, Some(ConstructKind::LoopBlockReturn));
    assert_eq!(warnings[0].location.map(|l| l.line), Some(6));

    assert!(!program.code.contains("report self"));
    assert!(!program.code.contains("ask neighbors"));
    assert!(program.code.contains(
        "to a-richest\n  ; UNTRANSLATED (return inside ask/foreach loop):\n  ;   for t in self.neighbors:\n  ;       if t.energy > 5:\n  ;           return t\nend"
    ));
}

#[test]
fn test_warnings_match_untranslated_blocks() {
    let source = r#"@agent
class A:
    def act(self):
        for t in self.neighbors:
            if t.energy > 1:
                break
        x = lambda: 1
        assert self.ok
"#;
    let program = Compiler::new().compile(source).unwrap();
    let markers = program.code.matches("; UNTRANSLATED (").count();
    assert_eq!(markers, 3);
    assert_eq!(program.diagnostics.warning_count(), markers);
}

// =============================================================================
// IR inspection
// =============================================================================

#[test]
fn test_build_model_classifies_behaviors() {
    let (model, diagnostics) = Compiler::new()
        .build_model(&read_data("predator_world.py"))
        .unwrap();
    assert!(diagnostics.is_empty());

    assert_eq!(model.model_name.as_deref(), Some("World"));
    assert_eq!(model.random_seed, Some(42));
    assert_eq!(model.reporters.len(), 1);
    let wolf = model.agent("Wolf").unwrap();
    assert_eq!(wolf.agentset(), "wolves");
    assert!(wolf.lifecycle(SchedulePhase::Step).is_some());

    let json = serde_json::to_value(&model).unwrap();
    assert_eq!(json["agents"][0]["breed"]["singular"], "wolf");
    assert_eq!(json["reporters"][0]["schedule_phase"], "reporter");
}

#[test]
fn test_render_legacy_container() {
    let program = Compiler::new()
        .compile(&read_data("simple_agent.py"))
        .unwrap();
    let doc = program.render(&Attachments::default(), ContainerFormat::Nlogo);
    assert!(doc.starts_with("turtles-own [count]\n"));
    assert!(doc.contains("\n@#$#@#$#@\nGRAPHICS-WINDOW\n"));
}
