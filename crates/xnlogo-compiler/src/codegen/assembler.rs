//! Program assembler
//!
//! Builds the final program text section by section:
//! declarations, `setup`, `go`, procedures, reporters.

use super::expression::{AgentContext, ExpressionTranslator};
use super::translator::TranslatedBehavior;
use std::collections::HashSet;
use xnlogo_core::ir::{AgentSpec, ModelSpec, SchedulePhase, StateField};

const INDENT: &str = "  ";

/// Turtle variables every agent already owns
const TURTLE_BUILTINS: &[&str] = &[
    "who",
    "color",
    "heading",
    "xcor",
    "ycor",
    "shape",
    "label",
    "label-color",
    "breed",
    "hidden?",
    "size",
    "pen-size",
    "pen-mode",
];

/// Patch variables every patch already owns
const PATCH_BUILTINS: &[&str] = &["pxcor", "pycor", "pcolor", "plabel", "plabel-color"];

/// Program assembler
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgramAssembler;

impl ProgramAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Program text for a model and its translated behaviors
    pub fn assemble(&self, model: &ModelSpec, behaviors: &[TranslatedBehavior]) -> String {
        let mut sections = Vec::new();

        let declarations = self.declarations(model);
        if !declarations.is_empty() {
            sections.push(declarations.join("\n"));
        }

        sections.push(self.setup_procedure(model, behaviors));
        sections.push(self.go_procedure(model, behaviors));

        // Agent behaviors, lifecycle ones included, then model-level customs.
        // A model lifecycle body that can `stop` gets a procedure of its own
        // so the exit cannot skip `reset-ticks` or `tick`.
        let procedures = behaviors.iter().filter(|b| match (&b.owner, b.phase) {
            (_, SchedulePhase::Reporter) => false,
            (Some(_), _) => true,
            (None, SchedulePhase::Custom) => true,
            (None, _) => b.exits_early(),
        });
        for behavior in procedures {
            sections.push(procedure("to", behavior));
        }

        for behavior in behaviors.iter().filter(|b| b.is_reporter()) {
            sections.push(procedure("to-report", behavior));
        }

        log::debug!("assembled {} sections", sections.len());
        let mut program = sections.join("\n\n");
        program.push('\n');
        program
    }

    fn declarations(&self, model: &ModelSpec) -> Vec<String> {
        let mut lines = Vec::new();

        if !model.globals.is_empty() {
            let names: Vec<&str> = model.globals.iter().map(|g| g.name.as_str()).collect();
            lines.push(format!("globals [{}]", names.join(" ")));
        }

        for agent in &model.agents {
            if let Some(breed) = &agent.breed {
                lines.push(format!("breed [{} {}]", breed.plural, breed.singular));
                let owned = owned_names(std::iter::once(agent), TURTLE_BUILTINS);
                if !owned.is_empty() {
                    lines.push(format!("{}-own [{}]", breed.plural, owned.join(" ")));
                }
            }
        }

        let unbred = owned_names(
            model.agents.iter().filter(|a| a.breed.is_none()),
            TURTLE_BUILTINS,
        );
        if !unbred.is_empty() {
            lines.push(format!("turtles-own [{}]", unbred.join(" ")));
        }

        let patches = field_names(&model.patches.state_fields, PATCH_BUILTINS);
        if !patches.is_empty() {
            lines.push(format!("patches-own [{}]", patches.join(" ")));
        }

        lines
    }

    fn setup_procedure(&self, model: &ModelSpec, behaviors: &[TranslatedBehavior]) -> String {
        let observer = ExpressionTranslator::new(model, None);
        let ctx = AgentContext::default();
        let mut body = vec!["clear-all".to_string()];

        if let Some(seed) = model.random_seed {
            body.push(format!("random-seed {}", seed));
        }

        for global in &model.globals {
            if let Some(default) = &global.default {
                body.push(format!("set {} {}", global.name, observer.translate(default, &ctx)));
            }
        }

        if let Some(setup) = model_lifecycle(behaviors, SchedulePhase::Setup) {
            body.extend(lifecycle_body(setup));
        }

        for agent in &model.agents {
            let init = self.agent_initializer(model, agent);
            match &agent.initial_count {
                Some(count) => {
                    let count = observer.operand(count, &ctx);
                    if init.is_empty() {
                        body.push(format!("create-{} {}", agent.agentset(), count));
                    } else {
                        body.push(format!("create-{} {} [", agent.agentset(), count));
                        body.extend(init);
                        body.push("]".to_string());
                    }
                }
                None if !init.is_empty() => {
                    body.push(format!("ask {} [", agent.agentset()));
                    body.extend(init);
                    body.push("]".to_string());
                }
                None => {}
            }
        }

        body.push("reset-ticks".to_string());
        wrap("to setup", &body)
    }

    /// Field defaults and the call to the agent's setup behavior
    fn agent_initializer(&self, model: &ModelSpec, agent: &AgentSpec) -> Vec<String> {
        let translator = ExpressionTranslator::new(model, Some(agent));
        let ctx = AgentContext::default();
        let mut lines: Vec<String> = agent
            .state_fields
            .iter()
            .filter_map(|field| {
                field
                    .default
                    .as_ref()
                    .map(|value| format!("set {} {}", field.name, translator.translate(value, &ctx)))
            })
            .collect();

        if let Some(setup) = agent.lifecycle(SchedulePhase::Setup) {
            lines.push(agent.procedure_name(&setup.name));
        }
        lines
    }

    fn go_procedure(&self, model: &ModelSpec, behaviors: &[TranslatedBehavior]) -> String {
        let mut body = Vec::new();

        for agent in &model.agents {
            if let Some(step) = agent.lifecycle(SchedulePhase::Step) {
                body.push(format!(
                    "ask {} [ {} ]",
                    agent.agentset(),
                    agent.procedure_name(&step.name)
                ));
            }
        }

        if let Some(step) = model_lifecycle(behaviors, SchedulePhase::Step) {
            body.extend(lifecycle_body(step));
        }

        body.push("tick".to_string());
        wrap("to go", &body)
    }
}

fn model_lifecycle(
    behaviors: &[TranslatedBehavior],
    phase: SchedulePhase,
) -> Option<&TranslatedBehavior> {
    behaviors
        .iter()
        .find(|b| b.owner.is_none() && b.phase == phase)
}

/// Lines a model lifecycle behavior contributes to `setup` or `go`
fn lifecycle_body(behavior: &TranslatedBehavior) -> Vec<String> {
    if behavior.exits_early() {
        vec![behavior.procedure.clone()]
    } else {
        behavior.lines.clone()
    }
}

/// Owned variable names across agents, first occurrence kept
fn owned_names<'a>(agents: impl Iterator<Item = &'a AgentSpec>, builtins: &[&str]) -> Vec<String> {
    let mut seen = HashSet::new();
    agents
        .flat_map(|agent| field_names(&agent.state_fields, builtins))
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

fn field_names(fields: &[StateField], builtins: &[&str]) -> Vec<String> {
    fields
        .iter()
        .map(|f| f.name.clone())
        .filter(|name| !builtins.contains(&name.as_str()))
        .collect()
}

fn procedure(keyword: &str, behavior: &TranslatedBehavior) -> String {
    let header = if behavior.params.is_empty() {
        format!("{} {}", keyword, behavior.procedure)
    } else {
        format!(
            "{} {} [{}]",
            keyword,
            behavior.procedure,
            behavior.params.join(" ")
        )
    };
    wrap(&header, &behavior.lines)
}

fn wrap(header: &str, body: &[String]) -> String {
    let mut out = vec![header.to_string()];
    out.extend(reindent(body, 1));
    out.push("end".to_string());
    out.join("\n")
}

/// Re-indent lines from their bracket structure, two spaces per level
pub(crate) fn reindent(lines: &[String], base: usize) -> Vec<String> {
    let mut depth = base as isize;
    let mut out = Vec::with_capacity(lines.len());

    for raw in lines {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let balance = BracketBalance::of(line);
        let level = (depth - balance.leading_closes).max(0) as usize;
        out.push(format!("{}{}", INDENT.repeat(level), line));
        depth = (depth + balance.opens - balance.closes).max(base as isize);
    }
    out
}

/// Bracket counts of one line, ignoring strings and comments
struct BracketBalance {
    opens: isize,
    closes: isize,
    /// `]` characters before any other token
    leading_closes: isize,
}

impl BracketBalance {
    fn of(line: &str) -> Self {
        let mut balance = Self {
            opens: 0,
            closes: 0,
            leading_closes: 0,
        };
        let mut leading = true;
        let mut in_string = false;
        let mut escaped = false;

        for ch in line.chars() {
            if in_string {
                match ch {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match ch {
                ';' => break,
                '"' => {
                    in_string = true;
                    leading = false;
                }
                '[' => {
                    balance.opens += 1;
                    leading = false;
                }
                ']' => {
                    balance.closes += 1;
                    if leading {
                        balance.leading_closes += 1;
                    }
                }
                ' ' | '\t' => {}
                _ => leading = false,
            }
        }
        balance
    }
}
