//! Model-level IR nodes

use super::statement::{Expression, Statement};
use crate::location::SourceLocation;
use serde::{Deserialize, Serialize};

/// Root of the IR: everything the assembler needs to emit a program
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Model class name, if the source declares one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,

    pub globals: Vec<GlobalVar>,

    pub agents: Vec<AgentSpec>,

    pub patches: PatchSpec,

    /// Model-level setup, step and custom behaviors
    pub behaviors: Vec<Behavior>,

    /// Model-level value-returning behaviors
    pub reporters: Vec<Reporter>,

    /// Fixed seed applied at the start of `setup`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<i64>,
}

impl ModelSpec {
    pub fn agent(&self, identifier: &str) -> Option<&AgentSpec> {
        self.agents.iter().find(|a| a.identifier == identifier)
    }

    pub fn global(&self, name: &str) -> Option<&GlobalVar> {
        self.globals.iter().find(|g| g.name == name)
    }

    /// Model-level behavior in the given phase
    pub fn lifecycle(&self, phase: SchedulePhase) -> Option<&Behavior> {
        self.behaviors.iter().find(|b| b.schedule_phase == phase)
    }

    /// Agent or model-level setup/step behavior exists
    pub fn is_compilable(&self) -> bool {
        !self.agents.is_empty()
            || self.lifecycle(SchedulePhase::Setup).is_some()
            || self.lifecycle(SchedulePhase::Step).is_some()
    }
}

/// Global variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalVar {
    pub name: String,
    /// Documentation only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Expression>,
    /// Default value as written in the source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_source: Option<String>,
}

/// Owned variable of an agent or patch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateField {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Expression>,
}

/// Plural and singular breed names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreedName {
    pub plural: String,
    pub singular: String,
}

impl BreedName {
    /// Singular is derived from the class identifier. NetLogo rejects a
    /// breed whose two names are equal, so a collision gains `-agent`.
    pub fn new(plural: impl Into<String>, identifier: &str) -> Self {
        let plural = plural.into();
        let mut singular = kebab_case(identifier);
        if singular == plural {
            singular.push_str("-agent");
        }
        Self { plural, singular }
    }

    /// Both names given explicitly, e.g. `breed=("wolves", "wolf")`
    pub fn explicit(plural: impl Into<String>, singular: impl Into<String>) -> Self {
        let plural = plural.into();
        let mut singular = singular.into();
        if singular == plural {
            singular.push_str("-agent");
        }
        Self { plural, singular }
    }
}

/// One agent type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breed: Option<BreedName>,
    pub state_fields: Vec<StateField>,
    pub behaviors: Vec<Behavior>,
    /// Number of agents created by `setup`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_count: Option<Expression>,
}

impl AgentSpec {
    /// Agentset the agent's procedures are asked on
    pub fn agentset(&self) -> &str {
        self.breed.as_ref().map_or("turtles", |b| b.plural.as_str())
    }

    /// Prefix for this agent's procedure names
    pub fn slug(&self) -> String {
        kebab_case(&self.identifier)
    }

    /// Procedure name of one of this agent's behaviors
    pub fn procedure_name(&self, behavior: &str) -> String {
        format!("{}-{}", self.slug(), kebab_case(behavior))
    }

    pub fn behavior(&self, name: &str) -> Option<&Behavior> {
        self.behaviors.iter().find(|b| b.name == name)
    }

    pub fn lifecycle(&self, phase: SchedulePhase) -> Option<&Behavior> {
        self.behaviors.iter().find(|b| b.schedule_phase == phase)
    }

    pub fn field(&self, name: &str) -> Option<&StateField> {
        self.state_fields.iter().find(|f| f.name == name)
    }
}

/// Patch-owned variables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatchSpec {
    pub state_fields: Vec<StateField>,
}

/// When a behavior runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulePhase {
    /// Runs once from `setup`
    Setup,
    /// Runs every tick from `go`
    Step,
    /// Emitted as a procedure, invoked only when referenced
    Custom,
    /// Value-returning procedure
    Reporter,
}

impl SchedulePhase {
    /// Reserved behavior names take precedence over the return shape
    pub fn classify(name: &str, returns_value: bool) -> Self {
        match name {
            "setup" => SchedulePhase::Setup,
            "step" | "go" => SchedulePhase::Step,
            _ if returns_value => SchedulePhase::Reporter,
            _ => SchedulePhase::Custom,
        }
    }

    pub fn is_lifecycle(&self) -> bool {
        matches!(self, SchedulePhase::Setup | SchedulePhase::Step)
    }
}

/// Agent or model-level procedure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Behavior {
    pub name: String,
    pub params: Vec<String>,
    pub statements: Vec<Statement>,
    pub schedule_phase: SchedulePhase,
    pub location: SourceLocation,
}

impl Behavior {
    pub fn is_reporter(&self) -> bool {
        self.schedule_phase == SchedulePhase::Reporter
    }
}

/// Reporter behaviors share the behavior shape
pub type Reporter = Behavior;

/// NetLogo-style identifier: `consume_energy` -> `consume-energy`,
/// `SmartAgent` -> `smart-agent`
pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for ch in name.chars() {
        if ch == '_' || ch == ' ' {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
        } else if ch.is_uppercase() {
            if matches!(prev, Some(p) if p.is_lowercase() || p.is_ascii_digit())
                && !out.ends_with('-')
            {
                out.push('-');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
        prev = Some(ch);
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}
