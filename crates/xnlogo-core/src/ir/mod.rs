//! Intermediate Representation (IR) for xnlogo
//!
//! The IR is backend-agnostic: it describes globals, agent types, behaviors
//! and their schedule phases. It is built once per compilation and only read
//! afterwards.

pub mod model;
pub mod statement;

pub use model::{
    kebab_case, AgentSpec, Behavior, BreedName, GlobalVar, ModelSpec, PatchSpec, Reporter,
    SchedulePhase, StateField,
};
pub use statement::{Expression, IterableKind, Literal, Number, Statement, SubscriptIndex};
