//! Runtime Module - executing a merged document
//!
//! Contains the run-time components:
//! - `orchestrator`: the sequential run state machine (gates, passes, execution)
//! - `enabled`: lazy/eager evaluation of `enabled` predicates
//! - `variables`: value spec resolution
//! - `prompts`: prompt collectors (terminal, defaults, scripted)
//! - `transform`: value transformers applied to prompt answers
//! - `command`: shell commands with a timeout
//! - `context`: the run's key/value bindings
//!
//! This module represents the "how" - runtime execution.
//! For static structure, see the `ast` module.

mod command;
mod context;
mod enabled;
mod orchestrator;
mod prompts;
mod transform;
mod variables;

pub use command::CommandRunner;
pub use context::RunContext;
pub use enabled::{EnabledEvaluator, Mode};
pub use orchestrator::{Orchestrator, RunOutcome, RunReport, TaskPreview};
pub use prompts::{
    coerce_answer, DefaultsCollector, PromptCollector, ScriptedCollector, TerminalCollector,
};
pub use transform::Transformers;
pub use variables::ValueResolver;
