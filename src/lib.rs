//! Kiln - configuration inheritance and task orchestration for project scaffolding
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  ast/       JSON/YAML → Rust types (ConfigDocument, Task)    │
//! │  expr/      Safe expression language (lexer, parser, eval)   │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      APPLICATION LAYER                       │
//! │  loader/    Document store + extends graph walk              │
//! │  dag/       Stable dependency sort                           │
//! │  merge/     Priority-ordered merge with override strategies  │
//! │  runtime/   Orchestrator (gates, variables, prompts, tasks)  │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    INFRASTRUCTURE LAYER                      │
//! │  tasks/     Task executors + template rendering              │
//! │  event/     Run hooks and the event log                      │
//! │  util/      Constants                                        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`ast`] | Document types, provenance, embedded JSON Schema |
//! | [`loader`] | Fetch, parse, cache; `extends` walk; [`loader::resolve`] |
//! | [`dag`] | Topological sort that keeps independent items in place |
//! | [`merge`] | Id conflicts, `merge`/`replace`, exclusive field groups |
//! | [`expr`] | Conditions and computed values over context keys only |
//! | [`runtime`] | The run state machine and its collaborators |
//! | [`tasks`] | `write`, `mkdir`, `delete`, `exec` and the registry |
//! | [`event`] | `RunHooks`, `EventLog` |
//! | [`error`] | Error types with fix suggestions |
//!
//! ```rust,ignore
//! let store = DocumentStore::new(std::env::current_dir()?)?;
//! let doc = kiln::loader::resolve(&store, "./kiln.json").await?;
//! let report = Orchestrator::new(".")?.run(doc).await?.into_result()?;
//! ```

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL
// ═══════════════════════════════════════════════════════════════
pub mod ast;
pub mod expr;

// ═══════════════════════════════════════════════════════════════
// APPLICATION LAYER
// ═══════════════════════════════════════════════════════════════
pub mod dag;
pub mod loader;
pub mod merge;
pub mod runtime;

// ═══════════════════════════════════════════════════════════════
// INFRASTRUCTURE LAYER
// ═══════════════════════════════════════════════════════════════
pub mod event;
pub mod tasks;
pub mod util;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING - Error handling, configuration
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;

// ═══════════════════════════════════════════════════════════════
// PUBLIC API RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

pub use config::KilnConfig;
pub use error::{FixSuggestion, KilnError, Result};

pub use ast::{
    ConfigDocument, Enabled, OverrideStrategy, PromptDefinition, Source, TaskDefinition,
    TaskKind, ValueSpec, VariableDefinition,
};

pub use loader::{resolve, DocumentStore, GraphLoader};
pub use merge::DocumentMerger;

pub use runtime::{
    EnabledEvaluator, Mode, Orchestrator, PromptCollector, RunContext, RunOutcome, RunReport,
};

pub use event::{Event, EventKind, EventLog, HookChain, NoopHooks, RunHooks};
pub use tasks::{ExecuteOptions, ExecutorRegistry, TaskExecutor};
