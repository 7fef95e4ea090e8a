//! AST Module - typed configuration documents
//!
//! Contains the Rust types parsed from JSON/YAML configuration documents:
//! - `document`: ConfigDocument, Extends, OverrideStrategy
//! - `task`: TaskDefinition, TaskKind (with exclusive field groups)
//! - `value`: VariableDefinition, ValueSpec
//! - `prompt`: PromptDefinition, PromptKind, Choice
//! - `enabled`: Enabled predicates
//! - `source`: provenance (local path or URL)
//! - `schema_validator`: embedded JSON Schema validation
//!
//! These types represent the "what" - static structure parsed from documents.
//! For loading, see `loader`; for execution, see `runtime`.

mod document;
mod enabled;
mod prompt;
pub mod schema_validator;
mod source;
mod task;
mod value;

// Re-export all public types
pub use document::{is_valid_name, ConfigDocument, Extends, OverrideStrategy};
pub use enabled::{Enabled, EnabledCheck};
pub use prompt::{Choice, PromptDefinition, PromptKind};
pub use source::Source;
pub use task::{FieldGroups, TaskDefinition, TaskKind};
pub use value::{ConditionalValue, TypedValue, ValueSpec, VariableDefinition};
