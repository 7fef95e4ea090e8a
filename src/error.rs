// The #[error] attribute from thiserror uses struct fields via string interpolation,
// but Rust's unused_assignments lint doesn't recognize this.
#![allow(unused_assignments)]

//! Kiln Error Types with Error Codes
//!
//! Error code ranges:
//! - KILN-000-009: Document store errors (not found, parse)
//! - KILN-010-019: Schema errors
//! - KILN-020-029: Graph/dependency errors
//! - KILN-030-039: Merge errors
//! - KILN-040-049: Expression/template errors
//! - KILN-050-059: Variable/prompt errors
//! - KILN-060-069: Task/run errors
//! - KILN-090-099: IO/config errors

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KilnError>;

/// Format schema validation errors for display
fn format_schema_errors(errors: &[crate::ast::schema_validator::SchemaError]) -> String {
    if errors.is_empty() {
        return "no errors".to_string();
    }
    if errors.len() == 1 {
        return errors[0].to_string();
    }
    format!(
        "{} errors: {}",
        errors.len(),
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    )
}

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
///
/// Implements both `thiserror::Error` for std error compatibility
/// and `miette::Diagnostic` for fancy terminal error display.
#[derive(Error, Debug, Diagnostic)]
pub enum KilnError {
    // ═══════════════════════════════════════════
    // DOCUMENT STORE ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[KILN-001] Configuration document not found: {reference}")]
    #[diagnostic(
        code(kiln::document_not_found),
        help("Check the path exists, or that the URL answers with a 2xx status")
    )]
    DocumentNotFound { reference: String },

    #[error("[KILN-002] Failed to parse '{source_ref}': {details}")]
    #[diagnostic(code(kiln::parse_error), help("Check the document is valid JSON (or YAML)"))]
    ParseError { source_ref: String, details: String },

    #[error("[KILN-003] Failed to fetch '{url}': {reason}")]
    #[diagnostic(code(kiln::fetch_failed))]
    FetchFailed { url: String, reason: String },

    #[error("[KILN-004] Invalid document reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    // ═══════════════════════════════════════════
    // SCHEMA ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[KILN-010] Invalid document '{source_ref}': {reason}")]
    #[diagnostic(
        code(kiln::schema_error),
        help("Documents need a lowercase-hyphen `name` and, if present, a `tasks` array")
    )]
    SchemaError { source_ref: String, reason: String },

    #[error("[KILN-011] Schema validation failed for '{source_ref}': {}", format_schema_errors(.errors))]
    #[diagnostic(code(kiln::schema_validation_failed))]
    SchemaValidationFailed {
        source_ref: String,
        errors: Vec<crate::ast::schema_validator::SchemaError>,
    },

    // ═══════════════════════════════════════════
    // GRAPH/DEPENDENCY ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[KILN-020] Circular extends chain: {chain}")]
    #[diagnostic(
        code(kiln::circular_extends),
        help("A document may not (transitively) extend itself")
    )]
    CircularExtends { chain: String },

    #[error("[KILN-021] Circular dependency: {cycle}")]
    #[diagnostic(code(kiln::cycle_detected))]
    CycleDetected { cycle: String },

    // ═══════════════════════════════════════════
    // MERGE ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[KILN-030] {kind} id '{id}' defined in {existing} is redefined in {incoming} without an override strategy")]
    #[diagnostic(
        code(kiln::id_conflict),
        help("Add `\"override\": \"merge\"` or `\"override\": \"replace\"` to the later definition")
    )]
    IdConflict {
        kind: &'static str,
        id: String,
        existing: String,
        incoming: String,
    },

    #[error("[KILN-031] Duplicate id '{id}' ({sources})")]
    #[diagnostic(code(kiln::duplicate_id))]
    DuplicateId { id: String, sources: String },

    // ═══════════════════════════════════════════
    // EXPRESSION/TEMPLATE ERRORS (040-049)
    // ═══════════════════════════════════════════
    #[error("[KILN-040] Invalid expression '{expression}': {reason}")]
    #[diagnostic(code(kiln::expression_error))]
    ExpressionError { expression: String, reason: String },

    #[error("[KILN-041] '{name}' is not defined")]
    #[diagnostic(code(kiln::undefined_reference))]
    UndefinedReference { name: String },

    #[error("[KILN-042] Template error in '{template}': {reason}")]
    #[diagnostic(code(kiln::template_error))]
    TemplateError { template: String, reason: String },

    // ═══════════════════════════════════════════
    // VARIABLE/PROMPT ERRORS (050-059)
    // ═══════════════════════════════════════════
    #[error("[KILN-050] Variable '{id}' could not be resolved: {reason}")]
    #[diagnostic(code(kiln::variable_failed))]
    VariableFailed { id: String, reason: String },

    #[error("[KILN-051] Prompt '{id}' failed: {reason}")]
    #[diagnostic(code(kiln::prompt_failed))]
    PromptFailed { id: String, reason: String },

    #[error("[KILN-052] Command '{command}' failed: {reason}")]
    #[diagnostic(code(kiln::command_failed))]
    CommandFailed { command: String, reason: String },

    // ═══════════════════════════════════════════
    // TASK/RUN ERRORS (060-069)
    // ═══════════════════════════════════════════
    #[error("[KILN-060] Task '{task_id}' failed: {reason}")]
    TaskFailed { task_id: String, reason: String },

    #[error("[KILN-061] No executor registered for task type '{kind}'")]
    #[diagnostic(code(kiln::executor_not_found))]
    ExecutorNotFound { kind: String },

    #[error("[KILN-062] Invalid config for task '{task_id}': {reason}")]
    InvalidTaskConfig { task_id: String, reason: String },

    #[error("[KILN-063] {failed} of {total} required task(s) failed")]
    #[diagnostic(code(kiln::run_failed))]
    RunFailed { failed: usize, total: usize },

    // ═══════════════════════════════════════════
    // IO/CONFIG ERRORS (090-099)
    // ═══════════════════════════════════════════
    #[error("[KILN-090] IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("[KILN-091] Configuration error: {reason}")]
    #[diagnostic(code(kiln::config_error))]
    ConfigError { reason: String },
}

impl KilnError {
    /// Get the error code (e.g., "KILN-001")
    pub fn code(&self) -> &'static str {
        match self {
            Self::DocumentNotFound { .. } => "KILN-001",
            Self::ParseError { .. } => "KILN-002",
            Self::FetchFailed { .. } => "KILN-003",
            Self::InvalidReference { .. } => "KILN-004",
            Self::SchemaError { .. } => "KILN-010",
            Self::SchemaValidationFailed { .. } => "KILN-011",
            Self::CircularExtends { .. } => "KILN-020",
            Self::CycleDetected { .. } => "KILN-021",
            Self::IdConflict { .. } => "KILN-030",
            Self::DuplicateId { .. } => "KILN-031",
            Self::ExpressionError { .. } => "KILN-040",
            Self::UndefinedReference { .. } => "KILN-041",
            Self::TemplateError { .. } => "KILN-042",
            Self::VariableFailed { .. } => "KILN-050",
            Self::PromptFailed { .. } => "KILN-051",
            Self::CommandFailed { .. } => "KILN-052",
            Self::TaskFailed { .. } => "KILN-060",
            Self::ExecutorNotFound { .. } => "KILN-061",
            Self::InvalidTaskConfig { .. } => "KILN-062",
            Self::RunFailed { .. } => "KILN-063",
            Self::Io(_) => "KILN-090",
            Self::ConfigError { .. } => "KILN-091",
        }
    }

    /// Expression and template failures; callers default these instead of aborting
    pub fn is_evaluation_error(&self) -> bool {
        matches!(
            self,
            Self::ExpressionError { .. } | Self::UndefinedReference { .. } | Self::TemplateError { .. }
        )
    }

    /// Graph and merge errors: fatal, raised before any task runs.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::DocumentNotFound { .. }
                | Self::ParseError { .. }
                | Self::FetchFailed { .. }
                | Self::InvalidReference { .. }
                | Self::SchemaError { .. }
                | Self::SchemaValidationFailed { .. }
                | Self::CircularExtends { .. }
                | Self::CycleDetected { .. }
                | Self::IdConflict { .. }
                | Self::DuplicateId { .. }
        )
    }
}

impl FixSuggestion for KilnError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            KilnError::DocumentNotFound { .. } => Some("Check the `extends` path is relative to the referencing document"),
            KilnError::ParseError { .. } => Some("Validate the file with a JSON linter (or `yq` for YAML)"),
            KilnError::FetchFailed { .. } => Some("Check network access and the URL"),
            KilnError::InvalidReference { .. } => Some("Use a relative/absolute path or an http(s) URL"),
            KilnError::SchemaError { .. } => Some("Names must match ^[a-z0-9]+(-[a-z0-9]+)*$"),
            KilnError::SchemaValidationFailed { .. } => Some("Fix the listed fields to match the document schema"),
            KilnError::CircularExtends { .. } => Some("Remove one `extends` edge from the reported chain"),
            KilnError::CycleDetected { .. } => Some("Remove one `dependencies` edge from the reported cycle"),
            KilnError::IdConflict { .. } => Some("Declare `override: merge` or `override: replace` on the later definition"),
            KilnError::DuplicateId { .. } => Some("Ids must be unique across tasks, variables and prompts"),
            KilnError::ExpressionError { .. } => Some("Check operators and quoting in the expression"),
            KilnError::UndefinedReference { .. } => Some("Define the variable or prompt before it is referenced"),
            KilnError::TemplateError { .. } => Some("Use {{ name }} or {{ name.field }} with a defined variable"),
            KilnError::VariableFailed { .. } => Some("Check the variable's value spec and any command it runs"),
            KilnError::PromptFailed { .. } => Some("Provide an answer with --set id=value or a default"),
            KilnError::CommandFailed { .. } => Some("Run the command by hand to see its output"),
            KilnError::TaskFailed { .. } => Some("Inspect the task config; mark it `required: false` to tolerate failures"),
            KilnError::ExecutorNotFound { .. } => Some("Use a built-in type (write, mkdir, delete, exec) or register an executor"),
            KilnError::InvalidTaskConfig { .. } => Some("Check the task's `config` fields"),
            KilnError::RunFailed { .. } => Some("See the warnings above for each failed task"),
            KilnError::Io(_) => Some("Check file path and permissions"),
            KilnError::ConfigError { .. } => Some("Check ~/.config/kiln/config.toml"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_matches_message_prefix() {
        let err = KilnError::CircularExtends {
            chain: "a.json → b.json → a.json".into(),
        };
        assert_eq!(err.code(), "KILN-020");
        assert!(err.to_string().starts_with("[KILN-020]"));
    }

    #[test]
    fn test_id_conflict_names_both_sources() {
        let err = KilnError::IdConflict {
            kind: "task",
            id: "readme".into(),
            existing: "/tmp/base.json".into(),
            incoming: "/tmp/app.json".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/base.json"));
        assert!(msg.contains("/tmp/app.json"));
        assert!(msg.contains("readme"));
    }

    #[test]
    fn test_config_errors_are_classified() {
        assert!(KilnError::DocumentNotFound {
            reference: "x".into()
        }
        .is_config_error());
        assert!(!KilnError::TaskFailed {
            task_id: "t".into(),
            reason: "boom".into()
        }
        .is_config_error());
    }

    #[test]
    fn test_evaluation_errors_are_classified() {
        assert!(KilnError::UndefinedReference { name: "x".into() }.is_evaluation_error());
        assert!(KilnError::TemplateError {
            template: "{{ x }}".into(),
            reason: "undefined: x".into()
        }
        .is_evaluation_error());
        assert!(!KilnError::CommandFailed {
            command: "false".into(),
            reason: "exit 1".into()
        }
        .is_evaluation_error());
    }

    #[test]
    fn test_every_error_has_suggestion() {
        let err = KilnError::RunFailed {
            failed: 1,
            total: 3,
        };
        assert!(err.fix_suggestion().is_some());
    }
}
