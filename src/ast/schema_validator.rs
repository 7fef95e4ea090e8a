//! Document Schema Validator
//!
//! Validates a parsed document value against the embedded JSON Schema before
//! serde turns it into a `ConfigDocument`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kiln::ast::schema_validator::DocumentSchemaValidator;
//!
//! let validator = DocumentSchemaValidator::new()?;
//! let problems = validator.validate(&value);
//! ```

use std::fmt;
use std::sync::OnceLock;

use jsonschema::Validator;
use serde_json::Value;

use crate::error::KilnError;

/// Embedded schema JSON (compiled at build time)
const SCHEMA_JSON: &str = include_str!("../../schemas/kiln-document.schema.json");

/// Global schema validator instance (lazy initialization)
static VALIDATOR: OnceLock<Result<Validator, String>> = OnceLock::new();

/// Document schema validator
pub struct DocumentSchemaValidator {
    validator: &'static Validator,
}

impl DocumentSchemaValidator {
    /// Create a validator backed by the cached compiled schema
    pub fn new() -> Result<Self, KilnError> {
        let validator_result = VALIDATOR.get_or_init(|| {
            let schema: Value = serde_json::from_str(SCHEMA_JSON)
                .map_err(|e| format!("Failed to parse schema JSON: {}", e))?;
            Validator::new(&schema).map_err(|e| format!("Failed to compile schema: {}", e))
        });

        match validator_result {
            Ok(validator) => Ok(Self { validator }),
            Err(e) => Err(KilnError::ConfigError { reason: e.clone() }),
        }
    }

    /// Every schema violation in `value` (empty when valid)
    pub fn validate(&self, value: &Value) -> Vec<SchemaError> {
        self.validator
            .iter_errors(value)
            .map(|e| SchemaError {
                path: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect()
    }

    /// Validate and convert violations into `SchemaValidationFailed`
    pub fn check(&self, source_ref: &str, value: &Value) -> Result<(), KilnError> {
        let errors = self.validate(value);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(KilnError::SchemaValidationFailed {
                source_ref: source_ref.to_string(),
                errors,
            })
        }
    }
}

/// Schema validation error details
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaError {
    /// JSON pointer path to the error (e.g., "/tasks/0/override")
    pub path: String,
    /// Human-readable error message
    pub message: String,
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "[{}] {}", self.path, self.message)
        }
    }
}
