//! Value specs and variable definitions
//!
//! A value spec says how a variable (or a prompt default) obtains its value:
//!
//! ```json
//! { "id": "year", "value": 2024 }
//! { "id": "slug", "value": { "type": "interpolate", "value": "{{ name }}-app" } }
//! { "id": "user", "value": { "type": "exec", "value": "git config user.name" } }
//! { "id": "ext",  "value": { "type": "conditional", "value": {
//!     "condition": "useTs", "ifTrue": "ts", "ifFalse": "js" } } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::OverrideStrategy;
use super::enabled::Enabled;
use super::source::Source;

/// How a value is obtained. A bare JSON value is shorthand for `static`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueSpec {
    Typed(TypedValue),
    Literal(Value),
}

/// Typed value spec, discriminated by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum TypedValue {
    Static(Value),
    /// Expression over context variables
    Expression(String),
    /// Shell command; trimmed stdout becomes the value
    Exec(String),
    /// Executable file relative to the owning document
    ExecFile(String),
    /// `{{ name }}` string interpolation
    Interpolate(String),
    /// Branch on a condition once prompts are known
    Conditional(Box<ConditionalValue>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalValue {
    pub condition: String,
    #[serde(rename = "ifTrue")]
    pub if_true: ValueSpec,
    #[serde(rename = "ifFalse", default, skip_serializing_if = "Option::is_none")]
    pub if_false: Option<ValueSpec>,
}

impl ValueSpec {
    /// Conditional values are resolved in the second variable pass.
    pub fn is_conditional(&self) -> bool {
        matches!(self, ValueSpec::Typed(TypedValue::Conditional(_)))
    }

    /// Short label for logs and events
    pub fn kind(&self) -> &'static str {
        match self {
            ValueSpec::Literal(_) | ValueSpec::Typed(TypedValue::Static(_)) => "static",
            ValueSpec::Typed(TypedValue::Expression(_)) => "expression",
            ValueSpec::Typed(TypedValue::Exec(_)) => "exec",
            ValueSpec::Typed(TypedValue::ExecFile(_)) => "exec-file",
            ValueSpec::Typed(TypedValue::Interpolate(_)) => "interpolate",
            ValueSpec::Typed(TypedValue::Conditional(_)) => "conditional",
        }
    }
}

impl From<Value> for ValueSpec {
    fn from(value: Value) -> Self {
        ValueSpec::Literal(value)
    }
}

/// A named variable contributed to the run context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub id: String,
    pub value: ValueSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<Enabled>,
    #[serde(rename = "override", default, skip_serializing_if = "Option::is_none")]
    pub override_strategy: Option<OverrideStrategy>,
    /// Document the variable came from
    #[serde(skip)]
    pub source: Option<Source>,
    /// Owning document's (possibly inherited) `enabled`
    #[serde(skip)]
    pub config_enabled: Option<Enabled>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_value_is_static() {
        let var: VariableDefinition =
            serde_json::from_value(json!({"id": "year", "value": 2024})).unwrap();
        assert_eq!(var.value, ValueSpec::Literal(json!(2024)));
        assert_eq!(var.value.kind(), "static");
        assert!(!var.value.is_conditional());
    }

    #[test]
    fn test_typed_exec_value() {
        let var: VariableDefinition = serde_json::from_value(
            json!({"id": "user", "value": {"type": "exec", "value": "whoami"}}),
        )
        .unwrap();
        assert_eq!(var.value, ValueSpec::Typed(TypedValue::Exec("whoami".into())));
    }

    #[test]
    fn test_exec_file_kebab_case() {
        let spec: ValueSpec =
            serde_json::from_value(json!({"type": "exec-file", "value": "./x.sh"})).unwrap();
        assert_eq!(spec.kind(), "exec-file");
    }

    #[test]
    fn test_conditional_value_nests_specs() {
        let var: VariableDefinition = serde_json::from_value(json!({
            "id": "ext",
            "value": {"type": "conditional", "value": {
                "condition": "useTs",
                "ifTrue": "ts",
                "ifFalse": {"type": "interpolate", "value": "{{ lang }}"}
            }}
        }))
        .unwrap();

        assert!(var.value.is_conditional());
        let ValueSpec::Typed(TypedValue::Conditional(cond)) = var.value else {
            panic!("expected conditional");
        };
        assert_eq!(cond.if_true, ValueSpec::Literal(json!("ts")));
        assert_eq!(
            cond.if_false,
            Some(ValueSpec::Typed(TypedValue::Interpolate("{{ lang }}".into())))
        );
    }

    #[test]
    fn test_override_field_parses() {
        let var: VariableDefinition = serde_json::from_value(
            json!({"id": "x", "value": 1, "override": "replace"}),
        )
        .unwrap();
        assert_eq!(var.override_strategy, Some(OverrideStrategy::Replace));
    }
}
