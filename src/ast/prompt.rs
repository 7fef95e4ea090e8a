//! Prompt definitions
//!
//! ```json
//! { "id": "name", "type": "input", "message": "Project name?",
//!   "default": "my-app", "transformers": ["kebab-case"] }
//! ```

use serde::{Deserialize, Serialize};

use super::document::OverrideStrategy;
use super::enabled::Enabled;
use super::source::Source;
use super::value::ValueSpec;

/// How the answer is collected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptKind {
    #[default]
    Input,
    Confirm,
    Select,
    Multiselect,
    Number,
    Password,
}

impl PromptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptKind::Input => "input",
            PromptKind::Confirm => "confirm",
            PromptKind::Select => "select",
            PromptKind::Multiselect => "multiselect",
            PromptKind::Number => "number",
            PromptKind::Password => "password",
        }
    }
}

/// A selectable choice: a bare string or `{ "name", "value" }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Choice {
    Plain(String),
    Labeled {
        name: String,
        value: serde_json::Value,
    },
}

impl Choice {
    pub fn label(&self) -> &str {
        match self {
            Choice::Plain(s) => s,
            Choice::Labeled { name, .. } => name,
        }
    }

    pub fn value(&self) -> serde_json::Value {
        match self {
            Choice::Plain(s) => serde_json::Value::String(s.clone()),
            Choice::Labeled { value, .. } => value.clone(),
        }
    }
}

/// A question put to the user; the answer is stored under `id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptDefinition {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: PromptKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ValueSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<Enabled>,
    #[serde(rename = "override", default, skip_serializing_if = "Option::is_none")]
    pub override_strategy: Option<OverrideStrategy>,
    #[serde(skip)]
    pub source: Option<Source>,
    #[serde(skip)]
    pub config_enabled: Option<Enabled>,
}

impl PromptDefinition {
    /// Message shown to the user (falls back to the id)
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prompt_defaults_to_input() {
        let p: PromptDefinition = serde_json::from_value(json!({"id": "name"})).unwrap();
        assert_eq!(p.kind, PromptKind::Input);
        assert_eq!(p.message(), "name");
    }

    #[test]
    fn test_select_with_mixed_choices() {
        let p: PromptDefinition = serde_json::from_value(json!({
            "id": "framework",
            "type": "select",
            "choices": ["react", {"name": "Vue 3", "value": "vue"}]
        }))
        .unwrap();
        let choices = p.choices.unwrap();
        assert_eq!(choices[0].label(), "react");
        assert_eq!(choices[1].label(), "Vue 3");
        assert_eq!(choices[1].value(), json!("vue"));
    }
}
