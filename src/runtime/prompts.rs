//! Prompt collection - asking the user for values
//!
//! - `TerminalCollector`: interactive, dialoguer widgets per prompt kind
//! - `DefaultsCollector`: non-interactive, answers with defaults
//! - `ScriptedCollector`: fixed answers (from `--set` or tests), falling back
//!   to another collector

use async_trait::async_trait;
use dialoguer::{Confirm, Input, MultiSelect, Password, Select};
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::ast::{PromptDefinition, PromptKind};
use crate::error::{KilnError, Result};
use crate::expr;

/// Source of prompt answers
#[async_trait]
pub trait PromptCollector: Send + Sync {
    /// Answer `prompt`; `default` is the already-resolved default value
    async fn ask(&self, prompt: &PromptDefinition, default: Option<&Value>) -> Result<Value>;
}

fn prompt_error(prompt: &PromptDefinition, reason: impl Into<String>) -> KilnError {
    KilnError::PromptFailed {
        id: prompt.id.clone(),
        reason: reason.into(),
    }
}

/// Convert a raw text answer into the prompt kind's value shape
///
/// - confirm: `y`/`yes`/`true`/`1` (case-insensitive) → true, else false
/// - number: parsed as a number
/// - multiselect: comma-separated list
/// - select: the matching choice's value (by label or value), else the text
pub fn coerce_answer(prompt: &PromptDefinition, raw: &str) -> Result<Value> {
    let raw = raw.trim();
    match prompt.kind {
        PromptKind::Confirm => Ok(Value::Bool(matches!(
            raw.to_ascii_lowercase().as_str(),
            "y" | "yes" | "true" | "1"
        ))),
        PromptKind::Number => raw
            .parse::<f64>()
            .map(expr::number)
            .map_err(|_| prompt_error(prompt, format!("'{}' is not a number", raw))),
        PromptKind::Multiselect => Ok(Value::Array(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| choice_value(prompt, s))
                .collect(),
        )),
        PromptKind::Select => Ok(choice_value(prompt, raw)),
        PromptKind::Input | PromptKind::Password => Ok(Value::String(raw.to_string())),
    }
}

fn choice_value(prompt: &PromptDefinition, raw: &str) -> Value {
    prompt
        .choices
        .iter()
        .flatten()
        .find(|c| c.label() == raw || c.value().as_str() == Some(raw))
        .map(|c| c.value())
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

// ═══════════════════════════════════════════════════════════════
// DEFAULTS
// ═══════════════════════════════════════════════════════════════

/// Answers every prompt without user interaction
///
/// Without a default: confirm → false, multiselect → [], select → first
/// choice; input, password and number fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultsCollector;

#[async_trait]
impl PromptCollector for DefaultsCollector {
    async fn ask(&self, prompt: &PromptDefinition, default: Option<&Value>) -> Result<Value> {
        if let Some(default) = default.filter(|d| !d.is_null()) {
            return Ok(default.clone());
        }
        match prompt.kind {
            PromptKind::Confirm => Ok(Value::Bool(false)),
            PromptKind::Multiselect => Ok(Value::Array(Vec::new())),
            PromptKind::Select => prompt
                .choices
                .as_ref()
                .and_then(|choices| choices.first())
                .map(|c| c.value())
                .ok_or_else(|| prompt_error(prompt, "select prompt has no choices")),
            _ => Err(prompt_error(
                prompt,
                "no default value and prompts are non-interactive",
            )),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
// SCRIPTED
// ═══════════════════════════════════════════════════════════════

/// Fixed answers by prompt id, falling back to another collector
pub struct ScriptedCollector {
    answers: FxHashMap<String, String>,
    fallback: Box<dyn PromptCollector>,
}

impl ScriptedCollector {
    pub fn new(fallback: Box<dyn PromptCollector>) -> Self {
        Self {
            answers: FxHashMap::default(),
            fallback,
        }
    }

    pub fn answer(mut self, id: impl Into<String>, raw: impl Into<String>) -> Self {
        self.answers.insert(id.into(), raw.into());
        self
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

#[async_trait]
impl PromptCollector for ScriptedCollector {
    async fn ask(&self, prompt: &PromptDefinition, default: Option<&Value>) -> Result<Value> {
        match self.answers.get(&prompt.id) {
            Some(raw) => coerce_answer(prompt, raw),
            None => self.fallback.ask(prompt, default).await,
        }
    }
}

// ═══════════════════════════════════════════════════════════════
// TERMINAL
// ═══════════════════════════════════════════════════════════════

/// Interactive terminal prompts
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalCollector;

#[async_trait]
impl PromptCollector for TerminalCollector {
    async fn ask(&self, prompt: &PromptDefinition, default: Option<&Value>) -> Result<Value> {
        let owned = prompt.clone();
        let default = default.cloned();
        tokio::task::spawn_blocking(move || ask_blocking(&owned, default.as_ref()))
            .await
            .map_err(|e| prompt_error(prompt, format!("prompt task panicked: {}", e)))?
    }
}

fn ask_blocking(prompt: &PromptDefinition, default: Option<&Value>) -> Result<Value> {
    let message = prompt.message();
    let io = |e: dialoguer::Error| prompt_error(prompt, e.to_string());
    let choices = prompt.choices.as_deref().unwrap_or_default();

    match prompt.kind {
        PromptKind::Input => {
            let mut input = Input::<String>::new().with_prompt(message);
            if let Some(d) = default.filter(|d| !d.is_null()) {
                input = input.default(expr::display(d));
            }
            Ok(Value::String(input.interact_text().map_err(io)?))
        }
        PromptKind::Password => {
            let answer = Password::new().with_prompt(message).interact().map_err(io)?;
            Ok(Value::String(answer))
        }
        PromptKind::Number => {
            let mut input = Input::<String>::new()
                .with_prompt(message)
                .validate_with(|s: &String| {
                    s.trim()
                        .parse::<f64>()
                        .map(|_| ())
                        .map_err(|_| "enter a number")
                });
            if let Some(d) = default.filter(|d| !d.is_null()) {
                input = input.default(expr::display(d));
            }
            coerce_answer(prompt, &input.interact_text().map_err(io)?)
        }
        PromptKind::Confirm => {
            let answer = Confirm::new()
                .with_prompt(message)
                .default(default.is_some_and(expr::truthy))
                .interact()
                .map_err(io)?;
            Ok(Value::Bool(answer))
        }
        PromptKind::Select => {
            if choices.is_empty() {
                return Err(prompt_error(prompt, "select prompt has no choices"));
            }
            let labels: Vec<&str> = choices.iter().map(|c| c.label()).collect();
            let initial = default
                .and_then(|d| choices.iter().position(|c| &c.value() == d))
                .unwrap_or(0);
            let index = Select::new()
                .with_prompt(message)
                .items(&labels)
                .default(initial)
                .interact()
                .map_err(io)?;
            Ok(choices[index].value())
        }
        PromptKind::Multiselect => {
            let labels: Vec<&str> = choices.iter().map(|c| c.label()).collect();
            let preselected: Vec<bool> = choices
                .iter()
                .map(|c| {
                    default
                        .and_then(Value::as_array)
                        .is_some_and(|d| d.contains(&c.value()))
                })
                .collect();
            let indices = MultiSelect::new()
                .with_prompt(message)
                .items(&labels)
                .defaults(&preselected)
                .interact()
                .map_err(io)?;
            Ok(Value::Array(
                indices.into_iter().map(|i| choices[i].value()).collect(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prompt(value: Value) -> PromptDefinition {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_coerce_confirm_and_number() {
        let confirm = prompt(json!({"id": "ok", "type": "confirm"}));
        assert_eq!(coerce_answer(&confirm, "Yes").unwrap(), json!(true));
        assert_eq!(coerce_answer(&confirm, "no").unwrap(), json!(false));

        let number = prompt(json!({"id": "port", "type": "number"}));
        assert_eq!(coerce_answer(&number, "8080").unwrap(), json!(8080));
        assert!(coerce_answer(&number, "eighty").is_err());
    }

    #[test]
    fn test_coerce_select_maps_labels_to_values() {
        let select = prompt(json!({
            "id": "db", "type": "select",
            "choices": [{"name": "PostgreSQL", "value": "pg"}, "sqlite"]
        }));
        assert_eq!(coerce_answer(&select, "PostgreSQL").unwrap(), json!("pg"));
        assert_eq!(coerce_answer(&select, "sqlite").unwrap(), json!("sqlite"));

        let multi = prompt(json!({"id": "f", "type": "multiselect", "choices": ["a", "b"]}));
        assert_eq!(coerce_answer(&multi, "a, b,").unwrap(), json!(["a", "b"]));
    }

    #[tokio::test]
    async fn test_defaults_collector() {
        let c = DefaultsCollector;
        let input = prompt(json!({"id": "name"}));
        assert_eq!(c.ask(&input, Some(&json!("demo"))).await.unwrap(), json!("demo"));
        assert!(c.ask(&input, None).await.is_err());

        let confirm = prompt(json!({"id": "ok", "type": "confirm"}));
        assert_eq!(c.ask(&confirm, None).await.unwrap(), json!(false));

        let select = prompt(json!({"id": "pm", "type": "select", "choices": ["npm", "pnpm"]}));
        assert_eq!(c.ask(&select, None).await.unwrap(), json!("npm"));
    }

    #[tokio::test]
    async fn test_scripted_collector_falls_back() {
        let c = ScriptedCollector::new(Box::new(DefaultsCollector)).answer("name", "scripted");
        let name = prompt(json!({"id": "name"}));
        let other = prompt(json!({"id": "other"}));

        assert_eq!(c.ask(&name, Some(&json!("d"))).await.unwrap(), json!("scripted"));
        assert_eq!(c.ask(&other, Some(&json!("d"))).await.unwrap(), json!("d"));
    }
}
