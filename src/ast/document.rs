//! Configuration document - the root structure of every loaded file
//!
//! ```json
//! {
//!   "name": "react-app",
//!   "extends": ["../base/kiln.json", "https://example.com/lint.json"],
//!   "dependencies": ["base"],
//!   "enabled": { "type": "condition", "value": "framework == 'react'" },
//!   "variables": [...], "prompts": [...], "tasks": [...]
//! }
//! ```

use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{KilnError, Result};

use super::enabled::Enabled;
use super::prompt::PromptDefinition;
use super::source::Source;
use super::task::TaskDefinition;
use super::value::VariableDefinition;

/// Pre-compiled document name pattern
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap());

/// Check a document name against `^[a-z0-9]+(-[a-z0-9]+)*$`
pub fn is_valid_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

/// Strategy for a same-id definition arriving from a later document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideStrategy {
    /// Field-level reconciliation with the earlier definition
    Merge,
    /// Wholesale replacement of the earlier definition
    Replace,
}

/// Handles string OR array for `extends`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Extends {
    Single(String),
    Multiple(Vec<String>),
}

impl Extends {
    pub fn as_vec(&self) -> Vec<&str> {
        match self {
            Extends::Single(s) => vec![s.as_str()],
            Extends::Multiple(v) => v.iter().map(|s| s.as_str()).collect(),
        }
    }
}

/// One configuration file (or URL payload)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<Extends>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<Enabled>,
    #[serde(default)]
    pub variables: Vec<VariableDefinition>,
    #[serde(default)]
    pub prompts: Vec<PromptDefinition>,
    #[serde(default)]
    pub tasks: Vec<TaskDefinition>,
    /// Resolved location this document was loaded from
    #[serde(skip)]
    pub source: Option<Source>,
    /// Condition propagated from a descendant down the extends chain
    #[serde(skip)]
    pub inherited_enabled: Option<Enabled>,
}

impl ConfigDocument {
    /// Empty placeholder (merging zero documents)
    pub fn empty() -> Self {
        Self {
            name: String::new(),
            description: None,
            extends: None,
            dependencies: Vec::new(),
            enabled: None,
            variables: Vec::new(),
            prompts: Vec::new(),
            tasks: Vec::new(),
            source: None,
            inherited_enabled: None,
        }
    }

    /// Parent references in declaration order
    pub fn extends_refs(&self) -> Vec<&str> {
        self.extends.as_ref().map(Extends::as_vec).unwrap_or_default()
    }

    /// Own `enabled`, else the one inherited from a descendant
    pub fn effective_enabled(&self) -> Option<&Enabled> {
        self.enabled.as_ref().or(self.inherited_enabled.as_ref())
    }

    /// Label used in diagnostics: source location, else the name
    pub fn label(&self) -> String {
        match &self.source {
            Some(source) => source.to_string(),
            None => self.name.clone(),
        }
    }

    /// Stamp provenance on the document and everything it declares
    pub fn stamp_source(&mut self, source: &Source) {
        self.source = Some(source.clone());
        for task in &mut self.tasks {
            task.source = Some(source.clone());
        }
        for variable in &mut self.variables {
            variable.source = Some(source.clone());
        }
        for prompt in &mut self.prompts {
            prompt.source = Some(source.clone());
        }
    }

    /// Ids must be unique across tasks, variables and prompts together.
    pub fn validate_unique_ids(&self) -> Result<()> {
        let mut seen: FxHashMap<&str, String> = FxHashMap::default();

        let entries = self
            .tasks
            .iter()
            .map(|t| (t.id.as_str(), "task", &t.source))
            .chain(
                self.variables
                    .iter()
                    .map(|v| (v.id.as_str(), "variable", &v.source)),
            )
            .chain(
                self.prompts
                    .iter()
                    .map(|p| (p.id.as_str(), "prompt", &p.source)),
            );

        for (id, kind, source) in entries {
            let here = describe(kind, source);
            if let Some(first) = seen.insert(id, here.clone()) {
                return Err(KilnError::DuplicateId {
                    id: id.to_string(),
                    sources: format!("{} and {}", first, here),
                });
            }
        }

        Ok(())
    }
}

fn describe(kind: &str, source: &Option<Source>) -> String {
    match source {
        Some(source) => format!("{} in {}", kind, source),
        None => kind.to_string(),
    }
}
