//! Field-level reconciliation for the `merge` override strategy
//!
//! Each mergeable entity (task, variable, prompt) implements [`Entity`], which
//! the merger uses to key, stamp and reconcile definitions without knowing
//! their concrete shape.

use serde_json::{Map, Value};

use crate::ast::{
    Enabled, FieldGroups, OverrideStrategy, PromptDefinition, Source, TaskDefinition,
    VariableDefinition,
};

/// A definition keyed by id that can collide across documents
pub trait Entity: Clone {
    /// Singular noun used in diagnostics
    const KIND: &'static str;

    fn id(&self) -> &str;
    fn source(&self) -> Option<&Source>;
    fn override_strategy(&self) -> Option<OverrideStrategy>;
    fn clear_override(&mut self);
    /// Record the owning document's `enabled` for cascading disablement
    fn stamp_config_enabled(&mut self, enabled: Option<Enabled>);
    /// Reconcile `incoming` onto `self` (the `merge` strategy)
    fn merge_from(self, incoming: Self) -> Self;
}

/// Union two config payloads, incoming winning per key
///
/// When the incoming side sets any member of an exclusive group, every member
/// of that group it does not set is dropped from the result.
pub fn merge_config(
    base: &Map<String, Value>,
    incoming: &Map<String, Value>,
    groups: FieldGroups,
) -> Map<String, Value> {
    let mut merged = base.clone();

    for group in groups {
        if group.iter().any(|field| incoming.contains_key(*field)) {
            for field in group.iter().filter(|f| !incoming.contains_key(**f)) {
                merged.remove(*field);
            }
        }
    }

    for (key, value) in incoming {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Concatenate, keeping the first occurrence of each entry
fn merge_dependencies(base: &[String], incoming: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(base.len() + incoming.len());
    for dep in base.iter().chain(incoming) {
        if !merged.contains(dep) {
            merged.push(dep.clone());
        }
    }
    merged
}

impl Entity for TaskDefinition {
    const KIND: &'static str = "task";

    fn id(&self) -> &str {
        &self.id
    }

    fn source(&self) -> Option<&Source> {
        self.source.as_ref()
    }

    fn override_strategy(&self) -> Option<OverrideStrategy> {
        self.override_strategy
    }

    fn clear_override(&mut self) {
        self.override_strategy = None;
    }

    fn stamp_config_enabled(&mut self, enabled: Option<Enabled>) {
        self.config_enabled = enabled;
    }

    fn merge_from(self, incoming: Self) -> Self {
        let config = merge_config(&self.config, &incoming.config, incoming.kind.exclusive_groups());
        let dependencies = merge_dependencies(&self.dependencies, &incoming.dependencies);

        TaskDefinition {
            id: incoming.id,
            kind: incoming.kind,
            config,
            description: incoming.description.or(self.description),
            dependencies,
            enabled: incoming.enabled.or(self.enabled),
            required: incoming.required.or(self.required),
            override_strategy: None,
            source: incoming.source.or(self.source),
            config_enabled: incoming.config_enabled,
        }
    }
}

impl Entity for VariableDefinition {
    const KIND: &'static str = "variable";

    fn id(&self) -> &str {
        &self.id
    }

    fn source(&self) -> Option<&Source> {
        self.source.as_ref()
    }

    fn override_strategy(&self) -> Option<OverrideStrategy> {
        self.override_strategy
    }

    fn clear_override(&mut self) {
        self.override_strategy = None;
    }

    fn stamp_config_enabled(&mut self, enabled: Option<Enabled>) {
        self.config_enabled = enabled;
    }

    fn merge_from(self, incoming: Self) -> Self {
        VariableDefinition {
            id: incoming.id,
            value: incoming.value,
            description: incoming.description.or(self.description),
            enabled: incoming.enabled.or(self.enabled),
            override_strategy: None,
            source: incoming.source.or(self.source),
            config_enabled: incoming.config_enabled,
        }
    }
}

impl Entity for PromptDefinition {
    const KIND: &'static str = "prompt";

    fn id(&self) -> &str {
        &self.id
    }

    fn source(&self) -> Option<&Source> {
        self.source.as_ref()
    }

    fn override_strategy(&self) -> Option<OverrideStrategy> {
        self.override_strategy
    }

    fn clear_override(&mut self) {
        self.override_strategy = None;
    }

    fn stamp_config_enabled(&mut self, enabled: Option<Enabled>) {
        self.config_enabled = enabled;
    }

    // `type` has a default, so it cannot be told apart from "not declared";
    // the base kind is kept.
    fn merge_from(self, incoming: Self) -> Self {
        PromptDefinition {
            id: incoming.id,
            kind: self.kind,
            message: incoming.message.or(self.message),
            default: incoming.default.or(self.default),
            choices: incoming.choices.or(self.choices),
            transformers: incoming.transformers.or(self.transformers),
            enabled: incoming.enabled.or(self.enabled),
            override_strategy: None,
            source: incoming.source.or(self.source),
            config_enabled: incoming.config_enabled,
        }
    }
}
