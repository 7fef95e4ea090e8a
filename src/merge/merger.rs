//! DocumentMerger - folds priority-ordered documents into one
//!
//! Later documents override earlier ones. A repeated id must declare an
//! override strategy on the later definition; silent shadowing is an error.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, instrument};

use crate::ast::{ConfigDocument, Enabled, OverrideStrategy};
use crate::error::{KilnError, Result};

use super::fields::Entity;

/// Insertion-ordered entity table keyed by id
struct Table<E: Entity> {
    items: Vec<E>,
    index: FxHashMap<String, usize>,
}

impl<E: Entity> Table<E> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Insert a definition from a later document
    fn absorb(&mut self, mut incoming: E, config_enabled: Option<&Enabled>) -> Result<()> {
        incoming.stamp_config_enabled(config_enabled.cloned());

        let Some(&slot) = self.index.get(incoming.id()) else {
            self.index.insert(incoming.id().to_string(), self.items.len());
            self.items.push(incoming);
            return Ok(());
        };

        let existing = &self.items[slot];
        let resolved = match incoming.override_strategy() {
            None => {
                return Err(KilnError::IdConflict {
                    kind: E::KIND,
                    id: incoming.id().to_string(),
                    existing: describe(existing.source()),
                    incoming: describe(incoming.source()),
                })
            }
            Some(OverrideStrategy::Replace) => {
                debug!(kind = E::KIND, id = incoming.id(), "Replacing definition");
                incoming.clear_override();
                incoming
            }
            Some(OverrideStrategy::Merge) => {
                debug!(kind = E::KIND, id = incoming.id(), "Merging definition");
                existing.clone().merge_from(incoming)
            }
        };

        self.items[slot] = resolved;
        Ok(())
    }
}

fn describe(source: Option<&crate::ast::Source>) -> String {
    source
        .map(ToString::to_string)
        .unwrap_or_else(|| "<unknown>".to_string())
}

/// Merges documents in priority order
#[derive(Debug, Default)]
pub struct DocumentMerger;

impl DocumentMerger {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip_all, fields(documents = documents.len()))]
    pub fn merge(&self, documents: Vec<ConfigDocument>) -> Result<ConfigDocument> {
        let mut documents = documents;
        match documents.len() {
            0 => return Ok(ConfigDocument::empty()),
            1 => {
                let only = documents.remove(0);
                only.validate_unique_ids()?;
                return Ok(only);
            }
            _ => {}
        }

        for doc in &documents {
            doc.validate_unique_ids()?;
        }

        let mut tasks = Table::new();
        let mut variables = Table::new();
        let mut prompts = Table::new();
        let mut skipped: FxHashSet<String> = FxHashSet::default();

        for doc in &documents {
            let effective = doc.effective_enabled();

            if effective.is_some_and(Enabled::is_literal_false) {
                debug!(document = %doc.name, "Skipping disabled document");
                skipped.insert(doc.name.clone());
                continue;
            }
            if effective.is_none() && doc.dependencies.iter().any(|d| skipped.contains(d)) {
                debug!(document = %doc.name, "Skipping document depending on a disabled one");
                skipped.insert(doc.name.clone());
                continue;
            }

            for task in &doc.tasks {
                tasks.absorb(task.clone(), effective)?;
            }
            for variable in &doc.variables {
                variables.absorb(variable.clone(), effective)?;
            }
            for prompt in &doc.prompts {
                prompts.absorb(prompt.clone(), effective)?;
            }
        }

        // Identity comes from the highest-priority document
        let last = documents.pop().unwrap_or_else(ConfigDocument::empty);
        let merged = ConfigDocument {
            name: last.name,
            description: last.description,
            extends: last.extends,
            dependencies: last.dependencies,
            enabled: last.enabled,
            variables: variables.items,
            prompts: prompts.items,
            tasks: tasks.items,
            source: last.source,
            inherited_enabled: last.inherited_enabled,
        };

        merged.validate_unique_ids()?;
        debug!(
            tasks = merged.tasks.len(),
            variables = merged.variables.len(),
            prompts = merged.prompts.len(),
            skipped = skipped.len(),
            "Documents merged"
        );
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{EnabledCheck, Source, ValueSpec};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::path::PathBuf;

    fn doc(file: &str, value: Value) -> ConfigDocument {
        let mut doc: ConfigDocument = serde_json::from_value(value).unwrap();
        doc.stamp_source(&Source::Path(PathBuf::from(format!("/tpl/{file}"))));
        doc
    }

    fn task_ids(doc: &ConfigDocument) -> Vec<&str> {
        doc.tasks.iter().map(|t| t.id.as_str()).collect()
    }

    // ═══════════════════════════════════════════════════════════════
    // BASICS
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn test_zero_documents_is_empty() {
        let merged = DocumentMerger::new().merge(vec![]).unwrap();
        assert!(merged.tasks.is_empty());
        assert!(merged.name.is_empty());
    }

    #[test]
    fn test_single_document_is_returned_unchanged() {
        let only = doc("a.json", json!({"name": "a", "tasks": [{"id": "t", "type": "mkdir"}]}));
        let merged = DocumentMerger::new().merge(vec![only.clone()]).unwrap();
        assert_eq!(merged, only);
    }

    #[test]
    fn test_single_document_duplicate_ids_fail() {
        let only = doc(
            "a.json",
            json!({"name": "a", "tasks": [{"id": "t", "type": "mkdir"}, {"id": "t", "type": "exec"}]}),
        );
        let err = DocumentMerger::new().merge(vec![only]).unwrap_err();
        assert!(matches!(err, KilnError::DuplicateId { .. }));
    }

    #[test]
    fn test_disjoint_documents_append_in_order() {
        let a = doc("a.json", json!({"name": "a", "tasks": [{"id": "one", "type": "mkdir"}]}));
        let b = doc("b.json", json!({"name": "b", "tasks": [{"id": "two", "type": "mkdir"}]}));
        let merged = DocumentMerger::new().merge(vec![a, b]).unwrap();
        assert_eq!(task_ids(&merged), vec!["one", "two"]);
        assert_eq!(merged.name, "b");
    }

    // ═══════════════════════════════════════════════════════════════
    // OVERRIDE STRATEGIES
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn test_collision_without_override_names_both_sources() {
        let a = doc("a.json", json!({"name": "a", "tasks": [{"id": "t", "type": "mkdir"}]}));
        let b = doc("b.json", json!({"name": "b", "tasks": [{"id": "t", "type": "mkdir"}]}));
        let err = DocumentMerger::new().merge(vec![a, b]).unwrap_err();
        match err {
            KilnError::IdConflict {
                kind,
                id,
                existing,
                incoming,
            } => {
                assert_eq!(kind, "task");
                assert_eq!(id, "t");
                assert_eq!(existing, "/tpl/a.json");
                assert_eq!(incoming, "/tpl/b.json");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_replace_takes_incoming_fields_only() {
        let a = doc(
            "a.json",
            json!({"name": "a", "tasks": [{"id": "t", "type": "write",
                "config": {"path": "x", "content": "old"}, "dependencies": ["z"]}]}),
        );
        let b = doc(
            "b.json",
            json!({"name": "b", "tasks": [{"id": "t", "type": "write",
                "config": {"path": "y"}, "override": "replace"}]}),
        );
        let merged = DocumentMerger::new().merge(vec![a, b]).unwrap();
        let task = &merged.tasks[0];
        assert_eq!(Value::Object(task.config.clone()), json!({"path": "y"}));
        assert!(task.dependencies.is_empty());
        assert_eq!(task.override_strategy, None);
        assert_eq!(task.source, Some(Source::Path(PathBuf::from("/tpl/b.json"))));
    }

    #[test]
    fn test_merge_unions_config_and_keeps_position() {
        let a = doc(
            "a.json",
            json!({"name": "a", "tasks": [
                {"id": "t", "type": "write", "config": {"path": "x", "content": "old"}},
                {"id": "u", "type": "mkdir"}
            ]}),
        );
        let b = doc(
            "b.json",
            json!({"name": "b", "tasks": [{"id": "t", "type": "write",
                "config": {"content": "new", "overwrite": true}, "override": "merge"}]}),
        );
        let merged = DocumentMerger::new().merge(vec![a, b]).unwrap();
        assert_eq!(task_ids(&merged), vec!["t", "u"]);
        assert_eq!(
            Value::Object(merged.tasks[0].config.clone()),
            json!({"path": "x", "content": "new", "overwrite": true})
        );
    }

    #[test]
    fn test_variable_replace() {
        let a = doc("a.json", json!({"name": "a", "variables": [{"id": "v", "value": 1}]}));
        let b = doc(
            "b.json",
            json!({"name": "b", "variables": [{"id": "v", "value": 2, "override": "replace"}]}),
        );
        let merged = DocumentMerger::new().merge(vec![a, b]).unwrap();
        assert_eq!(merged.variables.len(), 1);
        assert_eq!(merged.variables[0].value, ValueSpec::from(json!(2)));
    }

    #[test]
    fn test_appending_disjoint_document_extends_previous_merge() {
        let a = doc(
            "a.json",
            json!({"name": "a",
                "variables": [{"id": "port", "value": 3000}],
                "tasks": [
                    {"id": "t", "type": "write", "config": {"path": "x", "content": "old"}},
                    {"id": "u", "type": "mkdir", "config": {"path": "u"}}
                ]}),
        );
        let b = doc(
            "b.json",
            json!({"name": "b",
                "variables": [{"id": "port", "value": 8080, "override": "replace"}],
                "prompts": [{"id": "title"}],
                "tasks": [{"id": "t", "type": "write", "config": {"content": "new"}, "override": "merge"}]}),
        );
        let c = doc(
            "c.json",
            json!({"name": "c",
                "variables": [{"id": "license", "value": "MIT"}],
                "prompts": [{"id": "author"}],
                "tasks": [{"id": "ci", "type": "mkdir", "config": {"path": ".github"}}]}),
        );

        let merger = DocumentMerger::new();
        let ab = merger.merge(vec![a.clone(), b.clone()]).unwrap();
        let abc = merger.merge(vec![a, b, c.clone()]).unwrap();

        let expected_tasks: Vec<_> = ab.tasks.iter().chain(&c.tasks).cloned().collect();
        let expected_variables: Vec<_> = ab.variables.iter().chain(&c.variables).cloned().collect();
        let expected_prompts: Vec<_> = ab.prompts.iter().chain(&c.prompts).cloned().collect();
        assert_eq!(abc.tasks, expected_tasks);
        assert_eq!(abc.variables, expected_variables);
        assert_eq!(abc.prompts, expected_prompts);
        assert_eq!(abc.variables[0].value, ValueSpec::from(json!(8080)));
        assert_eq!(abc.tasks[0].config_str("content"), Some("new"));
    }

    #[test]
    fn test_cross_kind_collision_fails_final_check() {
        let a = doc("a.json", json!({"name": "a", "tasks": [{"id": "name", "type": "mkdir"}]}));
        let b = doc("b.json", json!({"name": "b", "prompts": [{"id": "name"}]}));
        let err = DocumentMerger::new().merge(vec![a, b]).unwrap_err();
        assert!(matches!(err, KilnError::DuplicateId { .. }));
    }

    // ═══════════════════════════════════════════════════════════════
    // ENABLED
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn test_literal_false_document_is_skipped() {
        let a = doc(
            "a.json",
            json!({"name": "a", "enabled": false, "tasks": [{"id": "one", "type": "mkdir"}]}),
        );
        let b = doc("b.json", json!({"name": "b", "tasks": [{"id": "two", "type": "mkdir"}]}));
        let merged = DocumentMerger::new().merge(vec![a, b]).unwrap();
        assert_eq!(task_ids(&merged), vec!["two"]);
    }

    #[test]
    fn test_dependent_of_disabled_document_is_skipped() {
        let a = doc(
            "a.json",
            json!({"name": "a", "enabled": false, "tasks": [{"id": "one", "type": "mkdir"}]}),
        );
        let b = doc(
            "b.json",
            json!({"name": "b", "dependencies": ["a"], "tasks": [{"id": "two", "type": "mkdir"}]}),
        );
        let c = doc("c.json", json!({"name": "c", "tasks": [{"id": "three", "type": "mkdir"}]}));
        let merged = DocumentMerger::new().merge(vec![a, b, c]).unwrap();
        assert_eq!(task_ids(&merged), vec!["three"]);
    }

    #[test]
    fn test_condition_is_stamped_on_entities() {
        let cond = Enabled::Check(EnabledCheck::Condition("useDocker".into()));
        let mut a = doc(
            "a.json",
            json!({"name": "a", "tasks": [{"id": "dockerfile", "type": "mkdir"}]}),
        );
        a.inherited_enabled = Some(cond.clone());
        let b = doc("b.json", json!({"name": "b", "tasks": [{"id": "readme", "type": "mkdir"}]}));

        let merged = DocumentMerger::new().merge(vec![a, b]).unwrap();
        assert_eq!(merged.tasks[0].config_enabled, Some(cond));
        assert_eq!(merged.tasks[1].config_enabled, None);
    }
}
