//! GraphLoader - walks `extends` from a root document
//!
//! The walk is a sequential depth-first traversal with two sets:
//! - **visiting**: documents on the current descent path (re-entry = cycle)
//! - **visited**: documents fully loaded (re-entry = diamond, deduplicated)
//!
//! Documents come out in post-order: every parent precedes the documents that
//! extend it, parents in `extends` declaration order, the root last. That is
//! merge priority order (later wins).
//!
//! After the walk, an inherited `enabled` is pushed from the root toward its
//! ancestors. A document passes its own `enabled` (or whatever it inherited)
//! to each parent; a parent without its own `enabled` adopts the condition
//! only when every document extending it passes the same one.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, instrument};

use crate::ast::{ConfigDocument, Enabled, Source};
use crate::error::{KilnError, Result};

use super::store::DocumentStore;

/// Loads the full extends-graph of a root document
pub struct GraphLoader<'a> {
    store: &'a DocumentStore,
}

/// Mutable traversal state for one `load_graph` call
#[derive(Default)]
struct Walk {
    /// Keys on the current descent path (ordered, for the cycle chain)
    visiting: Vec<String>,
    /// Fully loaded keys
    visited: FxHashSet<String>,
    /// Post-order: parents before children
    order: Vec<(String, Arc<ConfigDocument>)>,
    /// key -> resolved parent keys, declaration order
    parents: FxHashMap<String, Vec<String>>,
}

impl<'a> GraphLoader<'a> {
    pub fn new(store: &'a DocumentStore) -> Self {
        Self { store }
    }

    /// Load `root_ref` and every document it (transitively) extends
    #[instrument(skip(self))]
    pub async fn load_graph(&self, root_ref: &str) -> Result<Vec<ConfigDocument>> {
        let root = self.store.resolve(root_ref, None)?;
        let mut walk = Walk::default();
        self.visit(root.clone(), &mut walk).await?;

        let inherited = propagate_enabled(&root.key(), &walk);

        let documents: Vec<ConfigDocument> = walk
            .order
            .into_iter()
            .map(|(key, doc)| {
                let mut doc = ConfigDocument::clone(&doc);
                doc.inherited_enabled = inherited.get(&key).cloned().flatten();
                doc
            })
            .collect();

        debug!(count = documents.len(), "Extends graph loaded");
        Ok(documents)
    }

    async fn visit(&self, source: Source, walk: &mut Walk) -> Result<()> {
        let key = source.key();

        if walk.visiting.contains(&key) {
            let start = walk
                .visiting
                .iter()
                .position(|k| k == &key)
                .unwrap_or(0);
            let chain: Vec<&str> = walk.visiting[start..].iter().map(String::as_str).collect();
            return Err(KilnError::CircularExtends {
                chain: format!("{} → {}", chain.join(" → "), key),
            });
        }
        if walk.visited.contains(&key) {
            debug!(document = %key, "Already loaded (shared ancestor)");
            return Ok(());
        }

        // Load completes before any parent is walked
        let document = self.store.load_source(&source).await?;

        walk.visiting.push(key.clone());
        let mut parent_keys = Vec::new();
        for reference in document.extends_refs() {
            let parent = self.store.resolve(reference, Some(&source))?;
            parent_keys.push(parent.key());
            Box::pin(self.visit(parent, walk)).await?;
        }
        walk.visiting.pop();

        walk.parents.insert(key.clone(), parent_keys);
        walk.visited.insert(key.clone());
        walk.order.push((key, document));
        Ok(())
    }
}

/// Inherited `enabled` per document key (`None` = unconditional)
fn propagate_enabled(root_key: &str, walk: &Walk) -> FxHashMap<String, Option<Enabled>> {
    // Conditions offered to each document by the documents extending it
    let mut offered: FxHashMap<&str, Vec<Option<Enabled>>> = FxHashMap::default();
    let mut inherited: FxHashMap<String, Option<Enabled>> = FxHashMap::default();

    // Reverse post-order visits every child before its parents
    for (key, doc) in walk.order.iter().rev() {
        let own_inherited = if key == root_key {
            None
        } else {
            agreed_condition(offered.get(key.as_str()).map(Vec::as_slice).unwrap_or(&[]))
        };

        let passed = doc.enabled.clone().or_else(|| own_inherited.clone());
        for parent in walk.parents.get(key).into_iter().flatten() {
            offered
                .entry(parent.as_str())
                .or_default()
                .push(passed.clone());
        }

        inherited.insert(key.clone(), own_inherited);
    }

    inherited
}

/// The single condition every referrer agrees on, if any
fn agreed_condition(offers: &[Option<Enabled>]) -> Option<Enabled> {
    let first = offers.first()?.as_ref()?;
    offers
        .iter()
        .all(|offer| offer.as_ref() == Some(first))
        .then(|| first.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::EnabledCheck;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, file: &str, body: &str) {
        let path = dir.join(file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, body).unwrap();
    }

    fn names(docs: &[ConfigDocument]) -> Vec<&str> {
        docs.iter().map(|d| d.name.as_str()).collect()
    }

    fn condition(expr: &str) -> Enabled {
        Enabled::Check(EnabledCheck::Condition(expr.to_string()))
    }

    // ═══════════════════════════════════════════════════════════════
    // TRAVERSAL
    // ═══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn test_parents_precede_children() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app.json", r#"{"name": "app", "extends": ["./b.json", "./c.json"]}"#);
        write(dir.path(), "b.json", r#"{"name": "b"}"#);
        write(dir.path(), "c.json", r#"{"name": "c"}"#);

        let store = DocumentStore::new(dir.path()).unwrap();
        let docs = GraphLoader::new(&store).load_graph("app.json").await.unwrap();
        assert_eq!(names(&docs), vec!["b", "c", "app"]);
    }

    #[tokio::test]
    async fn test_diamond_loads_shared_ancestor_once() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app.json", r#"{"name": "app", "extends": ["./b.json", "./c.json"]}"#);
        write(dir.path(), "b.json", r#"{"name": "b", "extends": "./base.json"}"#);
        write(dir.path(), "c.json", r#"{"name": "c", "extends": "./base.json"}"#);
        write(dir.path(), "base.json", r#"{"name": "base"}"#);

        let store = DocumentStore::new(dir.path()).unwrap();
        let docs = GraphLoader::new(&store).load_graph("app.json").await.unwrap();
        assert_eq!(names(&docs), vec!["base", "b", "c", "app"]);
    }

    #[tokio::test]
    async fn test_extends_resolves_relative_to_referencing_document() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "apps/web.json", r#"{"name": "web", "extends": "../shared/base.json"}"#);
        write(dir.path(), "shared/base.json", r#"{"name": "base"}"#);

        let store = DocumentStore::new(dir.path()).unwrap();
        let docs = GraphLoader::new(&store)
            .load_graph("apps/web.json")
            .await
            .unwrap();
        assert_eq!(names(&docs), vec!["base", "web"]);
    }

    #[tokio::test]
    async fn test_cycle_chain_ends_at_closing_node() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", r#"{"name": "a", "extends": "./b.json"}"#);
        write(dir.path(), "b.json", r#"{"name": "b", "extends": "./a.json"}"#);

        let store = DocumentStore::new(dir.path()).unwrap();
        let err = GraphLoader::new(&store).load_graph("a.json").await.unwrap_err();
        match err {
            KilnError::CircularExtends { chain } => {
                let parts: Vec<&str> = chain.split(" → ").collect();
                assert_eq!(parts.len(), 3);
                assert!(parts[0].ends_with("a.json"));
                assert!(parts[1].ends_with("b.json"));
                assert!(parts[2].ends_with("a.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_self_extend_is_cycle() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", r#"{"name": "a", "extends": "./a.json"}"#);

        let store = DocumentStore::new(dir.path()).unwrap();
        let err = GraphLoader::new(&store).load_graph("a.json").await.unwrap_err();
        assert!(matches!(err, KilnError::CircularExtends { .. }));
    }

    #[tokio::test]
    async fn test_missing_parent_is_not_found() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", r#"{"name": "a", "extends": "./gone.json"}"#);

        let store = DocumentStore::new(dir.path()).unwrap();
        let err = GraphLoader::new(&store).load_graph("a.json").await.unwrap_err();
        assert!(matches!(err, KilnError::DocumentNotFound { .. }));
    }

    // ═══════════════════════════════════════════════════════════════
    // INHERITED ENABLED
    // ═══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn test_condition_propagates_up_the_chain() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "app.json",
            r#"{"name": "app", "extends": "./mid.json",
                "enabled": {"type": "condition", "value": "useDocker"}}"#,
        );
        write(dir.path(), "mid.json", r#"{"name": "mid", "extends": "./base.json"}"#);
        write(dir.path(), "base.json", r#"{"name": "base"}"#);

        let store = DocumentStore::new(dir.path()).unwrap();
        let docs = GraphLoader::new(&store).load_graph("app.json").await.unwrap();

        assert_eq!(docs[0].inherited_enabled, Some(condition("useDocker")));
        assert_eq!(docs[1].inherited_enabled, Some(condition("useDocker")));
        assert_eq!(docs[2].inherited_enabled, None);
    }

    #[tokio::test]
    async fn test_parent_own_enabled_takes_over() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "app.json",
            r#"{"name": "app", "extends": "./mid.json", "enabled": false}"#,
        );
        write(
            dir.path(),
            "mid.json",
            r#"{"name": "mid", "extends": "./base.json",
                "enabled": {"type": "condition", "value": "ci"}}"#,
        );
        write(dir.path(), "base.json", r#"{"name": "base"}"#);

        let store = DocumentStore::new(dir.path()).unwrap();
        let docs = GraphLoader::new(&store).load_graph("app.json").await.unwrap();

        assert_eq!(docs[0].inherited_enabled, Some(condition("ci")));
        assert_eq!(docs[1].effective_enabled(), Some(&condition("ci")));
    }

    #[tokio::test]
    async fn test_shared_ancestor_stays_unconditional_when_chains_disagree() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app.json", r#"{"name": "app", "extends": ["./b.json", "./c.json"]}"#);
        write(
            dir.path(),
            "b.json",
            r#"{"name": "b", "extends": "./base.json",
                "enabled": {"type": "condition", "value": "useB"}}"#,
        );
        write(dir.path(), "c.json", r#"{"name": "c", "extends": "./base.json"}"#);
        write(dir.path(), "base.json", r#"{"name": "base"}"#);

        let store = DocumentStore::new(dir.path()).unwrap();
        let docs = GraphLoader::new(&store).load_graph("app.json").await.unwrap();

        let base = docs.iter().find(|d| d.name == "base").unwrap();
        assert_eq!(base.inherited_enabled, None);
    }

    #[test]
    fn test_agreed_condition() {
        assert_eq!(agreed_condition(&[]), None);
        assert_eq!(
            agreed_condition(&[Some(condition("x")), Some(condition("x"))]),
            Some(condition("x"))
        );
        assert_eq!(agreed_condition(&[Some(condition("x")), None]), None);
        assert_eq!(
            agreed_condition(&[Some(condition("x")), Some(condition("y"))]),
            None
        );
    }
}
