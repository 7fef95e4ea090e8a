//! RunContext - key/value bindings visible to expressions and templates
//!
//! Only the orchestrator writes to it, and never concurrently.

use serde::Serialize;
use serde_json::{Map, Value};

/// Variables and prompt answers accumulated over one run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RunContext {
    values: Map<String, Value>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Bind (or rebind) a key
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Scope handed to the expression evaluator
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Map<String, Value>> for RunContext {
    fn from(values: Map<String, Value>) -> Self {
        Self::from_map(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_overwrites() {
        let mut ctx = RunContext::new();
        ctx.set("name", json!("a"));
        ctx.set("name", json!("b"));
        assert_eq!(ctx.get("name"), Some(&json!("b")));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let mut ctx = RunContext::new();
        ctx.set("port", json!(3000));
        assert_eq!(serde_json::to_value(&ctx).unwrap(), json!({"port": 3000}));
    }
}
