//! Value transformers applied to prompt answers
//!
//! Built-ins: lowercase, uppercase, trim, kebab-case, snake-case, camel-case,
//! pascal-case, title-case. More can be registered per orchestrator.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;

type TransformFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Named string transformers
#[derive(Clone)]
pub struct Transformers {
    registry: FxHashMap<String, TransformFn>,
}

impl Default for Transformers {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl Transformers {
    /// Empty registry
    pub fn empty() -> Self {
        Self {
            registry: FxHashMap::default(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut t = Self::empty();
        t.register("lowercase", |s| s.to_lowercase());
        t.register("uppercase", |s| s.to_uppercase());
        t.register("trim", |s| s.trim().to_string());
        t.register("kebab-case", |s| words(s).join("-"));
        t.register("snake-case", |s| words(s).join("_"));
        t.register("camel-case", |s| {
            let mut out = String::new();
            for (i, word) in words(s).iter().enumerate() {
                if i == 0 {
                    out.push_str(word);
                } else {
                    out.push_str(&capitalize(word));
                }
            }
            out
        });
        t.register("pascal-case", |s| words(s).iter().map(|w| capitalize(w)).collect());
        t.register("title-case", |s| {
            words(s)
                .iter()
                .map(|w| capitalize(w))
                .collect::<Vec<_>>()
                .join(" ")
        });
        t
    }

    /// Add or replace a transformer
    pub fn register(&mut self, name: &str, f: impl Fn(&str) -> String + Send + Sync + 'static) {
        self.registry.insert(name.to_string(), Arc::new(f));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains_key(name)
    }

    /// Apply `name` to strings (and string array items); other values pass
    /// through. `None` when the transformer is unknown.
    pub fn apply(&self, name: &str, value: &Value) -> Option<Value> {
        let f = self.registry.get(name)?;
        Some(match value {
            Value::String(s) => Value::String(f(s)),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => Value::String(f(s)),
                        other => other.clone(),
                    })
                    .collect(),
            ),
            other => other.clone(),
        })
    }
}

impl std::fmt::Debug for Transformers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.registry.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Transformers").field("names", &names).finish()
    }
}

/// Lowercased words, split on separators and case boundaries
///
/// `"MyHTTPServer v2"` → `["my", "http", "server", "v2"]`
fn words(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            // fooBar | HTTPServer
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }

        current.extend(c.to_lowercase());
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
