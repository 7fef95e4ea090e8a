//! ExecutorRegistry - task `type` → executor

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::delete::DeleteExecutor;
use super::exec::ExecExecutor;
use super::executor::TaskExecutor;
use super::mkdir::MkdirExecutor;
use super::write::WriteExecutor;

/// Executors keyed by task type; owned by the orchestrator
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    executors: FxHashMap<String, Arc<dyn TaskExecutor>>,
}

impl ExecutorRegistry {
    /// Registry with no executors
    pub fn new() -> Self {
        Self::default()
    }

    /// `write`, `mkdir`, `delete` and `exec`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("write", Arc::new(WriteExecutor));
        registry.register("mkdir", Arc::new(MkdirExecutor));
        registry.register("delete", Arc::new(DeleteExecutor));
        registry.register("exec", Arc::new(ExecExecutor));
        registry
    }

    /// Add or replace the executor for `kind`
    pub fn register(&mut self, kind: impl Into<String>, executor: Arc<dyn TaskExecutor>) {
        self.executors.insert(kind.into(), executor);
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn TaskExecutor>> {
        self.executors.get(kind).cloned()
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.executors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl std::fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
