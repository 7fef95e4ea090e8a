//! RunHooks Trait - lifecycle callbacks fired by the orchestrator
//!
//! Every method has a no-op default so implementors pick what they need.
//! `EventLog` records every callback; `HookChain` fans out to several hooks.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::ast::TaskDefinition;
use crate::error::KilnError;

use super::log::{EventKind, EventLog};

/// Callbacks over one run, invoked sequentially
pub trait RunHooks: Send + Sync {
    /// Fires once execution begins (never in a dry run)
    fn on_run_started(&self, _name: &str, _run_id: &str, _task_count: usize) {}

    fn on_run_disabled(&self, _name: &str) {}

    fn on_prompt_answered(&self, _prompt_id: &str, _value: &Value) {}

    fn on_task_skipped(&self, _task: &TaskDefinition, _reason: &str) {}

    fn before_task(&self, _task: &TaskDefinition) {}

    fn after_task(&self, _task: &TaskDefinition, _elapsed: Duration) {}

    fn on_error(&self, _task: &TaskDefinition, _error: &KilnError, _elapsed: Duration) {}

    /// Fires only when no required task failed
    fn after_all(&self, _completed: usize, _total: usize, _elapsed: Duration) {}

    fn on_run_failed(&self, _failed_required: usize, _total: usize) {}
}

/// Hooks that do nothing
#[derive(Debug, Clone, Default)]
pub struct NoopHooks;

impl RunHooks for NoopHooks {}

impl RunHooks for EventLog {
    fn on_run_started(&self, name: &str, run_id: &str, task_count: usize) {
        self.emit(EventKind::RunStarted {
            name: name.to_string(),
            run_id: run_id.to_string(),
            task_count,
        });
    }

    fn on_run_disabled(&self, name: &str) {
        self.emit(EventKind::RunDisabled {
            name: name.to_string(),
        });
    }

    fn on_prompt_answered(&self, prompt_id: &str, value: &Value) {
        self.emit(EventKind::PromptAnswered {
            prompt_id: prompt_id.into(),
            value: value.clone(),
        });
    }

    fn on_task_skipped(&self, task: &TaskDefinition, reason: &str) {
        self.emit(EventKind::TaskSkipped {
            task_id: task.id.as_str().into(),
            reason: reason.to_string(),
        });
    }

    fn before_task(&self, task: &TaskDefinition) {
        self.emit(EventKind::TaskStarted {
            task_id: task.id.as_str().into(),
            task_type: task.kind.to_string(),
        });
    }

    fn after_task(&self, task: &TaskDefinition, elapsed: Duration) {
        self.emit(EventKind::TaskCompleted {
            task_id: task.id.as_str().into(),
            duration_ms: elapsed.as_millis() as u64,
        });
    }

    fn on_error(&self, task: &TaskDefinition, error: &KilnError, elapsed: Duration) {
        self.emit(EventKind::TaskFailed {
            task_id: task.id.as_str().into(),
            error: error.to_string(),
            required: task.is_required(),
            duration_ms: elapsed.as_millis() as u64,
        });
    }

    fn after_all(&self, completed: usize, total: usize, elapsed: Duration) {
        self.emit(EventKind::RunCompleted {
            completed,
            total,
            total_duration_ms: elapsed.as_millis() as u64,
        });
    }

    fn on_run_failed(&self, failed_required: usize, total: usize) {
        self.emit(EventKind::RunFailed {
            failed_required,
            total,
        });
    }
}

/// Forwards every callback to each hook in order
#[derive(Clone, Default)]
pub struct HookChain {
    hooks: Vec<Arc<dyn RunHooks>>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, hooks: Arc<dyn RunHooks>) -> Self {
        self.hooks.push(hooks);
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl std::fmt::Debug for HookChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookChain")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl RunHooks for HookChain {
    fn on_run_started(&self, name: &str, run_id: &str, task_count: usize) {
        for h in &self.hooks {
            h.on_run_started(name, run_id, task_count);
        }
    }

    fn on_run_disabled(&self, name: &str) {
        for h in &self.hooks {
            h.on_run_disabled(name);
        }
    }

    fn on_prompt_answered(&self, prompt_id: &str, value: &Value) {
        for h in &self.hooks {
            h.on_prompt_answered(prompt_id, value);
        }
    }

    fn on_task_skipped(&self, task: &TaskDefinition, reason: &str) {
        for h in &self.hooks {
            h.on_task_skipped(task, reason);
        }
    }

    fn before_task(&self, task: &TaskDefinition) {
        for h in &self.hooks {
            h.before_task(task);
        }
    }

    fn after_task(&self, task: &TaskDefinition, elapsed: Duration) {
        for h in &self.hooks {
            h.after_task(task, elapsed);
        }
    }

    fn on_error(&self, task: &TaskDefinition, error: &KilnError, elapsed: Duration) {
        for h in &self.hooks {
            h.on_error(task, error, elapsed);
        }
    }

    fn after_all(&self, completed: usize, total: usize, elapsed: Duration) {
        for h in &self.hooks {
            h.after_all(completed, total, elapsed);
        }
    }

    fn on_run_failed(&self, failed_required: usize, total: usize) {
        for h in &self.hooks {
            h.on_run_failed(failed_required, total);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task() -> TaskDefinition {
        serde_json::from_value(json!({"id": "readme", "type": "write"})).unwrap()
    }

    #[test]
    fn run_hooks_trait_is_object_safe() {
        fn accepts(_: &dyn RunHooks) {}
        accepts(&NoopHooks);
        accepts(&EventLog::new());
        accepts(&HookChain::new());
    }

    #[test]
    fn event_log_records_task_lifecycle() {
        let log = EventLog::new();
        let t = task();
        log.before_task(&t);
        log.on_error(
            &t,
            &KilnError::TaskFailed {
                task_id: "readme".into(),
                reason: "exists".into(),
            },
            Duration::from_millis(3),
        );

        let events = log.filter_task("readme");
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[1].kind,
            EventKind::TaskFailed { required: true, duration_ms: 3, .. }
        ));
    }

    #[test]
    fn hook_chain_fans_out() {
        let first = EventLog::new();
        let second = EventLog::new();
        let chain = HookChain::new()
            .with(Arc::new(first.clone()))
            .with(Arc::new(second.clone()));

        chain.after_task(&task(), Duration::ZERO);
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
    }
}
