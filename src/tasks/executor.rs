//! TaskExecutor Trait - one implementation per task `type`

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::ast::{Source, TaskDefinition};
use crate::error::{KilnError, Result};
use crate::loader::Fetcher;
use crate::runtime::{CommandRunner, RunContext};

use super::render::Renderer;

/// Flags passed to every execution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Preview only; executors must not mutate anything
    pub dry_run: bool,
    /// Overwrite existing files
    pub force: bool,
}

/// Everything an executor may use besides the task itself
pub struct TaskEnv<'a> {
    pub ctx: &'a RunContext,
    /// Output root; relative task paths land here
    pub cwd: &'a Path,
    pub renderer: &'a dyn Renderer,
    pub fetcher: &'a Fetcher,
    pub commands: &'a CommandRunner,
}

impl TaskEnv<'_> {
    pub fn render<'t>(&self, text: &'t str) -> Result<Cow<'t, str>> {
        self.renderer.render(text, self.ctx)
    }

    /// Rendered config string, required
    pub fn required_str(&self, task: &TaskDefinition, key: &str) -> Result<String> {
        let raw = task
            .config_str(key)
            .ok_or_else(|| KilnError::InvalidTaskConfig {
                task_id: task.id.clone(),
                reason: format!("missing string field `{}`", key),
            })?;
        Ok(self.render(raw)?.into_owned())
    }

    /// Rendered config string, optional
    pub fn optional_str(&self, task: &TaskDefinition, key: &str) -> Result<Option<String>> {
        task.config_str(key)
            .map(|raw| self.render(raw).map(Cow::into_owned))
            .transpose()
    }

    /// Output path for a rendered relative (or absolute) path
    pub fn target(&self, path: &str) -> PathBuf {
        self.cwd.join(path)
    }

    /// Read a file reference relative to the task's owning document
    pub async fn read_relative(&self, task: &TaskDefinition, reference: &str) -> Result<String> {
        let source = Source::resolve(reference, task.source.as_ref(), self.cwd)?;
        self.fetcher.read(&source).await
    }
}

/// Executes tasks of one `type`
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Perform the task
    async fn execute(
        &self,
        task: &TaskDefinition,
        env: &TaskEnv<'_>,
        options: ExecuteOptions,
    ) -> Result<()>;

    /// Dry-run preview of what `execute` would do with `options`
    async fn diff(
        &self,
        _task: &TaskDefinition,
        _env: &TaskEnv<'_>,
        _options: ExecuteOptions,
    ) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Shorthand for a task-level failure
pub fn task_failed(task: &TaskDefinition, reason: impl Into<String>) -> KilnError {
    KilnError::TaskFailed {
        task_id: task.id.clone(),
        reason: reason.into(),
    }
}
