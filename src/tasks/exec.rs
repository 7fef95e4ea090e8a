//! `exec` - run a shell command or a script file
//!
//! ```json
//! { "id": "install", "type": "exec", "config": { "command": "npm install", "cwd": "web" } }
//! { "id": "setup",   "type": "exec", "config": { "script": "./scripts/setup.sh" } }
//! ```
//!
//! `command` is rendered and run through `sh -c`; `script` resolves relative to
//! the owning document. Both run in the output root (or `cwd` beneath it).

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::ast::{Source, TaskDefinition};
use crate::error::{KilnError, Result};

use super::executor::{task_failed, ExecuteOptions, TaskEnv, TaskExecutor};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExecExecutor;

fn working_dir(task: &TaskDefinition, env: &TaskEnv<'_>) -> Result<PathBuf> {
    Ok(match env.optional_str(task, "cwd")? {
        Some(dir) => env.target(&dir),
        None => env.cwd.to_path_buf(),
    })
}

#[async_trait]
impl TaskExecutor for ExecExecutor {
    #[instrument(skip_all, fields(task = %task.id))]
    async fn execute(
        &self,
        task: &TaskDefinition,
        env: &TaskEnv<'_>,
        options: ExecuteOptions,
    ) -> Result<()> {
        let cwd = working_dir(task, env)?;

        if let Some(command) = env.optional_str(task, "command")? {
            if options.dry_run {
                return Ok(());
            }
            let stdout = env
                .commands
                .run(&command, Some(&cwd))
                .await
                .map_err(|e| task_failed(task, e.to_string()))?;
            debug!(output_len = stdout.len(), "Command finished");
            return Ok(());
        }

        if let Some(script) = task.config_str("script") {
            let path = match Source::resolve(script, task.source.as_ref(), env.cwd)? {
                Source::Path(path) => path,
                Source::Url(url) => {
                    return Err(task_failed(
                        task,
                        format!("cannot execute remote script {}", url),
                    ))
                }
            };
            if options.dry_run {
                return Ok(());
            }
            env.commands
                .run_file(&path, Some(&cwd))
                .await
                .map_err(|e| task_failed(task, e.to_string()))?;
            return Ok(());
        }

        Err(KilnError::InvalidTaskConfig {
            task_id: task.id.clone(),
            reason: "one of `command` or `script` is required".to_string(),
        })
    }

    async fn diff(
        &self,
        task: &TaskDefinition,
        env: &TaskEnv<'_>,
        _options: ExecuteOptions,
    ) -> Result<Option<String>> {
        if let Some(command) = env.optional_str(task, "command")? {
            return Ok(Some(format!("$ {}", command)));
        }
        Ok(task.config_str("script").map(|script| format!("$ {}", script)))
    }
}
