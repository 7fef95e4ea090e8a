//! `write` - render inline content or a template file to a path
//!
//! ```json
//! { "id": "readme", "type": "write",
//!   "config": { "path": "README.md", "file": "./templates/readme.md", "overwrite": true } }
//! ```

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::ast::TaskDefinition;
use crate::error::{KilnError, Result};

use super::executor::{task_failed, ExecuteOptions, TaskEnv, TaskExecutor};

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteExecutor;

impl WriteExecutor {
    /// Rendered body from `content` or `file`
    async fn body(&self, task: &TaskDefinition, env: &TaskEnv<'_>) -> Result<String> {
        if let Some(content) = task.config_str("content") {
            return Ok(env.render(content)?.into_owned());
        }
        if let Some(file) = task.config_str("file") {
            let reference = env.render(file)?.into_owned();
            let template = env.read_relative(task, &reference).await?;
            return Ok(env.render(&template)?.into_owned());
        }
        Err(KilnError::InvalidTaskConfig {
            task_id: task.id.clone(),
            reason: "one of `content` or `file` is required".to_string(),
        })
    }
}

#[async_trait]
impl TaskExecutor for WriteExecutor {
    #[instrument(skip_all, fields(task = %task.id))]
    async fn execute(
        &self,
        task: &TaskDefinition,
        env: &TaskEnv<'_>,
        options: ExecuteOptions,
    ) -> Result<()> {
        let path = env.required_str(task, "path")?;
        let target = env.target(&path);
        let body = self.body(task, env).await?;

        if options.dry_run {
            debug!(path = %target.display(), "Dry run, not writing");
            return Ok(());
        }

        let exists = tokio::fs::try_exists(&target).await?;
        if exists && !(options.force || task.config_flag("overwrite")) {
            return Err(task_failed(
                task,
                format!("{} already exists (set `overwrite` or use --force)", path),
            ));
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, body.as_bytes()).await?;
        debug!(path = %target.display(), bytes = body.len(), "File written");
        Ok(())
    }

    async fn diff(
        &self,
        task: &TaskDefinition,
        env: &TaskEnv<'_>,
        options: ExecuteOptions,
    ) -> Result<Option<String>> {
        let path = env.required_str(task, "path")?;
        let target = env.target(&path);
        let body = self.body(task, env).await?;

        let preview = match tokio::fs::read_to_string(&target).await {
            Ok(current) if current == body => format!("= {} (unchanged)", path),
            Ok(_) if !(options.force || task.config_flag("overwrite")) => {
                format!("! {} (exists, would fail without --force)", path)
            }
            Ok(_) => format!("~ {} ({} lines)", path, body.lines().count()),
            Err(_) => format!("+ {} ({} lines)", path, body.lines().count()),
        };
        Ok(Some(preview))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Fetcher;
    use crate::runtime::{CommandRunner, RunContext};
    use crate::tasks::Interpolator;
    use serde_json::json;
    use tempfile::TempDir;

    fn task(config: serde_json::Value) -> TaskDefinition {
        serde_json::from_value(json!({"id": "w", "type": "write", "config": config})).unwrap()
    }

    fn ctx() -> RunContext {
        RunContext::from_map(json!({"name": "demo"}).as_object().cloned().unwrap())
    }

    #[tokio::test]
    async fn test_writes_rendered_content() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx();
        let fetcher = Fetcher::new().unwrap();
        let commands = CommandRunner::default();
        let env = TaskEnv {
            ctx: &ctx,
            cwd: dir.path(),
            renderer: &Interpolator,
            fetcher: &fetcher,
            commands: &commands,
        };

        let t = task(json!({"path": "{{ name }}/README.md", "content": "# {{ name }}"}));
        WriteExecutor
            .execute(&t, &env, ExecuteOptions::default())
            .await
            .unwrap();

        let written = std::fs::read_to_string(dir.path().join("demo/README.md")).unwrap();
        assert_eq!(written, "# demo");
    }

    #[tokio::test]
    async fn test_refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "old").unwrap();
        let ctx = ctx();
        let fetcher = Fetcher::new().unwrap();
        let commands = CommandRunner::default();
        let env = TaskEnv {
            ctx: &ctx,
            cwd: dir.path(),
            renderer: &Interpolator,
            fetcher: &fetcher,
            commands: &commands,
        };

        let t = task(json!({"path": "a.txt", "content": "new"}));
        let forced = ExecuteOptions {
            dry_run: false,
            force: true,
        };
        assert_eq!(
            WriteExecutor
                .diff(&t, &env, ExecuteOptions::default())
                .await
                .unwrap()
                .as_deref(),
            Some("! a.txt (exists, would fail without --force)")
        );
        assert_eq!(
            WriteExecutor.diff(&t, &env, forced).await.unwrap().as_deref(),
            Some("~ a.txt (1 lines)")
        );
        assert!(WriteExecutor
            .execute(&t, &env, ExecuteOptions::default())
            .await
            .is_err());

        WriteExecutor.execute(&t, &env, forced).await.unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_file_template_and_diff() {
        let dir = TempDir::new().unwrap();
        let tpl_dir = dir.path().join("tpl");
        std::fs::create_dir_all(&tpl_dir).unwrap();
        std::fs::write(tpl_dir.join("readme.md"), "Hello {{ name }}\n").unwrap();

        let mut t = task(json!({"path": "README.md", "file": "./readme.md"}));
        t.source = Some(crate::ast::Source::Path(tpl_dir.join("kiln.json")));

        let ctx = ctx();
        let fetcher = Fetcher::new().unwrap();
        let commands = CommandRunner::default();
        let env = TaskEnv {
            ctx: &ctx,
            cwd: dir.path(),
            renderer: &Interpolator,
            fetcher: &fetcher,
            commands: &commands,
        };

        let preview = WriteExecutor
            .diff(&t, &env, ExecuteOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(preview, "+ README.md (1 lines)");
        assert!(!dir.path().join("README.md").exists());

        WriteExecutor
            .execute(&t, &env, ExecuteOptions::default())
            .await
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("README.md")).unwrap(),
            "Hello demo\n"
        );
    }

    #[tokio::test]
    async fn test_missing_body_is_invalid_config() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx();
        let fetcher = Fetcher::new().unwrap();
        let commands = CommandRunner::default();
        let env = TaskEnv {
            ctx: &ctx,
            cwd: dir.path(),
            renderer: &Interpolator,
            fetcher: &fetcher,
            commands: &commands,
        };
        let err = WriteExecutor
            .execute(&task(json!({"path": "x"})), &env, ExecuteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, KilnError::InvalidTaskConfig { .. }));
    }
}
