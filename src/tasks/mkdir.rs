//! `mkdir` - create a directory (and parents)

use async_trait::async_trait;
use tracing::debug;

use crate::ast::TaskDefinition;
use crate::error::Result;

use super::executor::{ExecuteOptions, TaskEnv, TaskExecutor};

#[derive(Debug, Clone, Copy, Default)]
pub struct MkdirExecutor;

#[async_trait]
impl TaskExecutor for MkdirExecutor {
    async fn execute(
        &self,
        task: &TaskDefinition,
        env: &TaskEnv<'_>,
        options: ExecuteOptions,
    ) -> Result<()> {
        let path = env.required_str(task, "path")?;
        if options.dry_run {
            return Ok(());
        }
        let target = env.target(&path);
        tokio::fs::create_dir_all(&target).await?;
        debug!(path = %target.display(), "Directory created");
        Ok(())
    }

    async fn diff(
        &self,
        task: &TaskDefinition,
        env: &TaskEnv<'_>,
        _options: ExecuteOptions,
    ) -> Result<Option<String>> {
        let path = env.required_str(task, "path")?;
        let marker = if env.target(&path).is_dir() { "=" } else { "+" };
        Ok(Some(format!("{} {}/", marker, path.trim_end_matches('/'))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Fetcher;
    use crate::runtime::{CommandRunner, RunContext};
    use crate::tasks::Interpolator;
    use serde_json::json;

    #[tokio::test]
    async fn test_creates_nested_directories() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = RunContext::new();
        let fetcher = Fetcher::new().unwrap();
        let commands = CommandRunner::default();
        let env = TaskEnv {
            ctx: &ctx,
            cwd: dir.path(),
            renderer: &Interpolator,
            fetcher: &fetcher,
            commands: &commands,
        };
        let task: TaskDefinition = serde_json::from_value(
            json!({"id": "src", "type": "mkdir", "config": {"path": "src/components"}}),
        )
        .unwrap();

        assert_eq!(
            MkdirExecutor
                .diff(&task, &env, ExecuteOptions::default())
                .await
                .unwrap()
                .as_deref(),
            Some("+ src/components/")
        );
        MkdirExecutor
            .execute(&task, &env, ExecuteOptions::default())
            .await
            .unwrap();
        assert!(dir.path().join("src/components").is_dir());
    }
}
