//! `delete` - remove a file or directory tree
//!
//! A path that does not exist is not an error.

use async_trait::async_trait;
use tracing::debug;

use crate::ast::TaskDefinition;
use crate::error::Result;

use super::executor::{ExecuteOptions, TaskEnv, TaskExecutor};

#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteExecutor;

#[async_trait]
impl TaskExecutor for DeleteExecutor {
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
        let metadata = match tokio::fs::symlink_metadata(&target).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %target.display(), "Nothing to delete");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if metadata.is_dir() {
            tokio::fs::remove_dir_all(&target).await?;
        } else {
            tokio::fs::remove_file(&target).await?;
        }
        debug!(path = %target.display(), "Deleted");
        Ok(())
    }

    async fn diff(
        &self,
        task: &TaskDefinition,
        env: &TaskEnv<'_>,
        _options: ExecuteOptions,
    ) -> Result<Option<String>> {
        let path = env.required_str(task, "path")?;
        if env.target(&path).exists() {
            Ok(Some(format!("- {}", path)))
        } else {
            Ok(Some(format!("= {} (absent)", path)))
        }
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
    async fn test_deletes_tree_and_tolerates_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("build/out")).unwrap();
        std::fs::write(dir.path().join("build/out/a.js"), "x").unwrap();

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
            json!({"id": "clean", "type": "delete", "config": {"path": "build"}}),
        )
        .unwrap();

        DeleteExecutor
            .execute(&task, &env, ExecuteOptions::default())
            .await
            .unwrap();
        assert!(!dir.path().join("build").exists());

        DeleteExecutor
            .execute(&task, &env, ExecuteOptions::default())
            .await
            .unwrap();
    }
}
