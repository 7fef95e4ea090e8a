//! ValueResolver - turns a value spec into a JSON value
//!
//! Used for variables and prompt defaults. `exec`/`exec-file` run in the
//! owning document's directory with the fixed exec timeout.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::ast::{Source, TypedValue, ValueSpec};
use crate::error::{KilnError, Result};
use crate::expr;
use crate::tasks::Renderer;

use super::command::CommandRunner;
use super::context::RunContext;

pub struct ValueResolver {
    commands: CommandRunner,
    renderer: Arc<dyn Renderer>,
}

impl ValueResolver {
    pub fn new(commands: CommandRunner, renderer: Arc<dyn Renderer>) -> Self {
        Self { commands, renderer }
    }

    /// Resolve `spec` against `ctx`; `source` anchors relative commands
    pub async fn resolve(
        &self,
        spec: &ValueSpec,
        ctx: &RunContext,
        source: Option<&Source>,
    ) -> Result<Value> {
        let typed = match spec {
            ValueSpec::Literal(value) => return Ok(value.clone()),
            ValueSpec::Typed(typed) => typed,
        };

        match typed {
            TypedValue::Static(value) => Ok(value.clone()),
            TypedValue::Expression(expression) => expr::eval_str(expression, ctx.as_map()),
            TypedValue::Interpolate(template) => Ok(Value::String(
                self.renderer.render(template, ctx)?.into_owned(),
            )),
            TypedValue::Exec(command) => {
                let cwd = source.and_then(Source::directory);
                let stdout = self.commands.run(command, cwd.as_deref()).await?;
                Ok(Value::String(stdout))
            }
            TypedValue::ExecFile(file) => {
                let (path, cwd) = local_file(file, source)?;
                debug!(path = %path.display(), "Running value script");
                let stdout = self.commands.run_file(&path, cwd.as_deref()).await?;
                Ok(Value::String(stdout))
            }
            TypedValue::Conditional(conditional) => {
                let holds = match expr::eval_truthy(&conditional.condition, ctx.as_map()) {
                    Ok(holds) => holds,
                    Err(e) => {
                        warn!(error = %e, condition = %conditional.condition, "Condition failed, using the false branch");
                        false
                    }
                };
                let branch = if holds {
                    Some(&conditional.if_true)
                } else {
                    conditional.if_false.as_ref()
                };
                match branch {
                    Some(branch) => Box::pin(self.resolve(branch, ctx, source)).await,
                    None => Ok(Value::Null),
                }
            }
        }
    }
}

impl std::fmt::Debug for ValueResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueResolver")
            .field("commands", &self.commands)
            .finish_non_exhaustive()
    }
}

/// Script path relative to a local owning document, plus its directory
fn local_file(file: &str, source: Option<&Source>) -> Result<(PathBuf, Option<PathBuf>)> {
    match source {
        Some(Source::Url(url)) => Err(KilnError::CommandFailed {
            command: file.to_string(),
            reason: format!("cannot execute a script from remote document {}", url),
        }),
        Some(source @ Source::Path(_)) => {
            let dir = source.directory();
            let path = match &dir {
                Some(dir) => dir.join(file),
                None => PathBuf::from(file),
            };
            Ok((path, dir))
        }
        None => Ok((PathBuf::from(file), None)),
    }
}
