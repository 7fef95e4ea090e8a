//! EnabledEvaluator - two-mode evaluation of `enabled` predicates
//!
//! - **Lazy**: failures (including references to keys not yet in the
//!   context) count as enabled; the authoritative check comes later.
//! - **Eager**: failures count as disabled and are logged.

use std::path::Path;

use tracing::{debug, warn};

use crate::ast::{Enabled, EnabledCheck};
use crate::error::Result;
use crate::expr;

use super::command::CommandRunner;
use super::context::RunContext;

/// Evaluation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Provisional: unresolved references assume enabled
    Lazy,
    /// Final: unresolved references mean disabled
    Eager,
}

impl Mode {
    fn on_failure(self) -> bool {
        matches!(self, Mode::Lazy)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnabledEvaluator {
    commands: CommandRunner,
    /// Suppress failure logging
    silent: bool,
}

impl EnabledEvaluator {
    pub fn new(commands: CommandRunner) -> Self {
        Self {
            commands,
            silent: false,
        }
    }

    pub fn silenced(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Evaluate `predicate` (absent → enabled)
    ///
    /// `cwd` is where `exec` checks run (the owning document's directory).
    pub async fn evaluate(
        &self,
        predicate: Option<&Enabled>,
        ctx: &RunContext,
        mode: Mode,
        cwd: Option<&Path>,
    ) -> bool {
        let Some(predicate) = predicate else {
            return true;
        };

        let outcome: Result<bool> = match predicate {
            Enabled::Literal(value) => return *value,
            Enabled::Check(EnabledCheck::Condition(condition)) => {
                expr::eval_truthy(condition, ctx.as_map())
            }
            Enabled::Check(EnabledCheck::Exec(command)) => {
                self.commands.succeeds(command, cwd).await
            }
        };

        match outcome {
            Ok(enabled) => enabled,
            Err(e) => {
                let fallback = mode.on_failure();
                if !self.silent {
                    match mode {
                        Mode::Lazy => debug!(error = %e, "Deferring enabled check"),
                        Mode::Eager => warn!(error = %e, "Enabled check failed, treating as disabled"),
                    }
                }
                fallback
            }
        }
    }

    /// Both the owning document's `enabled` and the entity's own must hold
    pub async fn evaluate_both(
        &self,
        config_enabled: Option<&Enabled>,
        own: Option<&Enabled>,
        ctx: &RunContext,
        mode: Mode,
        cwd: Option<&Path>,
    ) -> bool {
        self.evaluate(config_enabled, ctx, mode, cwd).await
            && self.evaluate(own, ctx, mode, cwd).await
    }
}
