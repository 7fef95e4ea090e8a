//! Orchestrator - one sequential run over a merged document
//!
//! Steps:
//! 1. root gate (lazy)
//! 2. provisional task filter (lazy) + dependency sort
//! 3. variables, pass 1 (everything except `conditional`)
//! 4. prompts, in declaration order, each answer visible immediately
//! 5. variables, pass 2 (`conditional`, plus values pass 1 could not
//!    evaluate), then drop variables now disabled
//! 6. root gate (eager)
//! 7. final task filter (eager)
//! 8. dry run: collect previews and stop (no hooks, no mutation)
//! 9. execute; required failures are counted, the loop keeps going

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::ast::{
    ConfigDocument, Enabled, PromptDefinition, Source, TaskDefinition, VariableDefinition,
};
use crate::dag;
use crate::error::{KilnError, Result};
use crate::event::{NoopHooks, RunHooks};
use crate::loader::Fetcher;
use crate::tasks::{ExecuteOptions, ExecutorRegistry, Interpolator, Renderer, TaskEnv};

use super::command::CommandRunner;
use super::context::RunContext;
use super::enabled::{EnabledEvaluator, Mode};
use super::prompts::{DefaultsCollector, PromptCollector};
use super::transform::Transformers;
use super::variables::ValueResolver;

// ═══════════════════════════════════════════════════════════════
// REPORT
// ═══════════════════════════════════════════════════════════════

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every required task succeeded
    Completed,
    /// The root document's `enabled` was false; nothing ran
    Disabled,
    /// Previews collected, nothing executed
    DryRun,
    /// At least one required task failed
    Failed,
}

/// Dry-run preview line for one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskPreview {
    pub task_id: String,
    pub preview: String,
}

/// Summary of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub outcome: RunOutcome,
    /// Tasks left after the final filter
    pub total: usize,
    pub completed: usize,
    pub failed_required: usize,
    pub failed_optional: usize,
    pub previews: Vec<TaskPreview>,
    /// Final variables and prompt answers
    pub context: RunContext,
}

impl RunReport {
    fn new(run_id: String, outcome: RunOutcome, context: RunContext) -> Self {
        Self {
            run_id,
            outcome,
            total: 0,
            completed: 0,
            failed_required: 0,
            failed_optional: 0,
            previews: Vec::new(),
            context,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome != RunOutcome::Failed
    }

    /// `Err(RunFailed)` when a required task failed
    pub fn into_result(self) -> Result<Self> {
        if self.outcome == RunOutcome::Failed {
            return Err(KilnError::RunFailed {
                failed: self.failed_required,
                total: self.total,
            });
        }
        Ok(self)
    }
}

// ═══════════════════════════════════════════════════════════════
// ORCHESTRATOR
// ═══════════════════════════════════════════════════════════════

/// Runs merged documents; owns every registry and collaborator it uses
pub struct Orchestrator {
    registry: ExecutorRegistry,
    hooks: Arc<dyn RunHooks>,
    collector: Box<dyn PromptCollector>,
    transformers: Transformers,
    evaluator: EnabledEvaluator,
    resolver: ValueResolver,
    renderer: Arc<dyn Renderer>,
    fetcher: Fetcher,
    commands: CommandRunner,
    /// Output root for task paths
    cwd: PathBuf,
    options: ExecuteOptions,
}

impl Orchestrator {
    /// Built-in executors and transformers, no hooks, defaults-only prompts
    pub fn new(cwd: impl Into<PathBuf>) -> Result<Self> {
        let commands = CommandRunner::default();
        let renderer: Arc<dyn Renderer> = Arc::new(Interpolator);
        Ok(Self {
            registry: ExecutorRegistry::with_builtins(),
            hooks: Arc::new(NoopHooks),
            collector: Box::new(DefaultsCollector),
            transformers: Transformers::with_builtins(),
            evaluator: EnabledEvaluator::new(commands),
            resolver: ValueResolver::new(commands, Arc::clone(&renderer)),
            renderer,
            fetcher: Fetcher::new()?,
            commands,
            cwd: cwd.into(),
            options: ExecuteOptions::default(),
        })
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn RunHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_collector(mut self, collector: Box<dyn PromptCollector>) -> Self {
        self.collector = collector;
        self
    }

    pub fn with_registry(mut self, registry: ExecutorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_transformers(mut self, transformers: Transformers) -> Self {
        self.transformers = transformers;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Fetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Command runner shared by checks, value specs and `exec` tasks
    pub fn with_commands(mut self, commands: CommandRunner) -> Self {
        self.commands = commands;
        self.evaluator = EnabledEvaluator::new(commands);
        self.resolver = ValueResolver::new(commands, Arc::clone(&self.renderer));
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.resolver = ValueResolver::new(self.commands, Arc::clone(&renderer));
        self.renderer = renderer;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.options.dry_run = dry_run;
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.options.force = force;
        self
    }

    pub fn registry_mut(&mut self) -> &mut ExecutorRegistry {
        &mut self.registry
    }

    pub fn transformers_mut(&mut self) -> &mut Transformers {
        &mut self.transformers
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Run `doc` to completion
    ///
    /// Errors are configuration-level (variables, prompts, cycles between
    /// tasks). Task failures are reported in the [`RunReport`].
    #[instrument(skip_all, fields(name = %doc.name, tasks = doc.tasks.len()))]
    pub async fn run(&self, doc: ConfigDocument) -> Result<RunReport> {
        let started = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let mut ctx = RunContext::new();
        let root_dir = doc.source.as_ref().and_then(Source::directory);

        // 1. Root gate (lazy)
        if !self
            .evaluator
            .evaluate(doc.enabled.as_ref(), &ctx, Mode::Lazy, root_dir.as_deref())
            .await
        {
            return Ok(self.disabled(&doc.name, run_id, ctx));
        }

        // 2. Provisional task filter + sort
        let mut provisional = Vec::with_capacity(doc.tasks.len());
        for task in doc.tasks {
            if self.task_enabled(&task, &ctx, Mode::Lazy).await {
                provisional.push(task);
            } else {
                debug!(task = %task.id, "Task disabled (provisional)");
            }
        }
        let sorted = dag::sort(
            provisional,
            |task: &TaskDefinition| task.id.as_str(),
            |task: &TaskDefinition| task.dependencies.as_slice(),
        )?;

        // 3. Variables, pass 1; unevaluable values wait for pass 2
        let mut deferred = Vec::new();
        for variable in doc.variables.iter().filter(|v| !v.value.is_conditional()) {
            if !self.resolve_variable(variable, &mut ctx, Mode::Lazy).await? {
                deferred.push(variable.id.as_str());
            }
        }

        // 4. Prompts
        for prompt in &doc.prompts {
            self.collect_prompt(prompt, &mut ctx).await?;
        }

        // 5. Variables, pass 2
        for variable in &doc.variables {
            if variable.value.is_conditional() || deferred.contains(&variable.id.as_str()) {
                self.resolve_variable(variable, &mut ctx, Mode::Eager).await?;
            } else if ctx.contains(&variable.id)
                && !self
                    .entity_enabled(
                        variable.config_enabled.as_ref(),
                        variable.enabled.as_ref(),
                        variable.source.as_ref(),
                        &ctx,
                        Mode::Eager,
                    )
                    .await
            {
                debug!(variable = %variable.id, "Variable disabled after prompts");
                ctx.remove(&variable.id);
            }
        }

        // 6. Root gate (eager)
        if !self
            .evaluator
            .evaluate(doc.enabled.as_ref(), &ctx, Mode::Eager, root_dir.as_deref())
            .await
        {
            return Ok(self.disabled(&doc.name, run_id, ctx));
        }

        // 7. Final task filter
        let mut tasks = Vec::with_capacity(sorted.len());
        let mut skipped = Vec::new();
        for task in sorted {
            if self.task_enabled(&task, &ctx, Mode::Eager).await {
                tasks.push(task);
            } else {
                skipped.push(task);
            }
        }

        // 8. Dry run
        if self.options.dry_run {
            let mut report = RunReport::new(run_id, RunOutcome::DryRun, RunContext::new());
            report.total = tasks.len();
            report.previews = self.previews(&tasks, &ctx).await;
            report.context = ctx;
            info!(tasks = report.total, "Dry run complete");
            return Ok(report);
        }

        // 9. Execute
        let mut report = RunReport::new(run_id, RunOutcome::Completed, RunContext::new());
        report.total = tasks.len();
        self.hooks.on_run_started(&doc.name, &report.run_id, tasks.len());
        for task in &skipped {
            self.hooks.on_task_skipped(task, "disabled");
        }
        info!(tasks = tasks.len(), skipped = skipped.len(), "Executing tasks");

        for task in &tasks {
            self.hooks.before_task(task);
            let task_started = Instant::now();
            match self.execute_task(task, &ctx).await {
                Ok(()) => {
                    report.completed += 1;
                    self.hooks.after_task(task, task_started.elapsed());
                }
                Err(e) => {
                    self.hooks.on_error(task, &e, task_started.elapsed());
                    if task.is_required() {
                        warn!(task = %task.id, error = %e, "Required task failed");
                        report.failed_required += 1;
                    } else {
                        warn!(task = %task.id, error = %e, "Optional task failed, continuing");
                        report.failed_optional += 1;
                    }
                }
            }
        }

        if report.failed_required > 0 {
            report.outcome = RunOutcome::Failed;
            self.hooks.on_run_failed(report.failed_required, report.total);
        } else {
            self.hooks
                .after_all(report.completed, report.total, started.elapsed());
        }
        info!(
            completed = report.completed,
            total = report.total,
            failed_required = report.failed_required,
            failed_optional = report.failed_optional,
            "Run finished"
        );

        report.context = ctx;
        Ok(report)
    }

    fn disabled(&self, name: &str, run_id: String, ctx: RunContext) -> RunReport {
        info!(name = %name, "Configuration disabled, nothing to do");
        self.hooks.on_run_disabled(name);
        RunReport::new(run_id, RunOutcome::Disabled, ctx)
    }

    /// Owning document's `enabled` and the entity's own, checked in the
    /// entity's document directory
    async fn entity_enabled(
        &self,
        config_enabled: Option<&Enabled>,
        own: Option<&Enabled>,
        source: Option<&Source>,
        ctx: &RunContext,
        mode: Mode,
    ) -> bool {
        let dir = source.and_then(Source::directory);
        self.evaluator
            .evaluate_both(config_enabled, own, ctx, mode, dir.as_deref())
            .await
    }

    async fn task_enabled(&self, task: &TaskDefinition, ctx: &RunContext, mode: Mode) -> bool {
        self.entity_enabled(
            task.config_enabled.as_ref(),
            task.enabled.as_ref(),
            task.source.as_ref(),
            ctx,
            mode,
        )
        .await
    }

    /// Bind `variable` in `ctx`
    ///
    /// `Ok(false)` when its expression or template could not be evaluated;
    /// the key stays unbound. Command failures are fatal.
    async fn resolve_variable(
        &self,
        variable: &VariableDefinition,
        ctx: &mut RunContext,
        mode: Mode,
    ) -> Result<bool> {
        if !self
            .entity_enabled(
                variable.config_enabled.as_ref(),
                variable.enabled.as_ref(),
                variable.source.as_ref(),
                ctx,
                mode,
            )
            .await
        {
            debug!(variable = %variable.id, "Variable disabled");
            return Ok(true);
        }

        let value = match self
            .resolver
            .resolve(&variable.value, ctx, variable.source.as_ref())
            .await
        {
            Ok(value) => value,
            Err(e) if e.is_evaluation_error() => {
                match mode {
                    Mode::Lazy => debug!(variable = %variable.id, error = %e, "Deferring variable"),
                    Mode::Eager => warn!(variable = %variable.id, error = %e, "Variable left unbound"),
                }
                return Ok(false);
            }
            Err(e) => {
                return Err(KilnError::VariableFailed {
                    id: variable.id.clone(),
                    reason: e.to_string(),
                })
            }
        };
        debug!(variable = %variable.id, kind = variable.value.kind(), "Variable resolved");
        ctx.set(variable.id.clone(), value);
        Ok(true)
    }

    async fn collect_prompt(&self, prompt: &PromptDefinition, ctx: &mut RunContext) -> Result<()> {
        if !self
            .entity_enabled(
                prompt.config_enabled.as_ref(),
                prompt.enabled.as_ref(),
                prompt.source.as_ref(),
                ctx,
                Mode::Eager,
            )
            .await
        {
            debug!(prompt = %prompt.id, "Prompt disabled");
            return Ok(());
        }

        let default = match &prompt.default {
            Some(spec) => match self.resolver.resolve(spec, ctx, prompt.source.as_ref()).await {
                Ok(value) => Some(value),
                Err(e) if e.is_evaluation_error() => {
                    warn!(prompt = %prompt.id, error = %e, "Default could not be evaluated, asking without one");
                    None
                }
                Err(e) => {
                    return Err(KilnError::PromptFailed {
                        id: prompt.id.clone(),
                        reason: format!("default: {}", e),
                    })
                }
            },
            None => None,
        };

        let mut answer = self.collector.ask(prompt, default.as_ref()).await?;
        for name in prompt.transformers.iter().flatten() {
            answer = self.transform(prompt, name, &answer)?;
        }

        self.hooks.on_prompt_answered(&prompt.id, &answer);
        ctx.set(prompt.id.clone(), answer);
        Ok(())
    }

    fn transform(&self, prompt: &PromptDefinition, name: &str, value: &Value) -> Result<Value> {
        self.transformers
            .apply(name, value)
            .ok_or_else(|| KilnError::PromptFailed {
                id: prompt.id.clone(),
                reason: format!("unknown transformer '{}'", name),
            })
    }

    fn env<'a>(&'a self, ctx: &'a RunContext) -> TaskEnv<'a> {
        TaskEnv {
            ctx,
            cwd: &self.cwd,
            renderer: self.renderer.as_ref(),
            fetcher: &self.fetcher,
            commands: &self.commands,
        }
    }

    #[instrument(skip_all, fields(task = %task.id, kind = %task.kind))]
    async fn execute_task(&self, task: &TaskDefinition, ctx: &RunContext) -> Result<()> {
        let executor =
            self.registry
                .get(task.kind.as_str())
                .ok_or_else(|| KilnError::ExecutorNotFound {
                    kind: task.kind.to_string(),
                })?;
        executor.execute(task, &self.env(ctx), self.options).await
    }

    async fn previews(&self, tasks: &[TaskDefinition], ctx: &RunContext) -> Vec<TaskPreview> {
        let env = self.env(ctx);
        let mut previews = Vec::with_capacity(tasks.len());
        for task in tasks {
            let preview = match self.registry.get(task.kind.as_str()) {
                None => Some(format!("? no executor for type '{}'", task.kind)),
                Some(executor) => match executor.diff(task, &env, self.options).await {
                    Ok(preview) => preview,
                    Err(e) => Some(format!("! {}", e)),
                },
            };
            previews.push(TaskPreview {
                task_id: task.id.clone(),
                preview: preview.unwrap_or_else(|| format!("{} {}", task.kind, task.id)),
            });
        }
        previews
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("registry", &self.registry)
            .field("transformers", &self.transformers)
            .field("cwd", &self.cwd)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
