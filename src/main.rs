//! Kiln CLI - scaffold projects from layered configuration documents

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::debug;

use kiln::config::KilnConfig;
use kiln::error::{FixSuggestion, KilnError};
use kiln::event::{EventLog, HookChain, RunHooks};
use kiln::loader::{self, DocumentStore, Fetcher};
use kiln::runtime::{
    CommandRunner, DefaultsCollector, Orchestrator, PromptCollector, RunOutcome, RunReport,
    ScriptedCollector, TerminalCollector,
};
use kiln::TaskDefinition;

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Kiln - layered configuration and task orchestration for scaffolding")]
#[command(version)]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a configuration and run its tasks
    Run {
        /// Path or URL of the root document
        reference: String,

        /// Preview tasks without executing them
        #[arg(long)]
        dry_run: bool,

        /// Overwrite existing files
        #[arg(long)]
        force: bool,

        /// Answer every prompt with its default
        #[arg(short, long)]
        yes: bool,

        /// Prompt answer, repeatable (`--set name=demo`)
        #[arg(long = "set", value_name = "ID=VALUE", value_parser = parse_assignment)]
        answers: Vec<(String, String)>,

        /// Output directory (defaults to the current directory)
        #[arg(long)]
        cwd: Option<PathBuf>,

        /// Write the run's event log as JSON
        #[arg(long, value_name = "FILE")]
        events: Option<PathBuf>,
    },

    /// Load and merge a configuration, then print a summary
    Check {
        /// Path or URL of the root document
        reference: String,
    },

    /// Inspect the user configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file location
    Path,
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (id, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ID=VALUE, got '{}'", raw))?;
    if id.trim().is_empty() {
        return Err("prompt id is empty".to_string());
    }
    Ok((id.trim().to_string(), value.to_string()))
}

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Run {
            reference,
            dry_run,
            force,
            yes,
            answers,
            cwd,
            events,
        } => {
            let options = RunOptions {
                dry_run,
                force,
                yes,
                answers,
                cwd,
                events,
            };
            run(&reference, options).await
        }
        Commands::Check { reference } => check(&reference).await,
        Commands::Config { action } => show_config(action),
    };

    if let Err(e) = result {
        let label = if e.is_config_error() {
            "Configuration error:"
        } else {
            "Error:"
        };
        eprintln!("{} {}", label.red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

struct RunOptions {
    dry_run: bool,
    force: bool,
    yes: bool,
    answers: Vec<(String, String)>,
    cwd: Option<PathBuf>,
    events: Option<PathBuf>,
}

/// Task output root; documents always resolve against the process directory
fn output_dir(cwd: &Path, requested: Option<PathBuf>) -> PathBuf {
    match requested {
        Some(dir) => cwd.join(dir),
        None => cwd.to_path_buf(),
    }
}

fn load_config() -> Result<KilnConfig, KilnError> {
    Ok(KilnConfig::load()?.with_env())
}

fn store_for(config: &KilnConfig, cwd: &Path) -> Result<DocumentStore, KilnError> {
    let fetcher = Fetcher::with_timeouts(config.fetch_timeout(), config.connect_timeout())?;
    Ok(DocumentStore::with_fetcher(cwd, fetcher))
}

async fn run(reference: &str, options: RunOptions) -> Result<(), KilnError> {
    let config = load_config()?;
    let cwd = std::env::current_dir()?;
    let out = output_dir(&cwd, options.cwd);

    let store = store_for(&config, &cwd)?;
    let doc = loader::resolve(&store, reference).await?;

    println!(
        "{} {} ({} tasks, {} prompts)",
        "→".cyan(),
        doc.label().cyan().bold(),
        doc.tasks.len(),
        doc.prompts.len()
    );

    let interactive = !options.yes && !config.non_interactive() && std::io::stdin().is_terminal();
    let fallback: Box<dyn PromptCollector> = if interactive {
        Box::new(TerminalCollector)
    } else {
        debug!("Prompts answered from defaults");
        Box::new(DefaultsCollector)
    };
    let collector = options
        .answers
        .into_iter()
        .fold(ScriptedCollector::new(fallback), |c, (id, value)| c.answer(id, value));

    let log = EventLog::new();
    let hooks = HookChain::new()
        .with(Arc::new(ConsoleHooks))
        .with(Arc::new(log.clone()));

    let orchestrator = Orchestrator::new(&out)?
        .with_fetcher(store.fetcher().clone())
        .with_commands(CommandRunner::new(config.exec_timeout()))
        .with_collector(Box::new(collector))
        .with_hooks(Arc::new(hooks))
        .dry_run(options.dry_run)
        .force(options.force);

    let report = orchestrator.run(doc).await?;
    print_report(&report);

    if let Some(path) = options.events {
        let json = serde_json::to_string_pretty(&log.to_json()).map_err(|e| KilnError::ConfigError {
            reason: format!("Failed to serialize events: {}", e),
        })?;
        std::fs::write(&path, json)?;
        println!("  {} events written to {}", log.len(), path.display());
    }

    report.into_result().map(|_| ())
}

fn print_report(report: &RunReport) {
    match report.outcome {
        RunOutcome::Disabled => {
            println!("{} Configuration disabled, nothing to do", "○".dimmed());
        }
        RunOutcome::DryRun => {
            println!("{} Dry run, {} tasks:", "→".cyan(), report.total);
            for preview in &report.previews {
                println!("  {} {}", preview.task_id.bold(), preview.preview.dimmed());
            }
        }
        RunOutcome::Completed | RunOutcome::Failed => {
            let failed = report.failed_required + report.failed_optional;
            let summary = format!(
                "{}/{} tasks completed, {} failed",
                report.completed, report.total, failed
            );
            if report.is_success() {
                println!("\n{} {}", "✓".green(), summary.green());
            } else {
                println!("\n{} {}", "✗".red(), summary.red());
            }
        }
    }
}

async fn check(reference: &str) -> Result<(), KilnError> {
    let config = load_config()?;
    let cwd = std::env::current_dir()?;
    let store = store_for(&config, &cwd)?;
    let doc = loader::resolve(&store, reference).await?;

    println!("{} Configuration '{}' is valid", "✓".green(), doc.name);
    println!("  Documents: {}", store.len());
    println!("  Variables: {}", doc.variables.len());
    println!("  Prompts: {}", doc.prompts.len());
    println!("  Tasks: {}", doc.tasks.len());
    for task in &doc.tasks {
        let origin = task
            .source
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        println!("    {} {} {}", task.id.bold(), task.kind.to_string().cyan(), origin.dimmed());
    }
    Ok(())
}

fn show_config(action: ConfigAction) -> Result<(), KilnError> {
    match action {
        ConfigAction::Show => {
            print!("{}", load_config()?.to_toml()?);
        }
        ConfigAction::Path => {
            println!("{}", KilnConfig::config_path().display());
        }
    }
    Ok(())
}

/// Task progress on stdout
struct ConsoleHooks;

impl RunHooks for ConsoleHooks {
    fn on_run_started(&self, _name: &str, _run_id: &str, task_count: usize) {
        println!("{} Running {} tasks...\n", "→".cyan(), task_count);
    }

    fn on_task_skipped(&self, task: &TaskDefinition, reason: &str) {
        println!("  {} {} {}", "[-]".dimmed(), task.id, reason.dimmed());
    }

    fn before_task(&self, task: &TaskDefinition) {
        debug!(task = %task.id, "Starting");
    }

    fn after_task(&self, task: &TaskDefinition, elapsed: Duration) {
        println!(
            "  {} {} {}",
            "[✓]".green(),
            task.id,
            format!("({}ms)", elapsed.as_millis()).dimmed()
        );
    }

    fn on_error(&self, task: &TaskDefinition, error: &KilnError, _elapsed: Duration) {
        let marker = if task.is_required() {
            "[✗]".red()
        } else {
            "[!]".yellow()
        };
        println!("  {} {} {}", marker, task.id, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_dir_is_anchored_at_process_dir() {
        let cwd = Path::new("/work");
        assert_eq!(output_dir(cwd, None), PathBuf::from("/work"));
        assert_eq!(output_dir(cwd, Some("out".into())), PathBuf::from("/work/out"));
        assert_eq!(output_dir(cwd, Some("/tmp/out".into())), PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("name=my=app").unwrap(),
            ("name".to_string(), "my=app".to_string())
        );
        assert!(parse_assignment("=x").is_err());
        assert!(parse_assignment("novalue").is_err());
    }
}
