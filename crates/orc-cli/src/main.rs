use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use orc_cache::Cache;
use orc_events::run_channel;
use orc_executor::{ApprovalDecision, RunExecutor};
use orc_git::{GitHooks, NullPrProvider};
use orc_orchestrator::StubRoleModel;
use orc_repository::{InMemoryRunRepository, RunRepository};
use orc_types::event::EventType;
use orc_types::task::{OutputMode, ProjectType, RepoRef};
use orc_types::{ErrorKind, OrchestratorConfig, RunStatus, Task};

#[derive(Parser, Debug)]
#[command(name = "orc", version)]
#[command(about = "Local/demo driver for the multi-agent run executor")]
struct Cli {
    /// Path to a TOML config file overriding OrchestratorConfig defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Submit a task and drive it to completion, prompting for approval on stdin.
    Run(RunArgs),
    /// Print the effective OrchestratorConfig (defaults merged with --config).
    Config,
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Path to a JSON file describing the task (see orc_types::Task's fields).
    #[arg(long)]
    task_file: PathBuf,

    /// Approve automatically instead of prompting on stdin. Useful for scripted demos.
    #[arg(long)]
    auto_approve: bool,
}

/// The on-disk shape a `--task-file` carries; mirrors `orc_types::Task`
/// minus the fields only the repository/executor ever assign.
#[derive(serde::Deserialize)]
struct TaskInput {
    title: String,
    description: String,
    target_stack: Option<String>,
    #[serde(default)]
    project_type: ProjectTypeInput,
    output_mode: OutputModeInput,
    #[serde(default = "default_true")]
    strict_requirements: bool,
    #[serde(default)]
    constraints: Vec<String>,
    existing_project_path: Option<String>,
    repo: Option<RepoRef>,
}

fn default_true() -> bool {
    true
}

#[derive(serde::Deserialize, Default)]
#[serde(rename_all = "snake_case")]
enum ProjectTypeInput {
    #[default]
    Api,
    Webapp,
    Fullstack,
    Devops,
}

impl From<ProjectTypeInput> for ProjectType {
    fn from(p: ProjectTypeInput) -> Self {
        match p {
            ProjectTypeInput::Api => ProjectType::Api,
            ProjectTypeInput::Webapp => ProjectType::Webapp,
            ProjectTypeInput::Fullstack => ProjectType::Fullstack,
            ProjectTypeInput::Devops => ProjectType::Devops,
        }
    }
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "snake_case")]
enum OutputModeInput {
    GenerateNew,
    PatchExisting,
}

impl From<OutputModeInput> for OutputMode {
    fn from(m: OutputModeInput) -> Self {
        match m {
            OutputModeInput::GenerateNew => OutputMode::GenerateNew,
            OutputModeInput::PatchExisting => OutputMode::PatchExisting,
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<OrchestratorConfig> {
    match path {
        None => Ok(OrchestratorConfig::default()),
        Some(p) => {
            let text = std::fs::read_to_string(p).with_context(|| format!("reading config file {}", p.display()))?;
            toml::from_str(&text).with_context(|| format!("parsing config file {}", p.display()))
        }
    }
}

fn load_task(path: &PathBuf) -> Result<Task> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading task file {}", path.display()))?;
    let input: TaskInput = serde_json::from_str(&text).with_context(|| format!("parsing task file {}", path.display()))?;

    let task = Task {
        id: orc_types::new_id(),
        title: input.title,
        description: input.description,
        target_stack: input.target_stack,
        project_type: input.project_type.into(),
        output_mode: input.output_mode.into(),
        strict_requirements: input.strict_requirements,
        constraints: input.constraints,
        existing_project_path: input.existing_project_path,
        repo: input.repo,
        run_branch_prefix: "mgx".to_string(),
        commit_template: "MGX Task: {task_name} - Run #{run_number}".to_string(),
        total_runs: 0,
        successful_runs: 0,
        failed_runs: 0,
        last_run_at: None,
        last_error: None,
    };
    task.validate_input().map_err(|e| anyhow::anyhow!("invalid task: {}: {}", e.kind, e.message))?;
    Ok(task)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(4)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(cli.config.as_ref())?;

    match cli.cmd {
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config).context("serializing config")?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run(args) => run_task(args, config).await,
    }
}

async fn run_task(args: RunArgs, config: OrchestratorConfig) -> Result<ExitCode> {
    let task = load_task(&args.task_file)?;
    let task_id = task.id;

    let repository: Arc<dyn RunRepository + Send + Sync> = Arc::new(InMemoryRunRepository::new());
    repository.put_task(task.clone())?;

    let broadcaster = Arc::new(orc_events::Broadcaster::new(config.subscriber_queue_capacity));
    let cache = build_cache(&config);
    let git_hooks = Arc::new(GitHooks::new(NullPrProvider, config.push_max_attempts, config.push_backoff_base_ms));

    let executor = RunExecutor::new(
        Arc::clone(&repository),
        Arc::clone(&broadcaster),
        cache,
        Arc::new(StubRoleModel),
        "planner-v1",
        git_hooks,
        config,
    );

    let run = executor.submit(task_id)?;
    tracing::info!(run_id = %run.id, "run submitted");

    let subscription = broadcaster.subscribe([run_channel(&run.id.to_string())]);
    loop {
        let Some(event) = subscription.next().await else {
            bail!("event stream closed before the run reached a terminal state");
        };
        tracing::info!(event_type = ?event.event_type, "event");

        if event.event_type == EventType::ApprovalRequired {
            let decision = if args.auto_approve {
                ApprovalDecision { approved: true, feedback: None }
            } else {
                prompt_for_approval().await?
            };
            executor.decide_approval(run.id, decision)?;
        }

        if matches!(
            event.event_type,
            EventType::Completion | EventType::Failure | EventType::Cancelled | EventType::Timeout
        ) {
            break;
        }
    }

    let final_run = repository.load_run(run.id)?;
    print_summary(&final_run);
    Ok(exit_code_for(&final_run))
}

fn build_cache(config: &OrchestratorConfig) -> Cache {
    if !config.enable_caching {
        return Cache::disabled();
    }
    match config.cache_backend {
        orc_types::config::CacheBackendKind::Null => Cache::disabled(),
        orc_types::config::CacheBackendKind::InMemoryLruTtl => Cache::in_memory(config.cache_max_entries, config.cache_ttl),
        orc_types::config::CacheBackendKind::RemoteKeyvalue => {
            tracing::warn!("remote_keyvalue cache backend has no configured client in this CLI; falling back to in_memory_lru_ttl");
            Cache::in_memory(config.cache_max_entries, config.cache_ttl)
        }
    }
}

async fn prompt_for_approval() -> Result<ApprovalDecision> {
    tokio::task::spawn_blocking(|| {
        println!("Plan ready. Approve? [y/N]");
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok(ApprovalDecision {
            approved: line.trim().eq_ignore_ascii_case("y"),
            feedback: None,
        })
    })
    .await
    .context("approval prompt task panicked")?
}

fn print_summary(run: &orc_types::TaskRun) {
    println!("run_id:   {}", run.id);
    println!("status:   {:?}", run.status);
    if let Some(results) = &run.results {
        println!("results:  {results}");
    }
    if let Some(error) = &run.error {
        println!("error:    {} ({})", error.kind, error.message);
    }
    if let Some(branch) = &run.branch_name {
        println!("branch:   {branch}");
    }
    if let Some(pr) = &run.pr_url {
        println!("pr:       {pr}");
    }
}

/// Maps a run's terminal state onto the exit-code contract: `0` success,
/// `1` guardrail failure, `2` approval denied or timed out, `3` timeout,
/// `4` internal error.
fn exit_code_for(run: &orc_types::TaskRun) -> ExitCode {
    match run.status {
        RunStatus::Completed => ExitCode::SUCCESS,
        RunStatus::Cancelled => ExitCode::from(2),
        RunStatus::Timeout => ExitCode::from(3),
        RunStatus::Failed => match run.error.as_ref().map(|e| e.kind) {
            Some(ErrorKind::ApprovalTimeout) => ExitCode::from(2),
            Some(ErrorKind::RunTimeout) | Some(ErrorKind::StepTimeout) => ExitCode::from(3),
            Some(ErrorKind::ValidationError) | Some(ErrorKind::RevisionExhausted) | Some(ErrorKind::PatchError) => ExitCode::from(1),
            _ => ExitCode::from(4),
        },
        _ => ExitCode::from(4),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_maps_completed_to_success() {
        let mut run = orc_types::TaskRun::new(orc_types::new_id(), 1);
        run.status = RunStatus::Completed;
        assert_eq!(exit_code_for(&run), ExitCode::SUCCESS);
    }

    #[test]
    fn exit_code_maps_revision_exhausted_to_guardrail_failure() {
        let mut run = orc_types::TaskRun::new(orc_types::new_id(), 1);
        run.status = RunStatus::Failed;
        run.error = Some(orc_types::run::RunError {
            kind: ErrorKind::RevisionExhausted,
            message: "exhausted".into(),
            detail: None,
        });
        assert_eq!(exit_code_for(&run), ExitCode::from(1));
    }

    #[test]
    fn exit_code_maps_approval_timeout_to_denied_or_timed_out() {
        let mut run = orc_types::TaskRun::new(orc_types::new_id(), 1);
        run.status = RunStatus::Failed;
        run.error = Some(orc_types::run::RunError {
            kind: ErrorKind::ApprovalTimeout,
            message: "no decision".into(),
            detail: None,
        });
        assert_eq!(exit_code_for(&run), ExitCode::from(2));
    }

    #[test]
    fn exit_code_maps_run_timeout_status_directly() {
        let mut run = orc_types::TaskRun::new(orc_types::new_id(), 1);
        run.status = RunStatus::Timeout;
        assert_eq!(exit_code_for(&run), ExitCode::from(3));
    }

    #[test]
    fn load_task_rejects_an_empty_title() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("task.json");
        std::fs::write(&path, r#"{"title": "", "description": "x", "output_mode": "generate_new"}"#).unwrap();
        assert!(load_task(&path).is_err());
    }

    #[test]
    fn load_task_parses_a_minimal_generate_new_task() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("task.json");
        std::fs::write(
            &path,
            r#"{"title": "Hello API", "description": "ping endpoint", "target_stack": "fastapi", "output_mode": "generate_new"}"#,
        )
        .unwrap();
        let task = load_task(&path).unwrap();
        assert_eq!(task.title, "Hello API");
        assert_eq!(task.output_mode, OutputMode::GenerateNew);
    }
}
