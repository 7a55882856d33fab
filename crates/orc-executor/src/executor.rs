use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use orc_cache::Cache;
use orc_events::Broadcaster;
use orc_git::{GitHooks, PullRequestProvider};
use orc_orchestrator::{NeedsInfoReason, Orchestrator, PipelineOutcome, PipelineResult, RoleModel};
use orc_patch::TransactionMode;
use orc_repository::{RunPatch, RunRepository};
use orc_types::event::{EventData, EventEnvelope, EventType};
use orc_types::run::RunError;
use orc_types::task::{OutputMode, RunOutcome};
use orc_types::{Artifact, ArtifactType, ErrorKind, Id, Metric, MetricKind, OrcError, OrchestratorConfig, RunStatus, TaskRun};

use crate::approval::{ApprovalDecision, ApprovalGate};
use crate::patching::manifest_entry_to_diff_patch;

/// Drives one [`orc_types::TaskRun`] end to end through the state graph in
/// §4.9: analyze → plan → approval gate → code/test/review → (patch) →
/// (git) → terminal. One executor instance is shared by every run; each
/// `submit` spawns its own lightweight task, per the "parallel tasks"
/// scheduling model.
pub struct RunExecutor<P: PullRequestProvider + Send + Sync + 'static> {
    repository: Arc<dyn RunRepository + Send + Sync>,
    broadcaster: Arc<Broadcaster>,
    cache: Cache,
    model: Arc<dyn RoleModel>,
    model_name: String,
    git_hooks: Arc<GitHooks<P>>,
    config: OrchestratorConfig,
    approval_gate: Arc<ApprovalGate>,
    semaphore: Arc<Semaphore>,
    cancellations: Mutex<HashMap<Id, CancellationToken>>,
}

impl<P: PullRequestProvider + Send + Sync + 'static> RunExecutor<P> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repository: Arc<dyn RunRepository + Send + Sync>,
        broadcaster: Arc<Broadcaster>,
        cache: Cache,
        model: Arc<dyn RoleModel>,
        model_name: impl Into<String>,
        git_hooks: Arc<GitHooks<P>>,
        config: OrchestratorConfig,
    ) -> Arc<Self> {
        let concurrency_cap = config.concurrency_cap;
        Arc::new(RunExecutor {
            repository,
            broadcaster,
            cache,
            model,
            model_name: model_name.into(),
            git_hooks,
            config,
            approval_gate: Arc::new(ApprovalGate::new()),
            semaphore: Arc::new(Semaphore::new(concurrency_cap)),
            cancellations: Mutex::new(HashMap::new()),
        })
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    pub fn repository(&self) -> &Arc<dyn RunRepository + Send + Sync> {
        &self.repository
    }

    /// Admits a new run for `task_id`, rejecting immediately if the
    /// concurrency cap (§5 fairness: "overflow is rejected") has no free
    /// permit. On success, spawns the lightweight task that drives it and
    /// returns right away with the freshly created `pending` run.
    pub fn submit(self: &Arc<Self>, task_id: Id) -> Result<TaskRun, OrcError> {
        let permit = Arc::clone(&self.semaphore).try_acquire_owned().map_err(|_| {
            OrcError::new(ErrorKind::Internal, "concurrency cap reached, retry later").with_detail("concurrency_cap_exceeded")
        })?;

        let run = self.repository.create_run(task_id)?;
        let cancel = CancellationToken::new();
        self.cancellations
            .lock()
            .expect("cancellation map poisoned")
            .insert(run.id, cancel.clone());

        self.publish(run.id, task_id, EventType::TaskStarted, EventData::empty());

        let executor = Arc::clone(self);
        let run_id = run.id;
        tokio::spawn(async move {
            let cleanup = Arc::clone(&executor);
            executor.drive(run_id, task_id, cancel).await;
            let _permit = permit;
            cleanup.cancellations.lock().expect("cancellation map poisoned").remove(&run_id);
        });

        Ok(run)
    }

    /// Delivers an external approve/reject decision to a run currently
    /// suspended at the approval gate.
    pub fn decide_approval(&self, run_id: Id, decision: ApprovalDecision) -> Result<(), OrcError> {
        self.approval_gate.decide(run_id, decision)
    }

    /// Requests cancellation of an active run. The run observes this at its
    /// next safe point (§5: phase boundaries, before git mutation).
    pub fn cancel(&self, run_id: Id) -> Result<(), OrcError> {
        let token = self.cancellations.lock().expect("cancellation map poisoned").get(&run_id).cloned();
        match token {
            Some(token) => {
                token.cancel();
                Ok(())
            }
            None => Err(OrcError::new(ErrorKind::InvalidInput, format!("run {run_id} is not active"))),
        }
    }

    fn publish(&self, run_id: Id, task_id: Id, event_type: EventType, data: EventData) {
        self.broadcaster.publish(EventEnvelope::new(event_type, data).for_run(task_id, run_id));
    }

    /// Persists a patch then publishes its corresponding event, preserving
    /// the ordering guarantee in §4.9: "every state transition is durably
    /// recorded via C7 before the corresponding event is published."
    fn transition(&self, run_id: Id, task_id: Id, patch: RunPatch, event_type: EventType, data: EventData) -> Result<TaskRun, OrcError> {
        let run = self.repository.update_run(run_id, patch)?;
        self.publish(run_id, task_id, event_type, data);
        Ok(run)
    }

    async fn drive(self: Arc<Self>, run_id: Id, task_id: Id, cancel: CancellationToken) {
        let outcome = tokio::time::timeout(self.config.run_timeout, self.run_to_completion(run_id, task_id, cancel)).await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self.fail_run(run_id, task_id, e),
            Err(_elapsed) => {
                self.approval_gate.expire(run_id);
                if let Ok(run) = self.repository.load_run(run_id) {
                    if run.status.can_transition_to(RunStatus::Timeout) {
                        let patch = RunPatch {
                            status: Some(RunStatus::Timeout),
                            error: Some(RunError {
                                kind: ErrorKind::RunTimeout,
                                message: "run exceeded its wall-clock budget".into(),
                                detail: None,
                            }),
                            completed_at: Some(Utc::now()),
                            ..Default::default()
                        };
                        let _ = self.transition(run_id, task_id, patch, EventType::Timeout, EventData::empty());
                    }
                }
                let _ = self.repository.bump_task_counters(task_id, RunOutcome::Failure);
            }
        }
    }

    /// Marks a run failed on any error surfaced from the pipeline, git, or
    /// patch phases. A no-op if the run already reached a terminal state
    /// through one of the explicit branches below.
    fn fail_run(&self, run_id: Id, task_id: Id, error: OrcError) {
        if let Ok(run) = self.repository.load_run(run_id) {
            if run.status.can_transition_to(RunStatus::Failed) {
                let patch = RunPatch {
                    status: Some(RunStatus::Failed),
                    error: Some(RunError::from(error)),
                    completed_at: Some(Utc::now()),
                    ..Default::default()
                };
                let _ = self.transition(run_id, task_id, patch, EventType::Failure, EventData::empty());
            }
        }
        let _ = self.repository.bump_task_counters(task_id, RunOutcome::Failure);
    }

    fn cancel_run(&self, run_id: Id, task_id: Id) -> Result<(), OrcError> {
        if let Ok(run) = self.repository.load_run(run_id) {
            if run.status.can_transition_to(RunStatus::Cancelled) {
                let patch = RunPatch {
                    status: Some(RunStatus::Cancelled),
                    completed_at: Some(Utc::now()),
                    ..Default::default()
                };
                self.transition(run_id, task_id, patch, EventType::Cancelled, EventData::empty())?;
                self.repository.bump_task_counters(task_id, RunOutcome::Failure)?;
            }
        }
        Ok(())
    }

    async fn run_to_completion(self: &Arc<Self>, run_id: Id, task_id: Id, cancel: CancellationToken) -> Result<(), OrcError> {
        let task = self.repository.load_task(task_id)?;
        let run = self.repository.load_run(run_id)?;

        self.transition(
            run_id,
            task_id,
            RunPatch {
                status: Some(RunStatus::Analyzing),
                started_at: Some(Utc::now()),
                ..Default::default()
            },
            EventType::AnalysisStart,
            EventData::empty(),
        )?;

        if cancel.is_cancelled() {
            return self.cancel_run(run_id, task_id);
        }

        let mut orchestrator = Orchestrator::new(
            Arc::clone(&self.model),
            self.model_name.clone(),
            self.cache.clone(),
            self.config.max_rounds,
            self.config.max_revision_rounds,
        );

        let analysis = orchestrator.analyze(&task)?;
        let plan = orchestrator.plan(&task, &analysis)?;

        let approval_rx = self.approval_gate.register(run_id);
        self.transition(
            run_id,
            task_id,
            RunPatch::status(RunStatus::AwaitingApproval).with_plan(plan.plan_text.clone()),
            EventType::PlanReady,
            EventData::empty(),
        )?;
        self.publish(run_id, task_id, EventType::ApprovalRequired, EventData::empty());

        let decision = match tokio::time::timeout(self.config.approval_timeout, approval_rx).await {
            Ok(Ok(decision)) => decision,
            Ok(Err(_)) => return Err(OrcError::new(ErrorKind::Internal, "approval channel closed without a decision")),
            Err(_elapsed) => {
                self.approval_gate.expire(run_id);
                return Err(OrcError::new(ErrorKind::ApprovalTimeout, "no approval decision within the configured timeout"));
            }
        };

        if !decision.approved {
            self.transition(
                run_id,
                task_id,
                RunPatch {
                    status: Some(RunStatus::Cancelled),
                    results: decision.feedback,
                    completed_at: Some(Utc::now()),
                    ..Default::default()
                },
                EventType::Rejected,
                EventData::empty(),
            )?;
            self.repository.bump_task_counters(task_id, RunOutcome::Failure)?;
            return Ok(());
        }

        if cancel.is_cancelled() {
            return self.cancel_run(run_id, task_id);
        }

        self.transition(run_id, task_id, RunPatch::status(RunStatus::Approved), EventType::Approved, EventData::empty())?;
        self.transition(
            run_id,
            task_id,
            RunPatch::status(RunStatus::Executing),
            EventType::Progress,
            EventData::progress(1, 3, "executing"),
        )?;

        let outcome = orchestrator.code_test_review(&task, &analysis)?;

        let pipeline_result = match outcome {
            PipelineOutcome::Completed(result) => {
                self.transition(
                    run_id,
                    task_id,
                    RunPatch {
                        status: Some(RunStatus::Validating),
                        revision_rounds_used: Some(result.revision_count),
                        ..Default::default()
                    },
                    EventType::ValidationPassed,
                    EventData::empty(),
                )?;
                result
            }
            PipelineOutcome::NeedsInfo(reason) => {
                let message = match reason {
                    NeedsInfoReason::RevisionRoundsExhausted { phase } => format!("revision rounds exhausted during {phase}"),
                    NeedsInfoReason::ReviewRoundsExhausted => "review rounds exhausted without approval".to_string(),
                };
                self.transition(
                    run_id,
                    task_id,
                    RunPatch {
                        status: Some(RunStatus::Failed),
                        error: Some(RunError { kind: ErrorKind::RevisionExhausted, message, detail: None }),
                        completed_at: Some(Utc::now()),
                        ..Default::default()
                    },
                    EventType::ValidationFailed,
                    EventData::empty(),
                )?;
                self.repository.bump_task_counters(task_id, RunOutcome::Failure)?;
                return Ok(());
            }
        };

        self.record_artifacts(run_id, task_id, &pipeline_result)?;

        if cancel.is_cancelled() {
            return self.cancel_run(run_id, task_id);
        }

        if task.output_mode == OutputMode::PatchExisting {
            let project_root = PathBuf::from(task.existing_project_path.as_deref().unwrap_or("."));
            self.transition(
                run_id,
                task_id,
                RunPatch::status(RunStatus::Patching),
                EventType::Progress,
                EventData::progress(2, 3, "patching"),
            )?;

            let diffs: Vec<_> = pipeline_result
                .manifest
                .iter()
                .map(|entry| manifest_entry_to_diff_patch(entry, &project_root))
                .collect();
            let batch = orc_patch::apply_batch(&project_root, &diffs, TransactionMode::AllOrNothing, true);

            if !batch.all_succeeded() {
                let detail = batch
                    .results
                    .iter()
                    .filter_map(|r| r.outcome.as_ref().err().map(|e| format!("{}: {e}", r.path)))
                    .collect::<Vec<_>>()
                    .join("; ");
                self.transition(
                    run_id,
                    task_id,
                    RunPatch {
                        status: Some(RunStatus::Failed),
                        error: Some(RunError {
                            kind: ErrorKind::PatchError,
                            message: "patch application failed".into(),
                            detail: Some(detail),
                        }),
                        completed_at: Some(Utc::now()),
                        ..Default::default()
                    },
                    EventType::PatchApplyFailed,
                    EventData::empty(),
                )?;
                self.repository.bump_task_counters(task_id, RunOutcome::Failure)?;
                return Ok(());
            }
        }

        if cancel.is_cancelled() {
            return self.cancel_run(run_id, task_id);
        }

        if task.repo.is_some() {
            let repo_root = PathBuf::from(task.existing_project_path.as_deref().unwrap_or("."));
            self.transition(
                run_id,
                task_id,
                RunPatch::status(RunStatus::Committing),
                EventType::Progress,
                EventData::progress(3, 3, "committing"),
            )?;

            if task.output_mode == OutputMode::GenerateNew {
                self.materialize_generated_files(&repo_root, &pipeline_result);
            }

            let git_hooks = Arc::clone(&self.git_hooks);
            let branch_prefix = task.run_branch_prefix.clone();
            let title = task.title.clone();
            let description = task.description.clone();
            let commit_template = task.commit_template.clone();
            let run_number = run.run_number;
            let repo_root_for_cleanup = repo_root.clone();
            let reference_branch = task.repo.as_ref().expect("checked by task.repo.is_some() above").reference_branch.clone();
            let (git_result, git_err, step_events) = tokio::task::spawn_blocking(move || {
                let mut step_events = Vec::new();
                let (result, err) = git_hooks.run_phase(
                    &repo_root,
                    &branch_prefix,
                    &title,
                    &description,
                    &commit_template,
                    run_number,
                    |event| step_events.push(event),
                );
                (result, err, step_events)
            })
            .await
            .map_err(|e| OrcError::new(ErrorKind::Internal, format!("git phase task panicked: {e}")))?;

            let _ = self.repository.update_run(
                run_id,
                RunPatch {
                    branch_name: git_result.branch_name.clone(),
                    commit_sha: git_result.commit_sha.clone(),
                    pr_url: git_result.pr_url.clone(),
                    git_status: git_result.git_status,
                    ..Default::default()
                },
            );

            // §4.5's cleanup guarantee: the local branch is removed on every
            // exit path from here (success, failure, cancellation) once the
            // metadata above has been persisted.
            for step_event in &step_events {
                match step_event {
                    orc_git::GitStepEvent::BranchCreated { branch_name } => {
                        self.publish(run_id, task_id, EventType::GitBranchCreated, EventData::git_branch_created(branch_name));
                    }
                    orc_git::GitStepEvent::CommitCreated { commit_sha } => {
                        self.publish(run_id, task_id, EventType::GitCommitCreated, EventData::git_commit_created(commit_sha.as_deref()));
                    }
                    orc_git::GitStepEvent::Pushed | orc_git::GitStepEvent::PrOpened { .. } => {}
                }
            }

            if cancel.is_cancelled() {
                if let Some(branch_name) = git_result.branch_name.clone() {
                    cleanup_local_branch(repo_root_for_cleanup, branch_name, reference_branch).await;
                }
                return self.cancel_run(run_id, task_id);
            }

            match git_err {
                Some((step, err)) => {
                    tracing::warn!(run_id = %run_id, ?step, error = %err, "git phase failed, completing run with a warning");
                    if let Some(branch_name) = git_result.branch_name.clone() {
                        cleanup_local_branch(repo_root_for_cleanup, branch_name, reference_branch).await;
                    }
                    let event_type = if step == orc_git::GitPhaseStep::Push {
                        EventType::GitPushFailed
                    } else {
                        EventType::GitOperationFailed
                    };
                    let data = if step == orc_git::GitPhaseStep::Push {
                        EventData::git_push_failed(&err.message)
                    } else {
                        EventData::empty()
                    };
                    self.transition(
                        run_id,
                        task_id,
                        RunPatch {
                            status: Some(RunStatus::Completed),
                            completed_at: Some(Utc::now()),
                            results: Some(render_results_summary(&pipeline_result)),
                            ..Default::default()
                        },
                        event_type,
                        data,
                    )?;
                }
                None => {
                    self.transition(run_id, task_id, RunPatch::status(RunStatus::Pushing), EventType::GitPushSuccess, EventData::empty())?;
                    if git_result.pr_url.is_some() {
                        self.transition(run_id, task_id, RunPatch::status(RunStatus::PrOpened), EventType::PullRequestOpened, EventData::empty())?;
                    }
                    if let Some(branch_name) = git_result.branch_name.clone() {
                        cleanup_local_branch(repo_root_for_cleanup, branch_name, reference_branch).await;
                    }
                    self.transition(
                        run_id,
                        task_id,
                        RunPatch {
                            status: Some(RunStatus::Completed),
                            completed_at: Some(Utc::now()),
                            results: Some(render_results_summary(&pipeline_result)),
                            ..Default::default()
                        },
                        EventType::Completion,
                        EventData::empty(),
                    )?;
                }
            }
        } else {
            self.transition(
                run_id,
                task_id,
                RunPatch {
                    status: Some(RunStatus::Completed),
                    completed_at: Some(Utc::now()),
                    results: Some(render_results_summary(&pipeline_result)),
                    ..Default::default()
                },
                EventType::Completion,
                EventData::empty(),
            )?;
        }

        self.repository.bump_task_counters(task_id, RunOutcome::Success)?;
        Ok(())
    }

    fn record_artifacts(&self, run_id: Id, task_id: Id, result: &PipelineResult) -> Result<(), OrcError> {
        for entry in &result.manifest {
            self.repository
                .append_artifact(Artifact::new(run_id, entry.path.clone(), ArtifactType::Code, entry.content.clone().into_bytes()))?;
        }
        for entry in &result.test_manifest {
            self.repository
                .append_artifact(Artifact::new(run_id, entry.path.clone(), ArtifactType::Test, entry.content.clone().into_bytes()))?;
        }

        for (phase, duration) in &result.phase_timings {
            self.repository.record_metric(Metric {
                task_id,
                run_id: Some(run_id),
                name: format!("phase_duration_ms.{phase}"),
                kind: MetricKind::Timer,
                value: duration.as_millis() as f64,
                labels: BTreeMap::new(),
                timestamp: Utc::now(),
            })?;
        }
        self.repository
            .record_metric(Metric::counter(task_id, "estimated_tokens", result.estimated_tokens as f64).with_run(run_id))?;

        Ok(())
    }

    fn materialize_generated_files(&self, project_root: &std::path::Path, result: &PipelineResult) {
        for entry in result.manifest.iter().chain(result.test_manifest.iter()) {
            let path = project_root.join(&entry.path);
            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    tracing::warn!(path = %path.display(), error = %e, "failed to create directory for generated file");
                    continue;
                }
            }
            if let Err(e) = std::fs::write(&path, &entry.content) {
                tracing::warn!(path = %path.display(), error = %e, "failed to write generated file");
            }
        }
    }
}

/// Removes the local branch `run_phase` created, checking out `onto` first
/// since git refuses to delete the currently-checked-out branch. Best-effort:
/// a failure here is logged, never surfaced to the run's own terminal state,
/// since the run's actual outcome was already decided by the git phase.
async fn cleanup_local_branch(repo_root: PathBuf, branch_name: String, onto: String) {
    let log_name = branch_name.clone();
    let result = tokio::task::spawn_blocking(move || orc_git::delete_branch(&repo_root, &branch_name, &onto)).await;
    match result {
        Ok(Ok(())) => tracing::info!(branch = %log_name, "local branch cleaned up"),
        Ok(Err(e)) => tracing::warn!(branch = %log_name, error = %e, "failed to delete local branch during cleanup"),
        Err(e) => tracing::warn!(branch = %log_name, error = %e, "branch cleanup task panicked"),
    }
}

fn render_results_summary(result: &PipelineResult) -> String {
    format!(
        "{} file(s), {} test file(s), {} revision round(s), ~{} estimated tokens",
        result.manifest.len(),
        result.test_manifest.len(),
        result.revision_count,
        result.estimated_tokens
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_cache::Cache;
    use orc_git::{GitHooks, NullPrProvider};
    use orc_orchestrator::StubRoleModel;
    use orc_repository::InMemoryRunRepository;
    use orc_types::task::{OutputMode, ProjectType};
    use orc_types::{new_id, Task};
    use std::time::Duration;

    fn test_config() -> OrchestratorConfig {
        OrchestratorConfig {
            approval_timeout: Duration::from_millis(200),
            run_timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    fn sample_task(output_mode: OutputMode) -> Task {
        Task {
            id: new_id(),
            title: "Hello Ping API".into(),
            description: "Build a FastAPI /ping endpoint".into(),
            target_stack: Some("fastapi".into()),
            project_type: ProjectType::Api,
            output_mode,
            strict_requirements: true,
            constraints: vec![],
            existing_project_path: None,
            repo: None,
            run_branch_prefix: "mgx".into(),
            commit_template: "MGX Task: {task_name} - Run #{run_number}".into(),
            total_runs: 0,
            successful_runs: 0,
            failed_runs: 0,
            last_run_at: None,
            last_error: None,
        }
    }

    fn test_executor(config: OrchestratorConfig) -> (Arc<RunExecutor<NullPrProvider>>, Arc<InMemoryRunRepository>) {
        let repository = Arc::new(InMemoryRunRepository::default());
        let broadcaster = Arc::new(Broadcaster::default());
        let git_hooks = Arc::new(GitHooks::new(NullPrProvider, config.push_max_attempts, config.push_backoff_base_ms));
        let executor = RunExecutor::new(
            repository.clone(),
            broadcaster,
            Cache::disabled(),
            Arc::new(StubRoleModel),
            "planner-v1",
            git_hooks,
            config,
        );
        (executor, repository)
    }

    async fn wait_for_terminal(repository: &InMemoryRunRepository, run_id: Id) -> TaskRun {
        for _ in 0..200 {
            let run = repository.load_run(run_id).unwrap();
            if run.status.is_terminal() {
                return run;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("run never reached a terminal state");
    }

    #[tokio::test]
    async fn generate_new_without_a_repo_approves_and_completes() {
        let (executor, repository) = test_executor(test_config());
        let task = sample_task(OutputMode::GenerateNew);
        let task_id = task.id;
        repository.put_task(task).unwrap();

        let run = executor.submit(task_id).unwrap();
        let subscription = executor.broadcaster().subscribe([orc_events::run_channel(&run.id.to_string())]);

        // approve as soon as the run reaches the gate.
        loop {
            if let Ok(loaded) = repository.load_run(run.id) {
                if loaded.status == RunStatus::AwaitingApproval {
                    executor.decide_approval(run.id, ApprovalDecision { approved: true, feedback: None }).unwrap();
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let final_run = wait_for_terminal(&repository, run.id).await;
        assert_eq!(final_run.status, RunStatus::Completed);
        assert!(!repository.list_artifacts(run.id).unwrap().is_empty());
        assert!(subscription.next().await.is_some());
    }

    #[tokio::test]
    async fn rejecting_the_plan_cancels_the_run() {
        let (executor, repository) = test_executor(test_config());
        let task = sample_task(OutputMode::GenerateNew);
        let task_id = task.id;
        repository.put_task(task).unwrap();

        let run = executor.submit(task_id).unwrap();
        loop {
            if let Ok(loaded) = repository.load_run(run.id) {
                if loaded.status == RunStatus::AwaitingApproval {
                    executor
                        .decide_approval(run.id, ApprovalDecision { approved: false, feedback: Some("not now".into()) })
                        .unwrap();
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let final_run = wait_for_terminal(&repository, run.id).await;
        assert_eq!(final_run.status, RunStatus::Cancelled);
    }

    #[tokio::test]
    async fn an_unanswered_approval_times_out_the_run() {
        let (executor, repository) = test_executor(test_config());
        let task = sample_task(OutputMode::GenerateNew);
        let task_id = task.id;
        repository.put_task(task).unwrap();

        let run = executor.submit(task_id).unwrap();
        let final_run = wait_for_terminal(&repository, run.id).await;
        assert_eq!(final_run.status, RunStatus::Failed);
        assert_eq!(final_run.error.unwrap().kind, ErrorKind::ApprovalTimeout);
    }

    #[tokio::test]
    async fn submit_rejects_once_the_concurrency_cap_is_exhausted() {
        let mut config = test_config();
        config.concurrency_cap = 1;
        let (executor, repository) = test_executor(config);

        let task_a = sample_task(OutputMode::GenerateNew);
        let task_b = sample_task(OutputMode::GenerateNew);
        repository.put_task(task_a.clone()).unwrap();
        repository.put_task(task_b.clone()).unwrap();

        let _run_a = executor.submit(task_a.id).unwrap();
        let err = executor.submit(task_b.id).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
    }

    #[tokio::test]
    async fn cancelling_before_the_approval_gate_is_a_no_op_on_an_unknown_run() {
        let (executor, _repository) = test_executor(test_config());
        assert!(executor.cancel(new_id()).is_err());
    }
}
