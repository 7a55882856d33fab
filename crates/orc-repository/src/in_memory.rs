use std::collections::HashMap;
use std::sync::Mutex;

use orc_types::task::RunOutcome;
use orc_types::{Artifact, ErrorKind, Id, Metric, OrcError, Task, TaskRun};

use crate::patch::RunPatch;
use crate::RunRepository;

#[derive(Default)]
struct Store {
    tasks: HashMap<Id, Task>,
    runs: HashMap<Id, TaskRun>,
    run_numbers: HashMap<Id, u64>,
    artifacts: HashMap<Id, Vec<Artifact>>,
    metrics: HashMap<Id, Vec<Metric>>,
}

/// A single-process, single-store implementation of [`RunRepository`],
/// suitable for the CLI demo and integration tests. All state lives behind
/// one `Mutex`, which is exactly what the atomicity requirement in §4.7
/// needs: a patch is applied while holding the lock, so readers never see
/// a status transition without its accompanying field writes.
#[derive(Default)]
pub struct InMemoryRunRepository {
    store: Mutex<Store>,
}

impl InMemoryRunRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn not_found(what: &str, id: Id) -> OrcError {
        OrcError::new(ErrorKind::InvalidInput, format!("{what} not found: {id}"))
    }
}

impl RunRepository for InMemoryRunRepository {
    fn create_run(&self, task_id: Id) -> Result<TaskRun, OrcError> {
        let mut store = self.store.lock().expect("repository mutex poisoned");
        if !store.tasks.contains_key(&task_id) {
            return Err(Self::not_found("task", task_id));
        }
        let counter = store.run_numbers.entry(task_id).or_insert(0);
        *counter += 1;
        let run_number = *counter;

        let run = TaskRun::new(task_id, run_number);
        store.runs.insert(run.id, run.clone());
        Ok(run)
    }

    fn update_run(&self, run_id: Id, patch: RunPatch) -> Result<TaskRun, OrcError> {
        let mut store = self.store.lock().expect("repository mutex poisoned");
        let run = store.runs.get_mut(&run_id).ok_or_else(|| Self::not_found("run", run_id))?;

        if let Some(next) = patch.status {
            if !run.status.can_transition_to(next) {
                return Err(OrcError::new(
                    ErrorKind::ValidationError,
                    format!("illegal run transition: {:?} -> {next:?}", run.status),
                ));
            }
            run.status = next;
        }

        if let Some(plan) = patch.plan {
            run.plan = Some(plan);
        }
        if let Some(results) = patch.results {
            run.results = Some(results);
        }
        if let Some(error) = patch.error {
            run.error = Some(error);
        }
        if let Some(started_at) = patch.started_at {
            run.started_at = Some(started_at);
        }
        if let Some(completed_at) = patch.completed_at {
            run.completed_at = Some(completed_at);
        }
        if let Some(branch_name) = patch.branch_name {
            run.branch_name = Some(branch_name);
        }
        if let Some(commit_sha) = patch.commit_sha {
            run.commit_sha = Some(commit_sha);
        }
        if let Some(pr_url) = patch.pr_url {
            run.pr_url = Some(pr_url);
        }
        if let Some(git_status) = patch.git_status {
            run.git_status = git_status;
        }
        if let Some(rounds) = patch.revision_rounds_used {
            run.revision_rounds_used = rounds;
        }

        Ok(run.clone())
    }

    fn append_artifact(&self, artifact: Artifact) -> Result<(), OrcError> {
        let mut store = self.store.lock().expect("repository mutex poisoned");
        if !store.runs.contains_key(&artifact.run_id) {
            return Err(Self::not_found("run", artifact.run_id));
        }
        store.artifacts.entry(artifact.run_id).or_default().push(artifact);
        Ok(())
    }

    fn record_metric(&self, metric: Metric) -> Result<(), OrcError> {
        let mut store = self.store.lock().expect("repository mutex poisoned");
        if !store.tasks.contains_key(&metric.task_id) {
            return Err(Self::not_found("task", metric.task_id));
        }
        store.metrics.entry(metric.task_id).or_default().push(metric);
        Ok(())
    }

    fn load_run(&self, run_id: Id) -> Result<TaskRun, OrcError> {
        let store = self.store.lock().expect("repository mutex poisoned");
        store.runs.get(&run_id).cloned().ok_or_else(|| Self::not_found("run", run_id))
    }

    fn load_task(&self, task_id: Id) -> Result<Task, OrcError> {
        let store = self.store.lock().expect("repository mutex poisoned");
        store.tasks.get(&task_id).cloned().ok_or_else(|| Self::not_found("task", task_id))
    }

    fn bump_task_counters(&self, task_id: Id, outcome: RunOutcome) -> Result<(), OrcError> {
        let mut store = self.store.lock().expect("repository mutex poisoned");
        let task = store.tasks.get_mut(&task_id).ok_or_else(|| Self::not_found("task", task_id))?;
        task.bump_counters(outcome, chrono::Utc::now());
        Ok(())
    }

    fn put_task(&self, task: Task) -> Result<(), OrcError> {
        let mut store = self.store.lock().expect("repository mutex poisoned");
        store.tasks.insert(task.id, task);
        Ok(())
    }

    fn list_artifacts(&self, run_id: Id) -> Result<Vec<Artifact>, OrcError> {
        let store = self.store.lock().expect("repository mutex poisoned");
        Ok(store.artifacts.get(&run_id).cloned().unwrap_or_default())
    }

    fn list_metrics(&self, task_id: Id) -> Result<Vec<Metric>, OrcError> {
        let store = self.store.lock().expect("repository mutex poisoned");
        Ok(store.metrics.get(&task_id).cloned().unwrap_or_default())
    }
}
