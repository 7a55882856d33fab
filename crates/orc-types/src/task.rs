use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Id;

/// The kind of deployment a task targets, used by guardrails to select
/// stack-appropriate rules for server-shaped output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    Api,
    Webapp,
    Fullstack,
    Devops,
}

/// Whether the implementer is writing a brand-new tree or patching one that
/// already exists on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    GenerateNew,
    PatchExisting,
}

/// A reference to a linked Git repository, carried on a `Task` and
/// consulted by the git hooks component once a run reaches its git phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub full_name: String,
    pub reference_branch: String,
    pub auth_handle: String,
}

/// A long-lived unit of work: one natural-language software task, optionally
/// scoped to a repository, that may be run (and re-run) any number of times.
///
/// `Task` is created by the embedding application and updated only by the
/// executor's aggregate-counter bookkeeping; it never mutates its own
/// `run_number` sequence (that belongs to [`crate::TaskRun`] via the
/// repository).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Id,
    pub title: String,
    pub description: String,
    pub target_stack: Option<StackTagInput>,
    pub project_type: ProjectType,
    pub output_mode: OutputMode,
    pub strict_requirements: bool,
    pub constraints: Vec<String>,
    pub existing_project_path: Option<String>,
    pub repo: Option<RepoRef>,
    pub run_branch_prefix: String,
    pub commit_template: String,

    pub total_runs: u64,
    pub successful_runs: u64,
    pub failed_runs: u64,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Stack tag as carried on task input, before the orchestrator infers one.
/// Kept distinct from [`crate::StackTag`] so an unrecognized tag string from
/// an external caller is a plain `invalid_input`, not a panic on an unknown
/// enum variant.
pub type StackTagInput = String;

/// Outcome of one completed run, used to update a task's aggregate counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Failure,
}

impl Task {
    /// Validates the §6 input contract fields that are checkable without
    /// external context (title/description length, path presence for patch
    /// mode). Stack-tag and constraint-token validity are checked by the
    /// orchestrator/guardrails, which own that vocabulary.
    pub fn validate_input(&self) -> Result<(), crate::OrcError> {
        if self.title.is_empty() || self.title.chars().count() > 255 {
            return Err(crate::OrcError::invalid_input(
                "title must be 1-255 characters",
            ));
        }
        if self.description.chars().count() > 5000 {
            return Err(crate::OrcError::invalid_input(
                "description must be at most 5000 characters",
            ));
        }
        if self.output_mode == OutputMode::PatchExisting && self.existing_project_path.is_none() {
            return Err(crate::OrcError::invalid_input(
                "existing_project_path is required when output_mode is patch_existing",
            ));
        }
        Ok(())
    }

    /// Applies the monotonic-counter invariant from the data model: updates
    /// `total_runs`/`successful_runs`/`failed_runs` and bumps `last_run_at`,
    /// never decreasing it.
    pub fn bump_counters(&mut self, outcome: RunOutcome, at: DateTime<Utc>) {
        self.total_runs += 1;
        match outcome {
            RunOutcome::Success => self.successful_runs += 1,
            RunOutcome::Failure => self.failed_runs += 1,
        }
        if self.last_run_at.is_none_or(|prev| at >= prev) {
            self.last_run_at = Some(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_task() -> Task {
        Task {
            id: crate::new_id(),
            title: "Hello API".into(),
            description: "Create a FastAPI /ping endpoint".into(),
            target_stack: Some("fastapi".into()),
            project_type: ProjectType::Api,
            output_mode: OutputMode::GenerateNew,
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

    #[test]
    fn empty_title_is_invalid_input() {
        let mut t = base_task();
        t.title = "".into();
        assert!(t.validate_input().is_err());
    }

    #[test]
    fn patch_mode_requires_existing_path() {
        let mut t = base_task();
        t.output_mode = OutputMode::PatchExisting;
        t.existing_project_path = None;
        assert!(t.validate_input().is_err());
        t.existing_project_path = Some("/tmp/project".into());
        assert!(t.validate_input().is_ok());
    }

    #[test]
    fn counters_are_monotonic() {
        let mut t = base_task();
        let t0 = Utc::now();
        t.bump_counters(RunOutcome::Success, t0);
        assert_eq!(t.total_runs, 1);
        assert_eq!(t.successful_runs, 1);
        let t1 = t0 - chrono::Duration::seconds(10);
        t.bump_counters(RunOutcome::Failure, t1);
        assert_eq!(t.total_runs, 2);
        assert_eq!(t.failed_runs, 1);
        // last_run_at never moves backwards even if a later call reports an
        // earlier timestamp.
        assert_eq!(t.last_run_at, Some(t0));
    }
}
