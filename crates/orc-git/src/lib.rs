//! # orc-git
//!
//! Branch/commit/push/PR hooks for the git phases of a run (§4.5). Applied
//! only when a `TaskRun`'s task carries a [`orc_types::RepoRef`].
//!
//! Every subprocess call shells out to `git` via [`branch::git_program`],
//! overridable with `ORC_GIT_BIN` for tests, following the same pattern the
//! metrics shipper uses for its own git context collection.
//!
//! PR opening has no concrete provider in this crate: it is expressed as the
//! [`pr::PullRequestProvider`] trait with a no-op [`pr::NullPrProvider`]
//! default, since hosting a GitHub/GitLab client is out of scope for the
//! core (spec's "thin adapters" framing).

mod branch;
mod commit;
mod pr;
mod push;

pub use branch::{branch_exists, create_branch, delete_branch, derive_branch_name, git_program, BranchError};
pub use commit::{commit_all, render_commit_message, CommitOutcome};
pub use pr::{NullPrProvider, PrOutcome, PullRequestProvider};
pub use push::{push_branch, PushOutcome};

use std::path::Path;

use orc_retry::RetryConfig;
use orc_types::run::GitStatus;
use orc_types::OrcError;

/// Which of §4.5's four steps a `run_phase` failure occurred in, so the
/// caller can emit the right per-step failure event (`git_push_failed` vs.
/// a generic branch/commit/PR failure) and decide whether the cleanup
/// guarantee applies (it does once `Branch` has succeeded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitPhaseStep {
    Branch,
    Commit,
    Push,
    Pr,
}

/// Emitted as `run_phase` completes each step, so the caller can publish the
/// per-step events §6's taxonomy requires instead of waiting for the whole
/// phase to finish.
#[derive(Debug, Clone)]
pub enum GitStepEvent {
    BranchCreated { branch_name: String },
    /// `commit_sha` is `None` for a vacuous "nothing to commit" step.
    CommitCreated { commit_sha: Option<String> },
    Pushed,
    PrOpened { pr_url: String },
}

/// Result of running the full git phase sequence (§4.5's four steps) for one
/// run. Each field mirrors the "metadata contract": on success, the executor
/// persists these onto the `TaskRun` via C7.
#[derive(Debug, Clone, Default)]
pub struct GitPhaseResult {
    pub branch_name: Option<String>,
    pub commit_sha: Option<String>,
    pub pr_url: Option<String>,
    pub git_status: Option<GitStatus>,
}

/// Runs branch create → commit → push → open-PR in the repo at `repo_root`,
/// stopping at the first step that fails and returning what was accomplished
/// so far alongside the failing step and its error. The caller (executor) is
/// responsible for the cleanup guarantee (local branch removal on every exit
/// path, success or failure) since that happens after the metadata produced
/// here is persisted.
pub struct GitHooks<P: PullRequestProvider> {
    pr_provider: P,
    push_retry: RetryConfig,
}

impl<P: PullRequestProvider> GitHooks<P> {
    pub fn new(pr_provider: P, push_max_attempts: u32, push_backoff_base_ms: u64) -> Self {
        GitHooks {
            pr_provider,
            push_retry: RetryConfig::for_push(push_max_attempts, push_backoff_base_ms),
        }
    }

    /// Executes the full sequence. `task_name`/`run_number` feed the branch
    /// slug and commit/PR templates; `commit_template` is the task's own
    /// template string. `on_step` is invoked after each step completes, so
    /// the caller can publish per-step events without waiting for the whole
    /// phase to finish.
    pub fn run_phase(
        &self,
        repo_root: &Path,
        branch_prefix: &str,
        task_name: &str,
        task_description: &str,
        commit_template: &str,
        run_number: u64,
        mut on_step: impl FnMut(GitStepEvent),
    ) -> (GitPhaseResult, Option<(GitPhaseStep, OrcError)>) {
        let mut result = GitPhaseResult::default();

        let branch_name = derive_branch_name(branch_prefix, task_name, run_number, None);
        let branch_name = match create_branch(repo_root, &branch_name) {
            Ok(name) => name,
            Err(e) if e.is_branch_exists() => {
                tracing::warn!(branch = %branch_name, "branch exists, retrying with suffix");
                let suffixed = derive_branch_name(branch_prefix, task_name, run_number, Some("retry"));
                match create_branch(repo_root, &suffixed) {
                    Ok(name) => name,
                    Err(e) => return (result, Some((GitPhaseStep::Branch, e.into()))),
                }
            }
            Err(e) => return (result, Some((GitPhaseStep::Branch, e.into()))),
        };
        tracing::info!(branch = %branch_name, "branch created");
        result.branch_name = Some(branch_name.clone());
        result.git_status = Some(GitStatus::BranchCreated);
        on_step(GitStepEvent::BranchCreated { branch_name: branch_name.clone() });

        let message = render_commit_message(commit_template, task_name, run_number);
        match commit_all(repo_root, &message) {
            Ok(CommitOutcome::Committed(sha)) => {
                result.commit_sha = Some(sha.clone());
                result.git_status = Some(GitStatus::Committed);
                on_step(GitStepEvent::CommitCreated { commit_sha: Some(sha) });
            }
            Ok(CommitOutcome::NothingToCommit) => {
                result.git_status = Some(GitStatus::Committed);
                on_step(GitStepEvent::CommitCreated { commit_sha: None });
            }
            Err(e) => return (result, Some((GitPhaseStep::Commit, e))),
        }

        match push_branch(repo_root, &branch_name, &self.push_retry) {
            Ok(PushOutcome::Pushed) => {
                tracing::info!(branch = %branch_name, "branch pushed");
                result.git_status = Some(GitStatus::Pushed);
                on_step(GitStepEvent::Pushed);
            }
            Err(e) => return (result, Some((GitPhaseStep::Push, e))),
        }

        let pr_body = format!(
            "{task_description}\n\ncommit: {}",
            result.commit_sha.as_deref().unwrap_or("unknown")
        );
        let pr_title = format!("MGX: {task_name} — Run #{run_number}");
        match self.pr_provider.open_pr(&branch_name, &pr_title, &pr_body) {
            Ok(PrOutcome::Opened(url)) | Ok(PrOutcome::AlreadyExists(url)) => {
                result.pr_url = Some(url.clone());
                result.git_status = Some(GitStatus::PrOpened);
                on_step(GitStepEvent::PrOpened { pr_url: url });
            }
            Ok(PrOutcome::Skipped) => {}
            Err(e) => return (result, Some((GitPhaseStep::Pr, e))),
        }

        (result, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_result_default_is_all_none() {
        let r = GitPhaseResult::default();
        assert!(r.branch_name.is_none());
        assert!(r.pr_url.is_none());
    }
}
