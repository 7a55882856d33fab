use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::Id;

/// The finite set of states a `TaskRun` can occupy. Transitions between
/// these are governed exclusively by [`RunStatus::can_transition_to`]; both
/// the repository (rejecting illegal writes) and the executor (driving the
/// run forward) consult the same function so the two can never disagree
/// about what is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Analyzing,
    AwaitingApproval,
    Approved,
    Executing,
    Validating,
    Patching,
    Committing,
    Pushing,
    PrOpened,
    Completed,
    Failed,
    Cancelled,
    Timeout,
}

impl RunStatus {
    /// Terminal statuses are absorbing: once reached, no further transition
    /// is legal.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled | RunStatus::Timeout
        )
    }

    /// Implements the state graph from the run executor's design: returns
    /// whether `self -> next` is an edge in the graph (including the bounded
    /// `executing <-> validating` revision loop, which callers must still
    /// bound by a round counter).
    pub fn can_transition_to(self, next: RunStatus) -> bool {
        use RunStatus::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Pending, Analyzing)
                | (Analyzing, Failed)
                | (Analyzing, AwaitingApproval)
                | (AwaitingApproval, Cancelled)
                | (AwaitingApproval, Approved)
                | (AwaitingApproval, Failed) // approval_timeout
                | (Approved, Executing)
                | (Executing, Validating)
                | (Validating, Executing) // revision loop
                | (Validating, Failed) // revision_exhausted
                | (Validating, Patching)
                | (Validating, Committing)
                | (Validating, Pushing)
                | (Validating, Completed)
                | (Patching, Failed)
                | (Patching, Committing)
                | (Patching, Completed)
                | (Committing, Failed)
                | (Committing, Completed) // completed-with-warning, policy
                | (Committing, Pushing)
                | (Pushing, Completed) // push failed, no PR
                | (Pushing, PrOpened)
                | (PrOpened, Completed)
                // Any non-terminal state may be cancelled or time out at a
                // safe point.
                | (_, Cancelled)
                | (_, Timeout)
                | (_, Failed)
        )
    }
}

/// Git-phase status, tracked independently of `RunStatus` so a run can be
/// `completed` while `git_status` records exactly how far the git hooks got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GitStatus {
    Pending,
    BranchCreated,
    Committed,
    Pushed,
    PrOpened,
    Failed,
}

/// A structured run-terminal error: kind plus message plus optional detail,
/// matching §7's "user-visible failure behavior".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunError {
    pub kind: ErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl From<crate::OrcError> for RunError {
    fn from(e: crate::OrcError) -> Self {
        RunError {
            kind: e.kind,
            message: e.message,
            detail: e.detail,
        }
    }
}

/// One execution attempt of a [`crate::Task`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRun {
    pub id: Id,
    pub task_id: Id,
    pub run_number: u64,
    pub status: RunStatus,

    pub plan: Option<String>,
    pub results: Option<String>,
    pub error: Option<RunError>,

    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,

    pub branch_name: Option<String>,
    pub commit_sha: Option<String>,
    pub pr_url: Option<String>,
    pub git_status: GitStatus,

    pub revision_rounds_used: u32,
}

impl TaskRun {
    pub fn new(task_id: Id, run_number: u64) -> Self {
        TaskRun {
            id: crate::new_id(),
            task_id,
            run_number,
            status: RunStatus::Pending,
            plan: None,
            results: None,
            error: None,
            started_at: None,
            completed_at: None,
            branch_name: None,
            commit_sha: None,
            pr_url: None,
            git_status: GitStatus::Pending,
            revision_rounds_used: 0,
        }
    }

    /// `completed_at - started_at`, per the data-model invariant that
    /// `completed_at >= started_at`.
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.completed_at) {
            (Some(s), Some(c)) => Some(c - s),
            _ => None,
        }
    }

    /// `pr_url != None` implies `commit_sha != None && branch_name != None`.
    pub fn pr_invariant_holds(&self) -> bool {
        if self.pr_url.is_some() {
            self.commit_sha.is_some() && self.branch_name.is_some()
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_reject_every_transition() {
        for terminal in [
            RunStatus::Completed,
            RunStatus::Failed,
            RunStatus::Cancelled,
            RunStatus::Timeout,
        ] {
            for next in [RunStatus::Pending, RunStatus::Executing, RunStatus::Completed] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn happy_path_is_a_legal_walk() {
        let path = [
            RunStatus::Pending,
            RunStatus::Analyzing,
            RunStatus::AwaitingApproval,
            RunStatus::Approved,
            RunStatus::Executing,
            RunStatus::Validating,
            RunStatus::Completed,
        ];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{:?} -> {:?} should be legal",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn revision_loop_is_legal_both_ways() {
        assert!(RunStatus::Executing.can_transition_to(RunStatus::Validating));
        assert!(RunStatus::Validating.can_transition_to(RunStatus::Executing));
    }

    #[test]
    fn skipping_states_is_illegal() {
        assert!(!RunStatus::Pending.can_transition_to(RunStatus::Executing));
        assert!(!RunStatus::AwaitingApproval.can_transition_to(RunStatus::Completed));
    }

    #[test]
    fn pr_url_without_commit_violates_invariant() {
        let mut run = TaskRun::new(crate::new_id(), 1);
        run.pr_url = Some("https://example.invalid/pr/1".into());
        assert!(!run.pr_invariant_holds());
        run.commit_sha = Some("deadbeef".into());
        run.branch_name = Some("mgx/hello/run-1".into());
        assert!(run.pr_invariant_holds());
    }
}
