use chrono::{DateTime, Utc};

use orc_types::run::{GitStatus, RunError};
use orc_types::RunStatus;

/// A partial update to a [`orc_types::TaskRun`]. Every field left `None`
/// leaves the corresponding run field untouched; `status`, when present,
/// is checked against [`RunStatus::can_transition_to`] before anything in
/// the patch is applied.
#[derive(Debug, Clone, Default)]
pub struct RunPatch {
    pub status: Option<RunStatus>,
    pub plan: Option<String>,
    pub results: Option<String>,
    pub error: Option<RunError>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub branch_name: Option<String>,
    pub commit_sha: Option<String>,
    pub pr_url: Option<String>,
    pub git_status: Option<GitStatus>,
    pub revision_rounds_used: Option<u32>,
}

impl RunPatch {
    pub fn status(status: RunStatus) -> Self {
        RunPatch {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_plan(mut self, plan: impl Into<String>) -> Self {
        self.plan = Some(plan.into());
        self
    }

    pub fn with_error(mut self, error: RunError) -> Self {
        self.error = Some(error);
        self
    }
}
