use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Id;

/// The closed set of event types the broadcaster may be asked to publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    TaskCreated,
    TaskStarted,
    TaskCompleted,
    TaskFailed,
    TaskCancelled,

    AnalysisStart,
    PlanReady,
    ApprovalRequired,
    Approved,
    Rejected,
    Progress,
    Completion,
    Failure,
    Cancelled,
    Timeout,

    GitBranchCreated,
    GitCommitCreated,
    GitPushSuccess,
    GitPushFailed,
    PullRequestOpened,
    GitOperationFailed,

    ValidationFailed,
    ValidationPassed,
    PatchApplyFailed,

    AgentMessage,
    AgentThinking,
    AgentAction,
    ToolCall,
    ToolResult,
}

/// Event-specific payload. Kept as an open JSON-like value rather than one
/// variant per `EventType` so a late subscriber can render any event without
/// the broadcaster needing its own copy of every downstream schema; the
/// schema the payload must satisfy is fixed by `event_type` and documented
/// alongside it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EventData(pub serde_json::Value);

impl EventData {
    pub fn progress(step: u32, total_steps: u32, current_phase: &str) -> Self {
        EventData(serde_json::json!({
            "step": step,
            "total_steps": total_steps,
            "current_phase": current_phase,
        }))
    }

    pub fn empty() -> Self {
        EventData(serde_json::Value::Null)
    }

    pub fn git_branch_created(branch_name: &str) -> Self {
        EventData(serde_json::json!({ "branch_name": branch_name }))
    }

    pub fn git_commit_created(commit_sha: Option<&str>) -> Self {
        EventData(serde_json::json!({ "commit_sha": commit_sha }))
    }

    pub fn git_push_failed(message: &str) -> Self {
        EventData(serde_json::json!({ "message": message }))
    }
}

/// The envelope published to the broadcaster and consumed by the transport
/// adapter. Self-contained: a late subscriber can render current state from
/// one event without replaying history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: String,
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub workspace_id: Option<String>,
    pub task_id: Option<Id>,
    pub run_id: Option<Id>,
    pub data: EventData,
    pub version: String,
}

impl EventEnvelope {
    pub fn new(event_type: EventType, data: EventData) -> Self {
        EventEnvelope {
            event_id: crate::new_id().to_string(),
            event_type,
            timestamp: Utc::now(),
            workspace_id: None,
            task_id: None,
            run_id: None,
            data,
            version: "1.0".to_string(),
        }
    }

    pub fn for_run(mut self, task_id: Id, run_id: Id) -> Self {
        self.task_id = Some(task_id);
        self.run_id = Some(run_id);
        self
    }
}
