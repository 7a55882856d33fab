use std::collections::HashMap;
use std::sync::Mutex;

use orc_types::{ErrorKind, Id, OrcError};
use tokio::sync::oneshot;

/// The external approval-input contract (§6): `{approved, feedback?}`
/// targeted at a run currently `awaiting_approval`.
#[derive(Debug, Clone)]
pub struct ApprovalDecision {
    pub approved: bool,
    pub feedback: Option<String>,
}

/// Tracks the one pending approval channel per run currently suspended at
/// the gate. A run not present here when `decide` is called means it is not
/// in `awaiting_approval`, which is surfaced as `invalid_state` (mapped onto
/// `invalid_input` in the closed taxonomy).
#[derive(Default)]
pub struct ApprovalGate {
    pending: Mutex<HashMap<Id, oneshot::Sender<ApprovalDecision>>>,
}

impl ApprovalGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new wait slot for `run_id`, returning the receiver side
    /// the executor awaits (with its own timeout).
    pub fn register(&self, run_id: Id) -> oneshot::Receiver<ApprovalDecision> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().expect("approval gate mutex poisoned").insert(run_id, tx);
        rx
    }

    /// Delivers an external decision to a waiting run. Fails with
    /// `invalid_input` if no run is currently waiting under that id (already
    /// decided, timed out, or never reached the gate).
    pub fn decide(&self, run_id: Id, decision: ApprovalDecision) -> Result<(), OrcError> {
        let sender = self
            .pending
            .lock()
            .expect("approval gate mutex poisoned")
            .remove(&run_id)
            .ok_or_else(|| OrcError::new(ErrorKind::InvalidInput, format!("run {run_id} is not awaiting approval")))?;

        sender
            .send(decision)
            .map_err(|_| OrcError::new(ErrorKind::Internal, "approval receiver was dropped before delivery"))
    }

    /// Removes a run's wait slot without delivering a decision, used once
    /// the executor's own timeout fires so a stale `decide` call on the same
    /// id returns `invalid_input` instead of silently resolving nothing.
    pub fn expire(&self, run_id: Id) {
        self.pending.lock().expect("approval gate mutex poisoned").remove(&run_id);
    }
}
