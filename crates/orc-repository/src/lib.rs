//! # orc-repository
//!
//! The narrow persistence interface the executor consumes (§4.7, C7): a
//! trait plus one in-memory implementation for local/demo use. A real
//! embedding application backs [`RunRepository`] with its own store; the
//! contract is what matters, not the storage engine.
//!
//! **Atomicity.** [`RunRepository::update_run`] must apply its status
//! transition and any simultaneous field write atomically from a reader's
//! perspective — [`InMemoryRunRepository`] gets this for free from its
//! single `Mutex`; a relational implementation would need one transaction
//! per call.

mod in_memory;
mod patch;

pub use in_memory::InMemoryRunRepository;
pub use patch::RunPatch;

use orc_types::task::RunOutcome;
use orc_types::{Artifact, Id, Metric, OrcError, Task, TaskRun};

/// The persistence operations the executor needs, kept deliberately narrow
/// (semantic operations, not a SQL surface) per §4.7.
pub trait RunRepository {
    /// Assigns a new monotonic `run_number` for `task_id` and returns a
    /// freshly created run in status `pending`.
    fn create_run(&self, task_id: Id) -> Result<TaskRun, OrcError>;

    /// Applies a partial update, validating the status transition (if any)
    /// via [`orc_types::RunStatus::can_transition_to`]; rejects illegal
    /// transitions without applying any part of the patch.
    fn update_run(&self, run_id: Id, patch: RunPatch) -> Result<TaskRun, OrcError>;

    fn append_artifact(&self, artifact: Artifact) -> Result<(), OrcError>;

    fn record_metric(&self, metric: Metric) -> Result<(), OrcError>;

    fn load_run(&self, run_id: Id) -> Result<TaskRun, OrcError>;

    fn load_task(&self, task_id: Id) -> Result<Task, OrcError>;

    fn bump_task_counters(&self, task_id: Id, outcome: RunOutcome) -> Result<(), OrcError>;

    /// Registers a task so it can be looked up and run against. Not part of
    /// the spec's narrow C7 surface on its own, but every in-process caller
    /// needs a way to seed a task before it can call `create_run`.
    fn put_task(&self, task: Task) -> Result<(), OrcError>;

    fn list_artifacts(&self, run_id: Id) -> Result<Vec<Artifact>, OrcError>;

    fn list_metrics(&self, task_id: Id) -> Result<Vec<Metric>, OrcError>;
}
