//! # orc-types
//!
//! Shared domain types for the orchestration core.
//!
//! This crate has no behavior of its own: it holds the data model (`Task`,
//! `TaskRun`, `Metric`, `Artifact`, `StackSpec`), the closed error-kind
//! taxonomy, the event envelope, and the configuration struct that every
//! other `orc-*` crate depends on. Keeping these in one leaf crate avoids
//! cyclic intra-workspace dependencies between the component crates.
//!
//! ## Modules
//!
//! - [`task`] — `Task`, `ProjectType`, `OutputMode`
//! - [`run`] — `TaskRun`, `RunStatus`, `GitStatus`, state-graph legality
//! - [`metric`] — `Metric`, `MetricKind`
//! - [`artifact`] — `Artifact`, `ArtifactType`
//! - [`stack`] — `StackTag`, `StackSpec`
//! - [`error`] — `ErrorKind`, `OrcError`
//! - [`event`] — `EventEnvelope`, `EventType`
//! - [`config`] — `OrchestratorConfig`

pub mod artifact;
pub mod config;
pub mod error;
pub mod event;
pub mod metric;
pub mod run;
pub mod stack;
pub mod task;

pub use artifact::{Artifact, ArtifactType};
pub use config::OrchestratorConfig;
pub use error::{ErrorKind, OrcError};
pub use event::{EventEnvelope, EventType};
pub use metric::{Metric, MetricKind};
pub use run::{GitStatus, RunStatus, TaskRun};
pub use stack::{StackSpec, StackTag};
pub use task::{OutputMode, ProjectType, Task};

use uuid::Uuid;

/// Identity type shared by every entity in the data model.
pub type Id = Uuid;

/// Allocates a fresh v4 identity.
pub fn new_id() -> Id {
    Uuid::new_v4()
}
