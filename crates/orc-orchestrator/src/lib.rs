//! # orc-orchestrator
//!
//! The analyze → plan → code → test → review pipeline (§4.8, C8). Roles are
//! capabilities, not types: one [`role::Role`] enum, one [`model::RoleModel`]
//! seam any embedding application implements, and one shared, bounded
//! [`memory::MessageLog`] every role reads a relevance-filtered slice from.
//!
//! The approval gate between plan and code belongs to the executor (C9);
//! this crate only exposes the phases either side of it.

mod complexity;
mod memory;
mod model;
mod pipeline;
mod role;

pub use complexity::ComplexityTag;
pub use memory::{MemoryEntry, MessageLog, RELEVANT_SLICE_SIZE};
pub use model::{RoleModel, RoleRequest, RoleResponse, StubRoleModel};
pub use pipeline::{AnalysisResult, NeedsInfoReason, Orchestrator, PipelineOutcome, PipelineResult, PlanResult, ReviewVerdict};
pub use role::Role;
