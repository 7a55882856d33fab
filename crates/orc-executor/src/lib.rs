//! # orc-executor
//!
//! Run executor / state machine (§4.9, C9): the component that actually
//! drives one [`orc_types::TaskRun`] from `pending` to a terminal status,
//! sequencing the orchestrator's phases around the external approval gate,
//! the optional patch and git phases, cancellation, and the per-run
//! wall-clock budget.
//!
//! Every other component crate (C1-C8) is a library the executor calls into;
//! this is the only crate that owns `tokio::spawn`.

mod approval;
mod executor;
mod patching;

pub use approval::{ApprovalDecision, ApprovalGate};
pub use executor::RunExecutor;
pub use patching::manifest_entry_to_diff_patch;
