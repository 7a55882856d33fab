use std::path::{Path, PathBuf};

use crate::diff::DiffPatch;
use crate::fallback;
use crate::writer::{apply_one_file, restore_from_backup, PatchError};

/// How a multi-file patch batch is applied, per §4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    /// Apply each file in sequence; on the first failure, restore every
    /// already-touched file from its backup and mark the batch failed.
    AllOrNothing,
    /// Apply each file independently; already-applied files remain applied
    /// regardless of later failures.
    BestEffort,
}

#[derive(Debug, Clone)]
pub struct FileResult {
    pub path: String,
    pub outcome: Result<Vec<crate::apply::DriftWarning>, PatchError>,
}

pub struct BatchResult {
    pub results: Vec<FileResult>,
    pub rolled_back: bool,
}

impl BatchResult {
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.outcome.is_ok())
    }
}

/// Applies a batch of per-file patches under `root` according to `mode`.
/// On a failed file, fallback artifacts are always written next to that
/// file (§4.4); `backup=true` controls whether a `.bak` sidecar is kept for
/// successfully-applied files as well, which is what all_or_nothing's
/// rollback relies on.
pub fn apply_batch(root: &Path, patches: &[DiffPatch], mode: TransactionMode, backup: bool) -> BatchResult {
    let mut results = Vec::new();
    let mut applied_backups: Vec<(PathBuf, PathBuf)> = Vec::new();
    let mut rolled_back = false;

    for patch in patches {
        let target = root.join(&patch.target_path);
        match apply_one_file(root, patch, backup || mode == TransactionMode::AllOrNothing) {
            Ok(outcome) => {
                if let Some(bak) = &outcome.backup_path {
                    applied_backups.push((target.clone(), bak.clone()));
                }
                results.push(FileResult {
                    path: patch.target_path.clone(),
                    outcome: Ok(outcome.drift_warnings),
                });
            }
            Err(err) => {
                let _ = fallback::write_fallback_artifacts(
                    &target,
                    None,
                    &format!("{err}"),
                    &render_diff_for_log(patch),
                );
                results.push(FileResult {
                    path: patch.target_path.clone(),
                    outcome: Err(err),
                });

                if mode == TransactionMode::AllOrNothing {
                    for (touched_target, backup_path) in &applied_backups {
                        let _ = restore_from_backup(touched_target, backup_path);
                    }
                    rolled_back = true;
                    break;
                }
            }
        }
    }

    BatchResult { results, rolled_back }
}

fn render_diff_for_log(patch: &DiffPatch) -> String {
    format!(
        "target: {}\noperation: {:?}\nhunks: {}\n",
        patch.target_path,
        patch.operation,
        patch.hunks.len()
    )
}
