use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::apply::{apply_hunks, ApplyError, DriftWarning};
use crate::diff::DiffPatch;
use crate::fallback;
use orc_manifest::FileOperation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchErrorKind {
    ParseError,
    ContextMismatch,
    IoError,
    PathUnsafe,
}

#[derive(Debug, Clone)]
pub struct PatchError {
    pub kind: PatchErrorKind,
    pub message: String,
}

impl PatchError {
    fn new(kind: PatchErrorKind, message: impl Into<String>) -> Self {
        PatchError {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for PatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for PatchError {}

pub struct FileApplyOutcome {
    pub drift_warnings: Vec<DriftWarning>,
    pub backup_path: Option<PathBuf>,
}

/// Applies one file's patch to disk under `root`, following the §4.4
/// algorithm: validate the target path, apply hunks in memory, optionally
/// back up, then atomically rename a temp file over the target.
pub fn apply_one_file(root: &Path, patch: &DiffPatch, backup: bool) -> Result<FileApplyOutcome, PatchError> {
    let normalized = orc_manifest::path_safety_normalize(&patch.target_path)
        .map_err(|e| PatchError::new(PatchErrorKind::PathUnsafe, e.to_string()))?;
    let target = root.join(&normalized);

    if patch.is_binary {
        tracing::warn!(path = %normalized, "binary diff skipped");
        return Ok(FileApplyOutcome {
            drift_warnings: vec![],
            backup_path: None,
        });
    }

    match patch.operation {
        FileOperation::Delete => {
            if backup && target.exists() {
                let bak = fallback::backup_path(&target, Utc::now());
                std::fs::copy(&target, &bak).map_err(|e| PatchError::new(PatchErrorKind::IoError, e.to_string()))?;
            }
            if target.exists() {
                std::fs::remove_file(&target).map_err(|e| PatchError::new(PatchErrorKind::IoError, e.to_string()))?;
            }
            return Ok(FileApplyOutcome {
                drift_warnings: vec![],
                backup_path: None,
            });
        }
        FileOperation::Create | FileOperation::Modify => {}
    }

    let original = if target.exists() {
        std::fs::read_to_string(&target).map_err(|e| PatchError::new(PatchErrorKind::IoError, e.to_string()))?
    } else {
        String::new()
    };

    let outcome = apply_hunks(&original, patch).map_err(|e| match e {
        ApplyError::ContextMismatch { hunk_index } => PatchError::new(
            PatchErrorKind::ContextMismatch,
            format!("no anchor found for hunk {hunk_index} within the drift window"),
        ),
    })?;

    let backup_path = if backup && target.exists() {
        let bak = fallback::backup_path(&target, Utc::now());
        std::fs::copy(&target, &bak).map_err(|e| PatchError::new(PatchErrorKind::IoError, e.to_string()))?;
        Some(bak)
    } else {
        None
    };

    write_atomically(&target, &outcome.new_content).map_err(|e| PatchError::new(PatchErrorKind::IoError, e.to_string()))?;

    Ok(FileApplyOutcome {
        drift_warnings: outcome.drift_warnings,
        backup_path,
    })
}

/// Writes `content` to a temp file in the same directory as `target`, then
/// atomically renames it over the target, per §4.4 step 6.
fn write_atomically(target: &Path, content: &str) -> std::io::Result<()> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

/// Restores `target` from `backup`, used by the all_or_nothing rollback
/// path.
pub fn restore_from_backup(target: &Path, backup: &Path) -> std::io::Result<()> {
    std::fs::copy(backup, target)?;
    Ok(())
}
