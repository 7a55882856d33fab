//! Bridges a role-emitted [`ManifestEntry`] (whole-file content) onto the
//! [`orc_patch`] transaction engine used for `patch_existing` runs.
//!
//! The Implementer/Tester roles never emit hunk-level diffs (§6's FILE
//! manifest format is always whole-file); for `patch_existing` a manifest
//! entry is turned into a single replace-whole-file hunk against whatever is
//! currently on disk, which still gets drift tolerance, backups, and
//! rollback for free from `orc_patch`.

use std::path::Path;

use orc_manifest::{FileOperation, ManifestEntry};
use orc_patch::{DiffLine, DiffPatch, Hunk};

pub fn manifest_entry_to_diff_patch(entry: &ManifestEntry, project_root: &Path) -> DiffPatch {
    if matches!(entry.operation, FileOperation::Delete) {
        return DiffPatch {
            target_path: entry.path.clone(),
            hunks: vec![],
            operation: FileOperation::Delete,
            is_binary: false,
        };
    }

    let existing = std::fs::read_to_string(project_root.join(&entry.path)).ok();
    let new_lines: Vec<&str> = entry.content.lines().collect();

    match existing {
        None => DiffPatch {
            target_path: entry.path.clone(),
            operation: FileOperation::Create,
            is_binary: false,
            hunks: vec![Hunk {
                original_start: 0,
                original_count: 0,
                modified_start: 1,
                modified_count: new_lines.len() as u32,
                lines: new_lines.iter().map(|l| DiffLine::Added(l.to_string())).collect(),
            }],
        },
        Some(old) => {
            let old_lines: Vec<&str> = old.lines().collect();
            let mut lines = Vec::with_capacity(old_lines.len() + new_lines.len());
            lines.extend(old_lines.iter().map(|l| DiffLine::Removed(l.to_string())));
            lines.extend(new_lines.iter().map(|l| DiffLine::Added(l.to_string())));
            DiffPatch {
                target_path: entry.path.clone(),
                operation: FileOperation::Modify,
                is_binary: false,
                hunks: vec![Hunk {
                    original_start: if old_lines.is_empty() { 0 } else { 1 },
                    original_count: old_lines.len() as u32,
                    modified_start: 1,
                    modified_count: new_lines.len() as u32,
                    lines,
                }],
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(path: &str, content: &str) -> ManifestEntry {
        ManifestEntry {
            path: path.to_string(),
            content: content.to_string(),
            operation: FileOperation::infer(content),
            language: None,
        }
    }

    #[test]
    fn missing_file_becomes_a_create_patch() {
        let dir = tempdir().unwrap();
        let patch = manifest_entry_to_diff_patch(&entry("main.py", "print(1)\n"), dir.path());
        assert_eq!(patch.operation, FileOperation::Create);
        assert_eq!(patch.hunks[0].lines.len(), 1);
    }

    #[test]
    fn existing_file_becomes_a_modify_patch_replacing_every_line() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("main.py"), "old\n").unwrap();
        let patch = manifest_entry_to_diff_patch(&entry("main.py", "new\n"), dir.path());
        assert_eq!(patch.operation, FileOperation::Modify);
        assert_eq!(patch.hunks[0].lines, vec![DiffLine::Removed("old".into()), DiffLine::Added("new".into())]);
    }

    #[test]
    fn applying_the_generated_patch_round_trips_to_the_new_content() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("main.py"), "old\n").unwrap();
        let patch = manifest_entry_to_diff_patch(&entry("main.py", "new\ncontent\n"), dir.path());
        let outcome = orc_patch::apply_one_file(dir.path(), &patch, false).unwrap();
        assert!(outcome.drift_warnings.is_empty());
        assert_eq!(std::fs::read_to_string(dir.path().join("main.py")).unwrap(), "new\ncontent\n");
    }
}
