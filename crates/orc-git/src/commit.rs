use std::path::Path;
use std::process::Command;

use orc_types::{ErrorKind, OrcError};

use crate::branch::git_program;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed(String),
    /// An empty working tree after execution; §4.5 step 2 treats this as a
    /// vacuous success rather than an error.
    NothingToCommit,
}

/// Renders the commit template with `{task_name}` and `{run_number}`, the
/// same placeholder set the task carries in `commit_template`.
pub fn render_commit_message(template: &str, task_name: &str, run_number: u64) -> String {
    template
        .replace("{task_name}", task_name)
        .replace("{run_number}", &run_number.to_string())
}

/// Stages all changes and commits them. Returns `NothingToCommit` if there
/// was nothing staged, without treating that as an error.
pub fn commit_all(repo_root: &Path, message: &str) -> Result<CommitOutcome, OrcError> {
    let add = Command::new(git_program())
        .args(["add", "-A"])
        .current_dir(repo_root)
        .output()
        .map_err(|e| OrcError::new(ErrorKind::GitError, format!("git add -A failed to run: {e}")))?;
    if !add.status.success() {
        return Err(OrcError::new(
            ErrorKind::GitError,
            format!("git add -A failed: {}", String::from_utf8_lossy(&add.stderr).trim()),
        ));
    }

    let status = Command::new(git_program())
        .args(["diff", "--cached", "--quiet"])
        .current_dir(repo_root)
        .status()
        .map_err(|e| OrcError::new(ErrorKind::GitError, format!("git diff --cached failed to run: {e}")))?;
    if status.success() {
        return Ok(CommitOutcome::NothingToCommit);
    }

    let commit = Command::new(git_program())
        .args(["commit", "-m", message])
        .current_dir(repo_root)
        .output()
        .map_err(|e| OrcError::new(ErrorKind::GitError, format!("git commit failed to run: {e}")))?;
    if !commit.status.success() {
        return Err(OrcError::new(
            ErrorKind::GitError,
            format!("git commit failed: {}", String::from_utf8_lossy(&commit.stderr).trim()),
        ));
    }

    let rev_parse = Command::new(git_program())
        .args(["rev-parse", "HEAD"])
        .current_dir(repo_root)
        .output()
        .map_err(|e| OrcError::new(ErrorKind::GitError, format!("git rev-parse HEAD failed to run: {e}")))?;
    if !rev_parse.status.success() {
        return Err(OrcError::new(ErrorKind::GitError, "git rev-parse HEAD failed after commit"));
    }

    let sha = String::from_utf8_lossy(&rev_parse.stdout).trim().to_string();
    Ok(CommitOutcome::Committed(sha))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_both_placeholders() {
        let rendered = render_commit_message("MGX Task: {task_name} - Run #{run_number}", "Hello API", 7);
        assert_eq!(rendered, "MGX Task: Hello API - Run #7");
    }

    #[test]
    fn template_without_placeholders_passes_through() {
        let rendered = render_commit_message("static message", "Hello API", 7);
        assert_eq!(rendered, "static message");
    }
}
