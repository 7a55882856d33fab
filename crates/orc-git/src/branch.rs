use std::env;
use std::path::Path;
use std::process::Command;

use orc_types::{ErrorKind, OrcError};

/// The branch-create error set. Kept distinct from [`OrcError`] so the
/// caller can pattern-match `is_branch_exists` without string-matching a
/// message, while the conversion to `OrcError` still carries `GitError`.
#[derive(Debug, Clone)]
pub struct BranchError {
    kind: BranchErrorKind,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchErrorKind {
    AlreadyExists,
    CommandFailed,
}

impl BranchError {
    pub fn is_branch_exists(&self) -> bool {
        self.kind == BranchErrorKind::AlreadyExists
    }
}

impl std::fmt::Display for BranchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<BranchError> for OrcError {
    fn from(e: BranchError) -> Self {
        OrcError::new(ErrorKind::GitError, e.message)
    }
}

/// The git binary to invoke, overridable for tests the same way the
/// metrics shipper overrides `SHIPPER_GIT_BIN`.
pub fn git_program() -> String {
    env::var("ORC_GIT_BIN").unwrap_or_else(|_| "git".to_string())
}

/// Derives `{prefix}/{task-slug}/run-{n}`, per §4.5 step 1: the slug is the
/// task title lowercased, non-alphanumerics replaced by `-`, truncated to 50
/// characters. `suffix`, when given, is appended to the slug for the
/// one-retry-with-suffix path the executor drives on `branch_exists`.
pub fn derive_branch_name(prefix: &str, task_name: &str, run_number: u64, suffix: Option<&str>) -> String {
    let mut slug: String = task_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    slug.truncate(50);
    let slug = slug.trim_matches('-');
    match suffix {
        Some(s) => format!("{prefix}/{slug}-{s}/run-{run_number}"),
        None => format!("{prefix}/{slug}/run-{run_number}"),
    }
}

/// Whether `name` already exists as a local branch.
pub fn branch_exists(repo_root: &Path, name: &str) -> bool {
    Command::new(git_program())
        .args(["rev-parse", "--verify", "--quiet"])
        .arg(format!("refs/heads/{name}"))
        .current_dir(repo_root)
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Creates and checks out a new branch at the current HEAD. Fails with
/// `branch_exists` if the branch is already present locally.
pub fn create_branch(repo_root: &Path, name: &str) -> Result<String, BranchError> {
    if branch_exists(repo_root, name) {
        return Err(BranchError {
            kind: BranchErrorKind::AlreadyExists,
            message: format!("branch already exists: {name}"),
        });
    }

    let output = Command::new(git_program())
        .args(["checkout", "-b", name])
        .current_dir(repo_root)
        .output()
        .map_err(|e| BranchError {
            kind: BranchErrorKind::CommandFailed,
            message: format!("failed to run git checkout -b: {e}"),
        })?;

    if !output.status.success() {
        return Err(BranchError {
            kind: BranchErrorKind::CommandFailed,
            message: format!(
                "git checkout -b {name} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    Ok(name.to_string())
}

/// Removes a local branch, per §4.5's cleanup guarantee. Checks out `onto`
/// first since git refuses to delete the currently-checked-out branch.
pub fn delete_branch(repo_root: &Path, name: &str, onto: &str) -> Result<(), BranchError> {
    let _ = Command::new(git_program())
        .args(["checkout", onto])
        .current_dir(repo_root)
        .output();

    let output = Command::new(git_program())
        .args(["branch", "-D", name])
        .current_dir(repo_root)
        .output()
        .map_err(|e| BranchError {
            kind: BranchErrorKind::CommandFailed,
            message: format!("failed to run git branch -D: {e}"),
        })?;

    if !output.status.success() {
        return Err(BranchError {
            kind: BranchErrorKind::CommandFailed,
            message: format!(
                "git branch -D {name} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_lowercases_and_replaces_non_alphanumerics() {
        let name = derive_branch_name("mgx", "Hello, World! API", 3, None);
        assert_eq!(name, "mgx/hello--world--api/run-3");
    }

    #[test]
    fn slug_truncates_to_fifty_characters() {
        let long_title = "x".repeat(200);
        let name = derive_branch_name("mgx", &long_title, 1, None);
        let slug_part = name.strip_prefix("mgx/").unwrap().strip_suffix("/run-1").unwrap();
        assert_eq!(slug_part.len(), 50);
    }

    #[test]
    fn suffix_is_appended_for_retry() {
        let name = derive_branch_name("mgx", "Hello", 1, Some("retry"));
        assert_eq!(name, "mgx/hello-retry/run-1");
    }

    #[test]
    #[allow(unsafe_code)]
    fn git_program_honors_env_override() {
        unsafe { std::env::set_var("ORC_GIT_BIN", "my-fake-git") };
        assert_eq!(git_program(), "my-fake-git");
        unsafe { std::env::remove_var("ORC_GIT_BIN") };
    }
}
