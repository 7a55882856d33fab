use std::path::Path;
use std::process::Command;
use std::thread;

use orc_retry::{calculate_delay, should_retry, FailureClass, RetryConfig};
use orc_types::{ErrorKind, OrcError};

use crate::branch::git_program;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Pushed,
}

/// Pushes `branch` to the `origin` remote, retrying transient failures with
/// the exponential backoff in `retry` (§4.5 step 3: capped at 3 attempts by
/// default, via [`orc_retry::RetryConfig::for_push`]).
pub fn push_branch(repo_root: &std::path::Path, branch: &str, retry: &RetryConfig) -> Result<PushOutcome, OrcError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match try_push(repo_root, branch) {
            Ok(()) => return Ok(PushOutcome::Pushed),
            Err((class, message)) => {
                if should_retry(retry, class, attempt) {
                    let delay = calculate_delay(retry, attempt);
                    tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, "push failed, retrying");
                    thread::sleep(delay);
                    continue;
                }
                return Err(OrcError::new(ErrorKind::GitError, message));
            }
        }
    }
}

fn try_push(repo_root: &Path, branch: &str) -> Result<(), (FailureClass, String)> {
    let output = Command::new(git_program())
        .args(["push", "--set-upstream", "origin", branch])
        .current_dir(repo_root)
        .output()
        .map_err(|e| (FailureClass::Transient, format!("git push failed to run: {e}")))?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).to_lowercase();
    let class = if stderr.contains("could not resolve host")
        || stderr.contains("connection")
        || stderr.contains("timed out")
        || stderr.contains("rate limit")
    {
        FailureClass::Transient
    } else {
        FailureClass::Permanent
    };

    Err((class, format!("git push failed: {}", String::from_utf8_lossy(&output.stderr).trim())))
}
