use orc_types::OrcError;

#[derive(Debug, Clone)]
pub enum PrOutcome {
    Opened(String),
    /// Duplicate-PR errors are treated as success per §4.5 step 4, recording
    /// the existing PR's URL when discoverable.
    AlreadyExists(String),
    /// No provider configured; the git phase still records `git_status` up
    /// through `pushed` without a PR.
    Skipped,
}

/// A pull/merge request host, kept out of the core per the "thin adapters"
/// scoping: no concrete GitHub/GitLab client ships here. An embedding
/// application injects its own implementation.
pub trait PullRequestProvider {
    fn open_pr(&self, branch: &str, title: &str, body: &str) -> Result<PrOutcome, OrcError>;
}

/// Default provider: always reports `Skipped`, recording `pr_failed`-style
/// absence rather than attempting any network call.
pub struct NullPrProvider;

impl PullRequestProvider for NullPrProvider {
    fn open_pr(&self, _branch: &str, _title: &str, _body: &str) -> Result<PrOutcome, OrcError> {
        Ok(PrOutcome::Skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_provider_always_skips() {
        let provider = NullPrProvider;
        let outcome = provider.open_pr("mgx/hello/run-1", "title", "body").unwrap();
        assert!(matches!(outcome, PrOutcome::Skipped));
    }
}
