use serde::{Deserialize, Serialize};

/// The closed-set of recognized runtime options from the external-interface
/// contract. Deserializable from TOML with every field defaulted, so a
/// partial config file only overrides what it mentions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub max_rounds: u32,
    pub max_revision_rounds: u32,
    pub memory_size: usize,
    #[serde(with = "humantime_serde")]
    pub approval_timeout: std::time::Duration,
    #[serde(with = "humantime_serde")]
    pub run_timeout: std::time::Duration,
    pub concurrency_cap: usize,

    pub enable_caching: bool,
    pub cache_backend: CacheBackendKind,
    pub cache_max_entries: usize,
    #[serde(with = "humantime_serde")]
    pub cache_ttl: std::time::Duration,
    pub remote_url: Option<String>,

    pub subscriber_queue_capacity: usize,

    pub run_branch_prefix: String,
    pub commit_template: String,
    pub push_max_attempts: u32,
    pub push_backoff_base_ms: u64,
}

/// The closed set of pluggable cache backends (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackendKind {
    Null,
    InMemoryLruTtl,
    RemoteKeyvalue,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        OrchestratorConfig {
            max_rounds: 5,
            max_revision_rounds: 2,
            memory_size: 50,
            approval_timeout: std::time::Duration::from_secs(300),
            run_timeout: std::time::Duration::from_secs(1800),
            concurrency_cap: 100,

            enable_caching: true,
            cache_backend: CacheBackendKind::InMemoryLruTtl,
            cache_max_entries: 1024,
            cache_ttl: std::time::Duration::from_secs(3600),
            remote_url: None,

            subscriber_queue_capacity: 100,

            run_branch_prefix: "mgx".to_string(),
            commit_template: "MGX Task: {task_name} - Run #{run_number}".to_string(),
            push_max_attempts: 3,
            push_backoff_base_ms: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let c = OrchestratorConfig::default();
        assert_eq!(c.max_rounds, 5);
        assert_eq!(c.max_revision_rounds, 2);
        assert_eq!(c.approval_timeout, std::time::Duration::from_secs(300));
        assert_eq!(c.push_max_attempts, 3);
    }

    #[test]
    fn partial_toml_keeps_the_rest_defaulted() {
        let parsed: OrchestratorConfig = toml::from_str("max_rounds = 9\n").unwrap();
        assert_eq!(parsed.max_rounds, 9);
        assert_eq!(parsed.max_revision_rounds, 2);
    }
}
