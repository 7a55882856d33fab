//! Retry strategies for the one place in the core the design notes allow a
//! transparent retry: the Git push step (§4.5), and as a building block for
//! a `remote_keyvalue` cache backend's own transient-failure handling.
//!
//! LLM transient errors are explicitly *not* retried here; they surface as
//! revision failures per §4.9's retry policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the delay between attempts grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    Immediate,
    #[default]
    Exponential,
    Linear,
    Constant,
}

/// The classification of a failure, used to pick a per-class backoff
/// configuration. Distinct from [`orc_types::ErrorKind`]: this is about
/// *retry eligibility*, not the user-visible error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Worth retrying: network blip, rate limit, transient git failure.
    Transient,
    /// Not worth retrying: auth failure, branch-exists, malformed input.
    Permanent,
}

/// Configuration for one backoff strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default)]
    pub strategy: BackoffStrategy,
    #[serde(default)]
    pub max_attempts: u32,
    #[serde(with = "humantime_serde", default = "default_base_delay")]
    pub base_delay: Duration,
    #[serde(with = "humantime_serde", default = "default_max_delay")]
    pub max_delay: Duration,
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

fn default_base_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_jitter() -> f64 {
    0.5
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            strategy: BackoffStrategy::Exponential,
            max_attempts: 3,
            base_delay: default_base_delay(),
            max_delay: default_max_delay(),
            jitter: default_jitter(),
        }
    }
}

impl RetryConfig {
    /// The git push step's defaults: `push_max_attempts` capped at 3,
    /// `push_backoff_base_ms` of 500, matching §6's configuration options.
    pub fn for_push(max_attempts: u32, base_delay_ms: u64) -> Self {
        RetryConfig {
            strategy: BackoffStrategy::Exponential,
            max_attempts,
            base_delay: Duration::from_millis(base_delay_ms),
            max_delay: Duration::from_secs(30),
            jitter: 0.3,
        }
    }
}

/// Calculates the delay before the given attempt number (1-indexed).
pub fn calculate_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let delay = match config.strategy {
        BackoffStrategy::Immediate => Duration::ZERO,
        BackoffStrategy::Exponential => {
            let pow = attempt.saturating_sub(1).min(16);
            config.base_delay.saturating_mul(2_u32.saturating_pow(pow))
        }
        BackoffStrategy::Linear => config.base_delay.saturating_mul(attempt),
        BackoffStrategy::Constant => config.base_delay,
    };

    let capped = delay.min(config.max_delay);

    if config.jitter > 0.0 {
        apply_jitter(capped, config.jitter)
    } else {
        capped
    }
}

/// Jitter factor of 0.5 means delay * (0.5 to 1.5).
fn apply_jitter(delay: Duration, jitter: f64) -> Duration {
    let jitter_range = 2.0 * jitter;
    let random_factor = 1.0 - jitter + (rand::random::<f64>() * jitter_range);
    let millis = (delay.as_millis() as f64 * random_factor).round() as u64;
    Duration::from_millis(millis)
}

/// Whether a further attempt is permitted under this config, given how many
/// attempts have already been made.
pub fn should_retry(config: &RetryConfig, class: FailureClass, attempts_made: u32) -> bool {
    class == FailureClass::Transient && attempts_made < config.max_attempts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_doubles_and_caps() {
        let config = RetryConfig {
            strategy: BackoffStrategy::Exponential,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            jitter: 0.0,
            max_attempts: 10,
        };
        assert_eq!(calculate_delay(&config, 1), Duration::from_secs(1));
        assert_eq!(calculate_delay(&config, 2), Duration::from_secs(2));
        assert_eq!(calculate_delay(&config, 3), Duration::from_secs(4));
        assert_eq!(calculate_delay(&config, 10), Duration::from_secs(60));
    }

    #[test]
    fn immediate_is_always_zero() {
        let config = RetryConfig {
            strategy: BackoffStrategy::Immediate,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            jitter: 0.0,
            max_attempts: 3,
        };
        assert_eq!(calculate_delay(&config, 1), Duration::ZERO);
        assert_eq!(calculate_delay(&config, 5), Duration::ZERO);
    }

    #[test]
    fn push_defaults_match_the_configuration_contract() {
        let config = RetryConfig::for_push(3, 500);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.base_delay, Duration::from_millis(500));
    }

    #[test]
    fn permanent_failures_never_retry() {
        let config = RetryConfig::for_push(3, 500);
        assert!(!should_retry(&config, FailureClass::Permanent, 0));
        assert!(should_retry(&config, FailureClass::Transient, 0));
        assert!(!should_retry(&config, FailureClass::Transient, 3));
    }

    #[test]
    fn deserializes_human_readable_durations() {
        let json = r#"{"strategy":"linear","max_attempts":3,"base_delay":"5s","max_delay":"30s","jitter":0.2}"#;
        let config: RetryConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.strategy, BackoffStrategy::Linear);
        assert_eq!(config.base_delay, Duration::from_secs(5));
    }
}
