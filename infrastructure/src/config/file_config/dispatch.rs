//! Dispatch and resilience settings from TOML
//! (`[dispatch]`, `[retry]` and `[circuit_breaker]` sections)

use appforge_domain::{CircuitBreakerPolicy, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Model selection and provider call settings
///
/// # Example
///
/// ```toml
/// [dispatch]
/// top_k = 3
/// temperature = 0.2
/// max_tokens = 8192
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDispatchConfig {
    /// Models invoked per task
    pub top_k: usize,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for FileDispatchConfig {
    fn default() -> Self {
        Self {
            top_k: 2,
            temperature: 0.7,
            max_tokens: 4096,
        }
    }
}

/// Retry/backoff settings applied to every provider call
///
/// # Example
///
/// ```toml
/// [retry]
/// max_retries = 5
/// base_delay_ms = 500
/// max_delay_ms = 30000
/// exponential_base = 2.0
/// jitter = false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub exponential_base: f64,
    pub jitter: bool,
}

impl Default for FileRetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 60_000,
            exponential_base: 2.0,
            jitter: true,
        }
    }
}

impl FileRetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            exponential_base: self.exponential_base,
            jitter: self.jitter,
        }
    }
}

/// Circuit breaker settings (per operation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCircuitBreakerConfig {
    /// Failures at which the breaker opens
    pub threshold: u32,
    /// Cooldown after the last failure
    pub timeout_secs: u64,
}

impl Default for FileCircuitBreakerConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            timeout_secs: 60,
        }
    }
}

impl FileCircuitBreakerConfig {
    pub fn to_policy(&self) -> CircuitBreakerPolicy {
        CircuitBreakerPolicy::new(self.threshold, Duration::from_secs(self.timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_domain_policies() {
        assert_eq!(FileRetryConfig::default().to_policy(), RetryPolicy::default());
        assert_eq!(
            FileCircuitBreakerConfig::default().to_policy(),
            CircuitBreakerPolicy::default()
        );
    }

    #[test]
    fn test_retry_policy_conversion() {
        let config = FileRetryConfig {
            max_retries: 5,
            base_delay_ms: 250,
            max_delay_ms: 4_000,
            exponential_base: 3.0,
            jitter: false,
        };
        let policy = config.to_policy();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(250));
        assert_eq!(policy.max_delay, Duration::from_secs(4));
        assert!(!policy.jitter);
    }
}
