//! Retry/backoff and circuit-breaker policies

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound of the random jitter, as a fraction of the computed delay
pub const MAX_JITTER_RATIO: f64 = 0.1;

/// Bounded exponential-backoff retry policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Attempts allowed beyond the first one
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub exponential_base: f64,
    /// Add up to [`MAX_JITTER_RATIO`] of random delay on top of each backoff
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            exponential_base: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Policy that makes exactly one attempt
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_exponential_base(mut self, base: f64) -> Self {
        self.exponential_base = base;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Total attempts including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Backoff before retry number `attempt` (0-based), without jitter.
    ///
    /// `min(base_delay * exponential_base^attempt, max_delay)`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = self.exponential_base.max(1.0).powi(attempt.min(i32::MAX as u32) as i32);
        let secs = self.base_delay.as_secs_f64() * factor;
        let max = self.max_delay.as_secs_f64();
        if !secs.is_finite() || secs >= max {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs)
    }

    /// Backoff plus jitter; `jitter_sample` is a uniform sample in `[0, 1)`.
    pub fn delay_with_jitter(&self, attempt: u32, jitter_sample: f64) -> Duration {
        let delay = self.backoff(attempt);
        if !self.jitter {
            return delay;
        }
        let extra = delay.as_secs_f64() * MAX_JITTER_RATIO * jitter_sample.clamp(0.0, 1.0);
        delay + Duration::from_secs_f64(extra)
    }
}

/// Per-operation circuit breaker thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerPolicy {
    /// Failure count at which the breaker opens
    pub threshold: u32,
    /// Cooldown measured from the last recorded failure
    pub timeout: Duration,
}

impl Default for CircuitBreakerPolicy {
    fn default() -> Self {
        Self {
            threshold: 5,
            timeout: Duration::from_secs(60),
        }
    }
}

impl CircuitBreakerPolicy {
    pub fn new(threshold: u32, timeout: Duration) -> Self {
        Self { threshold, timeout }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_backoff_sequence() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
    }

    #[test]
    fn test_backoff_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(6), Duration::from_secs(60));
        assert_eq!(policy.backoff(1000), Duration::from_secs(60));
    }

    #[test]
    fn test_jitter_bounded_to_ten_percent() {
        let policy = RetryPolicy::default();
        let low = policy.delay_with_jitter(2, 0.0);
        let high = policy.delay_with_jitter(2, 0.999);
        assert_eq!(low, Duration::from_secs(4));
        assert!(high < Duration::from_secs_f64(4.4));
        assert!(high > Duration::from_secs(4));
    }

    #[test]
    fn test_jitter_disabled() {
        let policy = RetryPolicy::default().without_jitter();
        assert_eq!(policy.delay_with_jitter(1, 0.9), Duration::from_secs(2));
    }

    #[test]
    fn test_max_attempts() {
        assert_eq!(RetryPolicy::default().max_attempts(), 4);
        assert_eq!(RetryPolicy::no_retry().max_attempts(), 1);
    }
}
