//! Error/Retry controller
//!
//! Wraps a single fallible remote call with bounded exponential-backoff
//! retry and a per-operation circuit breaker.
//!
//! The breaker is checked once when a call enters the controller. While it
//! is open every call for that operation fails fast with
//! [`RetryError::CircuitOpen`] and the wrapped function is not invoked. The
//! breaker closes again once `timeout` has elapsed since the last recorded
//! failure (half-open by timeout, not by trial).

use appforge_domain::{CircuitBreakerPolicy, RetryPolicy};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Failure modes of [`RetryController::call_with_retry`]
#[derive(Error, Debug)]
pub enum RetryError<E> {
    #[error("Circuit breaker is open for {operation}")]
    CircuitOpen { operation: String },

    #[error("{operation} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last_error: E,
    },

    #[error("{operation} failed: {error}")]
    NotRetryable { operation: String, error: E },
}

impl<E> RetryError<E> {
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, RetryError::CircuitOpen { .. })
    }

    /// The last error returned by the wrapped call, if it was invoked
    pub fn last_error(&self) -> Option<&E> {
        match self {
            RetryError::CircuitOpen { .. } => None,
            RetryError::RetriesExhausted { last_error, .. } => Some(last_error),
            RetryError::NotRetryable { error, .. } => Some(error),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct RetryState {
    failures: u32,
    last_failure: Option<Instant>,
}

/// Breaker state of one operation, as reported by [`RetryController::stats`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationStats {
    pub operation: String,
    pub failures: u32,
    /// Time since the last recorded failure
    pub last_failure_age: Option<Duration>,
    pub open: bool,
}

/// Snapshot of all breaker state plus the thresholds in force
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetryStats {
    pub operations: Vec<OperationStats>,
    pub threshold: u32,
    pub timeout: Duration,
}

/// Process-scoped retry controller.
///
/// Shared by every dispatcher call; failure counters are keyed by operation
/// name. The lock is held only for counter reads and updates, never across
/// an await point.
pub struct RetryController {
    breaker: CircuitBreakerPolicy,
    states: Mutex<HashMap<String, RetryState>>,
}

impl Default for RetryController {
    fn default() -> Self {
        Self::new(CircuitBreakerPolicy::default())
    }
}

impl RetryController {
    pub fn new(breaker: CircuitBreakerPolicy) -> Self {
        Self {
            breaker,
            states: Mutex::new(HashMap::new()),
        }
    }

    pub fn breaker(&self) -> &CircuitBreakerPolicy {
        &self.breaker
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, RetryState>> {
        // Counters stay meaningful even if a holder panicked
        self.states.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether the breaker for `operation` currently rejects calls.
    ///
    /// An expired breaker is reset as a side effect.
    pub fn is_open(&self, operation: &str) -> bool {
        let mut states = self.lock();
        let Some(state) = states.get_mut(operation) else {
            return false;
        };
        if state.failures < self.breaker.threshold {
            return false;
        }
        match state.last_failure {
            Some(at) if at.elapsed() < self.breaker.timeout => true,
            _ => {
                info!(operation, "Circuit breaker cooldown elapsed; closing");
                *state = RetryState::default();
                false
            }
        }
    }

    /// Current failure count of `operation`
    pub fn failure_count(&self, operation: &str) -> u32 {
        self.lock().get(operation).map_or(0, |s| s.failures)
    }

    pub(crate) fn record_failure(&self, operation: &str) {
        let mut states = self.lock();
        let state = states.entry(operation.to_string()).or_default();
        state.failures = state.failures.saturating_add(1);
        state.last_failure = Some(Instant::now());
        if state.failures == self.breaker.threshold {
            warn!(
                operation,
                failures = state.failures,
                timeout_secs = self.breaker.timeout.as_secs(),
                "Circuit breaker opened"
            );
        }
    }

    fn record_success(&self, operation: &str) {
        if let Some(state) = self.lock().get_mut(operation) {
            *state = RetryState::default();
        }
    }

    /// Run `op` under the retry policy and the breaker for `operation`.
    ///
    /// Errors for which `is_retryable` returns false end the call at once
    /// with [`RetryError::NotRetryable`]. Every failed attempt counts towards
    /// the breaker; a success resets the counter to zero.
    pub async fn call_with_retry<T, E, Op, Fut, Classify>(
        &self,
        operation: &str,
        policy: &RetryPolicy,
        is_retryable: Classify,
        mut op: Op,
    ) -> Result<T, RetryError<E>>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        Classify: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        if self.is_open(operation) {
            debug!(operation, "Rejecting call: circuit breaker open");
            return Err(RetryError::CircuitOpen {
                operation: operation.to_string(),
            });
        }

        let max_attempts = policy.max_attempts();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match op().await {
                Ok(value) => {
                    self.record_success(operation);
                    if attempt > 1 {
                        info!(operation, attempt, "Call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => {
                    self.record_failure(operation);

                    if !is_retryable(&error) {
                        warn!(operation, error = %error, "Call failed with non-retryable error");
                        return Err(RetryError::NotRetryable {
                            operation: operation.to_string(),
                            error,
                        });
                    }

                    if attempt >= max_attempts {
                        warn!(
                            operation,
                            attempts = attempt,
                            error = %error,
                            "Call failed; retries exhausted"
                        );
                        return Err(RetryError::RetriesExhausted {
                            operation: operation.to_string(),
                            attempts: attempt,
                            last_error: error,
                        });
                    }

                    let delay = policy.delay_with_jitter(attempt - 1, rand::random::<f64>());
                    warn!(
                        operation,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Call failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Snapshot of every tracked operation, sorted by name
    pub fn stats(&self) -> RetryStats {
        let states = self.lock();
        let mut operations: Vec<OperationStats> = states
            .iter()
            .map(|(name, state)| {
                let age = state.last_failure.map(|at| at.elapsed());
                OperationStats {
                    operation: name.clone(),
                    failures: state.failures,
                    last_failure_age: age,
                    open: state.failures >= self.breaker.threshold
                        && age.is_some_and(|a| a < self.breaker.timeout),
                }
            })
            .collect();
        operations.sort_by(|a, b| a.operation.cmp(&b.operation));

        RetryStats {
            operations,
            threshold: self.breaker.threshold,
            timeout: self.breaker.timeout,
        }
    }

    /// Forget all failure counters and close every breaker
    pub fn reset(&self) {
        self.lock().clear();
    }
}
