//! Retry and circuit-breaker policy values
//!
//! Pure configuration and arithmetic; the async controller that applies
//! these policies lives in the application layer.

pub mod policy;

pub use policy::{CircuitBreakerPolicy, MAX_JITTER_RATIO, RetryPolicy};
