//! Application services shared by the use cases
//!
//! - [`RetryController`]: retry with backoff plus per-operation circuit breaker
//! - [`FeedbackScorer`]: atomically swapped model weight snapshots
//! - [`ModelDispatcher`]: model selection and concurrent provider calls

pub mod dispatcher;
pub mod feedback_scorer;
pub mod retry_controller;

pub use dispatcher::{DispatchError, DispatchOutcome, DispatchPolicy, DispatchTask, ModelDispatcher};
pub use feedback_scorer::FeedbackScorer;
pub use retry_controller::{OperationStats, RetryController, RetryError, RetryStats};
