//! Domain layer for appforge
//!
//! This crate contains the core business logic, entities, and value objects
//! of the generation pipeline. It has no dependencies on infrastructure,
//! async runtimes, or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Models and selection
//!
//! - **Model**: closed set of supported providers, each with a static
//!   [`ModelDescriptor`] (capability tags, token pricing)
//! - **Selection**: task descriptions are tokenized and matched against
//!   capability tags, scaled by feedback-derived [`ModelWeights`]
//!
//! ## Pipeline
//!
//! - **GenerationRequest**: walks the [`PhaseStep`] sequence from analysis to
//!   completion, recording [`AgentTask`]s and [`GeneratedComponent`]s
//! - **Aggregation**: each phase merges its [`AgentResponse`]s into one
//!   [`AggregatedResponse`] using an [`AggregationStrategy`]

pub mod agent;
pub mod aggregation;
pub mod core;
pub mod feedback;
pub mod generation;
pub mod prompt;
pub mod registry;
pub mod resilience;

// Re-export commonly used types
pub use agent::AgentRole;
pub use aggregation::{
    AgentResponse, AggregatedResponse, AggregationPolicy, AggregationStatus, AggregationStrategy,
    ResponseAggregator, ResponseType,
};
pub use core::{error::DomainError, model::Model};
pub use feedback::{DEFAULT_WEIGHT, ModelWeights};
pub use generation::{
    AgentTask, ComponentKind, GeneratedComponent, GenerationRequest, GenerationStatus,
    GenerationStatusReport, PhaseCheckpoints, PhaseStep, RequestId, TaskId, TaskStatus,
};
pub use prompt::PhasePromptTemplate;
pub use registry::{ModelDescriptor, ModelRegistry, ScoredModel, TokenPricing};
pub use resilience::{CircuitBreakerPolicy, RetryPolicy};
