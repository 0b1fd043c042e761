//! Application layer for appforge
//!
//! This crate contains use cases, application services, port definitions,
//! and application configuration. It depends only on the domain layer.
//!
//! ```text
//! RunGenerationUseCase → ModelDispatcher → RetryController → ProviderGateway
//!         ↓                    ↑
//!  ResponseAggregator    FeedbackScorer
//! ```

pub mod config;
pub mod ports;
pub mod services;
pub mod use_cases;

// Re-export commonly used types
pub use config::{EngineConfig, PipelineParams};
pub use ports::{
    persistence::{NoPersistence, PersistenceError, PersistenceSink},
    progress::{NoProgress, ProgressNotifier},
    provider_gateway::{GatewayError, ProviderGateway, ProviderReply, ProviderRequest},
    usage::{NoUsageSink, UsageEvent, UsageSink},
};
pub use services::{
    DispatchError, DispatchOutcome, DispatchPolicy, DispatchTask, FeedbackScorer, ModelDispatcher,
    OperationStats, RetryController, RetryError, RetryStats,
};
pub use use_cases::run_generation::{
    OrchestratorError, PhaseFailure, RunGenerationUseCase, StartGenerationInput,
};
