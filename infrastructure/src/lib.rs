//! Infrastructure layer for appforge
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, plus configuration file loading.

pub mod config;
pub mod gateway;
pub mod logging;
pub mod persistence;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileAggregationConfig, FileCircuitBreakerConfig,
    FileConfig, FileDispatchConfig, FileLoggingConfig, FileModelEntry, FilePipelineConfig,
    FileRetryConfig,
};
pub use gateway::SimulatedGateway;
pub use logging::{FanOutUsageSink, JsonlUsageLog, ModelUsage, UsageLedger};
pub use persistence::InMemoryStore;
