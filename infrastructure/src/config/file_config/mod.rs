//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly, validated as a whole, and then converted
//! into the domain registry and the application [`EngineConfig`].

mod dispatch;
mod logging;
mod models;
mod pipeline;

pub use dispatch::{FileCircuitBreakerConfig, FileDispatchConfig, FileRetryConfig};
pub use logging::FileLoggingConfig;
pub use models::FileModelEntry;
pub use pipeline::{FileAggregationConfig, FilePipelineConfig};

use appforge_application::{DispatchPolicy, EngineConfig, PipelineParams};
use appforge_domain::{Model, ModelRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("dispatch.top_k cannot be 0")]
    InvalidTopK,

    #[error("model name cannot be empty")]
    EmptyModelName,

    #[error("unknown model '{0}'. Valid: claude, gpt4, codex, gemini, local")]
    UnknownModel(String),

    #[error("model '{0}' is listed more than once")]
    DuplicateModel(String),

    #[error("model '{0}' has a negative token rate")]
    NegativeRate(String),

    #[error(
        "unknown aggregation strategy '{0}'. Valid: hierarchical, majority_vote, weighted_average, consensus"
    )]
    UnknownStrategy(String),

    #[error("aggregation.min_confidence must be within 0.0..=1.0, got {0}")]
    InvalidMinConfidence(f64),

    #[error("pipeline.checkpoints: {0}")]
    InvalidCheckpoints(String),

    #[error("retry.exponential_base must be at least 1.0, got {0}")]
    InvalidExponentialBase(f64),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Registered models; empty means the built-in catalogue
    pub models: Vec<FileModelEntry>,
    pub dispatch: FileDispatchConfig,
    pub retry: FileRetryConfig,
    pub circuit_breaker: FileCircuitBreakerConfig,
    pub aggregation: FileAggregationConfig,
    pub pipeline: FilePipelineConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the configuration, reporting the first problem found
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.dispatch.top_k == 0 {
            return Err(ConfigValidationError::InvalidTopK);
        }

        let mut seen: HashSet<Model> = HashSet::new();
        for entry in &self.models {
            let model = entry.parse_model()?;
            if !seen.insert(model) {
                return Err(ConfigValidationError::DuplicateModel(entry.id.clone()));
            }
        }

        if self.retry.exponential_base < 1.0 {
            return Err(ConfigValidationError::InvalidExponentialBase(
                self.retry.exponential_base,
            ));
        }

        self.aggregation.parse_strategy()?;
        self.aggregation.to_policy()?;
        self.pipeline.parse_checkpoints()?;

        Ok(())
    }

    /// Build the model registry (built-in catalogue when no models are listed)
    pub fn to_registry(&self) -> Result<ModelRegistry, ConfigValidationError> {
        if self.models.is_empty() {
            return Ok(ModelRegistry::with_defaults());
        }

        let mut registry = ModelRegistry::new();
        for entry in &self.models {
            registry
                .register(entry.to_descriptor()?)
                .map_err(|_| ConfigValidationError::DuplicateModel(entry.id.clone()))?;
        }
        Ok(registry)
    }

    /// Build the application configuration slices
    pub fn to_engine_config(&self) -> Result<EngineConfig, ConfigValidationError> {
        self.validate()?;

        let dispatch = DispatchPolicy {
            top_k: self.dispatch.top_k,
            temperature: self.dispatch.temperature,
            max_tokens: self.dispatch.max_tokens,
            retry: self.retry.to_policy(),
        };

        let pipeline = PipelineParams::default()
            .with_checkpoints(self.pipeline.parse_checkpoints()?)
            .with_strategy(self.aggregation.parse_strategy()?)
            .with_aggregation(self.aggregation.to_policy()?)
            .with_halt_on_low_confidence(self.pipeline.halt_on_low_confidence);

        Ok(EngineConfig::new(
            dispatch,
            self.circuit_breaker.to_policy(),
            pipeline,
        ))
    }
}
