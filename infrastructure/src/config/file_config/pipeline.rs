//! Aggregation and phase-loop settings from TOML
//! (`[aggregation]` and `[pipeline]` sections)

use super::ConfigValidationError;
use appforge_domain::{AggregationPolicy, AggregationStrategy, PhaseCheckpoints};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How each phase merges its responses
///
/// # Example
///
/// ```toml
/// [aggregation]
/// strategy = "consensus"
/// min_confidence = 0.6
/// max_duration_secs = 120
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAggregationConfig {
    pub strategy: String,
    pub min_confidence: f64,
    pub max_duration_secs: u64,
}

impl Default for FileAggregationConfig {
    fn default() -> Self {
        Self {
            strategy: AggregationStrategy::default().as_str().to_string(),
            min_confidence: 0.5,
            max_duration_secs: 300,
        }
    }
}

impl FileAggregationConfig {
    pub fn parse_strategy(&self) -> Result<AggregationStrategy, ConfigValidationError> {
        self.strategy
            .parse()
            .map_err(|_| ConfigValidationError::UnknownStrategy(self.strategy.clone()))
    }

    pub fn to_policy(&self) -> Result<AggregationPolicy, ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigValidationError::InvalidMinConfidence(
                self.min_confidence,
            ));
        }
        Ok(AggregationPolicy {
            min_confidence: self.min_confidence,
            max_duration: Duration::from_secs(self.max_duration_secs),
        })
    }
}

/// Phase loop settings
///
/// # Example
///
/// ```toml
/// [pipeline]
/// checkpoints = [5, 15, 35, 55, 65, 75, 85, 95, 100]
/// halt_on_low_confidence = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePipelineConfig {
    /// Progress reached on entering each of the nine phases
    pub checkpoints: Option<Vec<u8>>,
    pub halt_on_low_confidence: bool,
}

impl FilePipelineConfig {
    pub fn parse_checkpoints(&self) -> Result<PhaseCheckpoints, ConfigValidationError> {
        match &self.checkpoints {
            None => Ok(PhaseCheckpoints::default()),
            Some(values) => PhaseCheckpoints::try_from(values.clone())
                .map_err(|e| ConfigValidationError::InvalidCheckpoints(e.to_string())),
        }
    }
}
