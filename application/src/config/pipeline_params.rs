//! Pipeline parameters: phase-loop control.
//!
//! [`PipelineParams`] groups the static parameters that control how
//! [`RunGenerationUseCase`](crate::use_cases::run_generation::RunGenerationUseCase)
//! walks the phases and judges their aggregated results.

use appforge_domain::{AggregationPolicy, AggregationStrategy, PhaseCheckpoints};

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineParams {
    /// Progress value reached on entering each phase
    pub checkpoints: PhaseCheckpoints,
    /// Strategy used to merge each phase's responses
    pub strategy: AggregationStrategy,
    /// Thresholds marking an aggregation as failed
    pub aggregation: AggregationPolicy,
    /// Treat a low-confidence aggregation as a phase failure
    pub halt_on_low_confidence: bool,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            checkpoints: PhaseCheckpoints::default(),
            strategy: AggregationStrategy::default(),
            aggregation: AggregationPolicy::default(),
            halt_on_low_confidence: false,
        }
    }
}

impl PipelineParams {
    // ==================== Builder Methods ====================

    pub fn with_checkpoints(mut self, checkpoints: PhaseCheckpoints) -> Self {
        self.checkpoints = checkpoints;
        self
    }

    pub fn with_strategy(mut self, strategy: AggregationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_aggregation(mut self, aggregation: AggregationPolicy) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_halt_on_low_confidence(mut self, halt: bool) -> Self {
        self.halt_on_low_confidence = halt;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = PipelineParams::default();
        assert_eq!(params.strategy, AggregationStrategy::Hierarchical);
        assert_eq!(params.aggregation.min_confidence, 0.5);
        assert!(!params.halt_on_low_confidence);
    }

    #[test]
    fn test_builder() {
        let params = PipelineParams::default()
            .with_strategy(AggregationStrategy::Consensus)
            .with_halt_on_low_confidence(true);

        assert_eq!(params.strategy, AggregationStrategy::Consensus);
        assert!(params.halt_on_low_confidence);
    }
}
