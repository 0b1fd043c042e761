//! Engine configuration container.
//!
//! [`EngineConfig`] groups the configuration slices the wiring code needs to
//! assemble the engine. Services and use cases receive only the slice they
//! use:
//!
//! | Slice | Consumer |
//! |-------|----------|
//! | [`DispatchPolicy`] | `ModelDispatcher` |
//! | [`CircuitBreakerPolicy`] | `RetryController` |
//! | [`PipelineParams`] | `RunGenerationUseCase` |

use crate::config::PipelineParams;
use crate::services::DispatchPolicy;
use appforge_domain::CircuitBreakerPolicy;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineConfig {
    dispatch: DispatchPolicy,
    circuit_breaker: CircuitBreakerPolicy,
    pipeline: PipelineParams,
}

impl EngineConfig {
    pub fn new(
        dispatch: DispatchPolicy,
        circuit_breaker: CircuitBreakerPolicy,
        pipeline: PipelineParams,
    ) -> Self {
        Self {
            dispatch,
            circuit_breaker,
            pipeline,
        }
    }

    // ==================== Accessors ====================

    pub fn dispatch(&self) -> &DispatchPolicy {
        &self.dispatch
    }

    pub fn circuit_breaker(&self) -> &CircuitBreakerPolicy {
        &self.circuit_breaker
    }

    pub fn pipeline(&self) -> &PipelineParams {
        &self.pipeline
    }
}
