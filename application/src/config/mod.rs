//! Application-level configuration.
//!
//! - [`PipelineParams`]: phase-loop control (checkpoints, aggregation)
//! - [`EngineConfig`]: container of every slice used to wire the engine

pub mod engine_config;
pub mod pipeline_params;

pub use engine_config::EngineConfig;
pub use pipeline_params::PipelineParams;
