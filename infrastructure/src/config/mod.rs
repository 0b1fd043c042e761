//! Configuration file loading for appforge
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `APPFORGE_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./appforge.toml` or `./.appforge.toml`
//! 4. Global: `$XDG_CONFIG_HOME/appforge/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileAggregationConfig, FileCircuitBreakerConfig, FileConfig,
    FileDispatchConfig, FileLoggingConfig, FileModelEntry, FilePipelineConfig, FileRetryConfig,
};
pub use loader::{ConfigLoader, ENV_PREFIX};
