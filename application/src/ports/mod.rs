//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod persistence;
pub mod progress;
pub mod provider_gateway;
pub mod usage;
