//! Response aggregation domain
//!
//! Merges the answers of several model calls into one result.
//!
//! # Strategies
//!
//! | Strategy | Text | Code | Data | Numbers |
//! |----------|------|------|------|---------|
//! | `hierarchical` | keyed by agent, importance order | same | same | same |
//! | `majority_vote` | sentences in ≥ half the answers | union tagged by agent | key union, list dedup | weighted mean |
//! | `weighted_average` | highest confidence | highest confidence | highest confidence | weighted mean |
//! | `consensus` | tokens in ≥ half the answers | most common | most common | most common |

pub mod aggregator;
pub mod response;
pub mod strategy;

pub use aggregator::{AggregationPolicy, ResponseAggregator};
pub use response::{AgentResponse, AggregatedResponse, AggregationStatus, ResponseType};
pub use strategy::AggregationStrategy;
