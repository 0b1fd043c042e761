//! Aggregation strategy selection

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Algorithm used to merge agent responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationStrategy {
    /// Fold by agent importance; earlier (heavier) contributions win
    #[default]
    Hierarchical,
    MajorityVote,
    WeightedAverage,
    Consensus,
}

impl AggregationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationStrategy::Hierarchical => "hierarchical",
            AggregationStrategy::MajorityVote => "majority_vote",
            AggregationStrategy::WeightedAverage => "weighted_average",
            AggregationStrategy::Consensus => "consensus",
        }
    }
}

impl std::fmt::Display for AggregationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AggregationStrategy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "hierarchical" => Ok(AggregationStrategy::Hierarchical),
            "majority_vote" | "majority" => Ok(AggregationStrategy::MajorityVote),
            "weighted_average" | "weighted" => Ok(AggregationStrategy::WeightedAverage),
            "consensus" => Ok(AggregationStrategy::Consensus),
            other => Err(DomainError::InvalidConfig(format!(
                "unknown aggregation strategy '{}'. Valid: hierarchical, majority_vote, weighted_average, consensus",
                other
            ))),
        }
    }
}
