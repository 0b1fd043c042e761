//! Model weight snapshots

use crate::core::model::Model;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Weight used for any model without rating history
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Immutable map of model weights.
///
/// Models absent from the map weigh [`DEFAULT_WEIGHT`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelWeights {
    weights: HashMap<Model, f64>,
}

impl ModelWeights {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Model, f64)>) -> Self {
        Self {
            weights: pairs
                .into_iter()
                .map(|(model, weight)| (model, weight.max(0.0)))
                .collect(),
        }
    }

    /// Derive weights from historical ratings.
    ///
    /// `weight_i = mean(ratings_i) / Σ_j mean(ratings_j)`. Models with no
    /// ratings are left out (and therefore weigh the default). Negative
    /// ratings count as zero. If every average is zero the result is empty.
    pub fn from_ratings(ratings: &HashMap<Model, Vec<f64>>) -> Self {
        let averages: Vec<(Model, f64)> = ratings
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(model, values)| {
                let sum: f64 = values.iter().map(|r| r.max(0.0)).sum();
                (*model, sum / values.len() as f64)
            })
            .collect();

        let total: f64 = averages.iter().map(|(_, avg)| avg).sum();
        if total <= 0.0 {
            return Self::default();
        }

        Self {
            weights: averages
                .into_iter()
                .map(|(model, avg)| (model, avg / total))
                .collect(),
        }
    }

    pub fn get(&self, model: &Model) -> f64 {
        self.weights.get(model).copied().unwrap_or(DEFAULT_WEIGHT)
    }

    /// Models with an explicit (rating-derived) weight
    pub fn rated_models(&self) -> impl Iterator<Item = (&Model, &f64)> {
        self.weights.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weight_when_unrated() {
        let weights = ModelWeights::default();
        assert_eq!(weights.get(&Model::Claude), DEFAULT_WEIGHT);
    }

    #[test]
    fn test_ratio_of_averages() {
        let mut ratings = HashMap::new();
        ratings.insert(Model::Claude, vec![4.0, 4.0]);
        ratings.insert(Model::Gpt4, vec![2.0, 6.0, 4.0]);
        ratings.insert(Model::Codex, vec![2.0]);

        let weights = ModelWeights::from_ratings(&ratings);
        assert!((weights.get(&Model::Claude) - 0.4).abs() < 1e-9);
        assert!((weights.get(&Model::Gpt4) - 0.4).abs() < 1e-9);
        assert!((weights.get(&Model::Codex) - 0.2).abs() < 1e-9);
        assert_eq!(weights.get(&Model::Gemini), DEFAULT_WEIGHT);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut ratings = HashMap::new();
        ratings.insert(Model::Claude, vec![5.0, 3.0]);
        ratings.insert(Model::Codex, vec![1.0]);

        assert_eq!(
            ModelWeights::from_ratings(&ratings),
            ModelWeights::from_ratings(&ratings)
        );
    }

    #[test]
    fn test_all_zero_ratings_fall_back_to_defaults() {
        let mut ratings = HashMap::new();
        ratings.insert(Model::Claude, vec![0.0]);
        ratings.insert(Model::Codex, vec![-3.0]);

        let weights = ModelWeights::from_ratings(&ratings);
        assert!(weights.is_empty());
        assert_eq!(weights.get(&Model::Claude), DEFAULT_WEIGHT);
    }

    #[test]
    fn test_empty_rating_lists_ignored() {
        let mut ratings = HashMap::new();
        ratings.insert(Model::Claude, vec![]);
        ratings.insert(Model::Codex, vec![3.0]);

        let weights = ModelWeights::from_ratings(&ratings);
        assert_eq!(weights.get(&Model::Codex), 1.0);
        assert_eq!(weights.rated_models().count(), 1);
    }

    #[test]
    fn test_weights_never_negative() {
        let weights = ModelWeights::from_pairs([(Model::Claude, -1.0)]);
        assert_eq!(weights.get(&Model::Claude), 0.0);
    }
}
