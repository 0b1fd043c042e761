//! Registry of available models and capability-based ranking

use super::descriptor::ModelDescriptor;
use super::selection::tokenize;
use crate::core::error::DomainError;
use crate::core::model::Model;
use crate::feedback::ModelWeights;
use serde::Serialize;

/// A model together with its selection score for one task description
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredModel {
    pub model: Model,
    pub score: f64,
}

/// Ordered set of registered models.
///
/// Registration order is significant: it breaks ties during ranking.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    descriptors: Vec<ModelDescriptor>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in descriptors of [`Model::default_models`]
    pub fn with_defaults() -> Self {
        Self {
            descriptors: Model::default_models()
                .into_iter()
                .map(ModelDescriptor::builtin)
                .collect(),
        }
    }

    /// Build a registry from descriptors, rejecting duplicates and empty input
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = ModelDescriptor>,
    ) -> Result<Self, DomainError> {
        let mut registry = Self::new();
        for descriptor in descriptors {
            registry.register(descriptor)?;
        }
        if registry.is_empty() {
            return Err(DomainError::NoModels);
        }
        Ok(registry)
    }

    pub fn register(&mut self, descriptor: ModelDescriptor) -> Result<(), DomainError> {
        if self.get(&descriptor.model).is_some() {
            return Err(DomainError::DuplicateModel(descriptor.model.to_string()));
        }
        self.descriptors.push(descriptor);
        Ok(())
    }

    pub fn get(&self, model: &Model) -> Option<&ModelDescriptor> {
        self.descriptors.iter().find(|d| &d.model == model)
    }

    pub fn descriptors(&self) -> &[ModelDescriptor] {
        &self.descriptors
    }

    pub fn models(&self) -> impl Iterator<Item = Model> + '_ {
        self.descriptors.iter().map(|d| d.model)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Score every registered model against a task description.
    ///
    /// Each term that appears in a model's capability tags adds that model's
    /// weight to its score. The result is sorted by descending score; the
    /// sort is stable, so equal scores keep registration order.
    pub fn rank(&self, description: &str, weights: &ModelWeights) -> Vec<ScoredModel> {
        let terms = tokenize(description);

        let mut scored: Vec<ScoredModel> = self
            .descriptors
            .iter()
            .map(|descriptor| {
                let weight = weights.get(&descriptor.model);
                let matches = terms
                    .iter()
                    .filter(|term| descriptor.has_capability(term))
                    .count();
                ScoredModel {
                    model: descriptor.model,
                    score: matches as f64 * weight,
                }
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored
    }

    /// Top-k models for a task description
    pub fn select(&self, description: &str, weights: &ModelWeights, top_k: usize) -> Vec<Model> {
        self.rank(description, weights)
            .into_iter()
            .take(top_k)
            .map(|s| s.model)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TokenPricing;

    fn registry(a: &[&str], b: &[&str]) -> ModelRegistry {
        ModelRegistry::from_descriptors([
            ModelDescriptor::new(Model::Claude, a.iter().copied(), TokenPricing::default()),
            ModelDescriptor::new(Model::Codex, b.iter().copied(), TokenPricing::default()),
        ])
        .unwrap()
    }

    #[test]
    fn test_two_matches_beat_one() {
        let reg = registry(&["research", "analysis"], &["debugging"]);
        let weights = ModelWeights::default();

        let ranked = reg.rank("research and analysis with debugging", &weights);
        assert_eq!(ranked[0].model, Model::Claude);
        assert_eq!(ranked[0].score, 2.0);
        assert_eq!(ranked[1].model, Model::Codex);
        assert_eq!(ranked[1].score, 1.0);

        let selected = reg.select("research and analysis with debugging", &weights, 2);
        assert_eq!(selected, vec![Model::Claude, Model::Codex]);
    }

    #[test]
    fn test_weights_scale_scores() {
        let reg = registry(&["analysis"], &["debugging"]);
        let weights = ModelWeights::from_pairs([(Model::Claude, 0.2), (Model::Codex, 0.8)]);

        let selected = reg.select("analysis debugging", &weights, 1);
        assert_eq!(selected, vec![Model::Codex]);
    }

    #[test]
    fn test_ties_break_by_registration_order() {
        let reg = registry(&["analysis"], &["debugging"]);
        let selected = reg.select("nothing relevant here", &ModelWeights::default(), 2);
        assert_eq!(selected, vec![Model::Claude, Model::Codex]);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let reg = ModelRegistry::with_defaults();
        let weights = ModelWeights::default();
        let description = "code_generation debugging analysis research";
        let first = reg.select(description, &weights, 2);
        for _ in 0..10 {
            assert_eq!(reg.select(description, &weights, 2), first);
        }
    }

    #[test]
    fn test_top_k_larger_than_registry() {
        let reg = ModelRegistry::with_defaults();
        let selected = reg.select("anything", &ModelWeights::default(), 10);
        assert_eq!(selected.len(), 3);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut reg = ModelRegistry::with_defaults();
        let err = reg
            .register(ModelDescriptor::builtin(Model::Claude))
            .unwrap_err();
        assert_eq!(err, DomainError::DuplicateModel("claude".to_string()));
    }

    #[test]
    fn test_empty_registry_rejected() {
        let err = ModelRegistry::from_descriptors(Vec::new()).unwrap_err();
        assert_eq!(err, DomainError::NoModels);
    }
}
