//! Feedback-weighted scorer
//!
//! Holds the current [`ModelWeights`] snapshot consulted on every model
//! selection. Recomputation builds a whole new snapshot and swaps it in
//! atomically, so concurrent readers see either the old or the new map and
//! never a partial update.

use crate::ports::persistence::PersistenceSink;
use appforge_domain::{Model, ModelWeights};
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct FeedbackScorer {
    weights: ArcSwap<ModelWeights>,
}

impl Default for FeedbackScorer {
    fn default() -> Self {
        Self::new(ModelWeights::default())
    }
}

impl FeedbackScorer {
    pub fn new(initial: ModelWeights) -> Self {
        Self {
            weights: ArcSwap::from_pointee(initial),
        }
    }

    /// Current weight of `model` (1.0 without rating history)
    pub fn weight(&self, model: &Model) -> f64 {
        self.weights.load().get(model)
    }

    /// The snapshot in force right now
    pub fn snapshot(&self) -> Arc<ModelWeights> {
        self.weights.load_full()
    }

    /// Replace the weights with ones derived from `ratings`
    pub fn recompute(&self, ratings: &HashMap<Model, Vec<f64>>) -> Arc<ModelWeights> {
        let next = Arc::new(ModelWeights::from_ratings(ratings));
        self.weights.store(Arc::clone(&next));
        debug!(rated = ratings.len(), "Model weights recomputed");
        next
    }

    /// Load rating history for `models` and recompute.
    ///
    /// A model whose ratings cannot be loaded is skipped and logged.
    pub async fn refresh(
        &self,
        persistence: &dyn PersistenceSink,
        models: impl IntoIterator<Item = Model>,
    ) -> Arc<ModelWeights> {
        let mut ratings = HashMap::new();
        for model in models {
            match persistence.load_ratings(&model).await {
                Ok(values) => {
                    ratings.insert(model, values);
                }
                Err(e) => warn!(model = %model, error = %e, "Failed to load ratings; skipping model"),
            }
        }

        let weights = self.recompute(&ratings);
        info!(
            models = ratings.len(),
            rated = weights.rated_models().count(),
            "Model weights refreshed from rating history"
        );
        weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::persistence::PersistenceError;
    use appforge_domain::{AgentTask, GenerationRequest, RequestId};
    use async_trait::async_trait;

    struct RatingStore {
        failing: Option<Model>,
    }

    #[async_trait]
    impl PersistenceSink for RatingStore {
        async fn save_request_snapshot(
            &self,
            _request: &GenerationRequest,
        ) -> Result<(), PersistenceError> {
            Ok(())
        }

        async fn save_task(
            &self,
            _request_id: &RequestId,
            _task: &AgentTask,
        ) -> Result<(), PersistenceError> {
            Ok(())
        }

        async fn load_ratings(&self, model: &Model) -> Result<Vec<f64>, PersistenceError> {
            if self.failing == Some(*model) {
                return Err(PersistenceError::Storage("disk on fire".into()));
            }
            Ok(match model {
                Model::Claude => vec![4.0, 5.0],
                Model::Gpt4 => vec![3.0],
                _ => vec![],
            })
        }
    }

    #[test]
    fn test_default_weight_without_history() {
        let scorer = FeedbackScorer::default();
        assert_eq!(scorer.weight(&Model::Codex), 1.0);
    }

    #[test]
    fn test_recompute_replaces_snapshot() {
        let scorer = FeedbackScorer::default();
        let before = scorer.snapshot();

        let mut ratings = HashMap::new();
        ratings.insert(Model::Claude, vec![3.0]);
        ratings.insert(Model::Gpt4, vec![1.0]);
        scorer.recompute(&ratings);

        assert_eq!(scorer.weight(&Model::Claude), 0.75);
        assert_eq!(scorer.weight(&Model::Gpt4), 0.25);
        // Old snapshot is untouched
        assert_eq!(before.get(&Model::Claude), 1.0);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let scorer = FeedbackScorer::default();
        let mut ratings = HashMap::new();
        ratings.insert(Model::Claude, vec![2.0, 4.0]);
        let first = scorer.recompute(&ratings);
        let second = scorer.recompute(&ratings);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_refresh_loads_from_persistence() {
        let scorer = FeedbackScorer::default();
        let store = RatingStore { failing: None };

        scorer
            .refresh(&store, [Model::Claude, Model::Gpt4, Model::Codex])
            .await;

        // averages 4.5 and 3.0
        assert!((scorer.weight(&Model::Claude) - 0.6).abs() < 1e-9);
        assert!((scorer.weight(&Model::Gpt4) - 0.4).abs() < 1e-9);
        assert_eq!(scorer.weight(&Model::Codex), 1.0);
    }

    #[tokio::test]
    async fn test_refresh_skips_failing_model() {
        let scorer = FeedbackScorer::default();
        let store = RatingStore {
            failing: Some(Model::Gpt4),
        };

        scorer.refresh(&store, [Model::Claude, Model::Gpt4]).await;

        // Claude is the only rated model left, so it takes the whole weight
        assert_eq!(scorer.weight(&Model::Claude), 1.0);
        assert_eq!(scorer.weight(&Model::Gpt4), 1.0);
    }

    #[tokio::test]
    async fn test_concurrent_readers_see_whole_snapshots() {
        let scorer = Arc::new(FeedbackScorer::default());
        let mut a = HashMap::new();
        a.insert(Model::Claude, vec![1.0]);
        a.insert(Model::Gpt4, vec![1.0]);
        let mut b = HashMap::new();
        b.insert(Model::Claude, vec![3.0]);
        b.insert(Model::Gpt4, vec![1.0]);

        let writer = {
            let scorer = Arc::clone(&scorer);
            tokio::spawn(async move {
                for i in 0..200 {
                    scorer.recompute(if i % 2 == 0 { &a } else { &b });
                    tokio::task::yield_now().await;
                }
            })
        };

        for _ in 0..200 {
            let snapshot = scorer.snapshot();
            let sum = snapshot.get(&Model::Claude) + snapshot.get(&Model::Gpt4);
            // Either the default map (2.0) or a normalized one (1.0)
            assert!((sum - 1.0).abs() < 1e-9 || (sum - 2.0).abs() < 1e-9);
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();
    }
}
