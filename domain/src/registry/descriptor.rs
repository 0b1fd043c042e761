//! Model descriptors

use super::selection::normalize_tag;
use crate::core::model::Model;
use serde::{Deserialize, Serialize};

/// Price-per-token rates for one model
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TokenPricing {
    /// Cost per prompt (input) token
    pub prompt_rate: f64,
    /// Cost per completion (output) token
    pub completion_rate: f64,
}

impl TokenPricing {
    pub fn new(prompt_rate: f64, completion_rate: f64) -> Self {
        Self {
            prompt_rate,
            completion_rate,
        }
    }

    /// Rates quoted per thousand tokens
    pub fn per_thousand(prompt: f64, completion: f64) -> Self {
        Self::new(prompt / 1000.0, completion / 1000.0)
    }

    /// Cost of a single call
    pub fn cost(&self, prompt_tokens: u32, completion_tokens: u32) -> f64 {
        prompt_tokens as f64 * self.prompt_rate + completion_tokens as f64 * self.completion_rate
    }
}

/// Static description of a registered model (immutable after registration)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub model: Model,
    pub display_name: String,
    /// Ordered, de-duplicated tags in [`normalize_tag`] form
    capabilities: Vec<String>,
    pub pricing: TokenPricing,
}

impl ModelDescriptor {
    pub fn new<I, S>(model: Model, capabilities: I, pricing: TokenPricing) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tags: Vec<String> = Vec::new();
        for tag in capabilities {
            let tag = normalize_tag(tag.as_ref());
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        Self {
            model,
            display_name: model.display_name().to_string(),
            capabilities: tags,
            pricing,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    pub fn has_capability(&self, term: &str) -> bool {
        self.capabilities.iter().any(|c| c == term)
    }

    /// Built-in descriptor for a catalogue model
    pub fn builtin(model: Model) -> Self {
        match model {
            Model::Claude => Self::new(
                model,
                ["research", "analysis", "long_context", "natural_language"],
                TokenPricing::per_thousand(0.011, 0.011),
            ),
            Model::Gpt4 => Self::new(
                model,
                ["creativity", "general_understanding", "complex_reasoning"],
                TokenPricing::per_thousand(0.03, 0.06),
            ),
            Model::Codex => Self::new(
                model,
                ["code_generation", "debugging", "optimization"],
                TokenPricing::per_thousand(0.02, 0.04),
            ),
            Model::Gemini => Self::new(
                model,
                ["summarization", "long_context", "multimodal"],
                TokenPricing::per_thousand(0.0125, 0.0375),
            ),
            Model::Local => Self::new(model, ["code_generation", "privacy"], TokenPricing::default()),
        }
    }
}
