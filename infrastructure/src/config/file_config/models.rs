//! Model catalogue entries from TOML (`[[models]]` array)

use super::ConfigValidationError;
use appforge_domain::{Model, ModelDescriptor, TokenPricing};
use serde::{Deserialize, Serialize};

/// One registered model
///
/// Omitted fields fall back to the model's built-in descriptor.
///
/// # Example
///
/// ```toml
/// [[models]]
/// id = "codex"
/// capabilities = ["code_generation", "debugging", "optimization"]
/// prompt_rate = 0.00002      # cost per prompt token
/// completion_rate = 0.00004  # cost per completion token
///
/// [[models]]
/// id = "claude"
/// display_name = "Claude (team account)"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelEntry {
    pub id: String,
    pub display_name: Option<String>,
    pub capabilities: Option<Vec<String>>,
    pub prompt_rate: Option<f64>,
    pub completion_rate: Option<f64>,
}

impl FileModelEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn parse_model(&self) -> Result<Model, ConfigValidationError> {
        if self.id.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName);
        }
        self.id
            .parse()
            .map_err(|_| ConfigValidationError::UnknownModel(self.id.clone()))
    }

    pub fn to_descriptor(&self) -> Result<ModelDescriptor, ConfigValidationError> {
        let model = self.parse_model()?;
        let builtin = ModelDescriptor::builtin(model);

        if [self.prompt_rate, self.completion_rate]
            .into_iter()
            .flatten()
            .any(|rate| rate < 0.0)
        {
            return Err(ConfigValidationError::NegativeRate(self.id.clone()));
        }

        let pricing = TokenPricing::new(
            self.prompt_rate.unwrap_or(builtin.pricing.prompt_rate),
            self.completion_rate.unwrap_or(builtin.pricing.completion_rate),
        );
        let capabilities = match &self.capabilities {
            Some(tags) => tags.clone(),
            None => builtin.capabilities().to_vec(),
        };

        let mut descriptor = ModelDescriptor::new(model, capabilities, pricing);
        if let Some(name) = &self.display_name {
            descriptor = descriptor.with_display_name(name.clone());
        }
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appforge_domain::{ModelRegistry, ModelWeights};

    #[test]
    fn test_entry_falls_back_to_builtin() {
        let descriptor = FileModelEntry::new("codex").to_descriptor().unwrap();
        assert_eq!(descriptor, ModelDescriptor::builtin(Model::Codex));
    }

    #[test]
    fn test_entry_overrides() {
        let entry = FileModelEntry {
            id: "gpt-4".to_string(),
            display_name: Some("GPT-4 (org)".to_string()),
            capabilities: Some(vec!["Creativity".to_string()]),
            prompt_rate: Some(0.001),
            completion_rate: None,
        };
        let descriptor = entry.to_descriptor().unwrap();
        assert_eq!(descriptor.model, Model::Gpt4);
        assert_eq!(descriptor.display_name, "GPT-4 (org)");
        assert_eq!(descriptor.capabilities(), &["creativity"]);
        assert_eq!(descriptor.pricing.prompt_rate, 0.001);
        assert_eq!(
            descriptor.pricing.completion_rate,
            ModelDescriptor::builtin(Model::Gpt4).pricing.completion_rate
        );
    }

    #[test]
    fn test_hyphenated_tags_are_matchable() {
        let entry = FileModelEntry {
            capabilities: Some(vec!["long-context".to_string(), "Code Generation".to_string()]),
            ..FileModelEntry::new("claude")
        };
        let descriptor = entry.to_descriptor().unwrap();
        assert!(descriptor.has_capability("long_context"));
        assert!(descriptor.has_capability("code_generation"));

        // Gpt4 is registered first and would win a zero-score tie
        let registry =
            ModelRegistry::from_descriptors([ModelDescriptor::builtin(Model::Gpt4), descriptor])
                .unwrap();
        let selected = registry.select("needs code_generation", &ModelWeights::default(), 1);
        assert_eq!(selected, vec![Model::Claude]);
    }

    #[test]
    fn test_unknown_and_empty_ids() {
        assert!(matches!(
            FileModelEntry::new("llama-9000").to_descriptor(),
            Err(ConfigValidationError::UnknownModel(id)) if id == "llama-9000"
        ));
        assert!(matches!(
            FileModelEntry::new("  ").to_descriptor(),
            Err(ConfigValidationError::EmptyModelName)
        ));
    }

    #[test]
    fn test_negative_rate_rejected() {
        let entry = FileModelEntry {
            completion_rate: Some(-1.0),
            ..FileModelEntry::new("claude")
        };
        assert!(matches!(
            entry.to_descriptor(),
            Err(ConfigValidationError::NegativeRate(_))
        ));
    }
}
