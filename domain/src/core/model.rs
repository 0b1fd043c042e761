//! Model value object representing a supported generation provider

use super::error::DomainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Supported generation models (Value Object)
///
/// The set is closed: every identifier that reaches the dispatcher has been
/// parsed into one of these variants, so an unknown model name is rejected
/// when configuration is loaded rather than when a phase runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Model {
    /// Anthropic Claude (long-context analysis)
    Claude,
    /// OpenAI GPT-4 (general reasoning)
    Gpt4,
    /// OpenAI coding model
    Codex,
    /// Google Gemini
    Gemini,
    /// Self-hosted model behind an OpenAI-compatible endpoint
    Local,
}

impl Model {
    /// Get the string identifier for this model
    pub fn as_str(&self) -> &'static str {
        match self {
            Model::Claude => "claude",
            Model::Gpt4 => "gpt4",
            Model::Codex => "codex",
            Model::Gemini => "gemini",
            Model::Local => "local",
        }
    }

    /// Human-readable name shown in reports
    pub fn display_name(&self) -> &'static str {
        match self {
            Model::Claude => "Claude 3.5 Sonnet",
            Model::Gpt4 => "GPT-4",
            Model::Codex => "Codex",
            Model::Gemini => "Gemini Pro",
            Model::Local => "Local model",
        }
    }

    /// Every supported model, in catalogue order
    pub fn all() -> [Model; 5] {
        [
            Model::Claude,
            Model::Gpt4,
            Model::Codex,
            Model::Gemini,
            Model::Local,
        ]
    }

    /// Models registered when no configuration overrides the catalogue
    pub fn default_models() -> Vec<Model> {
        vec![Model::Claude, Model::Gpt4, Model::Codex]
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Model {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "claude" | "claude-3.5-sonnet" | "anthropic" => Ok(Model::Claude),
            "gpt4" | "gpt-4" => Ok(Model::Gpt4),
            "codex" => Ok(Model::Codex),
            "gemini" | "gemini-pro" => Ok(Model::Gemini),
            "local" => Ok(Model::Local),
            other => Err(DomainError::UnknownModel(other.to_string())),
        }
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
