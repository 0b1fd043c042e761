//! Provider gateway port
//!
//! Defines the interface for calling generation model providers.

use appforge_domain::Model;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during a provider call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

impl GatewayError {
    /// Whether repeating the same call could succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, GatewayError::ModelNotAvailable(_))
    }
}

/// One call to a provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ProviderRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            temperature: 0.7,
            max_tokens: 4096,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Raw provider answer
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReply {
    pub content: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    /// Provider-reported stop reason, e.g. `stop` or `length`
    pub finish_reason: String,
}

impl ProviderReply {
    pub fn tokens_used(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }

    /// Whether the provider cut the answer short
    pub fn is_truncated(&self) -> bool {
        matches!(
            self.finish_reason.as_str(),
            "length" | "max_tokens" | "max_output_tokens"
        )
    }
}

/// Gateway for model provider calls
///
/// This port defines how the application layer talks to model providers.
/// Implementations (adapters) live in the infrastructure layer. No
/// assumption is made about any provider's wire format.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    async fn invoke(
        &self,
        model: &Model,
        request: &ProviderRequest,
    ) -> Result<ProviderReply, GatewayError>;
}
