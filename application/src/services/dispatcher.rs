//! Model dispatcher
//!
//! Selects the best-matching models for a task and invokes them
//! concurrently through the [`RetryController`]. A failed call becomes a
//! zero-confidence ERROR response instead of aborting its siblings.

use super::feedback_scorer::FeedbackScorer;
use super::retry_controller::{RetryController, RetryError};
use crate::ports::provider_gateway::{GatewayError, ProviderGateway, ProviderReply, ProviderRequest};
use crate::ports::usage::{NoUsageSink, UsageEvent, UsageSink};
use appforge_domain::{AgentResponse, AgentRole, Model, ModelRegistry, ResponseType, RetryPolicy};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::{Id, JoinSet};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Errors from a single model invocation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("Provider call to {model} failed: {message}")]
    Provider { model: Model, message: String },

    #[error("Circuit breaker open for {0}")]
    CircuitOpen(Model),

    #[error("Model not registered: {0}")]
    UnknownModel(Model),
}

impl DispatchError {
    fn from_retry(model: Model, error: RetryError<GatewayError>) -> Self {
        match error {
            RetryError::CircuitOpen { .. } => DispatchError::CircuitOpen(model),
            other => DispatchError::Provider {
                model,
                message: other.to_string(),
            },
        }
    }
}

/// Knobs for model selection and provider calls
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchPolicy {
    /// Models invoked per task
    pub top_k: usize,
    pub temperature: f32,
    pub max_tokens: u32,
    pub retry: RetryPolicy,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            top_k: 2,
            temperature: 0.7,
            max_tokens: 4096,
            retry: RetryPolicy::default(),
        }
    }
}

impl DispatchPolicy {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// One role's unit of work
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchTask {
    pub role: AgentRole,
    /// Text matched against capability tags during selection
    pub description: String,
    pub prompt: String,
    pub system_prompt: Option<String>,
}

impl DispatchTask {
    pub fn new(role: AgentRole, description: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            role,
            description: description.into(),
            prompt: prompt.into(),
            system_prompt: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }
}

/// Models selected for a task and the responses they produced
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub models: Vec<Model>,
    /// One response per selected model, in selection order
    pub responses: Vec<AgentResponse>,
}

impl DispatchOutcome {
    pub fn all_failed(&self) -> bool {
        self.responses.iter().all(AgentResponse::is_error)
    }
}

/// Breaker key for calls to `model`
fn operation_name(model: Model) -> String {
    format!("provider:{}", model.as_str())
}

/// Confidence derived from how the provider finished
fn reply_confidence(reply: &ProviderReply) -> f64 {
    if reply.content.trim().is_empty() {
        0.0
    } else if reply.is_truncated() {
        0.5
    } else {
        1.0
    }
}

/// Strip a surrounding markdown code fence, if any
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`, `rust`, ...) on the opening line
    match body.split_once('\n') {
        Some((_, inner)) => inner.trim(),
        None => body.trim(),
    }
}

/// Tag raw provider text with a response type and parse structured content
fn classify(role: AgentRole, content: &str) -> (ResponseType, Value) {
    let expected = role.expected_response_type();
    let body = strip_code_fence(content);

    match serde_json::from_str::<Value>(body) {
        Ok(value @ Value::Object(_)) if expected == ResponseType::Code => (ResponseType::Code, value),
        Ok(value @ (Value::Object(_) | Value::Array(_) | Value::Number(_))) => {
            (ResponseType::Data, value)
        }
        _ if expected == ResponseType::Code => (ResponseType::Code, Value::String(body.to_string())),
        _ => (ResponseType::Text, Value::String(content.trim().to_string())),
    }
}

/// Model dispatcher service
pub struct ModelDispatcher<G: ProviderGateway + 'static> {
    gateway: Arc<G>,
    registry: Arc<ModelRegistry>,
    scorer: Arc<FeedbackScorer>,
    retry: Arc<RetryController>,
    usage: Arc<dyn UsageSink>,
    policy: DispatchPolicy,
}

impl<G: ProviderGateway + 'static> Clone for ModelDispatcher<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            registry: Arc::clone(&self.registry),
            scorer: Arc::clone(&self.scorer),
            retry: Arc::clone(&self.retry),
            usage: Arc::clone(&self.usage),
            policy: self.policy.clone(),
        }
    }
}

impl<G: ProviderGateway + 'static> ModelDispatcher<G> {
    pub fn new(
        gateway: Arc<G>,
        registry: Arc<ModelRegistry>,
        scorer: Arc<FeedbackScorer>,
        retry: Arc<RetryController>,
    ) -> Self {
        Self {
            gateway,
            registry,
            scorer,
            retry,
            usage: Arc::new(NoUsageSink),
            policy: DispatchPolicy::default(),
        }
    }

    pub fn with_usage_sink(mut self, usage: Arc<dyn UsageSink>) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &DispatchPolicy {
        &self.policy
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn scorer(&self) -> &FeedbackScorer {
        &self.scorer
    }

    pub fn retry_controller(&self) -> &RetryController {
        &self.retry
    }

    /// Top-k models for `description` under the current weights
    pub fn select(&self, description: &str) -> Vec<Model> {
        self.select_top(description, self.policy.top_k)
    }

    pub fn select_top(&self, description: &str, top_k: usize) -> Vec<Model> {
        let weights = self.scorer.snapshot();
        let selected = self.registry.select(description, &weights, top_k);
        debug!(?selected, top_k, "Models selected");
        selected
    }

    /// Call one model for `task`, with retries and breaker protection
    pub async fn invoke(&self, model: Model, task: &DispatchTask) -> Result<AgentResponse, DispatchError> {
        let descriptor = self
            .registry
            .get(&model)
            .ok_or(DispatchError::UnknownModel(model))?;

        let mut request = ProviderRequest::new(task.prompt.clone())
            .with_temperature(self.policy.temperature)
            .with_max_tokens(self.policy.max_tokens);
        if let Some(system_prompt) = &task.system_prompt {
            request = request.with_system_prompt(system_prompt.clone());
        }

        let operation = operation_name(model);
        let started = Instant::now();

        let reply = self
            .retry
            .call_with_retry(&operation, &self.policy.retry, GatewayError::is_retryable, || {
                let gateway = Arc::clone(&self.gateway);
                let request = request.clone();
                async move { gateway.invoke(&model, &request).await }
            })
            .await
            .map_err(|e| DispatchError::from_retry(model, e))?;

        let elapsed = started.elapsed();
        let cost = descriptor
            .pricing
            .cost(reply.prompt_tokens, reply.completion_tokens);
        self.usage.record(UsageEvent::new(
            model,
            task.role,
            reply.prompt_tokens,
            reply.completion_tokens,
            cost,
        ));

        let (response_type, content) = classify(task.role, &reply.content);
        debug!(
            model = %model,
            role = %task.role,
            response_type = %response_type,
            tokens = reply.tokens_used(),
            cost,
            "Model responded"
        );

        Ok(AgentResponse::new(task.role, Some(model), response_type, content)
            .with_confidence(reply_confidence(&reply))
            .with_processing_time(elapsed)
            .with_metadata("prompt_tokens", reply.prompt_tokens)
            .with_metadata("completion_tokens", reply.completion_tokens)
            .with_metadata("cost", cost)
            .with_metadata("finish_reason", reply.finish_reason))
    }

    /// Select models for `task` and invoke them concurrently.
    ///
    /// Always yields one response per selected model; failures are turned
    /// into ERROR responses with zero confidence.
    pub async fn dispatch(&self, task: &DispatchTask) -> DispatchOutcome {
        let models = self.select(&task.description);
        self.dispatch_to(models, task).await
    }

    /// Invoke an already selected set of models concurrently
    pub async fn dispatch_to(&self, models: Vec<Model>, task: &DispatchTask) -> DispatchOutcome {
        info!(role = %task.role, models = ?models, "Dispatching task");

        let mut join_set = JoinSet::new();
        let mut spawned: HashMap<Id, (usize, Model)> = HashMap::with_capacity(models.len());
        for (index, model) in models.iter().copied().enumerate() {
            let dispatcher = self.clone();
            let task = task.clone();
            let handle = join_set.spawn(async move {
                let result = dispatcher.invoke(model, &task).await;
                (index, model, result)
            });
            spawned.insert(handle.id(), (index, model));
        }

        let mut collected: Vec<(usize, AgentResponse)> = Vec::with_capacity(models.len());
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, _, Ok(response))) => collected.push((index, response)),
                Ok((index, model, Err(e))) => {
                    warn!(model = %model, role = %task.role, error = %e, "Model call failed");
                    collected.push((index, AgentResponse::error(task.role, Some(model), e.to_string())));
                }
                Err(e) => match spawned.get(&e.id()) {
                    // A panicking call still counts as a failure of its model
                    Some(&(index, model)) => {
                        self.retry.record_failure(&operation_name(model));
                        warn!(model = %model, role = %task.role, error = %e, "Model call aborted");
                        collected.push((index, AgentResponse::error(task.role, Some(model), e.to_string())));
                    }
                    None => warn!("Task join error: {}", e),
                },
            }
        }

        collected.sort_by_key(|(index, _)| *index);
        DispatchOutcome {
            models,
            responses: collected.into_iter().map(|(_, r)| r).collect(),
        }
    }
}
