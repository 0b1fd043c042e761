//! Agent responses and aggregated results

use super::aggregator::AggregationPolicy;
use crate::agent::AgentRole;
use crate::core::model::Model;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Kind of content carried by an [`AgentResponse`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Text,
    Code,
    Data,
    Error,
    Status,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Text => "text",
            ResponseType::Code => "code",
            ResponseType::Data => "data",
            ResponseType::Error => "error",
            ResponseType::Status => "status",
        }
    }
}

impl std::fmt::Display for ResponseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One agent's answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    /// Contributing agent, e.g. `frontend_developer@codex`
    pub agent_id: String,
    pub role: AgentRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<Model>,
    pub response_type: ResponseType,
    pub content: Value,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    pub processing_time: Duration,
    pub timestamp: DateTime<Utc>,
}

impl AgentResponse {
    pub fn new(
        role: AgentRole,
        model: Option<Model>,
        response_type: ResponseType,
        content: impl Into<Value>,
    ) -> Self {
        let agent_id = match model {
            Some(m) => format!("{}@{}", role.as_str(), m),
            None => role.as_str().to_string(),
        };
        Self {
            agent_id,
            role,
            model,
            response_type,
            content: content.into(),
            confidence: 0.0,
            metadata: None,
            processing_time: Duration::ZERO,
            timestamp: Utc::now(),
        }
    }

    /// Zero-confidence response standing in for a failed call
    pub fn error(role: AgentRole, model: Option<Model>, message: impl Into<String>) -> Self {
        Self::new(role, model, ResponseType::Error, Value::String(message.into()))
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        self
    }

    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = agent_id.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_processing_time(mut self, elapsed: Duration) -> Self {
        self.processing_time = elapsed;
        self
    }

    pub fn is_error(&self) -> bool {
        self.response_type == ResponseType::Error
    }

    /// Content as text, if it is a JSON string
    pub fn text(&self) -> Option<&str> {
        self.content.as_str()
    }
}

/// Outcome flag of an aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationStatus {
    Completed,
    Failed,
}

/// Combined result of one phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedResponse {
    pub request_id: String,
    pub responses: Vec<AgentResponse>,
    /// Object keyed by response type (`"text"`, `"code"`, ...)
    pub combined_result: Value,
    pub summary: String,
    pub confidence_score: f64,
    pub processing_time: Duration,
    pub timestamp: DateTime<Utc>,
    pub status: AggregationStatus,
}

impl AggregatedResponse {
    /// Section of the combined result for one response type
    pub fn section(&self, response_type: ResponseType) -> Option<&Value> {
        self.combined_result.get(response_type.as_str())
    }

    pub fn is_completed(&self) -> bool {
        self.status == AggregationStatus::Completed
    }

    /// Responses that carry a usable answer
    /// Whether this result satisfies the acceptance thresholds of `policy`
    pub fn is_acceptable(&self, policy: &AggregationPolicy) -> bool {
        !self.responses.is_empty()
            && !self.combined_result.is_null()
            && policy.evaluate(self.confidence_score, self.processing_time)
                == AggregationStatus::Completed
    }

    pub fn successful_responses(&self) -> impl Iterator<Item = &AgentResponse> {
        self.responses.iter().filter(|r| !r.is_error())
    }

    pub fn failed_responses(&self) -> impl Iterator<Item = &AgentResponse> {
        self.responses.iter().filter(|r| r.is_error())
    }
}
