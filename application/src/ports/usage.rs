//! Port for provider usage accounting.
//!
//! Every provider call emits one [`UsageEvent`] carrying token counts and
//! the computed cost. Like conversation logging, recording is synchronous
//! and infallible so accounting can never disrupt the pipeline.

use appforge_domain::{AgentRole, Model};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Token usage and cost of one provider call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageEvent {
    pub model: Model,
    pub role: AgentRole,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub tokens_used: u32,
    pub cost: f64,
    pub timestamp: DateTime<Utc>,
}

impl UsageEvent {
    pub fn new(
        model: Model,
        role: AgentRole,
        prompt_tokens: u32,
        completion_tokens: u32,
        cost: f64,
    ) -> Self {
        Self {
            model,
            role,
            prompt_tokens,
            completion_tokens,
            tokens_used: prompt_tokens.saturating_add(completion_tokens),
            cost,
            timestamp: Utc::now(),
        }
    }
}

pub trait UsageSink: Send + Sync {
    fn record(&self, event: UsageEvent);
}

/// No-op implementation for tests and when accounting is disabled.
pub struct NoUsageSink;

impl UsageSink for NoUsageSink {
    fn record(&self, _event: UsageEvent) {}
}
