//! In-memory usage totals per model

use appforge_application::{UsageEvent, UsageSink};
use appforge_domain::Model;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Accumulated usage of one model
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelUsage {
    pub calls: u32,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub tokens_used: u64,
    pub cost: f64,
}

impl ModelUsage {
    fn add(&mut self, event: &UsageEvent) {
        self.calls += 1;
        self.prompt_tokens += u64::from(event.prompt_tokens);
        self.completion_tokens += u64::from(event.completion_tokens);
        self.tokens_used += u64::from(event.tokens_used);
        self.cost += event.cost;
    }

    fn merge(&mut self, other: &ModelUsage) {
        self.calls += other.calls;
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.tokens_used += other.tokens_used;
        self.cost += other.cost;
    }
}

/// Usage sink that keeps running totals per model
#[derive(Debug, Default)]
pub struct UsageLedger {
    totals: Mutex<BTreeMap<Model, ModelUsage>>,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-model totals, in catalogue order
    pub fn summary(&self) -> Vec<(Model, ModelUsage)> {
        match self.totals.lock() {
            Ok(totals) => totals.iter().map(|(m, u)| (*m, u.clone())).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn usage(&self, model: &Model) -> Option<ModelUsage> {
        self.totals.lock().ok()?.get(model).cloned()
    }

    /// Totals over every model
    pub fn total(&self) -> ModelUsage {
        let mut total = ModelUsage::default();
        for (_, usage) in self.summary() {
            total.merge(&usage);
        }
        total
    }
}

impl UsageSink for UsageLedger {
    fn record(&self, event: UsageEvent) {
        if let Ok(mut totals) = self.totals.lock() {
            totals.entry(event.model).or_default().add(&event);
        }
    }
}

/// Forwards every event to several sinks
pub struct FanOutUsageSink {
    sinks: Vec<std::sync::Arc<dyn UsageSink>>,
}

impl FanOutUsageSink {
    pub fn new(sinks: Vec<std::sync::Arc<dyn UsageSink>>) -> Self {
        Self { sinks }
    }
}

impl UsageSink for FanOutUsageSink {
    fn record(&self, event: UsageEvent) {
        for sink in &self.sinks {
            sink.record(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appforge_domain::AgentRole;
    use std::sync::Arc;

    #[test]
    fn test_ledger_totals_per_model() {
        let ledger = UsageLedger::new();
        ledger.record(UsageEvent::new(Model::Codex, AgentRole::BackendDeveloper, 100, 200, 0.01));
        ledger.record(UsageEvent::new(Model::Codex, AgentRole::FrontendDeveloper, 50, 50, 0.005));
        ledger.record(UsageEvent::new(Model::Claude, AgentRole::RequirementsAnalyst, 10, 20, 0.001));

        let codex = ledger.usage(&Model::Codex).unwrap();
        assert_eq!(codex.calls, 2);
        assert_eq!(codex.prompt_tokens, 150);
        assert_eq!(codex.tokens_used, 400);
        assert!((codex.cost - 0.015).abs() < 1e-12);

        let summary = ledger.summary();
        assert_eq!(summary[0].0, Model::Claude);
        assert_eq!(summary[1].0, Model::Codex);

        let total = ledger.total();
        assert_eq!(total.calls, 3);
        assert_eq!(total.tokens_used, 430);
        assert!(ledger.usage(&Model::Gemini).is_none());
    }

    #[test]
    fn test_fan_out_forwards_to_every_sink() {
        let first = Arc::new(UsageLedger::new());
        let second = Arc::new(UsageLedger::new());
        let fan_out = FanOutUsageSink::new(vec![first.clone(), second.clone()]);

        fan_out.record(UsageEvent::new(Model::Gpt4, AgentRole::Generalist, 1, 2, 0.0));

        assert_eq!(first.total().calls, 1);
        assert_eq!(second.total().calls, 1);
    }
}
