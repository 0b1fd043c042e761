//! Response aggregation algorithms

use super::response::{AgentResponse, AggregatedResponse, AggregationStatus, ResponseType};
use super::strategy::AggregationStrategy;
use crate::core::error::DomainError;
use chrono::Utc;
use serde_json::{Map, Number, Value, json};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Thresholds deciding whether an aggregation is usable
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationPolicy {
    /// Aggregations below this confidence are marked failed
    pub min_confidence: f64,
    /// Aggregations slower than this are marked failed
    pub max_duration: Duration,
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            max_duration: Duration::from_secs(300),
        }
    }
}

impl AggregationPolicy {
    pub fn evaluate(&self, confidence: f64, elapsed: Duration) -> AggregationStatus {
        if confidence < self.min_confidence || elapsed > self.max_duration {
            AggregationStatus::Failed
        } else {
            AggregationStatus::Completed
        }
    }
}

/// Merges agent responses into a single [`AggregatedResponse`].
///
/// Aggregation is a pure computation: it never calls out and only fails when
/// it is handed nothing to merge. A weak result is reported through
/// [`AggregationStatus::Failed`] so the caller decides whether to go on.
#[derive(Debug, Clone, Default)]
pub struct ResponseAggregator {
    policy: AggregationPolicy,
}

type Group<'a> = (ResponseType, Vec<&'a AgentResponse>);

impl ResponseAggregator {
    pub fn new(policy: AggregationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AggregationPolicy {
        &self.policy
    }

    pub fn aggregate(
        &self,
        request_id: &str,
        responses: Vec<AgentResponse>,
        strategy: AggregationStrategy,
    ) -> Result<AggregatedResponse, DomainError> {
        let started = Instant::now();

        if responses.is_empty() {
            return Err(DomainError::NoResponses);
        }

        let groups = group_by_type(&responses);
        let combined_result = match strategy {
            AggregationStrategy::Hierarchical => hierarchical(&responses),
            AggregationStrategy::MajorityVote => majority_vote(&groups),
            AggregationStrategy::WeightedAverage => per_group(&groups, weighted_average),
            AggregationStrategy::Consensus => per_group(&groups, consensus),
        };

        let summary = summarize(&groups, responses.len(), &responses, &combined_result);
        let confidence_score = confidence_score(&responses);
        let processing_time = started.elapsed();
        let status = self.policy.evaluate(confidence_score, processing_time);

        Ok(AggregatedResponse {
            request_id: request_id.to_string(),
            responses,
            combined_result,
            summary,
            confidence_score,
            processing_time,
            timestamp: Utc::now(),
            status,
        })
    }

    /// Re-check an aggregation against this aggregator's policy
    pub fn is_acceptable(&self, aggregated: &AggregatedResponse) -> bool {
        aggregated.is_acceptable(&self.policy)
    }
}

/// Group responses by type, in order of first appearance
fn group_by_type(responses: &[AgentResponse]) -> Vec<Group<'_>> {
    let mut groups: Vec<Group<'_>> = Vec::new();
    for response in responses {
        match groups.iter_mut().find(|(t, _)| *t == response.response_type) {
            Some((_, members)) => members.push(response),
            None => groups.push((response.response_type, vec![response])),
        }
    }
    groups
}

fn per_group(groups: &[Group<'_>], merge: fn(&[&AgentResponse]) -> Value) -> Value {
    let mut result = Map::new();
    for (response_type, members) in groups {
        result.insert(response_type.as_str().to_string(), merge(members));
    }
    Value::Object(result)
}

/// Weighted mean of confidences, weighted by agent importance
fn confidence_score(responses: &[AgentResponse]) -> f64 {
    let (weighted, total) = responses.iter().fold((0.0, 0.0), |(sum, total), r| {
        let weight = r.role.importance();
        (sum + r.confidence * weight, total + weight)
    });
    if total > 0.0 { weighted / total } else { 0.0 }
}

fn summarize(
    groups: &[Group<'_>],
    count: usize,
    responses: &[AgentResponse],
    combined: &Value,
) -> String {
    let mut parts = vec![format!(
        "Processed {} responses from {} types:",
        count,
        groups.len()
    )];
    for (response_type, members) in groups {
        parts.push(format!("- {}: {}", response_type, members.len()));
    }

    let average = responses.iter().map(|r| r.confidence).sum::<f64>() / count.max(1) as f64;
    parts.push(format!("Average confidence: {:.2}", average));

    match combined {
        Value::Object(sections) => {
            parts.push(format!("Combined result contains {} sections", sections.len()))
        }
        other => parts.push(format!("Combined result type: {}", json_kind(other))),
    }

    parts.join(" | ")
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ==================== Hierarchical ====================

/// Fold responses by descending agent importance into
/// `{type: {agent_id: content}}`. The first contribution for a key wins.
fn hierarchical(responses: &[AgentResponse]) -> Value {
    let mut ordered: Vec<&AgentResponse> = responses.iter().collect();
    ordered.sort_by(|a, b| b.role.importance().total_cmp(&a.role.importance()));

    let mut result = Map::new();
    for response in ordered {
        if !matches!(
            response.response_type,
            ResponseType::Text | ResponseType::Code | ResponseType::Data
        ) {
            continue;
        }
        let section = result
            .entry(response.response_type.as_str())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(section) = section {
            section
                .entry(response.agent_id.clone())
                .or_insert_with(|| response.content.clone());
        }
    }
    Value::Object(result)
}

// ==================== Majority vote ====================

fn majority_vote(groups: &[Group<'_>]) -> Value {
    let mut result = Map::new();
    for (response_type, members) in groups {
        let merged = match response_type {
            ResponseType::Text => Value::String(majority_text(members)),
            ResponseType::Code => combine_code(members),
            ResponseType::Data => merge_data(members),
            _ => weighted_average(members),
        };
        result.insert(response_type.as_str().to_string(), merged);
    }
    Value::Object(result)
}

fn is_at_least_half(count: usize, total: usize) -> bool {
    count * 2 >= total
}

const TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Split text into sentences, keeping each terminator.
///
/// A sentence ends at a terminator followed by whitespace or the end of the
/// text, so decimals and versions such as `v1.2` stay whole.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if TERMINATORS.contains(&c) && chars.peek().is_none_or(|(_, next)| next.is_whitespace()) {
            let end = i + c.len_utf8();
            sentences.push(text[start..end].trim());
            start = end;
        }
    }
    sentences.push(text[start..].trim());
    sentences.retain(|s| !s.is_empty());
    sentences
}

/// Keep sentences that occur in at least half of the responses
fn majority_text(members: &[&AgentResponse]) -> String {
    // (comparison key, first-seen wording)
    let mut order: Vec<(String, String)> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for response in members {
        let Some(text) = response.text() else {
            continue;
        };
        let mut seen = HashSet::new();
        for sentence in split_sentences(text) {
            let key = sentence.trim_end_matches(TERMINATORS).trim_end().to_string();
            if key.is_empty() || !seen.insert(key.clone()) {
                continue;
            }
            let count = counts.entry(key.clone()).or_insert(0);
            if *count == 0 {
                order.push((key, sentence.to_string()));
            }
            *count += 1;
        }
    }

    order
        .into_iter()
        .filter(|(key, _)| is_at_least_half(counts[key], members.len()))
        .map(|(_, sentence)| {
            if sentence.ends_with(TERMINATORS) {
                sentence
            } else {
                format!("{}.", sentence)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Union of all code contributions, tagged by agent
fn combine_code(members: &[&AgentResponse]) -> Value {
    let mut combined: Map<String, Value> = Map::new();

    let mut push = |key: &str, content: &Value, response: &AgentResponse| {
        let entry = combined
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(list) = entry {
            list.push(json!({
                "content": content,
                "agent": response.agent_id,
                "confidence": response.confidence,
            }));
        }
    };

    for response in members {
        match &response.content {
            Value::Object(files) => {
                for (name, content) in files {
                    push(name, content, response);
                }
            }
            other => push("main", other, response),
        }
    }

    Value::Object(combined)
}

/// Union of keys; lists are concatenated without duplicates, nested objects
/// merged. Groups without any object content fall back to weighted averaging.
fn merge_data(members: &[&AgentResponse]) -> Value {
    if !members.iter().any(|r| r.content.is_object()) {
        return weighted_average(members);
    }

    let mut merged: Map<String, Value> = Map::new();
    for response in members {
        let Value::Object(fields) = &response.content else {
            continue;
        };
        for (key, value) in fields {
            if !merged.contains_key(key) {
                merged.insert(key.clone(), value.clone());
                continue;
            }
            match (merged.get_mut(key), value) {
                (Some(Value::Array(existing)), Value::Array(incoming)) => {
                    for item in incoming {
                        if !existing.contains(item) {
                            existing.push(item.clone());
                        }
                    }
                }
                (Some(Value::Object(existing)), Value::Object(incoming)) => {
                    for (k, v) in incoming {
                        existing.insert(k.clone(), v.clone());
                    }
                }
                _ => {}
            }
        }
    }
    Value::Object(merged)
}

// ==================== Weighted average ====================

fn highest_confidence<'a>(members: &[&'a AgentResponse]) -> &'a AgentResponse {
    members
        .iter()
        .copied()
        .fold(members[0], |best, r| {
            if r.confidence > best.confidence { r } else { best }
        })
}

/// Numeric groups: `Σ(w·x) / Σw` with `w = importance × confidence`.
/// Anything else: the highest-confidence content.
fn weighted_average(members: &[&AgentResponse]) -> Value {
    if members.len() == 1 {
        return members[0].content.clone();
    }

    let weights: Vec<f64> = members
        .iter()
        .map(|r| r.role.importance() * r.confidence)
        .collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return members[0].content.clone();
    }

    let numbers: Option<Vec<f64>> = members.iter().map(|r| r.content.as_f64()).collect();
    match numbers {
        Some(values) => {
            let weighted: f64 = values.iter().zip(&weights).map(|(x, w)| x * w).sum();
            Number::from_f64(weighted / total)
                .map(Value::Number)
                .unwrap_or(Value::Null)
        }
        None => highest_confidence(members).content.clone(),
    }
}

// ==================== Consensus ====================

fn consensus(members: &[&AgentResponse]) -> Value {
    if members.len() == 1 {
        return members[0].content.clone();
    }
    if members.iter().all(|r| r.content.is_string()) {
        return Value::String(text_consensus(members));
    }
    most_common(members)
}

fn normalize_token(token: &str) -> Option<String> {
    let token = token
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    (token.chars().count() > 3).then_some(token)
}

/// Tokens present in at least half of the responses, in first-seen order
fn text_consensus(members: &[&AgentResponse]) -> String {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for response in members {
        let Some(text) = response.text() else {
            continue;
        };
        let mut seen = HashSet::new();
        for token in text.split_whitespace().filter_map(normalize_token) {
            if !seen.insert(token.clone()) {
                continue;
            }
            let count = counts.entry(token.clone()).or_insert(0);
            if *count == 0 {
                order.push(token);
            }
            *count += 1;
        }
    }

    order
        .into_iter()
        .filter(|t| is_at_least_half(counts[t], members.len()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Most frequent content by serialized form; ties go to the first seen
fn most_common(members: &[&AgentResponse]) -> Value {
    let mut tally: Vec<(String, usize, &Value)> = Vec::new();
    for response in members {
        let key = response.content.to_string();
        match tally.iter_mut().find(|(k, _, _)| *k == key) {
            Some((_, count, _)) => *count += 1,
            None => tally.push((key, 1, &response.content)),
        }
    }

    let mut best: Option<&(String, usize, &Value)> = None;
    for entry in &tally {
        if best.is_none_or(|b| entry.1 > b.1) {
            best = Some(entry);
        }
    }
    best.map(|(_, _, value)| (*value).clone()).unwrap_or(Value::Null)
}
