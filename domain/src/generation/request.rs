//! Generation request entity and its status report

use super::phase::PhaseStep;
use super::task::{AgentTask, GeneratedComponent};
use super::value_objects::{GenerationStatus, RequestId, TaskId};
use crate::core::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A request driven through the generation pipeline (Entity)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    id: RequestId,
    user_id: String,
    prompt: String,
    tech_stack: Vec<String>,
    project_type: String,
    status: GenerationStatus,
    progress: u8,
    current_step: String,
    tasks: Vec<AgentTask>,
    components: Vec<GeneratedComponent>,
    /// Merged result of each finished phase
    outputs: BTreeMap<PhaseStep, Value>,
    error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    estimated_completion: Option<DateTime<Utc>>,
}

impl GenerationRequest {
    pub fn new(
        user_id: impl Into<String>,
        prompt: impl Into<String>,
        tech_stack: Vec<String>,
        project_type: impl Into<String>,
    ) -> Result<Self, DomainError> {
        Self::new_at(user_id, prompt, tech_stack, project_type, Utc::now())
    }

    pub fn new_at(
        user_id: impl Into<String>,
        prompt: impl Into<String>,
        tech_stack: Vec<String>,
        project_type: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(DomainError::InvalidRequest("prompt cannot be empty".into()));
        }

        Ok(Self {
            id: RequestId::generate(),
            user_id: user_id.into(),
            prompt: prompt.trim().to_string(),
            tech_stack,
            project_type: project_type.into(),
            status: GenerationStatus::Pending,
            progress: 0,
            current_step: "Initializing".to_string(),
            tasks: Vec::new(),
            components: Vec::new(),
            outputs: BTreeMap::new(),
            error: None,
            created_at: now,
            updated_at: now,
            estimated_completion: None,
        })
    }

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn tech_stack(&self) -> &[String] {
        &self.tech_stack
    }

    pub fn project_type(&self) -> &str {
        &self.project_type
    }

    pub fn status(&self) -> GenerationStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn current_step(&self) -> &str {
        &self.current_step
    }

    pub fn tasks(&self) -> &[AgentTask] {
        &self.tasks
    }

    pub fn components(&self) -> &[GeneratedComponent] {
        &self.components
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn estimated_completion(&self) -> Option<DateTime<Utc>> {
        self.estimated_completion
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn ensure_active(&self) -> Result<(), DomainError> {
        if self.is_terminal() {
            return Err(DomainError::TerminalState(self.status.to_string()));
        }
        Ok(())
    }

    /// Enter `step`, moving progress to `checkpoint`.
    ///
    /// Progress never moves backwards; a lower checkpoint keeps the current value.
    pub fn advance(
        &mut self,
        step: PhaseStep,
        checkpoint: u8,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.ensure_active()?;

        self.status = step.status();
        self.current_step = step.label().to_string();
        self.progress = self.progress.max(checkpoint.min(100));
        self.updated_at = now;
        self.estimated_completion = self.estimate_completion(now);
        Ok(())
    }

    /// Move to the absorbing FAILED state. Progress stays where it was.
    pub fn fail(&mut self, reason: impl Into<String>, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure_active()?;

        let reason = reason.into();
        self.status = GenerationStatus::Failed;
        self.current_step = format!("Generation failed: {}", reason);
        self.error = Some(reason);
        self.updated_at = now;
        Ok(())
    }

    /// `created_at + elapsed * (100 / progress)`; undefined at zero progress.
    fn estimate_completion(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.progress {
            0 => None,
            100 => Some(now),
            progress => {
                let elapsed_ms = (now - self.created_at).num_milliseconds().max(0);
                let total_ms = elapsed_ms.saturating_mul(100) / i64::from(progress);
                Some(self.created_at + chrono::Duration::milliseconds(total_ms))
            }
        }
    }

    /// Seconds until the estimated completion, clamped at zero
    pub fn estimated_time_remaining(&self, now: DateTime<Utc>) -> Option<u64> {
        if self.progress == 0 {
            return None;
        }
        let estimate = self.estimated_completion?;
        Some((estimate - now).num_seconds().max(0) as u64)
    }

    /// Append a task and return its id
    pub fn push_task(&mut self, task: AgentTask) -> TaskId {
        let id = task.id.clone();
        self.tasks.push(task);
        id
    }

    pub fn task(&self, id: &TaskId) -> Option<&AgentTask> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn task_mut(&mut self, id: &TaskId) -> Option<&mut AgentTask> {
        self.tasks.iter_mut().find(|t| &t.id == id)
    }

    pub fn add_component(&mut self, component: GeneratedComponent) {
        self.components.push(component);
    }

    pub fn record_output(&mut self, step: PhaseStep, output: Value) {
        self.outputs.insert(step, output);
    }

    pub fn output(&self, step: PhaseStep) -> Option<&Value> {
        self.outputs.get(&step)
    }

    pub fn status_report(&self, now: DateTime<Utc>) -> GenerationStatusReport {
        GenerationStatusReport {
            request_id: self.id.clone(),
            status: self.status,
            progress: self.progress,
            current_step: self.current_step.clone(),
            components_generated: self.components.len(),
            total_components: self.tasks.len(),
            estimated_time_remaining: self.estimated_time_remaining(now),
            tasks: self.tasks.clone(),
            error: self.error.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Detailed status exposed to status queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationStatusReport {
    pub request_id: RequestId,
    pub status: GenerationStatus,
    pub progress: u8,
    pub current_step: String,
    pub components_generated: usize,
    /// Number of agent tasks recorded so far
    pub total_components: usize,
    /// Seconds; absent while progress is zero
    pub estimated_time_remaining: Option<u64>,
    pub tasks: Vec<AgentTask>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
