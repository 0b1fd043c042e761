//! Agent tasks and generated components

use super::value_objects::{TaskId, TaskStatus};
use crate::agent::AgentRole;
use crate::core::model::Model;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One unit of agent work inside a request.
///
/// Tasks are append-only on their request: they are updated in place but
/// never removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTask {
    pub id: TaskId,
    pub role: AgentRole,
    /// Models selected to run the task
    pub models: Vec<Model>,
    pub description: String,
    pub input: Value,
    pub output: Option<Value>,
    pub status: TaskStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl AgentTask {
    pub fn new(role: AgentRole, description: impl Into<String>, input: Value) -> Self {
        Self {
            id: TaskId::generate(),
            role,
            models: Vec::new(),
            description: description.into(),
            input,
            output: None,
            status: TaskStatus::Pending,
            started_at: None,
            completed_at: None,
            error: None,
        }
    }

    pub fn with_models(mut self, models: Vec<Model>) -> Self {
        self.models = models;
        self
    }

    pub fn mark_running(&mut self, now: DateTime<Utc>) {
        self.status = TaskStatus::Running;
        self.started_at = Some(now);
    }

    pub fn complete(&mut self, output: Value, now: DateTime<Utc>) {
        self.output = Some(output);
        self.finish(TaskStatus::Completed, now);
    }

    pub fn fail(&mut self, error: impl Into<String>, now: DateTime<Utc>) {
        self.error = Some(error.into());
        self.finish(TaskStatus::Failed, now);
    }

    fn finish(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        let started = *self.started_at.get_or_insert(now);
        self.status = status;
        // completed_at never precedes started_at
        self.completed_at = Some(now.max(started));
    }

    /// Wall-clock time between start and completion
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.completed_at? - self.started_at?)
    }
}

/// Which layer of the application a component belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Frontend,
    Backend,
    Database,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Frontend => "frontend",
            ComponentKind::Backend => "backend",
            ComponentKind::Database => "database",
        }
    }

    pub fn role(&self) -> AgentRole {
        match self {
            ComponentKind::Frontend => AgentRole::FrontendDeveloper,
            ComponentKind::Backend => AgentRole::BackendDeveloper,
            ComponentKind::Database => AgentRole::DatabaseDesigner,
        }
    }

    pub fn from_role(role: AgentRole) -> Option<Self> {
        match role {
            AgentRole::FrontendDeveloper => Some(ComponentKind::Frontend),
            AgentRole::BackendDeveloper => Some(ComponentKind::Backend),
            AgentRole::DatabaseDesigner => Some(ComponentKind::Database),
            _ => None,
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output of one component-generation branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedComponent {
    pub kind: ComponentKind,
    pub content: Value,
    /// Agent ids that contributed to the content
    pub contributors: Vec<String>,
    pub confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_task_lifecycle() {
        let start = Utc::now();
        let mut task = AgentTask::new(AgentRole::TestingEngineer, "write tests", json!({}));
        assert_eq!(task.status, TaskStatus::Pending);

        task.mark_running(start);
        assert_eq!(task.status, TaskStatus::Running);

        task.complete(json!({"tests": 3}), start + Duration::seconds(2));
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.duration(), Some(Duration::seconds(2)));
    }

    #[test]
    fn test_completed_at_never_precedes_start() {
        let start = Utc::now();
        let mut task = AgentTask::new(AgentRole::SecuritySpecialist, "audit", json!(null));
        task.mark_running(start);
        task.fail("provider down", start - Duration::seconds(5));

        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.completed_at.unwrap() >= task.started_at.unwrap());
        assert_eq!(task.error.as_deref(), Some("provider down"));
    }

    #[test]
    fn test_finish_without_start_sets_start() {
        let now = Utc::now();
        let mut task = AgentTask::new(AgentRole::QualityAssurance, "review", json!(null));
        task.complete(json!("ok"), now);
        assert_eq!(task.started_at, Some(now));
        assert_eq!(task.completed_at, Some(now));
    }

    #[test]
    fn test_component_kind_roles() {
        for kind in [
            ComponentKind::Frontend,
            ComponentKind::Backend,
            ComponentKind::Database,
        ] {
            assert_eq!(ComponentKind::from_role(kind.role()), Some(kind));
        }
        assert_eq!(ComponentKind::from_role(AgentRole::TestingEngineer), None);
    }
}
