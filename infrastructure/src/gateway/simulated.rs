//! Offline provider gateway
//!
//! Produces deterministic, role-appropriate answers without network access.
//! The role is recovered from the system prompt, so the same request always
//! yields the same content. Failures can be scripted per model to exercise
//! retries and circuit breaking.

use appforge_application::{GatewayError, ProviderGateway, ProviderReply, ProviderRequest};
use appforge_domain::{AgentRole, Model};
use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::debug;

/// Rough characters-per-token ratio used for token accounting
const CHARS_PER_TOKEN: usize = 4;

#[derive(Debug, Default)]
pub struct SimulatedGateway {
    /// Remaining scripted failures per model
    failures: Mutex<HashMap<Model, u32>>,
    unavailable: HashSet<Model>,
    latency: Option<Duration>,
    calls: AtomicU32,
}

impl SimulatedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` calls to `model` with a retryable error
    pub fn with_failures(self, model: Model, count: u32) -> Self {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(model, count);
        }
        self
    }

    /// Reject every call to `model` as not available (not retryable)
    pub fn with_unavailable(mut self, model: Model) -> Self {
        self.unavailable.insert(model);
        self
    }

    /// Sleep before answering each call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Total calls received, including failed ones
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn take_failure(&self, model: &Model) -> bool {
        let Ok(mut failures) = self.failures.lock() else {
            return false;
        };
        match failures.get_mut(model) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }

    fn detect_role(system_prompt: Option<&str>) -> AgentRole {
        let Some(system) = system_prompt else {
            return AgentRole::Generalist;
        };
        AgentRole::ALL
            .into_iter()
            .find(|role| system.contains(role.display_name()))
            .unwrap_or(AgentRole::Generalist)
    }

    /// The user's request, taken from the first section of the prompt
    fn subject(prompt: &str) -> String {
        let body = prompt
            .strip_prefix("## Request")
            .map(str::trim_start)
            .unwrap_or(prompt);
        let line = body.lines().next().unwrap_or_default().trim();
        if line.is_empty() {
            "the application".to_string()
        } else {
            line.to_string()
        }
    }

    fn answer(role: AgentRole, subject: &str) -> String {
        match role {
            AgentRole::RequirementsAnalyst => format!(
                "Users must be able to sign in and manage their data for {subject}. \
                 The system must expose a REST API. \
                 Pages must load in under two seconds. \
                 All personal data must be stored encrypted."
            ),
            AgentRole::ArchitectureDesigner => format!(
                "Use a three tier architecture for {subject}. \
                 The frontend is a single page application talking to a REST API. \
                 The backend is a stateless service behind a load balancer. \
                 PostgreSQL stores all persistent data."
            ),
            AgentRole::SecuritySpecialist => format!(
                "Hash passwords with argon2 in {subject}. \
                 Validate every request body on the server. \
                 Issue short-lived session tokens and rotate them on login."
            ),
            AgentRole::QualityAssurance => format!(
                "The generated components for {subject} cover the stated requirements. \
                 Error handling is consistent across the API. \
                 No blocking defects remain."
            ),
            AgentRole::DeploymentEngineer => json!({
                "build": ["npm ci", "npm run build", "cargo build --release"],
                "environment": {"DATABASE_URL": "postgres://app@db/app", "PORT": "8080"},
                "hosting": "container",
            })
            .to_string(),
            AgentRole::FrontendDeveloper => Self::code_answer(json!({
                "src/App.tsx": format!("export default function App() {{ return <main>{subject}</main>; }}"),
                "src/api.ts": "export const api = (path: string) => fetch(`/api${path}`).then(r => r.json());",
            })),
            AgentRole::BackendDeveloper => Self::code_answer(json!({
                "src/main.rs": "fn main() { server::run(\"0.0.0.0:8080\"); }",
                "src/routes.rs": format!("// routes for {subject}\npub fn routes() -> Router {{ Router::new() }}"),
            })),
            AgentRole::DatabaseDesigner => Self::code_answer(json!({
                "migrations/001_init.sql": "CREATE TABLE users (id SERIAL PRIMARY KEY, email TEXT UNIQUE NOT NULL);",
            })),
            AgentRole::TestingEngineer => Self::code_answer(json!({
                "tests/api.rs": "#[test]\nfn health_check_returns_ok() { assert_eq!(health(), 200); }",
            })),
            AgentRole::PerformanceOptimizer => Self::code_answer(json!({
                "migrations/002_indexes.sql": "CREATE INDEX users_email_idx ON users (email);",
            })),
            AgentRole::Generalist => format!("Here is a plan for {subject}."),
        }
    }

    fn code_answer(files: serde_json::Value) -> String {
        let body = serde_json::to_string_pretty(&files).unwrap_or_else(|_| files.to_string());
        format!("```json\n{}\n```", body)
    }

    fn tokens(text: &str) -> u32 {
        let count = text.chars().count().div_ceil(CHARS_PER_TOKEN);
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

#[async_trait]
impl ProviderGateway for SimulatedGateway {
    async fn invoke(
        &self,
        model: &Model,
        request: &ProviderRequest,
    ) -> Result<ProviderReply, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.unavailable.contains(model) {
            return Err(GatewayError::ModelNotAvailable(model.to_string()));
        }
        if self.take_failure(model) {
            debug!(model = %model, "Simulated provider failure");
            return Err(GatewayError::ConnectionError(format!(
                "simulated outage for {}",
                model
            )));
        }

        let role = Self::detect_role(request.system_prompt.as_deref());
        let content = Self::answer(role, &Self::subject(&request.prompt));

        let prompt_tokens = Self::tokens(&request.prompt)
            + request.system_prompt.as_deref().map(Self::tokens).unwrap_or(0);
        let completion_tokens = Self::tokens(&content);
        let finish_reason = if completion_tokens > request.max_tokens {
            "length"
        } else {
            "stop"
        };

        Ok(ProviderReply {
            content,
            prompt_tokens,
            completion_tokens: completion_tokens.min(request.max_tokens),
            finish_reason: finish_reason.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::UsageLedger;
    use crate::persistence::InMemoryStore;
    use appforge_application::{
        FeedbackScorer, ModelDispatcher, PipelineParams, RetryController, RunGenerationUseCase,
        StartGenerationInput,
    };
    use appforge_domain::{
        CircuitBreakerPolicy, GenerationStatus, ModelRegistry, ModelWeights, PhasePromptTemplate,
        TaskStatus,
    };
    use std::sync::Arc;

    fn request_for(role: AgentRole) -> ProviderRequest {
        ProviderRequest::new("## Request\n\nA recipe sharing site\n\n## Project\n")
            .with_system_prompt(PhasePromptTemplate::system(role))
    }

    #[tokio::test]
    async fn test_answers_are_deterministic() {
        let gateway = SimulatedGateway::new();
        let request = request_for(AgentRole::RequirementsAnalyst);

        let first = gateway.invoke(&Model::Claude, &request).await.unwrap();
        let second = gateway.invoke(&Model::Gpt4, &request).await.unwrap();

        assert_eq!(first.content, second.content);
        assert!(first.content.contains("A recipe sharing site"));
        assert_eq!(first.finish_reason, "stop");
        assert!(first.prompt_tokens > 0);
        assert_eq!(gateway.calls(), 2);
    }

    #[tokio::test]
    async fn test_code_roles_answer_with_fenced_json() {
        let gateway = SimulatedGateway::new();
        let reply = gateway
            .invoke(&Model::Codex, &request_for(AgentRole::BackendDeveloper))
            .await
            .unwrap();

        let body = reply
            .content
            .strip_prefix("```json\n")
            .and_then(|s| s.strip_suffix("\n```"))
            .unwrap();
        let files: serde_json::Value = serde_json::from_str(body).unwrap();
        assert!(files.get("src/main.rs").is_some());
    }

    #[tokio::test]
    async fn test_scripted_failures_then_success() {
        let gateway = SimulatedGateway::new().with_failures(Model::Codex, 2);
        let request = request_for(AgentRole::TestingEngineer);

        for _ in 0..2 {
            let err = gateway.invoke(&Model::Codex, &request).await.unwrap_err();
            assert!(err.is_retryable());
        }
        assert!(gateway.invoke(&Model::Codex, &request).await.is_ok());
        assert!(gateway.invoke(&Model::Claude, &request).await.is_ok());
    }

    #[tokio::test]
    async fn test_unavailable_model() {
        let gateway = SimulatedGateway::new().with_unavailable(Model::Local);
        let err = gateway
            .invoke(&Model::Local, &request_for(AgentRole::Generalist))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ModelNotAvailable(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_truncation_reported() {
        let gateway = SimulatedGateway::new();
        let request = request_for(AgentRole::ArchitectureDesigner).with_max_tokens(5);
        let reply = gateway.invoke(&Model::Gpt4, &request).await.unwrap();
        assert!(reply.is_truncated());
        assert_eq!(reply.completion_tokens, 5);
    }

    fn use_case(
        gateway: Arc<SimulatedGateway>,
        ledger: Arc<UsageLedger>,
        store: Arc<InMemoryStore>,
    ) -> RunGenerationUseCase<SimulatedGateway> {
        let dispatcher = ModelDispatcher::new(
            gateway,
            Arc::new(ModelRegistry::with_defaults()),
            Arc::new(FeedbackScorer::new(ModelWeights::default())),
            Arc::new(RetryController::new(CircuitBreakerPolicy::default())),
        )
        .with_usage_sink(ledger);
        RunGenerationUseCase::new(dispatcher, PipelineParams::default()).with_persistence(store)
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_pipeline_completes_through_retries() {
        let gateway = Arc::new(SimulatedGateway::new().with_failures(Model::Codex, 2));
        let ledger = Arc::new(UsageLedger::new());
        let store = Arc::new(InMemoryStore::new());
        let use_case = use_case(gateway.clone(), ledger.clone(), store.clone());

        let report = use_case
            .execute(
                StartGenerationInput::new("user-1", "A recipe sharing site")
                    .with_tech_stack(vec!["react".to_string()]),
            )
            .await
            .unwrap();

        assert_eq!(report.status, GenerationStatus::Completed);
        assert_eq!(report.progress, 100);
        assert_eq!(report.components_generated, 3);
        assert_eq!(report.total_components, 10);
        assert!(report.tasks.iter().all(|t| t.status == TaskStatus::Completed));

        // Two models per task, plus the two scripted failures
        assert_eq!(ledger.total().calls, 20);
        assert_eq!(gateway.calls(), 22);

        let saved = store.request(&report.request_id).unwrap();
        assert_eq!(saved.status(), GenerationStatus::Completed);
        assert_eq!(store.tasks(&report.request_id).len(), 10);
    }

    #[tokio::test]
    async fn test_offline_pipeline_fails_when_no_model_answers() {
        let gateway = Arc::new(
            SimulatedGateway::new()
                .with_unavailable(Model::Claude)
                .with_unavailable(Model::Gpt4)
                .with_unavailable(Model::Codex),
        );
        let use_case = use_case(
            gateway,
            Arc::new(UsageLedger::new()),
            Arc::new(InMemoryStore::new()),
        );

        let report = use_case
            .execute(StartGenerationInput::new("user-1", "A recipe sharing site"))
            .await
            .unwrap();

        assert_eq!(report.status, GenerationStatus::Failed);
        assert_eq!(report.progress, 10);
        assert!(report.current_step.starts_with("Generation failed"));
        assert_eq!(report.tasks.len(), 1);
    }

    #[test]
    fn test_role_detection_falls_back_to_generalist() {
        assert_eq!(SimulatedGateway::detect_role(None), AgentRole::Generalist);
        assert_eq!(
            SimulatedGateway::detect_role(Some("You are the Database Designer of a team")),
            AgentRole::DatabaseDesigner
        );
    }
}
