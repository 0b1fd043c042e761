//! Run Generation use case
//!
//! Drives a generation request through the phase state machine:
//! analysis → design → component generation → security → testing →
//! optimization → QA → deployment prep → completion.
//!
//! Phases run strictly in sequence. Component generation fans out to the
//! frontend, backend and database roles and joins all three before the
//! phase is judged. Any phase failure moves the request to FAILED with the
//! error text recorded; earlier results stay inspectable.

use crate::config::PipelineParams;
use crate::ports::persistence::{NoPersistence, PersistenceSink};
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::provider_gateway::ProviderGateway;
use crate::services::{DispatchTask, ModelDispatcher};
use appforge_domain::{
    AgentResponse, AgentRole, AgentTask, AggregatedResponse, AggregationStatus, ComponentKind, DomainError,
    GeneratedComponent, GenerationRequest, GenerationStatusReport, PhasePromptTemplate, PhaseStep,
    RequestId, ResponseAggregator, TaskId,
};
use chrono::Utc;
use futures::future::join_all;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Why a phase could not produce a usable result
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhaseFailure {
    #[error("{step}: every model call failed for {role}: {errors}")]
    AllResponsesFailed {
        step: PhaseStep,
        role: AgentRole,
        errors: String,
    },

    #[error("{step}: no responses for {role}")]
    NoResponses { step: PhaseStep, role: AgentRole },

    #[error("{step}: confidence {confidence:.2} for {role} is below the acceptance threshold")]
    LowConfidence {
        step: PhaseStep,
        role: AgentRole,
        confidence: f64,
    },

    #[error("{step}: {message}")]
    Aggregation { step: PhaseStep, message: String },
}

/// Errors returned to callers of the orchestrator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestratorError {
    #[error("Generation request not found: {0}")]
    NotFound(RequestId),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Generation request {0} has already finished")]
    AlreadyTerminal(RequestId),
}

impl From<DomainError> for OrchestratorError {
    fn from(e: DomainError) -> Self {
        OrchestratorError::InvalidRequest(e.to_string())
    }
}

/// Input for the RunGeneration use case
#[derive(Debug, Clone)]
pub struct StartGenerationInput {
    pub user_id: String,
    pub prompt: String,
    pub tech_stack: Vec<String>,
    pub project_type: String,
}

impl StartGenerationInput {
    pub fn new(user_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            prompt: prompt.into(),
            tech_stack: Vec::new(),
            project_type: "web_app".to_string(),
        }
    }

    pub fn with_tech_stack(mut self, tech_stack: Vec<String>) -> Self {
        self.tech_stack = tech_stack;
        self
    }

    pub fn with_project_type(mut self, project_type: impl Into<String>) -> Self {
        self.project_type = project_type.into();
        self
    }
}

struct RequestEntry {
    request: GenerationRequest,
    cancel: CancellationToken,
    driving: bool,
}

/// Use case driving generation requests
///
/// Holds every request it has accepted. Each request is driven by one task;
/// different requests share only the dispatcher's weights and breaker state.
pub struct RunGenerationUseCase<G: ProviderGateway + 'static> {
    dispatcher: ModelDispatcher<G>,
    aggregator: ResponseAggregator,
    params: PipelineParams,
    persistence: Arc<dyn PersistenceSink>,
    requests: Mutex<HashMap<RequestId, RequestEntry>>,
}

impl<G: ProviderGateway + 'static> RunGenerationUseCase<G> {
    pub fn new(dispatcher: ModelDispatcher<G>, params: PipelineParams) -> Self {
        Self {
            dispatcher,
            aggregator: ResponseAggregator::new(params.aggregation.clone()),
            params,
            persistence: Arc::new(NoPersistence),
            requests: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_persistence(mut self, persistence: Arc<dyn PersistenceSink>) -> Self {
        self.persistence = persistence;
        self
    }

    pub fn dispatcher(&self) -> &ModelDispatcher<G> {
        &self.dispatcher
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RequestId, RequestEntry>> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` against the stored request
    fn with_request<R>(
        &self,
        id: &RequestId,
        f: impl FnOnce(&mut GenerationRequest) -> R,
    ) -> Result<R, OrchestratorError> {
        let mut requests = self.lock();
        let entry = requests
            .get_mut(id)
            .ok_or_else(|| OrchestratorError::NotFound(id.clone()))?;
        Ok(f(&mut entry.request))
    }

    // ==================== Public API ====================

    /// Register a new request in PENDING state without driving it
    pub fn submit(&self, input: StartGenerationInput) -> Result<RequestId, OrchestratorError> {
        let request = GenerationRequest::new(
            input.user_id,
            input.prompt,
            input.tech_stack,
            input.project_type,
        )?;
        let id = request.id().clone();
        info!(request_id = %id, "Generation request accepted");

        self.lock().insert(
            id.clone(),
            RequestEntry {
                request,
                cancel: CancellationToken::new(),
                driving: false,
            },
        );
        Ok(id)
    }

    /// Accept a request and drive it on a background task
    pub fn start(
        self: &Arc<Self>,
        input: StartGenerationInput,
        progress: Arc<dyn ProgressNotifier>,
    ) -> Result<RequestId, OrchestratorError> {
        let id = self.submit(input)?;

        let this = Arc::clone(self);
        let request_id = id.clone();
        tokio::spawn(async move {
            if let Err(e) = this.drive(&request_id, progress.as_ref()).await {
                warn!(request_id = %request_id, error = %e, "Generation task ended with error");
            }
        });

        Ok(id)
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(
        &self,
        input: StartGenerationInput,
    ) -> Result<GenerationStatusReport, OrchestratorError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        input: StartGenerationInput,
        progress: &dyn ProgressNotifier,
    ) -> Result<GenerationStatusReport, OrchestratorError> {
        let id = self.submit(input)?;
        self.drive(&id, progress).await
    }

    /// Detailed status of a request
    pub fn status(&self, id: &RequestId) -> Result<GenerationStatusReport, OrchestratorError> {
        self.with_request(id, |r| r.status_report(Utc::now()))
    }

    /// Full copy of a request, including phase outputs
    pub fn snapshot(&self, id: &RequestId) -> Option<GenerationRequest> {
        self.lock().get(id).map(|e| e.request.clone())
    }

    /// Mark a request FAILED on behalf of an external caller.
    ///
    /// Calls already in flight are allowed to finish; their results are
    /// discarded when they return.
    pub fn cancel(&self, id: &RequestId, reason: &str) -> Result<(), OrchestratorError> {
        let mut requests = self.lock();
        let entry = requests
            .get_mut(id)
            .ok_or_else(|| OrchestratorError::NotFound(id.clone()))?;

        entry
            .request
            .fail(format!("Cancelled: {}", reason), Utc::now())
            .map_err(|_| OrchestratorError::AlreadyTerminal(id.clone()))?;
        entry.cancel.cancel();
        info!(request_id = %id, reason, "Generation request cancelled");
        Ok(())
    }

    /// Reload rating history and recompute model weights
    pub async fn refresh_weights(&self) {
        let models: Vec<_> = self.dispatcher.registry().models().collect();
        self.dispatcher
            .scorer()
            .refresh(self.persistence.as_ref(), models)
            .await;
    }

    // ==================== Pipeline ====================

    /// Drive a PENDING request through every phase to a terminal state
    pub async fn drive(
        &self,
        id: &RequestId,
        progress: &dyn ProgressNotifier,
    ) -> Result<GenerationStatusReport, OrchestratorError> {
        let cancel = {
            let mut requests = self.lock();
            let entry = requests
                .get_mut(id)
                .ok_or_else(|| OrchestratorError::NotFound(id.clone()))?;
            if entry.request.is_terminal() {
                return Err(OrchestratorError::AlreadyTerminal(id.clone()));
            }
            if entry.driving {
                return Err(OrchestratorError::InvalidRequest(format!(
                    "request {} is already being driven",
                    id
                )));
            }
            entry.driving = true;
            entry.cancel.clone()
        };

        info!(request_id = %id, "Starting generation pipeline");

        for step in PhaseStep::ALL {
            if cancel.is_cancelled() {
                debug!(request_id = %id, "Cancelled; stopping before {}", step);
                break;
            }

            let checkpoint = self.params.checkpoints.for_step(step);
            let entered = self.with_request(id, |r| r.advance(step, checkpoint, Utc::now()))?;
            if let Err(e) = entered {
                debug!(request_id = %id, error = %e, "Request no longer active");
                break;
            }
            info!(request_id = %id, progress = checkpoint, "Phase: {}", step);
            self.persist_snapshot(id).await;

            if step == PhaseStep::Completion {
                progress.on_finished(true, step.label());
                break;
            }

            progress.on_phase_start(step, checkpoint, step.roles().len());
            let result = self.run_phase(id, step, progress).await;

            if cancel.is_cancelled() {
                debug!(request_id = %id, "Discarding results of {} after cancellation", step);
                break;
            }

            match result {
                Ok(confidence) => progress.on_phase_complete(step, confidence),
                Err(failure) => {
                    warn!(request_id = %id, error = %failure, "Phase failed");
                    let message = failure.to_string();
                    let _ = self.with_request(id, |r| r.fail(message.clone(), Utc::now()))?;
                    self.persist_snapshot(id).await;
                    progress.on_finished(false, &message);
                    break;
                }
            }
        }

        let report = self.status(id)?;
        info!(
            request_id = %id,
            status = %report.status,
            progress = report.progress,
            "Generation pipeline finished"
        );
        Ok(report)
    }

    /// Run one phase; returns its aggregate confidence
    async fn run_phase(
        &self,
        id: &RequestId,
        step: PhaseStep,
        progress: &dyn ProgressNotifier,
    ) -> Result<f64, PhaseFailure> {
        let roles = step.roles();

        // Siblings run concurrently; every branch records its task before
        // the phase outcome is evaluated.
        let branches = join_all(
            roles
                .iter()
                .map(|role| self.run_role(id, step, *role, progress)),
        )
        .await;

        let mut merged = serde_json::Map::new();
        let mut components = Vec::new();
        let mut confidences = Vec::new();
        for (role, branch) in roles.iter().zip(branches) {
            let aggregated = branch?;
            confidences.push(aggregated.confidence_score);
            if let Some(kind) = ComponentKind::from_role(*role) {
                components.push(GeneratedComponent {
                    kind,
                    content: aggregated.combined_result.clone(),
                    contributors: aggregated
                        .successful_responses()
                        .map(|r| r.agent_id.clone())
                        .collect(),
                    confidence: aggregated.confidence_score,
                });
            }
            merged.insert(role.as_str().to_string(), aggregated.combined_result);
        }

        let output = if roles.len() == 1 {
            merged.into_iter().next().map(|(_, v)| v).unwrap_or(Value::Null)
        } else {
            Value::Object(merged)
        };

        // Results of a cancelled request are not recorded
        let _ = self.with_request(id, |r| {
            if r.is_terminal() {
                return;
            }
            r.record_output(step, output);
            for component in components {
                r.add_component(component);
            }
        });

        let confidence = if confidences.is_empty() {
            0.0
        } else {
            confidences.iter().sum::<f64>() / confidences.len() as f64
        };
        Ok(confidence)
    }

    /// Run one role: record its task, dispatch, aggregate, finish the task
    async fn run_role(
        &self,
        id: &RequestId,
        step: PhaseStep,
        role: AgentRole,
        progress: &dyn ProgressNotifier,
    ) -> Result<AggregatedResponse, PhaseFailure> {
        let prepared = self.with_request(id, |request| {
            let description = PhasePromptTemplate::task_description(role, request);
            let prompt = PhasePromptTemplate::user(role, request);
            let models = self.dispatcher.select(&description);

            let mut task = AgentTask::new(
                role,
                description.clone(),
                json!({ "step": step.as_str(), "prompt": prompt }),
            )
            .with_models(models.clone());
            task.mark_running(Utc::now());
            let task_id = request.push_task(task);

            let dispatch = DispatchTask::new(role, description, prompt)
                .with_system_prompt(PhasePromptTemplate::system(role));
            (task_id, models, dispatch)
        });
        let (task_id, models, dispatch) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                return Err(PhaseFailure::Aggregation {
                    step,
                    message: e.to_string(),
                });
            }
        };
        self.persist_task(id, &task_id).await;

        let outcome = self.dispatcher.dispatch_to(models, &dispatch).await;
        let result = self.judge(id, step, role, outcome.responses);

        let _ = self.with_request(id, |request| {
            let discarded = request.is_terminal();
            if let Some(task) = request.task_mut(&task_id) {
                let now = Utc::now();
                match &result {
                    _ if discarded => task.fail("discarded: request no longer active", now),
                    Ok(aggregated) => task.complete(aggregated.combined_result.clone(), now),
                    Err(failure) => task.fail(failure.to_string(), now),
                }
            }
        });
        self.persist_task(id, &task_id).await;

        progress.on_task_complete(step, role, result.is_ok());
        result
    }

    /// Aggregate one role's responses and decide whether they are usable
    fn judge(
        &self,
        id: &RequestId,
        step: PhaseStep,
        role: AgentRole,
        responses: Vec<AgentResponse>,
    ) -> Result<AggregatedResponse, PhaseFailure> {
        if responses.is_empty() {
            return Err(PhaseFailure::NoResponses { step, role });
        }
        if responses.iter().all(|r| r.is_error()) {
            let errors = responses
                .iter()
                .filter_map(|r| r.text().map(|t| format!("{}: {}", r.agent_id, t)))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(PhaseFailure::AllResponsesFailed { step, role, errors });
        }

        let aggregated = self
            .aggregator
            .aggregate(id.as_str(), responses, self.params.strategy)
            .map_err(|e| match e {
                DomainError::NoResponses => PhaseFailure::NoResponses { step, role },
                other => PhaseFailure::Aggregation {
                    step,
                    message: other.to_string(),
                },
            })?;

        debug!(
            request_id = %id,
            role = %role,
            confidence = aggregated.confidence_score,
            "{}",
            aggregated.summary
        );

        if aggregated.status == AggregationStatus::Failed {
            if self.params.halt_on_low_confidence {
                return Err(PhaseFailure::LowConfidence {
                    step,
                    role,
                    confidence: aggregated.confidence_score,
                });
            }
            warn!(
                request_id = %id,
                role = %role,
                confidence = aggregated.confidence_score,
                "Low-confidence aggregation; continuing"
            );
        }

        Ok(aggregated)
    }

    // ==================== Persistence ====================

    async fn persist_snapshot(&self, id: &RequestId) {
        let Some(snapshot) = self.snapshot(id) else {
            return;
        };
        if let Err(e) = self.persistence.save_request_snapshot(&snapshot).await {
            warn!(request_id = %id, error = %e, "Failed to persist request snapshot");
        }
    }

    async fn persist_task(&self, id: &RequestId, task_id: &TaskId) {
        let task = self
            .with_request(id, |r| r.task(task_id).cloned())
            .ok()
            .flatten();
        let Some(task) = task else {
            return;
        };
        if let Err(e) = self.persistence.save_task(id, &task).await {
            warn!(request_id = %id, task_id = %task_id, error = %e, "Failed to persist task");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::persistence::PersistenceError;
    use crate::ports::provider_gateway::{GatewayError, ProviderReply, ProviderRequest};
    use crate::services::{DispatchPolicy, FeedbackScorer, RetryController};
    use appforge_domain::{GenerationStatus, Model, ModelRegistry, RetryPolicy, TaskStatus};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::{Notify, Semaphore};

    // ==================== Test doubles ====================

    /// Answers every call with fixed content, optionally failing one role
    struct EchoGateway {
        content: String,
        fail_for: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl EchoGateway {
        fn new(content: &str) -> Self {
            Self {
                content: content.to_string(),
                fail_for: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing_for(mut self, role_name: &'static str) -> Self {
            self.fail_for = Some(role_name);
            self
        }
    }

    #[async_trait]
    impl ProviderGateway for EchoGateway {
        async fn invoke(
            &self,
            _model: &Model,
            request: &ProviderRequest,
        ) -> Result<ProviderReply, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let system = request.system_prompt.as_deref().unwrap_or_default();
            if self.fail_for.is_some_and(|role| system.contains(role)) {
                return Err(GatewayError::RequestFailed("provider exploded".into()));
            }
            Ok(ProviderReply {
                content: self.content.clone(),
                prompt_tokens: 10,
                completion_tokens: 20,
                finish_reason: "stop".into(),
            })
        }
    }

    /// Blocks every call until permits are added
    struct GatedGateway {
        entered: Notify,
        gate: Semaphore,
    }

    #[async_trait]
    impl ProviderGateway for GatedGateway {
        async fn invoke(
            &self,
            _model: &Model,
            _request: &ProviderRequest,
        ) -> Result<ProviderReply, GatewayError> {
            self.entered.notify_one();
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| GatewayError::Other(e.to_string()))?;
            Ok(ProviderReply {
                content: "late answer".into(),
                prompt_tokens: 1,
                completion_tokens: 1,
                finish_reason: "stop".into(),
            })
        }
    }

    struct FailingPersistence;

    #[async_trait]
    impl PersistenceSink for FailingPersistence {
        async fn save_request_snapshot(
            &self,
            _request: &GenerationRequest,
        ) -> Result<(), PersistenceError> {
            Err(PersistenceError::Storage("database unreachable".into()))
        }

        async fn save_task(
            &self,
            _request_id: &RequestId,
            _task: &AgentTask,
        ) -> Result<(), PersistenceError> {
            Err(PersistenceError::Storage("database unreachable".into()))
        }

        async fn load_ratings(&self, _model: &Model) -> Result<Vec<f64>, PersistenceError> {
            Err(PersistenceError::Storage("database unreachable".into()))
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        starts: Mutex<Vec<(PhaseStep, u8)>>,
        tasks: Mutex<Vec<(AgentRole, bool)>>,
        finished: Mutex<Option<bool>>,
    }

    impl ProgressNotifier for RecordingProgress {
        fn on_phase_start(&self, step: PhaseStep, progress: u8, _total_tasks: usize) {
            self.starts.lock().unwrap().push((step, progress));
        }

        fn on_task_complete(&self, _step: PhaseStep, role: AgentRole, success: bool) {
            self.tasks.lock().unwrap().push((role, success));
        }

        fn on_phase_complete(&self, _step: PhaseStep, _confidence: f64) {}

        fn on_finished(&self, success: bool, _message: &str) {
            *self.finished.lock().unwrap() = Some(success);
        }
    }

    fn use_case<G: ProviderGateway + 'static>(
        gateway: Arc<G>,
        params: PipelineParams,
    ) -> RunGenerationUseCase<G> {
        let dispatcher = ModelDispatcher::new(
            gateway,
            Arc::new(ModelRegistry::with_defaults()),
            Arc::new(FeedbackScorer::default()),
            Arc::new(RetryController::default()),
        )
        .with_policy(DispatchPolicy::default().with_retry(RetryPolicy::no_retry()));
        RunGenerationUseCase::new(dispatcher, params)
    }

    fn input() -> StartGenerationInput {
        StartGenerationInput::new("user-1", "build a habit tracker")
            .with_tech_stack(vec!["react".into(), "fastapi".into()])
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_full_pipeline_completes() {
        let gateway = Arc::new(EchoGateway::new("Plan the work. Build it."));
        let use_case = use_case(Arc::clone(&gateway), PipelineParams::default());

        let report = use_case.execute(input()).await.unwrap();

        assert_eq!(report.status, GenerationStatus::Completed);
        assert_eq!(report.progress, 100);
        assert_eq!(report.current_step, "Generation completed");
        assert_eq!(report.components_generated, 3);
        // analysis, design, 3 components, security, testing, optimization, QA, deployment
        assert_eq!(report.total_components, 10);
        assert_eq!(report.estimated_time_remaining, Some(0));
        assert!(report.tasks.iter().all(|t| t.status == TaskStatus::Completed));
        assert!(
            report
                .tasks
                .iter()
                .all(|t| t.completed_at.unwrap() >= t.started_at.unwrap())
        );
        // top-2 selection for every task
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 20);

        let request = use_case.snapshot(&report.request_id).unwrap();
        assert!(request.output(PhaseStep::Design).is_some());
        assert!(request.output(PhaseStep::DeploymentPrep).is_some());
    }

    #[tokio::test]
    async fn test_progress_follows_checkpoints() {
        let use_case = use_case(Arc::new(EchoGateway::new("ok.")), PipelineParams::default());
        let progress = RecordingProgress::default();

        use_case.execute_with_progress(input(), &progress).await.unwrap();

        let starts = progress.starts.lock().unwrap();
        let values: Vec<u8> = starts.iter().map(|(_, p)| *p).collect();
        assert_eq!(values, vec![10, 20, 40, 60, 70, 80, 90, 95]);
        assert_eq!(*progress.finished.lock().unwrap(), Some(true));
    }

    #[tokio::test]
    async fn test_all_models_failing_fails_request() {
        let gateway = Arc::new(EchoGateway::new("x").failing_for("Requirements Analyst"));
        let use_case = use_case(gateway, PipelineParams::default());
        let progress = RecordingProgress::default();

        let report = use_case.execute_with_progress(input(), &progress).await.unwrap();

        assert_eq!(report.status, GenerationStatus::Failed);
        assert_eq!(report.progress, 10);
        let error = report.error.unwrap();
        assert!(error.contains("every model call failed"), "{error}");
        assert_eq!(report.tasks.len(), 1);
        assert_eq!(report.tasks[0].status, TaskStatus::Failed);
        assert_eq!(*progress.finished.lock().unwrap(), Some(false));

        let err = use_case.drive(&report.request_id, &NoProgress).await.unwrap_err();
        assert_eq!(err, OrchestratorError::AlreadyTerminal(report.request_id));
    }

    #[tokio::test]
    async fn test_one_failed_branch_fails_component_phase() {
        let gateway = Arc::new(EchoGateway::new("code").failing_for("Database Designer"));
        let use_case = use_case(gateway, PipelineParams::default());
        let progress = RecordingProgress::default();

        let report = use_case.execute_with_progress(input(), &progress).await.unwrap();

        assert_eq!(report.status, GenerationStatus::Failed);
        assert_eq!(report.progress, 40);
        // every sibling task is recorded and terminal
        assert_eq!(report.total_components, 5);
        assert!(report.tasks.iter().all(|t| t.status.is_terminal()));
        let failed: Vec<_> = report
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Failed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].role, AgentRole::DatabaseDesigner);

        // no components recorded for a failed phase
        assert_eq!(report.components_generated, 0);
        let tasks = progress.tasks.lock().unwrap();
        assert!(tasks.contains(&(AgentRole::FrontendDeveloper, true)));
        assert!(tasks.contains(&(AgentRole::DatabaseDesigner, false)));
    }

    #[tokio::test]
    async fn test_low_confidence_continues_by_default() {
        let use_case = use_case(Arc::new(EchoGateway::new("")), PipelineParams::default());
        let report = use_case.execute(input()).await.unwrap();
        assert_eq!(report.status, GenerationStatus::Completed);
    }

    #[tokio::test]
    async fn test_low_confidence_halts_when_configured() {
        let params = PipelineParams::default().with_halt_on_low_confidence(true);
        let use_case = use_case(Arc::new(EchoGateway::new("")), params);

        let report = use_case.execute(input()).await.unwrap();

        assert_eq!(report.status, GenerationStatus::Failed);
        assert!(report.error.unwrap().contains("below the acceptance threshold"));
    }

    #[tokio::test]
    async fn test_persistence_failures_are_not_fatal() {
        let use_case = use_case(Arc::new(EchoGateway::new("fine.")), PipelineParams::default())
            .with_persistence(Arc::new(FailingPersistence));

        use_case.refresh_weights().await;
        let report = use_case.execute(input()).await.unwrap();

        assert_eq!(report.status, GenerationStatus::Completed);
    }

    #[tokio::test]
    async fn test_unknown_request_not_found() {
        let use_case = use_case(Arc::new(EchoGateway::new("x")), PipelineParams::default());
        let id = RequestId::new("missing");

        assert_eq!(
            use_case.status(&id).unwrap_err(),
            OrchestratorError::NotFound(id.clone())
        );
        assert!(use_case.cancel(&id, "nope").is_err());
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected() {
        let use_case = use_case(Arc::new(EchoGateway::new("x")), PipelineParams::default());
        let err = use_case
            .execute(StartGenerationInput::new("user", "  "))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_submitted_request_is_pending() {
        let use_case = use_case(Arc::new(EchoGateway::new("x")), PipelineParams::default());
        let id = use_case.submit(input()).unwrap();

        let report = use_case.status(&id).unwrap();
        assert_eq!(report.status, GenerationStatus::Pending);
        assert_eq!(report.progress, 0);
        assert_eq!(report.estimated_time_remaining, None);
    }

    #[tokio::test]
    async fn test_cancel_discards_in_flight_results() {
        let gateway = Arc::new(GatedGateway {
            entered: Notify::new(),
            gate: Semaphore::new(0),
        });
        let use_case = Arc::new(use_case(Arc::clone(&gateway), PipelineParams::default()));

        let id = use_case.start(input(), Arc::new(NoProgress)).unwrap();
        gateway.entered.notified().await;

        use_case.cancel(&id, "user abort").unwrap();
        let report = use_case.status(&id).unwrap();
        assert_eq!(report.status, GenerationStatus::Failed);
        assert_eq!(report.progress, 10);
        assert_eq!(report.error.as_deref(), Some("Cancelled: user abort"));

        // Let the in-flight calls finish
        gateway.gate.add_permits(10);
        for _ in 0..200 {
            let report = use_case.status(&id).unwrap();
            if report.tasks.iter().all(|t| t.status.is_terminal()) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let request = use_case.snapshot(&id).unwrap();
        assert_eq!(request.status(), GenerationStatus::Failed);
        assert_eq!(request.progress(), 10);
        assert!(request.output(PhaseStep::Analysis).is_none());
        assert_eq!(request.tasks().len(), 1);
        assert_eq!(request.tasks()[0].status, TaskStatus::Failed);

        assert_eq!(
            use_case.cancel(&id, "again").unwrap_err(),
            OrchestratorError::AlreadyTerminal(id)
        );
    }
}
