//! Persistence sink port
//!
//! The pipeline does not own storage. It hands request snapshots and tasks
//! to this sink at phase boundaries and reads rating history from it.
//! Failures are logged by the caller and never abort a running request.

use appforge_domain::{AgentTask, GenerationRequest, Model, RequestId};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistenceError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

#[async_trait]
pub trait PersistenceSink: Send + Sync {
    async fn save_request_snapshot(&self, request: &GenerationRequest)
    -> Result<(), PersistenceError>;

    async fn save_task(&self, request_id: &RequestId, task: &AgentTask)
    -> Result<(), PersistenceError>;

    /// Historical user ratings of answers produced by `model`
    async fn load_ratings(&self, model: &Model) -> Result<Vec<f64>, PersistenceError>;
}

/// Sink that stores nothing and has no rating history
pub struct NoPersistence;

#[async_trait]
impl PersistenceSink for NoPersistence {
    async fn save_request_snapshot(
        &self,
        _request: &GenerationRequest,
    ) -> Result<(), PersistenceError> {
        Ok(())
    }

    async fn save_task(
        &self,
        _request_id: &RequestId,
        _task: &AgentTask,
    ) -> Result<(), PersistenceError> {
        Ok(())
    }

    async fn load_ratings(&self, _model: &Model) -> Result<Vec<f64>, PersistenceError> {
        Ok(Vec::new())
    }
}
