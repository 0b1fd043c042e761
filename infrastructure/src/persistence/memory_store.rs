//! In-memory persistence sink
//!
//! Keeps the latest snapshot of every request, every task keyed by id, and
//! the rating history used to weight models. Used by the CLI and tests.

use appforge_application::{PersistenceError, PersistenceSink};
use appforge_domain::{AgentTask, GenerationRequest, Model, RequestId, TaskId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct StoreState {
    requests: HashMap<RequestId, GenerationRequest>,
    tasks: HashMap<RequestId, Vec<AgentTask>>,
    ratings: HashMap<Model, Vec<f64>>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with rating history
    pub fn with_ratings(ratings: impl IntoIterator<Item = (Model, Vec<f64>)>) -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.lock() {
            state.ratings.extend(ratings);
        }
        store
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, PersistenceError> {
        self.state
            .lock()
            .map_err(|_| PersistenceError::Storage("store lock poisoned".to_string()))
    }

    /// Record a user rating for an answer produced by `model`
    pub fn add_rating(&self, model: Model, rating: f64) -> Result<(), PersistenceError> {
        self.lock()?.ratings.entry(model).or_default().push(rating);
        Ok(())
    }

    /// Latest saved snapshot of a request
    pub fn request(&self, id: &RequestId) -> Option<GenerationRequest> {
        self.lock().ok()?.requests.get(id).cloned()
    }

    /// Saved tasks of a request, in first-save order
    pub fn tasks(&self, id: &RequestId) -> Vec<AgentTask> {
        self.lock()
            .ok()
            .and_then(|state| state.tasks.get(id).cloned())
            .unwrap_or_default()
    }

    pub fn task(&self, request_id: &RequestId, task_id: &TaskId) -> Option<AgentTask> {
        self.tasks(request_id)
            .into_iter()
            .find(|task| &task.id == task_id)
    }

    pub fn request_count(&self) -> usize {
        self.lock().map(|state| state.requests.len()).unwrap_or(0)
    }
}

#[async_trait]
impl PersistenceSink for InMemoryStore {
    async fn save_request_snapshot(
        &self,
        request: &GenerationRequest,
    ) -> Result<(), PersistenceError> {
        self.lock()?
            .requests
            .insert(request.id().clone(), request.clone());
        Ok(())
    }

    async fn save_task(
        &self,
        request_id: &RequestId,
        task: &AgentTask,
    ) -> Result<(), PersistenceError> {
        let mut state = self.lock()?;
        let tasks = state.tasks.entry(request_id.clone()).or_default();
        match tasks.iter_mut().find(|saved| saved.id == task.id) {
            Some(saved) => *saved = task.clone(),
            None => tasks.push(task.clone()),
        }
        Ok(())
    }

    async fn load_ratings(&self, model: &Model) -> Result<Vec<f64>, PersistenceError> {
        Ok(self.lock()?.ratings.get(model).cloned().unwrap_or_default())
    }
}
