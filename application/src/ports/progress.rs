//! Progress notification port
//!
//! Defines the interface for reporting progress while a request moves
//! through the pipeline.

use appforge_domain::{AgentRole, PhaseStep};

/// Callback for progress updates during generation
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console, web UI, etc.)
pub trait ProgressNotifier: Send + Sync {
    /// Called when a phase starts
    fn on_phase_start(&self, step: PhaseStep, progress: u8, total_tasks: usize);

    /// Called when one role's task within a phase finishes
    fn on_task_complete(&self, step: PhaseStep, role: AgentRole, success: bool);

    /// Called when a phase completes, with its aggregate confidence
    fn on_phase_complete(&self, step: PhaseStep, confidence: f64);

    /// Called once when the request reaches COMPLETED or FAILED
    fn on_finished(&self, _success: bool, _message: &str) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_phase_start(&self, _step: PhaseStep, _progress: u8, _total_tasks: usize) {}
    fn on_task_complete(&self, _step: PhaseStep, _role: AgentRole, _success: bool) {}
    fn on_phase_complete(&self, _step: PhaseStep, _confidence: f64) {}
}
