//! Generation pipeline state
//!
//! A [`GenerationRequest`] walks a fixed sequence of [`PhaseStep`]s:
//!
//! ```text
//! PENDING → ANALYZING → DESIGNING → GENERATING → TESTING → OPTIMIZING → DEPLOYING → COMPLETED
//!                                                                                    ↘ FAILED (from any non-terminal state)
//! ```
//!
//! Progress only moves forward. Failing freezes progress at its last value and
//! keeps every recorded [`AgentTask`] for inspection.

pub mod phase;
pub mod request;
pub mod task;
pub mod value_objects;

pub use phase::{PhaseCheckpoints, PhaseStep};
pub use request::{GenerationRequest, GenerationStatusReport};
pub use task::{AgentTask, ComponentKind, GeneratedComponent};
pub use value_objects::{GenerationStatus, RequestId, TaskId, TaskStatus};
