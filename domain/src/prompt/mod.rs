//! Prompt domain
//!
//! Prompt composition for each pipeline role. Earlier phase outputs flow
//! into later prompts as clipped context.

mod phase;

pub use phase::{PhasePromptTemplate, clip};
