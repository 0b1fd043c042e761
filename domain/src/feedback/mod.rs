//! Feedback-derived model weights
//!
//! User ratings of past generations are folded into one scalar weight per
//! model. Weights are immutable snapshots: recomputation always produces a
//! whole new [`ModelWeights`] value.

pub mod weights;

pub use weights::{DEFAULT_WEIGHT, ModelWeights};
