//! Model registry domain
//!
//! Static knowledge about the models the dispatcher may call:
//!
//! - [`ModelDescriptor`]: capability tags and per-token pricing for one model
//! - [`ModelRegistry`]: ordered set of registered descriptors plus
//!   capability-based ranking
//! - [`selection`]: task description tokenizer used for ranking

pub mod descriptor;
pub mod registry;
pub mod selection;

pub use descriptor::{ModelDescriptor, TokenPricing};
pub use registry::{ModelRegistry, ScoredModel};
pub use selection::{normalize_tag, tokenize};
