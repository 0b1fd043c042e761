//! Agent roles
//!
//! Every model call made by the pipeline is performed on behalf of a role
//! (requirements analyst, frontend developer, ...). The role decides which
//! capabilities the call needs and how much its answer counts when
//! responses are merged.

pub mod role;

pub use role::AgentRole;
