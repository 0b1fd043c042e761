//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: the closed set of supported generation models
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod model;
