//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("No responses to aggregate")]
    NoResponses,

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Model already registered: {0}")]
    DuplicateModel(String),

    #[error("No models registered")]
    NoModels,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Request is already {0}")]
    TerminalState(String),
}

impl DomainError {
    /// Check if this error was caused by a request that can no longer transition
    pub fn is_terminal_state(&self) -> bool {
        matches!(self, DomainError::TerminalState(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_responses_display() {
        assert_eq!(
            DomainError::NoResponses.to_string(),
            "No responses to aggregate"
        );
    }

    #[test]
    fn test_is_terminal_state_check() {
        assert!(DomainError::TerminalState("completed".into()).is_terminal_state());
        assert!(!DomainError::NoModels.is_terminal_state());
        assert!(!DomainError::UnknownModel("x".into()).is_terminal_state());
    }
}
