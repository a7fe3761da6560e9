//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid case description: {0}")]
    InvalidRequest(String),

    #[error("Unknown backend: {0}")]
    UnknownBackend(String),
}

impl DomainError {
    /// Check if this error was caused by caller input rather than configuration
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, DomainError::InvalidRequest(_))
    }
}
