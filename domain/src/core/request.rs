//! Analysis request value object

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// Minimum number of characters in a trimmed case description.
pub const MIN_DESCRIPTION_CHARS: usize = 10;

/// Maximum number of characters accepted in a case description.
pub const MAX_DESCRIPTION_CHARS: usize = 5000;

/// A case description submitted for IPC analysis (Value Object)
///
/// The description is trimmed on construction and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    case_description: String,
}

impl AnalysisRequest {
    /// Validate and create a new request.
    ///
    /// Rejects descriptions that are empty, shorter than
    /// [`MIN_DESCRIPTION_CHARS`] or longer than [`MAX_DESCRIPTION_CHARS`].
    pub fn new(case_description: impl Into<String>) -> Result<Self, DomainError> {
        let raw = case_description.into();
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(DomainError::InvalidRequest(
                "case description cannot be empty".to_string(),
            ));
        }

        let chars = trimmed.chars().count();
        if chars < MIN_DESCRIPTION_CHARS {
            return Err(DomainError::InvalidRequest(format!(
                "case description must be at least {} characters long",
                MIN_DESCRIPTION_CHARS
            )));
        }
        if chars > MAX_DESCRIPTION_CHARS {
            return Err(DomainError::InvalidRequest(format!(
                "case description must be at most {} characters ({} given)",
                MAX_DESCRIPTION_CHARS, chars
            )));
        }

        Ok(Self {
            case_description: trimmed.to_string(),
        })
    }

    /// Get the trimmed case description
    pub fn case_description(&self) -> &str {
        &self.case_description
    }

    /// Consume and return the inner description
    pub fn into_description(self) -> String {
        self.case_description
    }
}

impl std::fmt::Display for AnalysisRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.case_description)
    }
}

impl TryFrom<&str> for AnalysisRequest {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        AnalysisRequest::new(s)
    }
}

impl TryFrom<String> for AnalysisRequest {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        AnalysisRequest::new(s)
    }
}
