//! Backend provider types (provider-neutral, transport-free).
//!
//! These types describe *which* AI backend is used and *how* it is reached
//! without depending on any HTTP client or configuration format.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::core::error::DomainError;

/// The closed set of AI backends an analysis can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendId {
    /// Self-hosted Ollama inference server.
    Ollama,
    /// Hugging Face hosted Inference API.
    HuggingFace,
    /// Google Gemini managed generative API.
    Gemini,
}

impl BackendId {
    /// All backends, in the order they are reported by introspection.
    pub const ALL: [BackendId; 3] = [BackendId::Gemini, BackendId::HuggingFace, BackendId::Ollama];

    /// Stable lowercase name used in results, config and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendId::Ollama => "ollama",
            BackendId::HuggingFace => "huggingface",
            BackendId::Gemini => "gemini",
        }
    }

    /// Whether the backend is a remote service that needs a credential.
    pub fn requires_credential(&self) -> bool {
        !matches!(self, BackendId::Ollama)
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" | "local" => Ok(BackendId::Ollama),
            "huggingface" | "hugging_face" | "hf" | "hosted" => Ok(BackendId::HuggingFace),
            "gemini" | "managed" => Ok(BackendId::Gemini),
            other => Err(DomainError::UnknownBackend(other.to_string())),
        }
    }
}

/// Retry backoff bases for a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffSettings {
    /// First wait after an HTTP 429, doubled on every further attempt.
    pub rate_limit_base: Duration,
    /// First wait after a timeout or transient failure, doubled on every further attempt.
    pub transient_base: Duration,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            rate_limit_base: Duration::from_secs(2),
            transient_base: Duration::from_secs(1),
        }
    }
}

/// Static description of one configured backend.
///
/// Resolved once during assembly and never mutated afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct BackendDescriptor {
    pub id: BackendId,
    /// Base URL (Ollama) or full generation URL (Hugging Face, Gemini).
    pub endpoint: String,
    /// Model name or model id sent to the backend.
    pub model: String,
    /// API key or bearer token, if the backend needs one.
    pub credential: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Total upstream attempts per call (at least 1).
    pub max_retries: u32,
    pub backoff: BackoffSettings,
}

impl BackendDescriptor {
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    pub fn new(id: BackendId, endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id,
            endpoint: endpoint.into(),
            model: model.into(),
            credential: None,
            timeout: Duration::from_secs(60),
            max_retries: Self::DEFAULT_MAX_RETRIES,
            backoff: BackoffSettings::default(),
        }
    }

    pub fn with_credential(mut self, credential: Option<String>) -> Self {
        self.credential = credential.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffSettings) -> Self {
        self.backoff = backoff;
        self
    }

    /// The credential, if one is configured and non-empty.
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref().filter(|c| !c.is_empty())
    }

    pub fn has_credential(&self) -> bool {
        self.credential().is_some()
    }
}

// Hand-written so credentials never reach logs.
impl fmt::Debug for BackendDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendDescriptor")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("backoff", &self.backoff)
            .finish()
    }
}

/// Raw text returned by one successful backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBackendResponse {
    pub text: String,
    /// Wall time of the whole call, retries and backoff included.
    pub elapsed_ms: u64,
    pub backend: BackendId,
    pub model: String,
}

impl RawBackendResponse {
    pub fn new(
        backend: BackendId,
        model: impl Into<String>,
        text: impl Into<String>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            text: text.into(),
            elapsed_ms,
            backend,
            model: model.into(),
        }
    }
}
