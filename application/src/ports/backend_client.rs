//! Backend client port
//!
//! Defines the interface for submitting a prompt to one AI backend.

use async_trait::async_trait;
use justice_domain::{BackendId, RawBackendResponse};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification of a failed backend call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorKind {
    /// Credential missing, invalid or rejected. Never retried.
    Unauthenticated,
    /// HTTP 429.
    RateLimited,
    /// The request did not complete within the backend timeout.
    Timeout,
    /// Connection failures, 5xx responses, model still loading.
    Transient,
    /// The response could not be read at all.
    Malformed,
    /// Any other refusal (4xx other than auth/rate limit).
    Unavailable,
}

impl BackendErrorKind {
    /// Whether the client should try again after a backoff
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BackendErrorKind::RateLimited | BackendErrorKind::Timeout | BackendErrorKind::Transient
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendErrorKind::Unauthenticated => "unauthenticated",
            BackendErrorKind::RateLimited => "rate_limited",
            BackendErrorKind::Timeout => "timeout",
            BackendErrorKind::Transient => "transient",
            BackendErrorKind::Malformed => "malformed",
            BackendErrorKind::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error surfaced by a backend client after its retries are spent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Unauthenticated, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::RateLimited, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Timeout, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Transient, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Malformed, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Unavailable, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// Health state of one backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Result of probing one backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendHealth {
    pub service: BackendId,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Backend-specific facts (available models, loading state, ...)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub details: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_service: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl BackendHealth {
    pub fn healthy(service: BackendId, model: impl Into<String>) -> Self {
        Self {
            service,
            status: HealthStatus::Healthy,
            model: Some(model.into()),
            error: None,
            details: serde_json::Map::new(),
            primary_service: None,
            role: None,
        }
    }

    pub fn unhealthy(service: BackendId, error: impl Into<String>) -> Self {
        Self {
            service,
            status: HealthStatus::Unhealthy,
            model: None,
            error: Some(error.into()),
            details: serde_json::Map::new(),
            primary_service: None,
            role: None,
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Client for one AI backend
///
/// Implementations (adapters) live in the infrastructure layer and own
/// their transport, credentials, retry and backoff. They return the raw
/// text the model produced; interpreting it is the normalizer's job.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Which backend this client talks to
    fn id(&self) -> BackendId;

    /// Model name sent with each request
    fn model(&self) -> &str;

    /// Submit a prompt and return the model's raw text
    async fn call(&self, prompt: &str) -> Result<RawBackendResponse, BackendError>;

    /// Probe the backend. Never fails; problems are reported as unhealthy.
    async fn health_check(&self) -> BackendHealth;
}
