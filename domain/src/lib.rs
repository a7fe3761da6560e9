//! Domain layer for justice-aid
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Analysis
//!
//! A citizen's case description ([`AnalysisRequest`]) is sent to an AI backend
//! which answers with IPC sections. Whatever text comes back is turned into an
//! [`AnalysisJson`] by the single shared [`normalize`] function.
//!
//! ## Backends and selection
//!
//! - [`BackendId`]: the closed set of backends (Ollama, Hugging Face, Gemini)
//! - [`BackendDescriptor`]: how to reach one backend, fixed at startup
//! - [`select`]: picks primary and fallback once from configuration and deployment signals

pub mod analysis;
pub mod core;
pub mod prompt;
pub mod providers;
pub mod selection;
pub mod util;

// Re-export commonly used types
pub use analysis::{
    AnalysisJson, AnalysisResult, AppliedSection,
    entities::{DEFAULT_EXPLANATION, FAILED_SERVICE},
    normalize,
    normalizer::unparseable,
};
pub use crate::core::{error::DomainError, request::AnalysisRequest};
pub use prompt::PromptTemplate;
pub use providers::{BackendDescriptor, BackendId, BackoffSettings, RawBackendResponse};
pub use selection::{
    DeploymentEnvironment, DeploymentSignals, Selection, SelectionInputs, SelectionMode,
    ServicePriority, policy::CLOUD_INDICATORS, select,
};
