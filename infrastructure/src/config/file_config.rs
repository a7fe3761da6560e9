//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Unset provider fields fall back to per-backend defaults when the
//! configuration is resolved into [`BackendDescriptor`]s.
//!
//! ```toml
//! [analysis]
//! mode = "auto"                 # auto | ollama | huggingface | gemini
//! fallback = "ollama"           # only used when mode names a backend
//! preferred_remote = "gemini"   # remote backend used in production
//! debug = false
//!
//! [providers.gemini]
//! model = "gemini-1.5-flash"
//! api_key_env = "GEMINI_API_KEY"
//! timeout_seconds = 60
//! max_retries = 3
//! ```

use justice_domain::{
    BackendDescriptor, BackendId, DeploymentSignals, DomainError, SelectionInputs, SelectionMode,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("{field}: timeout_seconds cannot be 0")]
    ZeroTimeout { field: String },

    #[error("{field}: max_retries cannot be 0")]
    ZeroRetries { field: String },

    #[error("{field}: model name cannot be empty")]
    EmptyModelName { field: String },

    #[error("{field}: {source}")]
    UnknownBackend { field: String, source: DomainError },

    #[error("analysis.preferred_remote: '{0}' is not a remote backend")]
    NotRemote(BackendId),
}

/// Raw analysis configuration from TOML (`[analysis]` section)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAnalysisConfig {
    /// "auto" or a backend name
    pub mode: String,
    /// Fallback backend when `mode` names a backend
    pub fallback: Option<String>,
    /// Remote backend preferred in production
    pub preferred_remote: String,
    /// Debug flag; disabled debug counts as production in auto mode
    pub debug: bool,
}

impl Default for FileAnalysisConfig {
    fn default() -> Self {
        Self {
            mode: "auto".to_string(),
            fallback: None,
            preferred_remote: BackendId::Gemini.as_str().to_string(),
            debug: false,
        }
    }
}

impl FileAnalysisConfig {
    pub fn parse_mode(&self) -> Result<SelectionMode, ConfigValidationError> {
        self.mode
            .parse()
            .map_err(|source| ConfigValidationError::UnknownBackend {
                field: "analysis.mode".to_string(),
                source,
            })
    }

    pub fn parse_fallback(&self) -> Result<Option<BackendId>, ConfigValidationError> {
        match self.fallback.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(name) => name.parse().map(Some).map_err(|source| {
                ConfigValidationError::UnknownBackend {
                    field: "analysis.fallback".to_string(),
                    source,
                }
            }),
        }
    }

    pub fn parse_preferred_remote(&self) -> Result<BackendId, ConfigValidationError> {
        let id: BackendId =
            self.preferred_remote
                .parse()
                .map_err(|source| ConfigValidationError::UnknownBackend {
                    field: "analysis.preferred_remote".to_string(),
                    source,
                })?;
        if id.requires_credential() {
            Ok(id)
        } else {
            Err(ConfigValidationError::NotRemote(id))
        }
    }
}

/// Raw configuration for one backend (`[providers.<name>]`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    /// Base URL (Ollama) or full generation URL (Hugging Face, Gemini)
    pub endpoint: Option<String>,
    pub model: Option<String>,
    /// Environment variable holding the credential
    pub api_key_env: Option<String>,
    /// Direct credential (not recommended; use the env var instead)
    pub api_key: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_retries: Option<u32>,
}

impl FileBackendConfig {
    pub fn model_for(&self, id: BackendId) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| default_model(id).to_string())
    }

    pub fn endpoint_for(&self, id: BackendId) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => default_endpoint(id, &self.model_for(id)),
        }
    }

    pub fn api_key_env_for(&self, id: BackendId) -> Option<String> {
        self.api_key_env
            .clone()
            .or_else(|| default_api_key_env(id).map(str::to_string))
    }

    pub fn timeout_for(&self, id: BackendId) -> Duration {
        Duration::from_secs(
            self.timeout_seconds
                .unwrap_or_else(|| default_timeout_seconds(id)),
        )
    }

    /// Direct key first, then the named environment variable.
    pub fn credential_for(
        &self,
        id: BackendId,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key_env_for(id).and_then(|name| lookup(&name)))
            .filter(|k| !k.trim().is_empty())
    }

    pub fn to_descriptor(
        &self,
        id: BackendId,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> BackendDescriptor {
        let mut descriptor = BackendDescriptor::new(id, self.endpoint_for(id), self.model_for(id))
            .with_timeout(self.timeout_for(id));
        if let Some(max_retries) = self.max_retries {
            descriptor = descriptor.with_max_retries(max_retries);
        }
        if id.requires_credential() {
            descriptor = descriptor.with_credential(self.credential_for(id, lookup));
        }
        descriptor
    }
}

fn default_model(id: BackendId) -> &'static str {
    match id {
        BackendId::Ollama => "Anupam/IPC-Helper:latest",
        BackendId::HuggingFace => "mistralai/Mistral-7B-Instruct-v0.1",
        BackendId::Gemini => "gemini-1.5-flash",
    }
}

fn default_endpoint(id: BackendId, model: &str) -> String {
    match id {
        BackendId::Ollama => "http://localhost:11434".to_string(),
        BackendId::HuggingFace => format!("https://api-inference.huggingface.co/models/{}", model),
        BackendId::Gemini => format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            model
        ),
    }
}

fn default_api_key_env(id: BackendId) -> Option<&'static str> {
    match id {
        BackendId::Ollama => None,
        BackendId::HuggingFace => Some("HUGGINGFACE_API_TOKEN"),
        BackendId::Gemini => Some("GEMINI_API_KEY"),
    }
}

fn default_timeout_seconds(id: BackendId) -> u64 {
    match id {
        BackendId::Ollama => 30,
        BackendId::HuggingFace | BackendId::Gemini => 60,
    }
}

/// Raw provider configuration from TOML (`[providers]` section)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    pub ollama: FileBackendConfig,
    pub huggingface: FileBackendConfig,
    pub gemini: FileBackendConfig,
}

impl FileProvidersConfig {
    pub fn get(&self, id: BackendId) -> &FileBackendConfig {
        match id {
            BackendId::Ollama => &self.ollama,
            BackendId::HuggingFace => &self.huggingface,
            BackendId::Gemini => &self.gemini,
        }
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Backend selection settings
    pub analysis: FileAnalysisConfig,
    /// Per-backend connection settings
    pub providers: FileProvidersConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();

        if let Err(e) = self.analysis.parse_mode() {
            issues.push(e);
        }
        if let Err(e) = self.analysis.parse_fallback() {
            issues.push(e);
        }
        if let Err(e) = self.analysis.parse_preferred_remote() {
            issues.push(e);
        }

        for id in BackendId::ALL {
            let provider = self.providers.get(id);
            let field = format!("providers.{}", id);
            if provider.timeout_seconds == Some(0) {
                issues.push(ConfigValidationError::ZeroTimeout {
                    field: field.clone(),
                });
            }
            if provider.max_retries == Some(0) {
                issues.push(ConfigValidationError::ZeroRetries {
                    field: field.clone(),
                });
            }
            if provider.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
                issues.push(ConfigValidationError::EmptyModelName { field });
            }
        }

        issues
    }

    /// Resolve one backend, reading credentials through `lookup`.
    pub fn descriptor(
        &self,
        id: BackendId,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> BackendDescriptor {
        self.providers.get(id).to_descriptor(id, lookup)
    }

    /// Resolve every backend.
    pub fn descriptors(&self, lookup: &dyn Fn(&str) -> Option<String>) -> Vec<BackendDescriptor> {
        BackendId::ALL
            .iter()
            .map(|id| self.descriptor(*id, lookup))
            .collect()
    }

    /// Inputs for the backend selector.
    ///
    /// `credentials` lists the backends whose descriptor carries a credential.
    pub fn selection_inputs(
        &self,
        signals: DeploymentSignals,
        credentials: Vec<BackendId>,
    ) -> Result<SelectionInputs, ConfigValidationError> {
        Ok(SelectionInputs {
            mode: self.analysis.parse_mode()?,
            explicit_fallback: self.analysis.parse_fallback()?,
            preferred_remote: self.analysis.parse_preferred_remote()?,
            signals,
            credentials,
        })
    }
}
