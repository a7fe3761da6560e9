//! Selection policy table.
//!
//! | Mode | Environment | Preferred remote has credential | Primary | Fallback |
//! |------|-------------|---------------------------------|---------|----------|
//! | explicit `X` | any | any | `X` | configured fallback, if any |
//! | auto | production | yes | preferred remote | Ollama |
//! | auto | production | no | Ollama | none (warning) |
//! | auto | development | any | Ollama | none |
//!
//! "Production" means a cloud deployment indicator is present, or debug is off.

use crate::core::error::DomainError;
use crate::providers::BackendId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Environment variables whose presence marks a managed/cloud deployment.
pub const CLOUD_INDICATORS: &[&str] = &[
    "DYNO",
    "PORT",
    "DATABASE_URL",
    "RENDER",
    "VERCEL",
    "NETLIFY",
    "RAILWAY_ENVIRONMENT",
];

/// How the primary backend is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Detect from deployment signals and credentials.
    #[default]
    Auto,
    /// Always use the named backend.
    Explicit(BackendId),
}

impl FromStr for SelectionMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "auto" => Ok(SelectionMode::Auto),
            other => other.parse().map(SelectionMode::Explicit),
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionMode::Auto => f.write_str("auto"),
            SelectionMode::Explicit(id) => write!(f, "{}", id),
        }
    }
}

/// Deployment facts observed at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentSignals {
    /// Names of the [`CLOUD_INDICATORS`] that were set (non-empty).
    pub cloud_indicators: Vec<String>,
    /// Whether the application runs with debugging enabled.
    pub debug: bool,
}

impl DeploymentSignals {
    pub fn is_cloud(&self) -> bool {
        !self.cloud_indicators.is_empty()
    }

    pub fn is_production(&self) -> bool {
        self.is_cloud() || !self.debug
    }
}

/// Everything the policy looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionInputs {
    pub mode: SelectionMode,
    /// Fallback used together with an explicit mode.
    pub explicit_fallback: Option<BackendId>,
    /// Remote backend preferred in production.
    pub preferred_remote: BackendId,
    pub signals: DeploymentSignals,
    /// Backends whose credential is configured.
    pub credentials: Vec<BackendId>,
}

impl SelectionInputs {
    pub fn has_credential(&self, id: BackendId) -> bool {
        !id.requires_credential() || self.credentials.contains(&id)
    }
}

impl Default for SelectionInputs {
    fn default() -> Self {
        Self {
            mode: SelectionMode::Auto,
            explicit_fallback: None,
            preferred_remote: BackendId::Gemini,
            signals: DeploymentSignals::default(),
            credentials: Vec::new(),
        }
    }
}

/// Which environment the decision was made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentEnvironment {
    Production,
    Development,
    /// The backend was named in configuration; detection was skipped.
    Explicit,
}

impl DeploymentEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentEnvironment::Production => "production",
            DeploymentEnvironment::Development => "development",
            DeploymentEnvironment::Explicit => "explicit",
        }
    }
}

impl fmt::Display for DeploymentEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary backend and its optional fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePriority {
    pub primary: BackendId,
    pub fallback: Option<BackendId>,
}

impl ServicePriority {
    pub fn new(primary: BackendId, fallback: Option<BackendId>) -> Self {
        // A backend never falls back to itself
        Self {
            primary,
            fallback: fallback.filter(|f| *f != primary),
        }
    }

    /// Backends in call order.
    pub fn chain(&self) -> impl Iterator<Item = BackendId> {
        std::iter::once(self.primary).chain(self.fallback)
    }
}

/// The outcome of [`select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub priority: ServicePriority,
    pub environment: DeploymentEnvironment,
    /// Human-readable reason for the decision.
    pub reason: String,
    /// Set when the decision had to degrade (e.g. missing credential in production).
    pub warning: Option<String>,
}

/// Apply the policy table. Same inputs, same answer.
pub fn select(inputs: &SelectionInputs) -> Selection {
    if let SelectionMode::Explicit(primary) = inputs.mode {
        return Selection {
            priority: ServicePriority::new(primary, inputs.explicit_fallback),
            environment: DeploymentEnvironment::Explicit,
            reason: format!("backend '{}' configured explicitly", primary),
            warning: None,
        };
    }

    if !inputs.signals.is_production() {
        return Selection {
            priority: ServicePriority::new(BackendId::Ollama, None),
            environment: DeploymentEnvironment::Development,
            reason: "development environment detected - using local backend".to_string(),
            warning: None,
        };
    }

    let trigger = if inputs.signals.is_cloud() {
        format!("cloud indicators [{}]", inputs.signals.cloud_indicators.join(", "))
    } else {
        "debug disabled".to_string()
    };
    let remote = inputs.preferred_remote;

    if inputs.has_credential(remote) {
        Selection {
            priority: ServicePriority::new(remote, Some(BackendId::Ollama)),
            environment: DeploymentEnvironment::Production,
            reason: format!("production environment ({}) with {} credential", trigger, remote),
            warning: None,
        }
    } else {
        Selection {
            priority: ServicePriority::new(BackendId::Ollama, None),
            environment: DeploymentEnvironment::Production,
            reason: format!("production environment ({})", trigger),
            warning: Some(format!(
                "production environment detected but no {} credential - falling back to local backend",
                remote
            )),
        }
    }
}
