//! Orchestrator assembly
//!
//! Resolves configuration into backend descriptors, runs the selector once,
//! and wires the chosen clients into an [`AnalyzeCaseUseCase`].

use crate::config::{ConfigValidationError, FileConfig};
use crate::providers::HttpBackend;
use justice_application::{AnalyzeCaseUseCase, BackendClient};
use justice_domain::{BackendDescriptor, BackendId, DeploymentSignals, Selection, select};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("Invalid configuration: {}", join_issues(.0))]
    InvalidConfig(Vec<ConfigValidationError>),
}

fn join_issues(issues: &[ConfigValidationError]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A ready-to-use orchestrator and the decision that shaped it
pub struct Assembly {
    pub orchestrator: AnalyzeCaseUseCase,
    pub selection: Selection,
    pub descriptors: Vec<BackendDescriptor>,
}

impl Assembly {
    pub fn descriptor(&self, id: BackendId) -> Option<&BackendDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }
}

/// Build the orchestrator from configuration and deployment signals.
///
/// Credentials are read through `lookup`. Selection happens exactly once,
/// here; the returned orchestrator never re-decides.
pub fn build_orchestrator(
    config: &FileConfig,
    signals: DeploymentSignals,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<Assembly, AssemblyError> {
    let issues = config.validate();
    if !issues.is_empty() {
        return Err(AssemblyError::InvalidConfig(issues));
    }

    let descriptors = config.descriptors(lookup);
    let credentials = descriptors
        .iter()
        .filter(|d| d.has_credential())
        .map(|d| d.id)
        .collect();
    let inputs = config
        .selection_inputs(signals, credentials)
        .map_err(|e| AssemblyError::InvalidConfig(vec![e]))?;

    let selection = select(&inputs);
    if let Some(warning) = &selection.warning {
        warn!("{}", warning);
    }
    info!(
        primary = %selection.priority.primary,
        fallback = ?selection.priority.fallback,
        environment = %selection.environment,
        "Backend selection: {}",
        selection.reason
    );

    let http = reqwest::Client::new();
    let client_for = |id: BackendId| -> Arc<dyn BackendClient> {
        let descriptor = descriptors
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .unwrap_or_else(|| config.descriptor(id, lookup));
        Arc::new(HttpBackend::with_http_client(descriptor, http.clone()))
    };
    let primary = client_for(selection.priority.primary);
    let fallback = selection.priority.fallback.map(client_for);

    let orchestrator = AnalyzeCaseUseCase::new(primary, fallback)
        .with_environment(selection.environment)
        .with_mode(inputs.mode)
        .with_debug_mode(config.analysis.debug);

    Ok(Assembly {
        orchestrator,
        selection,
        descriptors,
    })
}
