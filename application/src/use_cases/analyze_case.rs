//! Analyze Case use case
//!
//! Runs one legal analysis through the selected primary backend, switches to
//! the fallback backend when the primary fails, and always returns an
//! [`AnalysisResult`]. Backend failures are folded into the result value.

use crate::ports::analysis_logger::{AnalysisEvent, AnalysisLogger, NoAnalysisLogger};
use crate::ports::backend_client::{BackendClient, BackendError, BackendHealth};
use crate::ports::progress::{AnalysisPhase, AnalysisProgressNotifier, NoAnalysisProgress};
use justice_domain::util::truncate_str;
use justice_domain::{
    AnalysisRequest, AnalysisResult, BackendId, DeploymentEnvironment, PromptTemplate,
    RawBackendResponse, SelectionMode, normalize,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Why an analysis produced the failure shape
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("{source}")]
    Backend {
        backend: BackendId,
        source: BackendError,
    },

    #[error(
        "All services failed. {primary}: {primary_error}; {fallback} fallback: {fallback_error}"
    )]
    AllBackendsExhausted {
        primary: BackendId,
        primary_error: BackendError,
        fallback: BackendId,
        fallback_error: BackendError,
    },

    #[error("Analysis cancelled")]
    Cancelled,
}

/// Health of every configured backend
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub primary: BackendHealth,
    pub fallbacks: Vec<BackendHealth>,
    pub environment: DeploymentEnvironment,
    pub mode: String,
    pub service_priority: Vec<BackendId>,
}

impl HealthReport {
    /// True when at least one backend can serve requests.
    pub fn any_healthy(&self) -> bool {
        self.primary.is_healthy() || self.fallbacks.iter().any(BackendHealth::is_healthy)
    }
}

/// Static description of the orchestrator wiring
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub primary_service: BackendId,
    pub fallback_service: Option<BackendId>,
    pub primary_model: String,
    pub fallback_model: Option<String>,
    pub environment: DeploymentEnvironment,
    pub mode: String,
    pub services_available: BTreeMap<String, bool>,
    pub debug_mode: bool,
    pub service_priority: Vec<BackendId>,
}

/// Outcome of one backend call
enum Attempt {
    Answered(RawBackendResponse),
    Failed(BackendError),
    Cancelled,
}

impl From<Result<RawBackendResponse, BackendError>> for Attempt {
    fn from(result: Result<RawBackendResponse, BackendError>) -> Self {
        match result {
            Ok(raw) => Attempt::Answered(raw),
            Err(e) => Attempt::Failed(e),
        }
    }
}

/// Use case for analyzing a case description
///
/// The primary/fallback pair is fixed when the use case is built; the
/// struct holds no mutable state and can be shared across tasks by `Arc`.
pub struct AnalyzeCaseUseCase {
    primary: Arc<dyn BackendClient>,
    fallback: Option<Arc<dyn BackendClient>>,
    environment: DeploymentEnvironment,
    mode: SelectionMode,
    debug_mode: bool,
    logger: Arc<dyn AnalysisLogger>,
}

impl Clone for AnalyzeCaseUseCase {
    fn clone(&self) -> Self {
        Self {
            primary: self.primary.clone(),
            fallback: self.fallback.clone(),
            environment: self.environment,
            mode: self.mode,
            debug_mode: self.debug_mode,
            logger: self.logger.clone(),
        }
    }
}

impl AnalyzeCaseUseCase {
    pub fn new(primary: Arc<dyn BackendClient>, fallback: Option<Arc<dyn BackendClient>>) -> Self {
        // A backend never falls back to itself
        let fallback = fallback.filter(|f| f.id() != primary.id());
        Self {
            primary,
            fallback,
            environment: DeploymentEnvironment::Development,
            mode: SelectionMode::Auto,
            debug_mode: false,
            logger: Arc::new(NoAnalysisLogger),
        }
    }

    pub fn with_environment(mut self, environment: DeploymentEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_mode(mut self, mode: SelectionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_debug_mode(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    /// Create with an analysis logger.
    pub fn with_logger(mut self, logger: Arc<dyn AnalysisLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn primary_id(&self) -> BackendId {
        self.primary.id()
    }

    pub fn fallback_id(&self) -> Option<BackendId> {
        self.fallback.as_ref().map(|f| f.id())
    }

    pub fn environment(&self) -> DeploymentEnvironment {
        self.environment
    }

    /// Backends in call order.
    pub fn service_priority(&self) -> Vec<BackendId> {
        std::iter::once(self.primary_id())
            .chain(self.fallback_id())
            .collect()
    }

    /// Analyze with default (no-op) progress
    pub async fn analyze_case(&self, request: &AnalysisRequest) -> AnalysisResult {
        self.analyze_case_with_progress(request, &NoAnalysisProgress)
            .await
    }

    /// Analyze with progress callbacks
    pub async fn analyze_case_with_progress(
        &self,
        request: &AnalysisRequest,
        progress: &dyn AnalysisProgressNotifier,
    ) -> AnalysisResult {
        self.run(request, progress, None).await
    }

    /// Analyze, giving up as soon as `cancel` fires.
    ///
    /// A cancelled analysis yields the failure shape with the error
    /// `"Analysis cancelled"`; the in-flight HTTP request is dropped.
    pub async fn analyze_case_with_cancel(
        &self,
        request: &AnalysisRequest,
        progress: &dyn AnalysisProgressNotifier,
        cancel: &CancellationToken,
    ) -> AnalysisResult {
        self.run(request, progress, Some(cancel)).await
    }

    async fn run(
        &self,
        request: &AnalysisRequest,
        progress: &dyn AnalysisProgressNotifier,
        cancel: Option<&CancellationToken>,
    ) -> AnalysisResult {
        info!(
            primary = %self.primary.id(),
            fallback = ?self.fallback_id(),
            "Analyzing case: {}",
            truncate_str(request.case_description(), 100)
        );
        let prompt = PromptTemplate::legal_analysis(request.case_description());

        progress.on_phase(AnalysisPhase::CallingPrimary, Some(self.primary.id()));
        let primary_error = match self.attempt(self.primary.as_ref(), &prompt, cancel).await {
            Attempt::Answered(raw) => return self.succeed(raw, None, progress),
            Attempt::Cancelled => return self.fail(AnalysisError::Cancelled, progress),
            Attempt::Failed(e) => e,
        };
        error!(
            backend = %self.primary.id(),
            kind = %primary_error.kind,
            "Primary analysis service failed: {}",
            primary_error
        );

        let Some(fallback) = self.fallback.as_ref() else {
            return self.fail(
                AnalysisError::Backend {
                    backend: self.primary.id(),
                    source: primary_error,
                },
                progress,
            );
        };

        info!(
            "{} failed, trying {} fallback",
            self.primary.id(),
            fallback.id()
        );
        progress.on_phase(AnalysisPhase::CallingFallback, Some(fallback.id()));
        match self.attempt(fallback.as_ref(), &prompt, cancel).await {
            Attempt::Answered(raw) => self.succeed(raw, Some(primary_error), progress),
            Attempt::Cancelled => self.fail(AnalysisError::Cancelled, progress),
            Attempt::Failed(fallback_error) => {
                error!(
                    backend = %fallback.id(),
                    kind = %fallback_error.kind,
                    "Fallback analysis service also failed: {}",
                    fallback_error
                );
                self.fail(
                    AnalysisError::AllBackendsExhausted {
                        primary: self.primary.id(),
                        primary_error,
                        fallback: fallback.id(),
                        fallback_error,
                    },
                    progress,
                )
            }
        }
    }

    async fn attempt(
        &self,
        client: &dyn BackendClient,
        prompt: &str,
        cancel: Option<&CancellationToken>,
    ) -> Attempt {
        match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Attempt::Cancelled,
                    result = client.call(prompt) => result.into(),
                }
            }
            None => client.call(prompt).await.into(),
        }
    }

    fn succeed(
        &self,
        raw: RawBackendResponse,
        primary_error: Option<BackendError>,
        progress: &dyn AnalysisProgressNotifier,
    ) -> AnalysisResult {
        let backend = raw.backend;
        debug!(
            backend = %backend,
            elapsed_ms = raw.elapsed_ms,
            "Raw response: {}",
            truncate_str(&raw.text, 200)
        );
        let analysis = normalize(&raw.text);
        let mut result = AnalysisResult::from_backend(analysis, raw);
        if let Some(reason) = primary_error {
            result = result.into_fallback(reason.to_string(), self.primary.id().as_str());
        }

        info!(
            service_used = %result.service_used,
            sections = result.sections.len(),
            response_time_ms = result.response_time_ms,
            "Analysis completed"
        );
        self.logger.log(AnalysisEvent::new(
            if result.used_fallback() {
                "fallback_completed"
            } else {
                "analysis_completed"
            },
            serde_json::json!({
                "service_used": result.service_used,
                "model": result.model_used,
                "sections": result.sections.len(),
                "response_time_ms": result.response_time_ms,
                "fallback_reason": result.fallback_reason,
            }),
        ));
        progress.on_phase(AnalysisPhase::Success, Some(backend));
        result
    }

    fn fail(
        &self,
        err: AnalysisError,
        progress: &dyn AnalysisProgressNotifier,
    ) -> AnalysisResult {
        let message = err.to_string();
        if matches!(err, AnalysisError::Cancelled) {
            warn!("Analysis cancelled");
        }
        self.logger.log(AnalysisEvent::new(
            "analysis_failed",
            serde_json::json!({
                "primary": self.primary.id(),
                "fallback": self.fallback_id(),
                "error": message,
            }),
        ));
        progress.on_phase(AnalysisPhase::Failed, None);
        AnalysisResult::failure(message)
    }

    /// Probe every configured backend concurrently.
    pub async fn health_check(&self) -> HealthReport {
        let primary_check = self.primary.health_check();
        let fallback_check = async {
            match &self.fallback {
                Some(f) => Some(f.health_check().await),
                None => None,
            }
        };
        let (mut primary, fallback) = futures::join!(primary_check, fallback_check);

        primary.primary_service = Some(true);
        let fallbacks = fallback
            .into_iter()
            .map(|mut h| {
                h.primary_service = Some(false);
                h.role = Some("fallback".to_string());
                h
            })
            .collect();

        HealthReport {
            primary,
            fallbacks,
            environment: self.environment,
            mode: self.mode.to_string(),
            service_priority: self.service_priority(),
        }
    }

    pub fn service_info(&self) -> ServiceInfo {
        let configured = self.service_priority();
        let services_available = BackendId::ALL
            .iter()
            .map(|id| (id.as_str().to_string(), configured.contains(id)))
            .collect();

        ServiceInfo {
            primary_service: self.primary.id(),
            fallback_service: self.fallback_id(),
            primary_model: self.primary.model().to_string(),
            fallback_model: self.fallback.as_ref().map(|f| f.model().to_string()),
            environment: self.environment,
            mode: self.mode.to_string(),
            services_available,
            debug_mode: self.debug_mode,
            service_priority: configured,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::backend_client::BackendErrorKind;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Backend that replays a scripted list of outcomes
    struct ScriptedBackend {
        id: BackendId,
        outcomes: Mutex<VecDeque<Result<String, BackendError>>>,
        calls: AtomicUsize,
        delay: Option<Duration>,
        healthy: bool,
    }

    impl ScriptedBackend {
        fn new(id: BackendId, outcomes: Vec<Result<String, BackendError>>) -> Self {
            Self {
                id,
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicUsize::new(0),
                delay: None,
                healthy: true,
            }
        }

        fn answering(id: BackendId, text: &str) -> Self {
            Self::new(id, vec![Ok(text.to_string())])
        }

        fn failing(id: BackendId, err: BackendError) -> Self {
            Self::new(id, vec![Err(err)])
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn unhealthy(mut self) -> Self {
            self.healthy = false;
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BackendClient for ScriptedBackend {
        fn id(&self) -> BackendId {
            self.id
        }

        fn model(&self) -> &str {
            "test-model"
        }

        async fn call(&self, _prompt: &str) -> Result<RawBackendResponse, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let next = self
                .outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(BackendError::unavailable("script exhausted")));
            next.map(|text| RawBackendResponse::new(self.id, "test-model", text, 42))
        }

        async fn health_check(&self) -> BackendHealth {
            if self.healthy {
                BackendHealth::healthy(self.id, "test-model")
            } else {
                BackendHealth::unhealthy(self.id, "down")
            }
        }
    }

    /// Records every phase it is told about
    #[derive(Default)]
    struct RecordingProgress {
        phases: Mutex<Vec<AnalysisPhase>>,
    }

    impl AnalysisProgressNotifier for RecordingProgress {
        fn on_phase(&self, phase: AnalysisPhase, _backend: Option<BackendId>) {
            self.phases.lock().unwrap().push(phase);
        }
    }

    #[derive(Default)]
    struct RecordingLogger {
        events: Mutex<Vec<String>>,
    }

    impl AnalysisLogger for RecordingLogger {
        fn log(&self, event: AnalysisEvent) {
            self.events.lock().unwrap().push(event.event_type.to_string());
        }
    }

    const THEFT_JSON: &str = r#"{"sections_applied":[{"section_number":"379","description":"Theft","reason":"took phone"}],"explanation":"Theft case"}"#;

    fn request(text: &str) -> AnalysisRequest {
        AnalysisRequest::new(text).unwrap()
    }

    #[tokio::test]
    async fn test_primary_success() {
        let primary = Arc::new(ScriptedBackend::answering(BackendId::Gemini, THEFT_JSON));
        let fallback = Arc::new(ScriptedBackend::answering(BackendId::Ollama, THEFT_JSON));
        let uc = AnalyzeCaseUseCase::new(primary.clone(), Some(fallback.clone()));

        let result = uc.analyze_case(&request("Someone stole my phone")).await;

        assert!(result.success);
        assert_eq!(result.service_used, "gemini");
        assert_eq!(result.sections[0].section_number, "379");
        assert_eq!(result.response_time_ms, 42);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_reckless_driving_case_end_to_end() {
        let raw = r#"{"sections_applied":[{"section_number":"304A","description":"Negligent act causing death","reason":"Reckless driving"}],"explanation":"Rash driving causing death"}"#;
        let primary = Arc::new(ScriptedBackend::answering(BackendId::Ollama, raw));
        let uc = AnalyzeCaseUseCase::new(primary.clone(), None);

        let result = uc
            .analyze_case(&request("A man hit a pedestrian while driving recklessly"))
            .await;

        assert!(result.success);
        assert_eq!(result.service_used, "ollama");
        assert_eq!(result.sections.len(), 1);
        assert_eq!(result.sections[0].section_number, "304A");
        assert_eq!(result.explanation, "Rash driving causing death");
        assert!(result.error.is_none());
        assert_eq!(primary.calls(), 1);
    }

    #[tokio::test]
    async fn test_fallback_on_primary_timeout() {
        let primary = Arc::new(ScriptedBackend::failing(
            BackendId::Gemini,
            BackendError::timeout("Request timeout after 3 attempts"),
        ));
        let fallback = Arc::new(ScriptedBackend::answering(BackendId::Ollama, THEFT_JSON));
        let progress = RecordingProgress::default();
        let uc = AnalyzeCaseUseCase::new(primary.clone(), Some(fallback.clone()));

        let result = uc
            .analyze_case_with_progress(&request("Someone stole my phone"), &progress)
            .await;

        assert!(result.success);
        assert_eq!(result.service_used, "ollama_fallback");
        assert_eq!(
            result.fallback_reason.as_deref(),
            Some("Request timeout after 3 attempts")
        );
        assert_eq!(result.primary_service_failed.as_deref(), Some("gemini"));
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 1);
        assert_eq!(
            *progress.phases.lock().unwrap(),
            vec![
                AnalysisPhase::CallingPrimary,
                AnalysisPhase::CallingFallback,
                AnalysisPhase::Success
            ]
        );
    }

    #[tokio::test]
    async fn test_no_fallback_credential_failure() {
        let primary = Arc::new(ScriptedBackend::failing(
            BackendId::Gemini,
            BackendError::unauthenticated("API key not configured"),
        ));
        let uc = AnalyzeCaseUseCase::new(primary, None);

        let result = uc.analyze_case(&request("Someone stole my phone")).await;

        assert!(!result.success);
        assert_eq!(result.service_used, "fallback");
        assert_eq!(result.response_time_ms, 0);
        assert_eq!(result.sections.len(), 1);
        assert_eq!(result.sections[0].section_number, "Error");
        assert_eq!(result.error.as_deref(), Some("API key not configured"));
        assert!(result.explanation.contains("API key not configured"));
    }

    #[tokio::test]
    async fn test_both_backends_fail() {
        let primary = Arc::new(ScriptedBackend::failing(
            BackendId::Gemini,
            BackendError::rate_limited("Rate limited after 3 attempts"),
        ));
        let fallback = Arc::new(ScriptedBackend::failing(
            BackendId::Ollama,
            BackendError::transient("connection refused"),
        ));
        let logger = Arc::new(RecordingLogger::default());
        let progress = RecordingProgress::default();
        let uc = AnalyzeCaseUseCase::new(primary, Some(fallback)).with_logger(logger.clone());

        let result = uc
            .analyze_case_with_progress(&request("Someone stole my phone"), &progress)
            .await;

        assert!(!result.success);
        let error = result.error.unwrap();
        assert!(error.contains("Rate limited after 3 attempts"));
        assert!(error.contains("connection refused"));
        assert_eq!(*logger.events.lock().unwrap(), vec!["analysis_failed"]);
        assert_eq!(
            progress.phases.lock().unwrap().last(),
            Some(&AnalysisPhase::Failed)
        );
    }

    #[tokio::test]
    async fn test_embedded_json_end_to_end() {
        let raw = r#"Here you go: {"sections_applied":[{"section_number":"304A","description":"Death by negligence","reason":"rash driving"}],"explanation":"Accident"} Thanks"#;
        let primary = Arc::new(ScriptedBackend::answering(BackendId::Ollama, raw));
        let uc = AnalyzeCaseUseCase::new(primary, None);

        let result = uc
            .analyze_case(&request("A driver hit a pedestrian who later died"))
            .await;

        assert!(result.success);
        assert_eq!(result.service_used, "ollama");
        assert_eq!(result.sections.len(), 1);
        assert_eq!(result.sections[0].section_number, "304A");
        assert_eq!(result.explanation, "Accident");
        assert_eq!(result.raw_response.as_deref(), Some(raw));
    }

    #[tokio::test]
    async fn test_unparseable_answer_is_still_success() {
        let primary = Arc::new(ScriptedBackend::answering(BackendId::Ollama, "no json here"));
        let uc = AnalyzeCaseUseCase::new(primary, None);

        let result = uc.analyze_case(&request("Someone stole my phone")).await;

        assert!(result.success);
        assert_eq!(result.sections[0].section_number, "Unknown");
        assert!(result.explanation.starts_with("Raw response: no json here"));
    }

    #[tokio::test]
    async fn test_fallback_equal_to_primary_is_dropped() {
        let primary = Arc::new(ScriptedBackend::answering(BackendId::Ollama, THEFT_JSON));
        let same = Arc::new(ScriptedBackend::answering(BackendId::Ollama, THEFT_JSON));
        let uc = AnalyzeCaseUseCase::new(primary, Some(same));
        assert_eq!(uc.fallback_id(), None);
        assert_eq!(uc.service_priority(), vec![BackendId::Ollama]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_yields_failure_shape() {
        let primary = Arc::new(
            ScriptedBackend::answering(BackendId::Gemini, THEFT_JSON)
                .with_delay(Duration::from_secs(30)),
        );
        let fallback = Arc::new(ScriptedBackend::answering(BackendId::Ollama, THEFT_JSON));
        let uc = AnalyzeCaseUseCase::new(primary, Some(fallback.clone()));
        let token = CancellationToken::new();

        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                token.cancel();
            })
        };

        let result = uc
            .analyze_case_with_cancel(
                &request("Someone stole my phone"),
                &NoAnalysisProgress,
                &token,
            )
            .await;
        canceller.await.unwrap();

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Analysis cancelled"));
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_health_check_roles() {
        let primary = Arc::new(ScriptedBackend::answering(BackendId::Gemini, THEFT_JSON));
        let fallback =
            Arc::new(ScriptedBackend::answering(BackendId::Ollama, THEFT_JSON).unhealthy());
        let uc = AnalyzeCaseUseCase::new(primary, Some(fallback))
            .with_environment(DeploymentEnvironment::Production);

        let report = uc.health_check().await;

        assert_eq!(report.primary.primary_service, Some(true));
        assert_eq!(report.fallbacks.len(), 1);
        assert_eq!(report.fallbacks[0].role.as_deref(), Some("fallback"));
        assert_eq!(report.fallbacks[0].primary_service, Some(false));
        assert!(!report.fallbacks[0].is_healthy());
        assert!(report.any_healthy());
        assert_eq!(
            report.service_priority,
            vec![BackendId::Gemini, BackendId::Ollama]
        );
    }

    #[test]
    fn test_service_info() {
        let primary = Arc::new(ScriptedBackend::answering(BackendId::Gemini, THEFT_JSON));
        let fallback = Arc::new(ScriptedBackend::answering(BackendId::Ollama, THEFT_JSON));
        let uc = AnalyzeCaseUseCase::new(primary, Some(fallback))
            .with_environment(DeploymentEnvironment::Production)
            .with_debug_mode(true);

        let info = uc.service_info();

        assert_eq!(info.primary_service, BackendId::Gemini);
        assert_eq!(info.fallback_service, Some(BackendId::Ollama));
        assert_eq!(info.services_available["gemini"], true);
        assert_eq!(info.services_available["huggingface"], false);
        assert!(info.debug_mode);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["environment"], "production");
        assert_eq!(json["mode"], "auto");
    }

    #[test]
    fn test_exhausted_error_names_both_backends() {
        let err = AnalysisError::AllBackendsExhausted {
            primary: BackendId::Gemini,
            primary_error: BackendError::new(BackendErrorKind::Timeout, "slow"),
            fallback: BackendId::Ollama,
            fallback_error: BackendError::transient("refused"),
        };
        assert_eq!(
            err.to_string(),
            "All services failed. gemini: slow; ollama fallback: refused"
        );
    }
}
