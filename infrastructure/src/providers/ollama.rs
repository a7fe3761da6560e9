//! Ollama backend client
//!
//! Talks to a local (or self-hosted) Ollama server through its
//! `/api/generate` endpoint. No credential is needed.

use super::http::{classify_status, classify_transport, read_answer, read_json, text_or_json};
use super::retry::RetryPolicy;
use async_trait::async_trait;
use justice_application::{BackendClient, BackendError, BackendHealth};
use justice_domain::{BackendDescriptor, BackendId, RawBackendResponse};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::debug;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
}

pub struct OllamaClient {
    descriptor: BackendDescriptor,
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl OllamaClient {
    pub fn new(descriptor: BackendDescriptor) -> Self {
        Self::with_http_client(descriptor, reqwest::Client::new())
    }

    pub fn with_http_client(descriptor: BackendDescriptor, http: reqwest::Client) -> Self {
        let retry = RetryPolicy::for_descriptor(&descriptor);
        Self {
            descriptor,
            http,
            retry,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.descriptor.endpoint.trim_end_matches('/'), path)
    }

    async fn generate_once(&self, prompt: &str) -> Result<String, BackendError> {
        let body = GenerateRequest {
            model: &self.descriptor.model,
            prompt,
            stream: false,
            format: "json",
        };
        let response = self
            .http
            .post(self.url("/api/generate"))
            .timeout(self.descriptor.timeout)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status("Ollama", status, &text));
        }

        // Unexpected shapes are handed on as-is; the normalizer copes.
        read_answer(response, |json| {
            json.get("response")
                .map(text_or_json)
                .unwrap_or_else(|| text_or_json(json))
        })
        .await
    }
}

#[async_trait]
impl BackendClient for OllamaClient {
    fn id(&self) -> BackendId {
        BackendId::Ollama
    }

    fn model(&self) -> &str {
        &self.descriptor.model
    }

    async fn call(&self, prompt: &str) -> Result<RawBackendResponse, BackendError> {
        let started = Instant::now();
        let text = self.retry.run(|_| self.generate_once(prompt)).await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        debug!(model = %self.descriptor.model, elapsed_ms, "Ollama answered");
        Ok(RawBackendResponse::new(
            BackendId::Ollama,
            self.descriptor.model.clone(),
            text,
            elapsed_ms,
        ))
    }

    async fn health_check(&self) -> BackendHealth {
        let response = match self
            .http
            .get(self.url("/api/tags"))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                return BackendHealth::unhealthy(BackendId::Ollama, e.without_url().to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            return BackendHealth::unhealthy(
                BackendId::Ollama,
                format!("HTTP {}", status.as_u16()),
            );
        }

        let json = match read_json(response).await {
            Ok(json) => json,
            Err(e) => return BackendHealth::unhealthy(BackendId::Ollama, e.to_string()),
        };
        let available: Vec<String> = json
            .get("models")
            .and_then(|m| m.as_array())
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m.get("name").and_then(|n| n.as_str()))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let model_available = available.iter().any(|name| *name == self.descriptor.model);

        BackendHealth::healthy(BackendId::Ollama, self.descriptor.model.clone())
            .with_detail("model_available", model_available)
            .with_detail("available_models", available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use justice_application::BackendErrorKind;
    use justice_domain::BackoffSettings;
    use serde_json::json;

    fn client(server: &MockServer, max_retries: u32) -> OllamaClient {
        let descriptor = BackendDescriptor::new(BackendId::Ollama, server.base_url(), "ipc-helper")
            .with_max_retries(max_retries)
            .with_backoff(BackoffSettings {
                rate_limit_base: Duration::from_millis(2),
                transient_base: Duration::from_millis(1),
            });
        OllamaClient::new(descriptor)
    }

    #[tokio::test]
    async fn test_generate_extracts_response_field() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/generate")
                    .json_body_partial(r#"{"model":"ipc-helper","stream":false,"format":"json"}"#);
                then.status(200)
                    .json_body(json!({"response": "{\"sections_applied\":[]}", "done": true}));
            })
            .await;

        let raw = client(&server, 3).call("prompt").await.unwrap();

        mock.assert_async().await;
        assert_eq!(raw.text, "{\"sections_applied\":[]}");
        assert_eq!(raw.backend, BackendId::Ollama);
        assert_eq!(raw.model, "ipc-helper");
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_best_effort_text() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200).json_body(json!({"message": "hi"}));
            })
            .await;

        let raw = client(&server, 3).call("prompt").await.unwrap();
        assert_eq!(raw.text, "{\"message\":\"hi\"}");
    }

    #[tokio::test]
    async fn test_plain_text_answer_is_passed_on() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200).body("Section 304A applies");
            })
            .await;

        let raw = client(&server, 3).call("prompt").await.unwrap();

        mock.assert_hits_async(1).await;
        assert_eq!(raw.text, "Section 304A applies");
    }

    #[tokio::test]
    async fn test_server_errors_retry_up_to_bound() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(500).body("boom");
            })
            .await;

        let err = client(&server, 3).call("prompt").await.unwrap_err();

        mock.assert_hits_async(3).await;
        assert_eq!(err.kind, BackendErrorKind::Transient);
        assert!(err.message.contains("after 3 attempts"));
    }

    #[tokio::test]
    async fn test_missing_model_is_not_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(404).body("model 'ipc-helper' not found");
            })
            .await;

        let err = client(&server, 3).call("prompt").await.unwrap_err();

        mock.assert_hits_async(1).await;
        assert_eq!(err.kind, BackendErrorKind::Unavailable);
    }

    #[tokio::test]
    async fn test_health_reports_model_availability() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tags");
                then.status(200).json_body(json!({
                    "models": [{"name": "ipc-helper"}, {"name": "llama3"}]
                }));
            })
            .await;

        let health = client(&server, 3).health_check().await;

        assert!(health.is_healthy());
        assert_eq!(health.details["model_available"], json!(true));
        assert_eq!(health.details["available_models"], json!(["ipc-helper", "llama3"]));
    }

    #[tokio::test]
    async fn test_health_unhealthy_on_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tags");
                then.status(502);
            })
            .await;

        let health = client(&server, 3).health_check().await;

        assert!(!health.is_healthy());
        assert_eq!(health.error.as_deref(), Some("HTTP 502"));
    }
}
