//! Google Gemini (Generative Language API) client

use super::http::{classify_status, classify_transport, read_answer, text_or_json};
use super::retry::RetryPolicy;
use async_trait::async_trait;
use justice_application::{BackendClient, BackendError, BackendHealth};
use justice_domain::{BackendDescriptor, BackendId, PromptTemplate, RawBackendResponse};
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use tracing::debug;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

pub struct GeminiClient {
    descriptor: BackendDescriptor,
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl GeminiClient {
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

    fn generate_body(prompt: &str) -> Value {
        let safety: Vec<Value> = SAFETY_CATEGORIES
            .iter()
            .map(|category| json!({"category": category, "threshold": "BLOCK_MEDIUM_AND_ABOVE"}))
            .collect();
        json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {
                "temperature": 0.3,
                "topK": 40,
                "topP": 0.95,
                "maxOutputTokens": 1024,
                "stopSequences": []
            },
            "safetySettings": safety
        })
    }

    /// `candidates[0].content.parts[0].text`, or the whole body when absent.
    fn extract_text(json: &Value) -> String {
        json.pointer("/candidates/0/content/parts/0/text")
            .map(text_or_json)
            .unwrap_or_else(|| text_or_json(json))
    }

    async fn generate_once(&self, key: &str, body: &Value) -> Result<String, BackendError> {
        let response = self
            .http
            .post(&self.descriptor.endpoint)
            .query(&[("key", key)])
            .timeout(self.descriptor.timeout)
            .json(body)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status("Gemini", status, &text));
        }

        read_answer(response, Self::extract_text).await
    }
}

#[async_trait]
impl BackendClient for GeminiClient {
    fn id(&self) -> BackendId {
        BackendId::Gemini
    }

    fn model(&self) -> &str {
        &self.descriptor.model
    }

    async fn call(&self, prompt: &str) -> Result<RawBackendResponse, BackendError> {
        let Some(key) = self.descriptor.credential() else {
            return Err(BackendError::unauthenticated("Gemini API key not configured"));
        };

        let body = Self::generate_body(prompt);
        let started = Instant::now();
        let text = self.retry.run(|_| self.generate_once(key, &body)).await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        debug!(model = %self.descriptor.model, elapsed_ms, "Gemini answered");
        Ok(RawBackendResponse::new(
            BackendId::Gemini,
            self.descriptor.model.clone(),
            text,
            elapsed_ms,
        ))
    }

    async fn health_check(&self) -> BackendHealth {
        let Some(key) = self.descriptor.credential() else {
            return BackendHealth::unhealthy(BackendId::Gemini, "API key not configured");
        };

        let probe = json!({
            "contents": [{"parts": [{"text": PromptTemplate::health_probe()}]}],
            "generationConfig": {"maxOutputTokens": 10}
        });
        let result = self
            .http
            .post(&self.descriptor.endpoint)
            .query(&[("key", key)])
            .timeout(HEALTH_TIMEOUT)
            .json(&probe)
            .send()
            .await;

        match result {
            Ok(r) if r.status().is_success() => {
                BackendHealth::healthy(BackendId::Gemini, self.descriptor.model.clone())
            }
            Ok(r) => BackendHealth::unhealthy(
                BackendId::Gemini,
                format!("HTTP {}", r.status().as_u16()),
            ),
            Err(e) => BackendHealth::unhealthy(BackendId::Gemini, e.without_url().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use justice_application::BackendErrorKind;
    use justice_domain::BackoffSettings;

    const PATH: &str = "/models/gemini-1.5-flash:generateContent";

    fn client(server: &MockServer, key: Option<&str>) -> GeminiClient {
        client_with_backoff(server, key, Duration::from_millis(2))
    }

    fn client_with_backoff(
        server: &MockServer,
        key: Option<&str>,
        rate_limit_base: Duration,
    ) -> GeminiClient {
        let descriptor =
            BackendDescriptor::new(BackendId::Gemini, server.url(PATH), "gemini-1.5-flash")
                .with_credential(key.map(str::to_string))
                .with_backoff(BackoffSettings {
                    rate_limit_base,
                    transient_base: Duration::from_millis(1),
                });
        GeminiClient::new(descriptor)
    }

    fn candidate(text: &str) -> Value {
        json!({"candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]})
    }

    #[test]
    fn test_request_body_shape() {
        let body = GeminiClient::generate_body("case");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "case");
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(body["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(
            body["safetySettings"][0]["threshold"],
            "BLOCK_MEDIUM_AND_ABOVE"
        );
    }

    #[tokio::test]
    async fn test_generate_extracts_candidate_text() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path(PATH).query_param("key", "secret");
                then.status(200).json_body(candidate("{\"sections_applied\":[]}"));
            })
            .await;

        let raw = client(&server, Some("secret")).call("prompt").await.unwrap();

        mock.assert_async().await;
        assert_eq!(raw.text, "{\"sections_applied\":[]}");
        assert_eq!(raw.model, "gemini-1.5-flash");
    }

    #[tokio::test]
    async fn test_blocked_answer_is_best_effort_text() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(PATH);
                then.status(200)
                    .json_body(json!({"promptFeedback": {"blockReason": "SAFETY"}}));
            })
            .await;

        let raw = client(&server, Some("k")).call("prompt").await.unwrap();
        assert!(raw.text.contains("blockReason"));
    }

    #[tokio::test]
    async fn test_plain_text_answer_is_passed_on() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path(PATH);
                then.status(200).body("Section 302 applies");
            })
            .await;

        let raw = client(&server, Some("k")).call("prompt").await.unwrap();

        mock.assert_hits_async(1).await;
        assert_eq!(raw.text, "Section 302 applies");
    }

    #[tokio::test]
    async fn test_connection_failure_does_not_echo_key() {
        let descriptor =
            BackendDescriptor::new(BackendId::Gemini, "http://127.0.0.1:1/g", "gemini-1.5-flash")
                .with_credential(Some("SUPERSECRETKEY".to_string()))
                .with_max_retries(1);
        let client = GeminiClient::new(descriptor);

        let err = client.call("prompt").await.unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Transient);
        assert!(err.message.starts_with("Request failed: "));
        assert!(!err.message.contains("SUPERSECRETKEY"));

        let health = client.health_check().await;
        assert!(!health.is_healthy());
        let health_error = health.error.unwrap_or_default();
        assert!(!health_error.is_empty());
        assert!(!health_error.contains("SUPERSECRETKEY"));
    }

    #[tokio::test]
    async fn test_rate_limit_then_success() {
        let server = MockServer::start_async().await;
        let limited = server
            .mock_async(|when, then| {
                when.method(POST).path(PATH);
                then.status(429);
            })
            .await;

        // Long enough backoff to swap the mock before the second attempt
        let client = client_with_backoff(&server, Some("k"), Duration::from_millis(500));
        let call = tokio::spawn(async move { client.call("prompt").await });

        while limited.hits_async().await == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        limited.delete_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(PATH);
                then.status(200).json_body(candidate("ok"));
            })
            .await;

        let raw = call.await.unwrap().unwrap();
        assert_eq!(raw.text, "ok");
    }

    #[tokio::test]
    async fn test_rate_limit_exhausts_retries() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path(PATH);
                then.status(429);
            })
            .await;

        let err = client(&server, Some("k")).call("prompt").await.unwrap_err();

        mock.assert_hits_async(3).await;
        assert_eq!(err.kind, BackendErrorKind::RateLimited);
        assert_eq!(err.message, "Rate limit exceeded after 3 attempts");
    }

    #[tokio::test]
    async fn test_forbidden_is_not_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path(PATH);
                then.status(403).body("API key not valid");
            })
            .await;

        let err = client(&server, Some("k")).call("prompt").await.unwrap_err();

        mock.assert_hits_async(1).await;
        assert_eq!(err.kind, BackendErrorKind::Unauthenticated);
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path(PATH);
                then.status(200);
            })
            .await;

        let err = client(&server, None).call("prompt").await.unwrap_err();

        assert_eq!(err.kind, BackendErrorKind::Unauthenticated);
        assert_eq!(err.message, "Gemini API key not configured");
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(PATH)
                    .json_body_partial(r#"{"generationConfig":{"maxOutputTokens":10}}"#);
                then.status(200).json_body(candidate("Hello"));
            })
            .await;

        let health = client(&server, Some("k")).health_check().await;
        assert!(health.is_healthy());
        assert_eq!(health.model.as_deref(), Some("gemini-1.5-flash"));
    }
}
