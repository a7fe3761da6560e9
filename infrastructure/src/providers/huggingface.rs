//! Hugging Face Inference API client

use super::http::{classify_status, classify_transport, read_answer, text_or_json};
use super::retry::RetryPolicy;
use async_trait::async_trait;
use justice_application::{BackendClient, BackendError, BackendHealth};
use justice_domain::{BackendDescriptor, BackendId, RawBackendResponse};
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use tracing::debug;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);
const STOP_TOKENS: [&str; 2] = ["</s>", "<|endoftext|>"];

pub struct HuggingFaceClient {
    descriptor: BackendDescriptor,
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl HuggingFaceClient {
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
        json!({
            "inputs": prompt,
            "parameters": {
                "max_new_tokens": 800,
                "temperature": 0.3,
                "do_sample": true,
                "return_full_text": false,
                "stop": STOP_TOKENS,
                "repetition_penalty": 1.1
            },
            "options": {
                "wait_for_model": true,
                "use_cache": false
            }
        })
    }

    /// `generated_text` from either a list or an object answer.
    fn extract_text(json: &Value) -> String {
        let generated = match json {
            Value::Array(items) => items.first().and_then(|first| first.get("generated_text")),
            Value::Object(_) => json.get("generated_text"),
            _ => None,
        };
        generated
            .map(text_or_json)
            .unwrap_or_else(|| text_or_json(json))
    }

    async fn generate_once(&self, token: &str, prompt: &str) -> Result<String, BackendError> {
        let response = self
            .http
            .post(&self.descriptor.endpoint)
            .bearer_auth(token)
            .timeout(self.descriptor.timeout)
            .json(&Self::generate_body(prompt))
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(BackendError::transient("Model is still loading"));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status("Hugging Face", status, &text));
        }

        read_answer(response, Self::extract_text).await
    }
}

#[async_trait]
impl BackendClient for HuggingFaceClient {
    fn id(&self) -> BackendId {
        BackendId::HuggingFace
    }

    fn model(&self) -> &str {
        &self.descriptor.model
    }

    async fn call(&self, prompt: &str) -> Result<RawBackendResponse, BackendError> {
        let Some(token) = self.descriptor.credential() else {
            return Err(BackendError::unauthenticated(
                "Hugging Face API token not configured",
            ));
        };

        let started = Instant::now();
        let text = self
            .retry
            .run(|_| self.generate_once(token, prompt))
            .await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        debug!(model = %self.descriptor.model, elapsed_ms, "Hugging Face answered");
        Ok(RawBackendResponse::new(
            BackendId::HuggingFace,
            self.descriptor.model.clone(),
            text,
            elapsed_ms,
        ))
    }

    async fn health_check(&self) -> BackendHealth {
        let Some(token) = self.descriptor.credential() else {
            return BackendHealth::unhealthy(BackendId::HuggingFace, "API token not configured");
        };

        let probe = json!({
            "inputs": "Test connection",
            "parameters": {"max_new_tokens": 10}
        });
        let response = match self
            .http
            .post(&self.descriptor.endpoint)
            .bearer_auth(token)
            .timeout(HEALTH_TIMEOUT)
            .json(&probe)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                return BackendHealth::unhealthy(
                    BackendId::HuggingFace,
                    e.without_url().to_string(),
                );
            }
        };

        // 503 means the model is still loading, which is fine for health
        match response.status() {
            StatusCode::OK => {
                BackendHealth::healthy(BackendId::HuggingFace, self.descriptor.model.clone())
                    .with_detail("note", "Ready")
            }
            StatusCode::SERVICE_UNAVAILABLE => {
                BackendHealth::healthy(BackendId::HuggingFace, self.descriptor.model.clone())
                    .with_detail("note", "Model loading")
            }
            status => BackendHealth::unhealthy(
                BackendId::HuggingFace,
                format!("HTTP {}", status.as_u16()),
            ),
        }
    }
}
