//! HTTP backend clients
//!
//! One client per [`BackendId`]. [`HttpBackend`] closes over the set so the
//! composition root can build any backend from its descriptor and hand it to
//! the application layer as a [`BackendClient`].

mod http;
pub mod gemini;
pub mod huggingface;
pub mod ollama;
pub mod retry;

pub use gemini::GeminiClient;
pub use huggingface::HuggingFaceClient;
pub use ollama::OllamaClient;
pub use retry::RetryPolicy;

use async_trait::async_trait;
use justice_application::{BackendClient, BackendError, BackendHealth};
use justice_domain::{BackendDescriptor, BackendId, RawBackendResponse};

/// Any of the supported backends
pub enum HttpBackend {
    Ollama(OllamaClient),
    HuggingFace(HuggingFaceClient),
    Gemini(GeminiClient),
}

impl HttpBackend {
    /// Build the client matching `descriptor.id`.
    pub fn from_descriptor(descriptor: BackendDescriptor) -> Self {
        Self::with_http_client(descriptor, reqwest::Client::new())
    }

    /// Same as [`from_descriptor`](Self::from_descriptor), sharing one
    /// connection pool across backends.
    pub fn with_http_client(descriptor: BackendDescriptor, http: reqwest::Client) -> Self {
        match descriptor.id {
            BackendId::Ollama => {
                HttpBackend::Ollama(OllamaClient::with_http_client(descriptor, http))
            }
            BackendId::HuggingFace => {
                HttpBackend::HuggingFace(HuggingFaceClient::with_http_client(descriptor, http))
            }
            BackendId::Gemini => {
                HttpBackend::Gemini(GeminiClient::with_http_client(descriptor, http))
            }
        }
    }

    fn inner(&self) -> &dyn BackendClient {
        match self {
            HttpBackend::Ollama(c) => c,
            HttpBackend::HuggingFace(c) => c,
            HttpBackend::Gemini(c) => c,
        }
    }
}

#[async_trait]
impl BackendClient for HttpBackend {
    fn id(&self) -> BackendId {
        self.inner().id()
    }

    fn model(&self) -> &str {
        self.inner().model()
    }

    async fn call(&self, prompt: &str) -> Result<RawBackendResponse, BackendError> {
        self.inner().call(prompt).await
    }

    async fn health_check(&self) -> BackendHealth {
        self.inner().health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_descriptor_matches_id() {
        for id in BackendId::ALL {
            let backend =
                HttpBackend::from_descriptor(BackendDescriptor::new(id, "http://localhost", "m"));
            assert_eq!(backend.id(), id);
            assert_eq!(backend.model(), "m");
        }
    }
}
