//! Shared HTTP plumbing for backend clients
//!
//! Maps reqwest transport failures and HTTP status codes onto
//! [`BackendErrorKind`](justice_application::BackendErrorKind).

use justice_application::BackendError;
use justice_domain::util::truncate_str;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

/// Longest error body echoed back in an error message
const MAX_ERROR_BODY: usize = 500;

/// Classify a failure that happened before a status code was received.
///
/// The URL is stripped from the message since Gemini carries its key in the query.
pub(crate) fn classify_transport(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::timeout("Request timeout")
    } else {
        BackendError::transient(format!("Request failed: {}", err.without_url()))
    }
}

/// Classify a non-200 response.
///
/// `label` is the human name used in messages ("Gemini", "Hugging Face", ...).
pub(crate) fn classify_status(label: &str, status: StatusCode, body: &str) -> BackendError {
    let body = truncate_str(body.trim(), MAX_ERROR_BODY);
    match status.as_u16() {
        401 | 403 => BackendError::unauthenticated(format!(
            "Permission denied - check your {} credential (HTTP {})",
            label,
            status.as_u16()
        )),
        429 => BackendError::rate_limited("Rate limit exceeded"),
        400 => BackendError::unavailable(format!("Bad request: {}", body)),
        code if status.is_server_error() => {
            BackendError::transient(format!("{} API error: {} - {}", label, code, body))
        }
        code => BackendError::unavailable(format!("{} API error: {} - {}", label, code, body)),
    }
}

/// Read a 200 answer body and pull the model text out of it with `extract`.
///
/// A body that is not JSON is passed on as lossy text for the normalizer.
pub(crate) async fn read_answer<F>(
    response: reqwest::Response,
    extract: F,
) -> Result<String, BackendError>
where
    F: FnOnce(&Value) -> String,
{
    let bytes = response.bytes().await.map_err(classify_transport)?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(json) => Ok(extract(&json)),
        Err(e) => {
            debug!(error = %e, "Answer body is not JSON, passing it on as text");
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}

/// Read a 200 body as JSON.
pub(crate) async fn read_json(response: reqwest::Response) -> Result<Value, BackendError> {
    let bytes = response.bytes().await.map_err(classify_transport)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        BackendError::malformed(format!(
            "Response body is not JSON ({}): {}",
            e,
            truncate_str(&String::from_utf8_lossy(&bytes), MAX_ERROR_BODY)
        ))
    })
}

/// Text of a string value, or the value serialized back to JSON.
pub(crate) fn text_or_json(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
