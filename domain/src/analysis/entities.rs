//! Analysis entities and the result value returned to callers.

use crate::providers::RawBackendResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Explanation used when a backend answer carries none.
pub const DEFAULT_EXPLANATION: &str = "No explanation provided";

/// `service_used` reported when no backend produced an answer.
pub const FAILED_SERVICE: &str = "fallback";

/// One IPC section cited as applicable to the case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedSection {
    pub section_number: String,
    pub description: String,
    pub reason: String,
}

impl AppliedSection {
    pub fn new(
        section_number: impl Into<String>,
        description: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            section_number: section_number.into(),
            description: description.into(),
            reason: reason.into(),
        }
    }

    /// Build a section from whatever shape the backend produced.
    ///
    /// Objects map field by field (missing fields become empty, numbers become
    /// strings). A bare string or number is taken as the section number.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self {
                section_number: lenient_string(map.get("section_number")),
                description: lenient_string(map.get("description")),
                reason: lenient_string(map.get("reason")),
            }),
            Value::String(s) => Some(Self::new(s.clone(), "", "")),
            Value::Number(n) => Some(Self::new(n.to_string(), "", "")),
            _ => None,
        }
    }
}

fn lenient_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// The structured shape every backend answer is normalized into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisJson {
    pub sections_applied: Vec<AppliedSection>,
    pub explanation: String,
}

impl AnalysisJson {
    /// Interpret a parsed JSON value, or `None` if it has no `sections_applied` key.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let sections = object.get("sections_applied")?;

        let sections_applied = match sections {
            Value::Array(items) => items.iter().filter_map(AppliedSection::from_value).collect(),
            Value::Null => Vec::new(),
            single => AppliedSection::from_value(single).into_iter().collect(),
        };

        let explanation = match object.get("explanation") {
            None | Some(Value::Null) => DEFAULT_EXPLANATION.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };

        Some(Self {
            sections_applied,
            explanation,
        })
    }
}

/// Outcome of one `analyze_case` call.
///
/// Failure is encoded in the value: when `success` is false, `sections`
/// holds exactly one sentinel `"Error"` entry and `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub success: bool,
    #[serde(rename = "sections_applied")]
    pub sections: Vec<AppliedSection>,
    pub explanation: String,
    pub service_used: String,
    pub response_time_ms: u64,
    pub error: Option<String>,
    pub fallback_reason: Option<String>,
    pub primary_service_failed: Option<String>,
    pub model_used: Option<String>,
    pub raw_response: Option<String>,
}

impl AnalysisResult {
    /// Successful result built from a normalized backend answer.
    pub fn from_backend(analysis: AnalysisJson, raw: RawBackendResponse) -> Self {
        Self {
            success: true,
            sections: analysis.sections_applied,
            explanation: analysis.explanation,
            service_used: raw.backend.as_str().to_string(),
            response_time_ms: raw.elapsed_ms,
            error: None,
            fallback_reason: None,
            primary_service_failed: None,
            model_used: Some(raw.model),
            raw_response: Some(raw.text),
        }
    }

    /// Mark a successful result as produced by the fallback backend.
    pub fn into_fallback(
        mut self,
        reason: impl Into<String>,
        failed_primary: impl Into<String>,
    ) -> Self {
        self.service_used = format!("{}_fallback", self.service_used);
        self.fallback_reason = Some(reason.into());
        self.primary_service_failed = Some(failed_primary.into());
        self
    }

    /// Synthetic result used when no backend could answer.
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            sections: vec![AppliedSection::new(
                "Error",
                "Analysis service unavailable",
                format!("Service error: {}", message),
            )],
            explanation: format!(
                "Unable to analyze case due to service error. Please try again later. Error: {}",
                message
            ),
            service_used: FAILED_SERVICE.to_string(),
            response_time_ms: 0,
            error: Some(message),
            fallback_reason: None,
            primary_service_failed: None,
            model_used: None,
            raw_response: None,
        }
    }

    /// Whether a fallback backend produced this result.
    pub fn used_fallback(&self) -> bool {
        self.service_used.ends_with("_fallback")
    }
}
