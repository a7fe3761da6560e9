//! Port for structured analysis logging.
//!
//! Defines the [`AnalysisLogger`] trait for recording analysis events
//! (completed analyses, fallbacks, failures) to a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures one
//! machine-readable record per event (JSONL).

use serde_json::Value;

/// A structured analysis event for logging.
pub struct AnalysisEvent {
    /// Event type identifier (e.g., "analysis_completed", "fallback_completed").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl AnalysisEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging analysis events.
///
/// `log` is synchronous and non-fallible; logging failures must not
/// affect the analysis result.
pub trait AnalysisLogger: Send + Sync {
    /// Record an analysis event.
    fn log(&self, event: AnalysisEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoAnalysisLogger;

impl AnalysisLogger for NoAnalysisLogger {
    fn log(&self, _event: AnalysisEvent) {}
}
