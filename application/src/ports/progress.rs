//! Progress notification port
//!
//! Defines the interface for reporting orchestration phases while an
//! analysis runs.

use justice_domain::BackendId;
use std::fmt;

/// Orchestration phase of a single `analyze_case` call
///
/// ```text
/// Idle -> CallingPrimary -> Success
///                        -> CallingFallback -> Success
///                                           -> Failed
///                        -> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPhase {
    Idle,
    CallingPrimary,
    CallingFallback,
    Success,
    Failed,
}

impl AnalysisPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisPhase::Success | AnalysisPhase::Failed)
    }
}

impl fmt::Display for AnalysisPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalysisPhase::Idle => "idle",
            AnalysisPhase::CallingPrimary => "calling_primary",
            AnalysisPhase::CallingFallback => "calling_fallback",
            AnalysisPhase::Success => "success",
            AnalysisPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Callback for phase changes during an analysis
///
/// Implementations live in the presentation layer.
pub trait AnalysisProgressNotifier: Send + Sync {
    /// Called on every phase transition. `backend` is the backend being
    /// called (for calling phases) or the one that answered (for success).
    fn on_phase(&self, phase: AnalysisPhase, backend: Option<BackendId>);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoAnalysisProgress;

impl AnalysisProgressNotifier for NoAnalysisProgress {
    fn on_phase(&self, _phase: AnalysisPhase, _backend: Option<BackendId>) {}
}
