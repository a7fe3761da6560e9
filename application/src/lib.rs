//! Application layer for justice-aid
//!
//! This crate contains the analysis use case and the port definitions its
//! adapters implement. It depends only on the domain layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    analysis_logger::{AnalysisEvent, AnalysisLogger, NoAnalysisLogger},
    backend_client::{BackendClient, BackendError, BackendErrorKind, BackendHealth, HealthStatus},
    progress::{AnalysisPhase, AnalysisProgressNotifier, NoAnalysisProgress},
};
pub use use_cases::analyze_case::{AnalysisError, AnalyzeCaseUseCase, HealthReport, ServiceInfo};
