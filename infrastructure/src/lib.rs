//! Infrastructure layer for justice-aid
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: HTTP backend clients, the JSONL analysis logger,
//! configuration file loading, and orchestrator assembly.

pub mod assembly;
pub mod config;
pub mod environment;
pub mod logging;
pub mod providers;

// Re-export commonly used types
pub use assembly::{Assembly, AssemblyError, build_orchestrator};
pub use config::{ConfigLoader, ConfigValidationError, FileConfig};
pub use environment::{probe_signals, process_env};
pub use logging::JsonlAnalysisLogger;
pub use providers::{GeminiClient, HttpBackend, HuggingFaceClient, OllamaClient, RetryPolicy};
