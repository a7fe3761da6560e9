//! Legal analysis subdomain.
//!
//! - [`entities`] - [`AppliedSection`], [`AnalysisJson`] and the caller-facing [`AnalysisResult`]
//! - [`normalizer`] - turns raw backend text into an [`AnalysisJson`]

pub mod entities;
pub mod normalizer;

pub use entities::{AnalysisJson, AnalysisResult, AppliedSection};
pub use normalizer::normalize;
