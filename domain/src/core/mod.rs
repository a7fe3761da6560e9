//! Core domain concepts shared across all subdomains.
//!
//! - [`request::AnalysisRequest`] - a validated case description
//! - [`error::DomainError`] - domain-level errors

pub mod error;
pub mod request;
