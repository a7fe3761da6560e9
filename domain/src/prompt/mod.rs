//! Prompt domain
//!
//! Templates for the prompts sent to analysis backends.

mod template;

pub use template::PromptTemplate;
