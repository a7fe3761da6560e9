//! Prompt templates for IPC analysis

/// Templates for generating backend prompts
pub struct PromptTemplate;

impl PromptTemplate {
    /// The JSON shape every backend is asked to answer in
    pub fn response_format() -> &'static str {
        r#"{
  "sections_applied": [
    {
      "section_number": "304A",
      "description": "Brief description of the section",
      "reason": "Explanation of why this section applies to the case"
    }
  ],
  "explanation": "Overall explanation of the legal analysis"
}"#
    }

    /// Legal analysis prompt for a case description.
    ///
    /// Identical for every backend so answers stay comparable.
    pub fn legal_analysis(case_description: &str) -> String {
        format!(
            r#"
{}

Which IPC sections will be applied in this case? Give response in JSON format with a description of those IPCs and why were those applied.

Please provide the response in the following JSON format:
{}
"#,
            case_description.trim(),
            Self::response_format()
        )
    }

    /// Short prompt used by health probes
    pub fn health_probe() -> &'static str {
        "Say 'Hello' to test the connection."
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_analysis_embeds_trimmed_description() {
        let prompt = PromptTemplate::legal_analysis("  A man hit a pedestrian  ");
        assert!(prompt.contains("\nA man hit a pedestrian\n"));
        assert!(prompt.contains("Which IPC sections will be applied"));
    }

    #[test]
    fn test_response_format_is_valid_json() {
        let value: serde_json::Value =
            serde_json::from_str(PromptTemplate::response_format()).unwrap();
        assert!(value.get("sections_applied").is_some());
        assert!(value.get("explanation").is_some());
    }
}
