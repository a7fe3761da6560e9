//! Response normalization for backend answers.
//!
//! Backends are asked for JSON but frequently wrap it in prose, markdown
//! fences or truncate it. [`normalize`] is the single place that turns any
//! such text into an [`AnalysisJson`]. It is pure: no I/O, no retries.
//!
//! # Order of attempts
//!
//! | Step | Input | Accepted when |
//! |------|-------|---------------|
//! | 1 | whole trimmed text | parses and has `sections_applied` |
//! | 2 | greedy `{...}` span (first `{` to last `}`) | same |
//! | 3 | balanced `{...}` span at each `{`, in order | same |
//! | 4 | - | always: sentinel "Unknown" section |

use super::entities::{AnalysisJson, AppliedSection};
use crate::util::take_chars;
use regex::Regex;
use std::sync::LazyLock;

/// Number of raw characters echoed in the unparseable explanation.
pub const RAW_PREVIEW_CHARS: usize = 500;

static GREEDY_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("static regex is valid"));

/// Normalize raw backend text into the analysis shape.
///
/// Never fails; text without a usable JSON object yields the sentinel
/// produced by [`unparseable`].
///
/// # Examples
///
/// ```
/// use justice_domain::analysis::normalize;
///
/// let a = normalize(r#"{"sections_applied": []}"#);
/// assert_eq!(a.explanation, "No explanation provided");
///
/// let a = normalize("not json at all");
/// assert_eq!(a.sections_applied[0].section_number, "Unknown");
/// ```
pub fn normalize(raw: &str) -> AnalysisJson {
    let trimmed = raw.trim();

    if let Some(analysis) = parse_candidate(trimmed) {
        return analysis;
    }

    candidate_spans(trimmed)
        .into_iter()
        .find_map(parse_candidate)
        .unwrap_or_else(|| unparseable(raw))
}

/// Sentinel analysis for text that holds no usable JSON object.
pub fn unparseable(raw: &str) -> AnalysisJson {
    AnalysisJson {
        sections_applied: vec![AppliedSection::new(
            "Unknown",
            "Could not parse response",
            "Response format error",
        )],
        explanation: format!("Raw response: {}...", take_chars(raw, RAW_PREVIEW_CHARS)),
    }
}

fn parse_candidate(text: &str) -> Option<AnalysisJson> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    AnalysisJson::from_value(&value)
}

/// Candidate object spans, in the order they should be tried.
fn candidate_spans(text: &str) -> Vec<&str> {
    let mut spans: Vec<&str> = Vec::new();

    if let Some(m) = GREEDY_OBJECT.find(text) {
        spans.push(m.as_str());
    }

    for (start, _) in text.match_indices('{') {
        if let Some(end) = balanced_end(text, start) {
            let span = &text[start..=end];
            if !spans.contains(&span) {
                spans.push(span);
            }
        }
    }

    spans
}

/// Byte index of the `}` closing the object that opens at `start`.
///
/// Braces inside JSON string literals are ignored.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in text.as_bytes()[start..].iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }

    None
}
