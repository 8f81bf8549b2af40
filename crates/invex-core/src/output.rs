//! Parsing of model replies into JSON.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::ExtractionError;

lazy_static! {
    /// A Markdown code fence, optionally tagged `json`.
    static ref CODE_FENCE: Regex = Regex::new(r"(?s)```(?:json|JSON)?\s*\n?(.*?)```").unwrap();
}

/// Parses model output that is expected to hold a single JSON value.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonOutputParser;

impl JsonOutputParser {
    pub fn new() -> Self {
        Self
    }

    /// Instruction text a prompt can embed to request JSON output.
    pub fn format_instructions() -> &'static str {
        "Return a JSON object."
    }

    /// Parse raw, fenced, or prose-wrapped JSON.
    pub fn parse(&self, text: &str) -> Result<Value, ExtractionError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ExtractionError::MalformedOutput("empty reply".to_string()));
        }

        let first_error = match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if let Some(caps) = CODE_FENCE.captures(trimmed) {
            debug!("Parsing JSON from fenced code block");
            if let Ok(value) = serde_json::from_str::<Value>(caps[1].trim()) {
                return Ok(value);
            }
        }

        if let Some(candidate) = outermost_json(trimmed) {
            debug!("Parsing JSON embedded in surrounding text");
            if let Ok(value) = serde_json::from_str::<Value>(candidate) {
                return Ok(value);
            }
        }

        Err(ExtractionError::MalformedOutput(first_error.to_string()))
    }
}

/// Slice from the first opening bracket to its last matching closer.
fn outermost_json(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer)?;
    (end > start).then(|| &text[start..=end])
}
