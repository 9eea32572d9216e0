//! Model Output Extraction
//!
//! Strips markdown code fences from model output and classifies whether what
//! remains is a JSON document.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref FENCE_RE: Regex = match Regex::new(r"```json\s*|\s*```") {
        Ok(re) => re,
        Err(e) => panic!("fence pattern failed to compile: {}", e),
    };
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    Parsed(Value),
    /// Holds the upstream text exactly as received.
    Unparseable(String),
}

/// How an unparseable model response is surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnparseablePolicy {
    /// 200 with a warning and the raw text.
    Warn,
    /// Upstream error envelope.
    Reject,
}

/// Removes ```` ```json ```` / ```` ``` ```` fences anywhere in the text and trims.
pub fn strip_fences(text: &str) -> String {
    FENCE_RE.replace_all(text, "").trim().to_string()
}

/// Parses the text after fence removal.
pub fn parse_cleaned(text: &str) -> serde_json::Result<Value> {
    serde_json::from_str::<Value>(&strip_fences(text))
}

pub fn extract_json(text: &str) -> ExtractionOutcome {
    match parse_cleaned(text) {
        Ok(value) => ExtractionOutcome::Parsed(value),
        Err(e) => {
            tracing::debug!(
                "[EXTRACT] Model output is not JSON after fence removal ({} chars): {}",
                text.len(),
                e
            );
            ExtractionOutcome::Unparseable(text.to_string())
        }
    }
}
