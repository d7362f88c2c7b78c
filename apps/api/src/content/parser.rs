//! Content Parser: turns raw model output into `ParsedContent`.
//!
//! Never fails: strict JSON first, then the greedy `{ ... }` span, then the fixed
//! fallback. Degradation is logged and reported through `ParsedContent::degraded`.

use serde_json::Value;
use tracing::{debug, warn};

use crate::content::model::ParsedContent;

/// Extracts a JSON object from model output that may be wrapped in prose or fences.
///
/// Returns `None` if neither the whole text nor the span from the first `{` to the
/// last `}` parses as a JSON object.
pub fn extract_json_object(raw: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(value) if value.is_object() => return Some(value),
        Ok(_) => debug!("Model output is JSON but not an object; searching for an object span"),
        Err(e) => debug!("Strict JSON parse failed ({e}); searching for an object span"),
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }

    match serde_json::from_str::<Value>(&raw[start..=end]) {
        Ok(value) if value.is_object() => Some(value),
        Ok(_) => None,
        Err(e) => {
            debug!("Extracted span is not valid JSON: {e}");
            None
        }
    }
}

/// Parses slide-deck content from raw model output.
pub fn parse_content(raw: &str) -> ParsedContent {
    match extract_json_object(raw) {
        Some(value) => ParsedContent::from_value(&value),
        None => {
            warn!(
                "Model output could not be parsed as JSON; using fallback content. Output starts with: {:?}",
                raw.chars().take(200).collect::<String>()
            );
            ParsedContent::fallback()
        }
    }
}
